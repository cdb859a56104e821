//! Hotkey actions and the sources that produce them.
//!
//! A source turns key presses into [`Action`]s. The host loop pulls one
//! action at a time and runs it to completion before pulling the next.
//!
//! Hosts:
//!   - GlobalHost  — polls the system keyboard and mouse (device_query), so
//!     hotkeys work whichever window has focus
//!   - ConsoleHost — key names and coordinates typed on stdin

use crate::capture::Region;
use crate::ocr::Backend;
use device_query::{DeviceQuery, DeviceState, Keycode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Interval between keyboard and mouse polls.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Left button in `MouseState::button_pressed`.
const LEFT_BUTTON: usize = 1;

/// Everything a hotkey can ask the app to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    SelectRegion,
    Classic,
    Division,
    Vision,
    VisionDivision,
    SaveError,
    Reset,
    Quit,
}

impl Action {
    /// Backend and division mode for actions that run the pipeline.
    pub fn run_params(self) -> Option<(Backend, bool)> {
        match self {
            Action::Classic => Some((Backend::Tesseract, false)),
            Action::Division => Some((Backend::Tesseract, true)),
            Action::Vision => Some((Backend::VisionLlm, false)),
            Action::VisionDivision => Some((Backend::VisionLlm, true)),
            _ => None,
        }
    }
}

/// Produces hotkey actions.
#[allow(async_fn_in_trait)]
pub trait HotkeySource {
    /// Next action, or `None` once the source is exhausted.
    async fn next_action(&mut self) -> Option<Action>;
}

/// Lets the user pick the screen region to watch.
#[allow(async_fn_in_trait)]
pub trait RegionSelector {
    /// `None` when the user cancels.
    async fn select_region(&mut self) -> Option<Region>;
}

/// Look up a key name in a keymap, ignoring case and surrounding space.
pub fn lookup(keymap: &HashMap<String, Action>, key: &str) -> Option<Action> {
    let key = key.trim().to_lowercase();
    keymap
        .iter()
        .find(|(name, _)| name.to_lowercase() == key)
        .map(|(_, action)| *action)
}

/// Parse `x y width height` (commas also accepted) into a region.
pub fn parse_region(text: &str) -> Option<Region> {
    let parts: Vec<i64> = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<i64>())
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [x, y, w, h] if *w > 0 && *h > 0 => Some(Region {
            x: i32::try_from(*x).ok()?,
            y: i32::try_from(*y).ok()?,
            width: u32::try_from(*w).ok()?,
            height: u32::try_from(*h).ok()?,
        }),
        _ => None,
    }
}

/// Terminal host: key names and region coordinates typed on stdin.
///
/// A line is either a key name from the keymap (`f2`) or a key name
/// followed by region coordinates (`f1 120 340 400 60`), which pre-answers
/// the next region prompt.
pub struct ConsoleHost {
    lines: Lines<BufReader<Stdin>>,
    keymap: HashMap<String, Action>,
    pending_region: Option<Region>,
}

impl ConsoleHost {
    pub fn new(keymap: HashMap<String, Action>) -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            keymap,
            pending_region: None,
        }
    }

    async fn read_line(&mut self) -> Option<String> {
        match self.lines.next_line().await {
            Ok(line) => line,
            Err(e) => {
                log::error!("[HOTKEY] Failed to read stdin: {}", e);
                None
            }
        }
    }
}

impl HotkeySource for ConsoleHost {
    async fn next_action(&mut self) -> Option<Action> {
        loop {
            let line = self.read_line().await?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (key, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            match lookup(&self.keymap, key) {
                Some(action) => {
                    if action == Action::SelectRegion && !rest.trim().is_empty() {
                        self.pending_region = parse_region(rest);
                    }
                    log::debug!("[HOTKEY] {} -> {:?}", key, action);
                    return Some(action);
                }
                None => {
                    eprintln!("Unbound key '{}'", key);
                }
            }
        }
    }
}

impl RegionSelector for ConsoleHost {
    async fn select_region(&mut self) -> Option<Region> {
        if let Some(region) = self.pending_region.take() {
            return Some(region);
        }
        eprintln!("Region (x y width height), empty to cancel:");
        let line = self.read_line().await?;
        if line.trim().is_empty() {
            return None;
        }
        let region = parse_region(&line);
        if region.is_none() {
            eprintln!("Could not read a region from '{}'", line.trim());
        }
        region
    }
}

/// Tracks which keys are held between polls and reports new presses.
#[derive(Debug)]
pub struct KeyEdges<T> {
    held: Vec<T>,
}

impl<T> Default for KeyEdges<T> {
    fn default() -> Self {
        Self { held: Vec::new() }
    }
}

impl<T: PartialEq + Clone> KeyEdges<T> {
    /// Record the keys down now; returns those that were up last poll.
    pub fn update(&mut self, now: Vec<T>) -> Vec<T> {
        let pressed = now
            .iter()
            .filter(|key| !self.held.contains(key))
            .cloned()
            .collect();
        self.held = now;
        pressed
    }
}

/// Keymap name for a system key: `F1` becomes `f1`, `Escape` becomes `escape`.
pub fn key_name(key: &Keycode) -> String {
    format!("{:?}", key).to_lowercase()
}

/// System-wide host: hotkeys are read from the keyboard state whatever
/// window has focus, and a region is two left clicks (or one drag).
pub struct GlobalHost {
    device: DeviceState,
    keymap: HashMap<String, Action>,
    edges: KeyEdges<Keycode>,
}

impl GlobalHost {
    /// `None` when the keyboard cannot be read (no display, or no
    /// accessibility permission).
    pub fn new(keymap: HashMap<String, Action>) -> Option<Self> {
        let device = DeviceState::checked_new()?;
        let mut edges = KeyEdges::default();
        // Keys already down at startup are not presses.
        edges.update(device.get_keys());
        Some(Self {
            device,
            keymap,
            edges,
        })
    }

    fn left_down(&self) -> bool {
        self.device
            .get_mouse()
            .button_pressed
            .get(LEFT_BUTTON)
            .copied()
            .unwrap_or(false)
    }

    fn escape_pressed(&mut self) -> bool {
        self.edges
            .update(self.device.get_keys())
            .contains(&Keycode::Escape)
    }

    /// Wait for the next left click. Returns the press and release
    /// positions, or `None` if Escape is pressed first.
    async fn next_click(&mut self) -> Option<((i32, i32), (i32, i32))> {
        while self.left_down() {
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        loop {
            if self.escape_pressed() {
                return None;
            }
            if self.left_down() {
                break;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        let start = self.device.get_mouse().coords;
        let mut end = start;
        while self.left_down() {
            end = self.device.get_mouse().coords;
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        Some((start, end))
    }
}

impl HotkeySource for GlobalHost {
    async fn next_action(&mut self) -> Option<Action> {
        loop {
            for key in self.edges.update(self.device.get_keys()) {
                let name = key_name(&key);
                if let Some(action) = lookup(&self.keymap, &name) {
                    log::debug!("[HOTKEY] {} -> {:?}", name, action);
                    return Some(action);
                }
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

impl RegionSelector for GlobalHost {
    async fn select_region(&mut self) -> Option<Region> {
        eprintln!("Click two opposite corners of the region (or drag), Escape to cancel");
        let (start, end) = self.next_click().await?;
        let region = if start != end {
            Region::from_corners(start, end)
        } else {
            let (second, _) = self.next_click().await?;
            Region::from_corners(start, second)
        };
        if region.is_empty() {
            eprintln!("Region {} is empty", region);
            return None;
        }
        log::info!("[HOTKEY] Selected region {}", region);
        Some(region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_keymap;

    #[test]
    fn default_bindings() {
        let keymap = default_keymap();
        assert_eq!(lookup(&keymap, "f1"), Some(Action::SelectRegion));
        assert_eq!(lookup(&keymap, " F2 "), Some(Action::Classic));
        assert_eq!(lookup(&keymap, "f3"), Some(Action::Division));
        assert_eq!(lookup(&keymap, "f4"), Some(Action::Vision));
        assert_eq!(lookup(&keymap, "f10"), Some(Action::SaveError));
        assert_eq!(lookup(&keymap, "f12"), Some(Action::Quit));
        assert_eq!(lookup(&keymap, "f5"), None);
        assert_eq!(lookup(&keymap, "q"), None);
    }

    #[test]
    fn system_key_names_match_keymap() {
        let keymap = default_keymap();
        assert_eq!(key_name(&Keycode::F1), "f1");
        assert_eq!(key_name(&Keycode::F10), "f10");
        assert_eq!(lookup(&keymap, &key_name(&Keycode::F4)), Some(Action::Vision));
        assert_eq!(lookup(&keymap, &key_name(&Keycode::Q)), None);
    }

    #[test]
    fn only_new_presses_are_reported() {
        let mut edges = KeyEdges::default();
        assert_eq!(edges.update(vec!["f2"]), ["f2"]);
        // Holding the key does not repeat it.
        assert!(edges.update(vec!["f2"]).is_empty());
        assert_eq!(edges.update(vec!["f2", "f3"]), ["f3"]);
        assert!(edges.update(vec![]).is_empty());
        assert_eq!(edges.update(vec!["f2"]), ["f2"]);
    }

    #[test]
    fn run_params_follow_action() {
        assert_eq!(Action::Classic.run_params(), Some((Backend::Tesseract, false)));
        assert_eq!(Action::Division.run_params(), Some((Backend::Tesseract, true)));
        assert_eq!(Action::Vision.run_params(), Some((Backend::VisionLlm, false)));
        assert_eq!(
            Action::VisionDivision.run_params(),
            Some((Backend::VisionLlm, true))
        );
        assert_eq!(Action::SaveError.run_params(), None);
    }

    #[test]
    fn region_parsing() {
        assert_eq!(
            parse_region("10 20 300 40"),
            Some(Region { x: 10, y: 20, width: 300, height: 40 })
        );
        assert_eq!(
            parse_region("-5,0, 8,9"),
            Some(Region { x: -5, y: 0, width: 8, height: 9 })
        );
        assert_eq!(parse_region("10 20 0 40"), None);
        assert_eq!(parse_region("10 20 30"), None);
        assert_eq!(parse_region("a b c d"), None);
    }

    #[test]
    fn actions_deserialize_from_snake_case() {
        let action: Action = serde_json::from_str("\"vision_division\"").unwrap();
        assert_eq!(action, Action::VisionDivision);
    }
}
