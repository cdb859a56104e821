//! Settings loading and API key resolution.
//!
//! Sources, lowest priority first:
//!   1. built-in defaults
//!   2. `<config_dir>/calc-snip/settings.json`
//!   3. environment variables (after `.env.local` / `.env` are loaded)
//!
//! The vision API key is never stored in the settings file. It comes from
//! the environment or, failing that, the OS keychain.

use crate::hotkeys::Action;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Keychain service name for stored API keys.
pub const KEYRING_SERVICE: &str = "calc-snip";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid settings JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("keychain error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// How the result is handed back to the focused application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjectionMode {
    /// Clear the focused field with backspaces and type the result.
    Keystrokes,
    /// Copy the result to the clipboard.
    Clipboard,
    /// Report only.
    None,
}

/// Where hotkeys are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HotkeyMode {
    /// System-wide keyboard and mouse polling.
    Global,
    /// Key names typed into the terminal.
    Console,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseractSettings {
    pub binary: String,
    pub language: String,
    /// Page segmentation mode passed as `--psm`; tesseract's default when unset.
    pub psm: Option<u8>,
    pub timeout_secs: u64,
}

impl Default for TesseractSettings {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
            language: "eng".to_string(),
            psm: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionSettings {
    pub base_url: String,
    pub model: String,
    pub detail: String,
    pub timeout_secs: u64,
    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            detail: "low".to_string(),
            timeout_secs: 30,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingSettings {
    /// Backspaces sent before typing, and by the reset action.
    pub clear_presses: u32,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for TypingSettings {
    fn default() -> Self {
        Self {
            clear_presses: 10,
            min_delay_ms: 20,
            max_delay_ms: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tesseract: TesseractSettings,
    /// Handwriting recognizer command: PNG on stdin, text on stdout.
    pub handwriting_command: Option<Vec<String>>,
    pub handwriting_timeout_secs: u64,
    pub vision: VisionSettings,
    pub error_dir: PathBuf,
    /// Also dump every capture, not only the ones saved on request.
    pub save_captures: bool,
    pub injection: InjectionMode,
    pub typing: TypingSettings,
    pub hotkeys: HotkeyMode,
    pub keymap: HashMap<String, Action>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tesseract: TesseractSettings::default(),
            handwriting_command: None,
            handwriting_timeout_secs: 60,
            vision: VisionSettings::default(),
            error_dir: PathBuf::from("error"),
            save_captures: false,
            injection: InjectionMode::Keystrokes,
            typing: TypingSettings::default(),
            hotkeys: HotkeyMode::Global,
            keymap: default_keymap(),
        }
    }
}

/// f1 select, f2 classic, f3 division, f4 vision, f10 save error, f12 quit.
pub fn default_keymap() -> HashMap<String, Action> {
    HashMap::from([
        ("f1".to_string(), Action::SelectRegion),
        ("f2".to_string(), Action::Classic),
        ("f3".to_string(), Action::Division),
        ("f4".to_string(), Action::Vision),
        ("f10".to_string(), Action::SaveError),
        ("f12".to_string(), Action::Quit),
    ])
}

/// Directory holding calc-snip's settings file.
fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("calc-snip")
}

/// Default settings file location.
pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

impl Settings {
    /// Load settings from the default location and apply env overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Self::load_from(&settings_path())?;
        settings.apply_env();
        Ok(settings)
    }

    /// Read a settings file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("[CONFIG] No settings at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let settings = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("[CONFIG] Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Persist settings as pretty JSON, creating the directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("[CONFIG] Saved settings to {}", path.display());
        Ok(())
    }

    /// Environment overrides, applied on top of the file.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok().filter(|v| !v.is_empty()));
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("OPENAI_BASE_URL") {
            self.vision.base_url = url;
        }
        if let Some(model) = lookup("VISION_MODEL") {
            self.vision.model = model;
        }
        if let Some(lang) = lookup("TESSERACT_LANG") {
            self.tesseract.language = lang;
        }
        if let Some(bin) = lookup("TESSERACT_BIN") {
            self.tesseract.binary = bin;
        }
        if let Some(dir) = lookup("CALC_SNIP_ERROR_DIR") {
            self.error_dir = PathBuf::from(dir);
        }
        if let Some(mode) = lookup("CALC_SNIP_INJECT") {
            match mode.to_lowercase().as_str() {
                "keystrokes" => self.injection = InjectionMode::Keystrokes,
                "clipboard" => self.injection = InjectionMode::Clipboard,
                "none" => self.injection = InjectionMode::None,
                other => log::warn!("[CONFIG] Ignoring unknown CALC_SNIP_INJECT={}", other),
            }
        }
        if let Some(mode) = lookup("CALC_SNIP_HOTKEYS") {
            match mode.to_lowercase().as_str() {
                "global" => self.hotkeys = HotkeyMode::Global,
                "console" => self.hotkeys = HotkeyMode::Console,
                other => log::warn!("[CONFIG] Ignoring unknown CALC_SNIP_HOTKEYS={}", other),
            }
        }
    }
}

/// Resolve the vision API key.
///
/// Priority:
/// 1. the configured env var (`OPENAI_API_KEY` by default)
/// 2. the OS keychain entry `calc-snip` / `vision`
pub fn resolve_vision_key(vision: &VisionSettings) -> Option<String> {
    if let Ok(key) = std::env::var(&vision.api_key_env) {
        if !key.is_empty() {
            return Some(key);
        }
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, "vision") {
        if let Ok(key) = entry.get_password() {
            if !key.is_empty() {
                log::info!("[CONFIG] Loaded vision key from OS keychain");
                return Some(key);
            }
        }
    }

    None
}

/// Store the vision API key in the OS keychain.
pub fn save_vision_key(api_key: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, "vision")?;
    entry.set_password(api_key)?;
    log::info!("[CONFIG] Vision API key saved to OS keychain");
    Ok(())
}
