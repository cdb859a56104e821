//! Handing the result back to the focused application.
//!
//! Two strategies behind one trait:
//!   - ClipboardInjector — copies the text (arboard)
//!   - KeystrokeInjector — clears the field with backspaces, then types each
//!     character with a short random delay, over any [`KeySink`]
//!
//! [`EnigoSink`] is the system key sink used by the binary.

use crate::config::TypingSettings;
use rand::Rng;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    #[error("clipboard unavailable: {0}")]
    Clipboard(#[from] arboard::Error),
    #[error("key press failed: {0}")]
    Key(String),
}

/// Delivers result text to whatever currently has focus.
pub trait TextInjector {
    fn inject_text(&mut self, text: &str) -> Result<(), InjectError>;

    /// Undo a previous injection. No-op where that makes no sense.
    fn reset(&mut self) -> Result<(), InjectError> {
        Ok(())
    }
}

impl<T: TextInjector + ?Sized> TextInjector for Box<T> {
    fn inject_text(&mut self, text: &str) -> Result<(), InjectError> {
        (**self).inject_text(text)
    }

    fn reset(&mut self) -> Result<(), InjectError> {
        (**self).reset()
    }
}

/// A single simulated key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Backspace,
    Char(char),
}

/// Low-level key press backend supplied by the host platform.
pub trait KeySink {
    fn press(&mut self, key: Key) -> Result<(), InjectError>;
}

/// Synthesizes key presses through the OS input API.
pub struct EnigoSink {
    enigo: enigo::Enigo,
}

impl EnigoSink {
    pub fn new() -> Result<Self, InjectError> {
        let enigo = enigo::Enigo::new(&enigo::Settings::default())
            .map_err(|e| InjectError::Key(format!("no input connection: {}", e)))?;
        Ok(Self { enigo })
    }
}

fn to_enigo_key(key: Key) -> enigo::Key {
    match key {
        Key::Backspace => enigo::Key::Backspace,
        Key::Char(c) => enigo::Key::Unicode(c),
    }
}

impl KeySink for EnigoSink {
    fn press(&mut self, key: Key) -> Result<(), InjectError> {
        use enigo::Keyboard;
        self.enigo
            .key(to_enigo_key(key), enigo::Direction::Click)
            .map_err(|e| InjectError::Key(e.to_string()))
    }
}

pub struct ClipboardInjector {
    clipboard: arboard::Clipboard,
}

impl ClipboardInjector {
    pub fn new() -> Result<Self, InjectError> {
        Ok(Self {
            clipboard: arboard::Clipboard::new()?,
        })
    }
}

impl TextInjector for ClipboardInjector {
    fn inject_text(&mut self, text: &str) -> Result<(), InjectError> {
        self.clipboard.set_text(text)?;
        log::info!("[INJECT] Copied {} chars to clipboard", text.len());
        Ok(())
    }
}

/// Types through a [`KeySink`] with human-like jitter between presses.
pub struct KeystrokeInjector<S: KeySink> {
    sink: S,
    typing: TypingSettings,
}

impl<S: KeySink> KeystrokeInjector<S> {
    pub fn new(sink: S, typing: TypingSettings) -> Self {
        Self { sink, typing }
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn clear(&mut self) -> Result<(), InjectError> {
        for _ in 0..self.typing.clear_presses {
            self.sink.press(Key::Backspace)?;
        }
        Ok(())
    }

    fn jitter(&self) -> Duration {
        let min = self.typing.min_delay_ms.min(self.typing.max_delay_ms);
        let max = self.typing.min_delay_ms.max(self.typing.max_delay_ms);
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

impl<S: KeySink> TextInjector for KeystrokeInjector<S> {
    fn inject_text(&mut self, text: &str) -> Result<(), InjectError> {
        self.clear()?;
        for c in text.chars() {
            self.sink.press(Key::Char(c))?;
            let delay = self.jitter();
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
        }
        log::info!("[INJECT] Typed {} chars", text.chars().count());
        Ok(())
    }

    fn reset(&mut self) -> Result<(), InjectError> {
        self.clear()
    }
}

/// Reports results without delivering them anywhere.
#[derive(Debug, Default)]
pub struct NoopInjector;

impl TextInjector for NoopInjector {
    fn inject_text(&mut self, text: &str) -> Result<(), InjectError> {
        log::debug!("[INJECT] Injection disabled, dropping {:?}", text);
        Ok(())
    }
}
