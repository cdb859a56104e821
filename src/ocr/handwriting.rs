//! Handwriting recognition through a user-supplied command.
//!
//! The command receives the region as PNG on stdin and prints the
//! recognized text on stdout. Configured as `handwriting_command` in the
//! settings file, e.g. `["python3", "easyocr_stdin.py"]`.

use super::process::run_with_stdin;
use super::{Backend, RecognitionError, RecognitionProvider, RecognitionResult};
use crate::capture::encode_png;
use image::DynamicImage;
use std::time::Duration;

pub struct HandwritingOcr {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl HandwritingOcr {
    /// `None` for an empty command.
    pub fn from_command(mut command: Vec<String>, timeout: Duration) -> Option<Self> {
        if command.is_empty() {
            return None;
        }
        let program = command.remove(0);
        Some(Self {
            program,
            args: command,
            timeout,
        })
    }
}

impl RecognitionProvider for HandwritingOcr {
    fn backend(&self) -> Backend {
        Backend::Handwriting
    }

    async fn recognize(&self, image: &DynamicImage) -> Result<RecognitionResult, RecognitionError> {
        let program = which::which(&self.program)
            .map_err(|_| RecognitionError::MissingBinary(self.program.clone()))?;
        let png_bytes = encode_png(image)?;
        let text = run_with_stdin(&program, &self.args, &png_bytes, self.timeout).await?;
        Ok(RecognitionResult::new(text))
    }
}
