//! Tesseract OCR via the command-line binary.
//!
//! The region is binarized first, then piped to `tesseract stdin stdout`.

use super::process::run_with_stdin;
use super::{preprocess, Backend, RecognitionError, RecognitionProvider, RecognitionResult};
use crate::capture::encode_png;
use crate::config::TesseractSettings;
use image::DynamicImage;
use std::time::Duration;

pub struct TesseractOcr {
    settings: TesseractSettings,
}

impl TesseractOcr {
    pub fn new(settings: TesseractSettings) -> Self {
        Self { settings }
    }

    /// Command-line arguments after the binary name.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "stdin".to_string(),
            "stdout".to_string(),
            "-l".to_string(),
            self.settings.language.clone(),
        ];
        if let Some(psm) = self.settings.psm {
            args.push("--psm".to_string());
            args.push(psm.to_string());
        }
        args
    }

    /// Whether the configured binary can be found.
    pub fn is_available(&self) -> bool {
        which::which(&self.settings.binary).is_ok()
    }
}

impl RecognitionProvider for TesseractOcr {
    fn backend(&self) -> Backend {
        Backend::Tesseract
    }

    async fn recognize(&self, image: &DynamicImage) -> Result<RecognitionResult, RecognitionError> {
        let binary = which::which(&self.settings.binary)
            .map_err(|_| RecognitionError::MissingBinary(self.settings.binary.clone()))?;

        let prep_start = std::time::Instant::now();
        let png_bytes = encode_png(&preprocess::binarize(image))?;
        log::debug!(
            "[OCR] Tesseract preprocessing: {}ms ({} bytes)",
            prep_start.elapsed().as_millis(),
            png_bytes.len()
        );

        let timeout = Duration::from_secs(self.settings.timeout_secs);
        let text = run_with_stdin(&binary, &self.args(), &png_bytes, timeout).await?;
        Ok(RecognitionResult::new(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_args_read_stdin_and_write_stdout() {
        let ocr = TesseractOcr::new(TesseractSettings::default());
        assert_eq!(ocr.args(), ["stdin", "stdout", "-l", "eng"]);
    }

    #[test]
    fn psm_is_appended_when_set() {
        let ocr = TesseractOcr::new(TesseractSettings {
            psm: Some(7),
            language: "fra".to_string(),
            ..Default::default()
        });
        assert_eq!(ocr.args(), ["stdin", "stdout", "-l", "fra", "--psm", "7"]);
    }

    #[tokio::test]
    async fn missing_binary_is_reported() {
        let ocr = TesseractOcr::new(TesseractSettings {
            binary: "definitely-not-a-real-tesseract-binary".to_string(),
            ..Default::default()
        });
        assert!(!ocr.is_available());
        let img = DynamicImage::new_luma8(4, 4);
        assert!(matches!(
            ocr.recognize(&img).await,
            Err(RecognitionError::MissingBinary(_))
        ));
    }
}
