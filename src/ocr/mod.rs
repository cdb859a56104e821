//! Recognition domain — bitmap in, raw text out.
//!
//! Three interchangeable backends, each paired with the normalization
//! profile that undoes its typical misreads:
//!   - tesseract.rs   — local Tesseract binary on a thresholded image
//!   - handwriting.rs — user-configured external recognizer command
//!   - vision.rs      — OpenAI-compatible vision chat completion
//!
//! Timeouts and failures are handled here; the expression core only ever
//! sees a string.

mod handwriting;
pub mod preprocess;
mod process;
mod tesseract;
mod vision;

pub use handwriting::HandwritingOcr;
pub use tesseract::TesseractOcr;
pub use vision::{VisionLlm, VISION_PROMPT};

use crate::config::Settings;
use crate::expr::{NormalizationProfile, HANDWRITING, TESSERACT, VISION_LLM};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Raw text exactly as a recognizer returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionResult {
    pub raw_text: String,
}

impl RecognitionResult {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    #[error("{0} not found on PATH")]
    MissingBinary(String),
    #[error("no recognizer configured for backend '{0}'")]
    NotConfigured(Backend),
    #[error("no API key for the vision backend (set {0} or store one in the keychain)")]
    MissingApiKey(String),
    #[error("failed to run recognizer: {0}")]
    Io(#[from] std::io::Error),
    #[error("recognizer exited with {status}: {stderr}")]
    Process { status: String, stderr: String },
    #[error("image encoding failed: {0}")]
    Encode(#[from] crate::capture::CaptureError),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("vision API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("vision API response had no message content")]
    EmptyResponse,
    #[error("recognition timed out after {0}s")]
    Timeout(u64),
}

/// Recognition backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    Tesseract,
    Handwriting,
    VisionLlm,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::Tesseract, Backend::Handwriting, Backend::VisionLlm];

    /// The normalization profile matching this backend's noise.
    pub fn profile(self) -> &'static NormalizationProfile {
        match self {
            Backend::Tesseract => &TESSERACT,
            Backend::Handwriting => &HANDWRITING,
            Backend::VisionLlm => &VISION_LLM,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.profile().name
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tesseract" | "classic" => Ok(Backend::Tesseract),
            "handwriting" | "easy" => Ok(Backend::Handwriting),
            "vision-llm" | "vision" | "gpt" => Ok(Backend::VisionLlm),
            other => Err(format!("unknown backend: {}", other)),
        }
    }
}

/// Anything that turns a bitmap into raw text.
#[allow(async_fn_in_trait)]
pub trait RecognitionProvider {
    fn backend(&self) -> Backend;

    async fn recognize(&self, image: &DynamicImage) -> Result<RecognitionResult, RecognitionError>;
}

/// Dispatches a recognition request to the provider for a backend.
#[allow(async_fn_in_trait)]
pub trait ProviderSet {
    async fn recognize(
        &self,
        backend: Backend,
        image: &DynamicImage,
    ) -> Result<RecognitionResult, RecognitionError>;
}

/// The set of providers built from settings, one per backend.
pub struct Recognizers {
    pub tesseract: TesseractOcr,
    pub handwriting: Option<HandwritingOcr>,
    pub vision: VisionLlm,
}

impl Recognizers {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            tesseract: TesseractOcr::new(settings.tesseract.clone()),
            handwriting: settings
                .handwriting_command
                .clone()
                .and_then(|command| {
                    HandwritingOcr::from_command(
                        command,
                        Duration::from_secs(settings.handwriting_timeout_secs),
                    )
                }),
            vision: VisionLlm::new(settings.vision.clone()),
        }
    }
}

impl ProviderSet for Recognizers {
    async fn recognize(
        &self,
        backend: Backend,
        image: &DynamicImage,
    ) -> Result<RecognitionResult, RecognitionError> {
        let start = std::time::Instant::now();
        let result = match backend {
            Backend::Tesseract => self.tesseract.recognize(image).await,
            Backend::Handwriting => match &self.handwriting {
                Some(provider) => provider.recognize(image).await,
                None => Err(RecognitionError::NotConfigured(backend)),
            },
            Backend::VisionLlm => self.vision.recognize(image).await,
        };
        match &result {
            Ok(r) => log::info!(
                "[OCR] {}: {} chars in {}ms",
                backend,
                r.raw_text.chars().count(),
                start.elapsed().as_millis()
            ),
            Err(e) => log::warn!("[OCR] {} failed: {}", backend, e),
        }
        result
    }
}
