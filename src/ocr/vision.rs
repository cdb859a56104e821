//! Vision-LLM recognition — OpenAI-compatible chat completions.
//!
//! The region is sent inline as a base64 PNG data URL together with a
//! one-line extraction prompt. Any endpoint speaking the same protocol
//! works through `vision.base_url`.

use super::{Backend, RecognitionError, RecognitionProvider, RecognitionResult};
use crate::capture::encode_png;
use crate::config::{resolve_vision_key, VisionSettings};
use base64::Engine;
use image::DynamicImage;
use serde::Deserialize;
use std::time::Duration;

pub const VISION_PROMPT: &str =
    "Extract mathematical expression from the image. Just send the text, no more.";

pub struct VisionLlm {
    settings: VisionSettings,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

impl VisionLlm {
    pub fn new(settings: VisionSettings) -> Self {
        Self { settings }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    /// Request body for one recognition call.
    pub fn request_body(&self, png_bytes: &[u8]) -> serde_json::Value {
        let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes);
        serde_json::json!({
            "model": self.settings.model,
            "messages": [
                {
                    "role": "user",
                    "content": [
                        {
                            "type": "text",
                            "text": VISION_PROMPT,
                        },
                        {
                            "type": "image_url",
                            "image_url": {
                                "url": format!("data:image/png;base64,{}", encoded),
                                "detail": self.settings.detail,
                            }
                        }
                    ]
                }
            ]
        })
    }

    async fn call(&self, api_key: &str, png_bytes: &[u8]) -> Result<String, RecognitionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.settings.timeout_secs))
            .build()?;

        let start = std::time::Instant::now();
        let response = client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .header("content-type", "application/json")
            .json(&self.request_body(png_bytes))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RecognitionError::Timeout(self.settings.timeout_secs)
                } else {
                    RecognitionError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("[OCR] Vision API returned {}: {}", status, body);
            return Err(RecognitionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        log::info!("[OCR] Vision API: {}ms", start.elapsed().as_millis());
        parse_response(&body)
    }
}

/// Pull the assistant's text out of a chat completion body.
fn parse_response(body: &str) -> Result<String, RecognitionError> {
    let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| {
        log::warn!("[OCR] Unparseable vision response: {}", e);
        RecognitionError::EmptyResponse
    })?;

    if let Some(usage) = &parsed.usage {
        log::info!(
            "[OCR] Vision tokens: {} in / {} out",
            usage.prompt_tokens,
            usage.completion_tokens
        );
    }

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(RecognitionError::EmptyResponse)
}

impl RecognitionProvider for VisionLlm {
    fn backend(&self) -> Backend {
        Backend::VisionLlm
    }

    async fn recognize(&self, image: &DynamicImage) -> Result<RecognitionResult, RecognitionError> {
        let api_key = resolve_vision_key(&self.settings)
            .ok_or_else(|| RecognitionError::MissingApiKey(self.settings.api_key_env.clone()))?;

        log::info!("[OCR] Vision model: {}", self.settings.model);
        let png_bytes = encode_png(image)?;
        let text = self.call(&api_key, &png_bytes).await?;
        Ok(RecognitionResult::new(text))
    }
}
