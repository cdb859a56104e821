//! Core recognize → normalize → solve pipeline.
//!
//! One call per hotkey press. Nothing here touches the screen or the
//! keyboard; capture and injection happen in the app around it.

use crate::expr::{self, CanonicalExpression, EvalError, EvaluationOutcome};
use crate::ocr::{Backend, RecognitionError, RecognitionProvider};
use image::DynamicImage;
use std::fmt;

/// Everything a run produced, kept for display.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveReport {
    pub backend: Backend,
    pub raw_text: String,
    pub canonical: CanonicalExpression,
    pub outcome: EvaluationOutcome,
}

impl SolveReport {
    /// Normalize and solve text that has already been recognized.
    pub fn from_text(backend: Backend, raw_text: String, division_mode: bool) -> Self {
        let canonical = expr::normalize(&raw_text, backend.profile(), division_mode);
        let outcome = expr::solve(&canonical);
        Self {
            backend,
            raw_text,
            canonical,
            outcome,
        }
    }

    pub fn value(&self) -> Option<f64> {
        self.outcome.as_ref().ok().copied()
    }

    pub fn error(&self) -> Option<&EvalError> {
        self.outcome.as_ref().err()
    }
}

impl fmt::Display for SolveReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Original expression: {}", self.raw_text.trim())?;
        match &self.outcome {
            Ok(value) => {
                writeln!(f, "Cleaned expression: {}", self.canonical)?;
                writeln!(f, "Result: {}", expr::format_result(*value))
            }
            Err(e) => writeln!(f, "Error: {}", e),
        }
    }
}

/// Run the full pipeline on one captured region.
///
/// Recognition failures are returned as `Err`; evaluation failures are part
/// of the report.
pub async fn run_pipeline<P: RecognitionProvider>(
    provider: &P,
    image: &DynamicImage,
    division_mode: bool,
) -> Result<SolveReport, RecognitionError> {
    let start = std::time::Instant::now();
    let recognized = provider.recognize(image).await?;
    let report = SolveReport::from_text(provider.backend(), recognized.raw_text, division_mode);
    log_report(&report, start.elapsed().as_millis());
    Ok(report)
}

pub(crate) fn log_report(report: &SolveReport, elapsed_ms: u128) {
    match &report.outcome {
        Ok(value) => log::info!(
            "[PIPELINE] {} {:?} -> {:?} = {} ({}ms)",
            report.backend,
            report.raw_text,
            report.canonical.as_str(),
            value,
            elapsed_ms
        ),
        Err(e) => log::warn!(
            "[PIPELINE] {} {:?} -> {:?}: {} {} ({}ms)",
            report.backend,
            report.raw_text,
            report.canonical.as_str(),
            e.kind(),
            e,
            elapsed_ms
        ),
    }
}
