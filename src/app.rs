//! Host application state and hotkey dispatch.
//!
//! Holds the selected region and the last capture between hotkey presses,
//! and wires the pipeline to capture, display and injection:
//!
//!   capture → recognize → normalize → solve → report → inject
//!
//! One action runs to completion before the next one is read.

use crate::capture::{CaptureError, Region, ScreenCapture};
use crate::config::Settings;
use crate::diagnostics::{self, DiagnosticsError};
use crate::expr;
use crate::hotkeys::{Action, HotkeySource, RegionSelector};
use crate::inject::TextInjector;
use crate::ocr::{Backend, ProviderSet, RecognitionError};
use crate::pipeline::{log_report, SolveReport};
use image::DynamicImage;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("No region selected.")]
    NoRegion,
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Recognition(#[from] RecognitionError),
}

/// Whether the host loop keeps going after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App<C, R, I> {
    settings: Settings,
    capture: C,
    recognizers: R,
    injector: I,
    region: Option<Region>,
    last_image: Option<DynamicImage>,
    last_report: Option<SolveReport>,
}

impl<C, R, I> App<C, R, I>
where
    C: ScreenCapture,
    R: ProviderSet,
    I: TextInjector,
{
    pub fn new(settings: Settings, capture: C, recognizers: R, injector: I) -> Self {
        Self {
            settings,
            capture,
            recognizers,
            injector,
            region: None,
            last_image: None,
            last_report: None,
        }
    }

    pub fn region(&self) -> Option<Region> {
        self.region
    }

    pub fn set_region(&mut self, region: Region) {
        log::info!("[CAPTURE] Region set: {}", region);
        self.region = Some(region);
    }

    pub fn last_report(&self) -> Option<&SolveReport> {
        self.last_report.as_ref()
    }

    pub fn injector(&self) -> &I {
        &self.injector
    }

    /// Pull actions from `host` until it runs dry or asks to quit.
    pub async fn run<H>(&mut self, host: &mut H)
    where
        H: HotkeySource + RegionSelector,
    {
        while let Some(action) = host.next_action().await {
            if self.handle(action, host).await == Flow::Quit {
                break;
            }
        }
        log::info!("Hotkey loop finished");
    }

    /// Execute one action.
    pub async fn handle<S: RegionSelector>(&mut self, action: Action, selector: &mut S) -> Flow {
        log::info!("[HOTKEY] {:?}", action);
        match action {
            Action::SelectRegion => {
                match selector.select_region().await {
                    Some(region) if !region.is_empty() => {
                        self.set_region(region);
                        self.run_and_report(Backend::VisionLlm, false).await;
                    }
                    _ => log::info!("[CAPTURE] Region selection cancelled"),
                }
                Flow::Continue
            }
            Action::SaveError => {
                match self.save_error() {
                    Ok(Some(path)) => println!("Saved {}", path.display()),
                    Ok(None) => eprintln!("No image to save."),
                    Err(e) => log::error!("[DIAG] {}", e),
                }
                Flow::Continue
            }
            Action::Reset => {
                if let Err(e) = self.injector.reset() {
                    log::error!("[INJECT] Reset failed: {}", e);
                }
                Flow::Continue
            }
            Action::Quit => Flow::Quit,
            Action::Classic | Action::Division | Action::Vision | Action::VisionDivision => {
                if let Some((backend, division_mode)) = action.run_params() {
                    self.run_and_report(backend, division_mode).await;
                }
                Flow::Continue
            }
        }
    }

    /// Run the pipeline and show the outcome; inject the result on success.
    async fn run_and_report(&mut self, backend: Backend, division_mode: bool) {
        match self.process(backend, division_mode).await {
            Ok(report) => {
                print!("{}", report);
                if let Some(value) = report.value() {
                    let text = expr::injection_text(value);
                    if let Err(e) = self.injector.inject_text(&text) {
                        log::error!("[INJECT] {}", e);
                    }
                }
            }
            Err(e) => println!("{}", e),
        }
    }

    /// Capture the current region and run it through `backend`.
    pub async fn process(
        &mut self,
        backend: Backend,
        division_mode: bool,
    ) -> Result<SolveReport, AppError> {
        let region = self.region.ok_or(AppError::NoRegion)?;
        let start = std::time::Instant::now();

        let image = self.capture.capture(&region)?;
        if self.settings.save_captures {
            if let Err(e) = diagnostics::save_screenshot(&image, &self.settings.error_dir) {
                log::warn!("[DIAG] Could not keep capture: {}", e);
            }
        }
        let capture_ms = start.elapsed().as_millis();

        let recognized = self.recognizers.recognize(backend, &image).await;
        self.last_image = Some(image);
        let recognized = recognized?;

        let report = SolveReport::from_text(backend, recognized.raw_text, division_mode);
        log::info!(
            "[PIPELINE] capture={}ms total={}ms",
            capture_ms,
            start.elapsed().as_millis()
        );
        log_report(&report, start.elapsed().as_millis());
        self.last_report = Some(report.clone());
        Ok(report)
    }

    /// Write the last captured image to the error directory.
    ///
    /// `Ok(None)` when nothing has been captured yet.
    pub fn save_error(&self) -> Result<Option<PathBuf>, DiagnosticsError> {
        match &self.last_image {
            Some(image) => diagnostics::save_screenshot(image, &self.settings.error_dir).map(Some),
            None => {
                log::warn!("[DIAG] No image to save");
                Ok(None)
            }
        }
    }
}
