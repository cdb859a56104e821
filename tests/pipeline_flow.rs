//! Integration tests for the recognize → normalize → solve flow and the
//! hotkey host around it.
//!
//! Screen, recognizers and injection are replaced by in-memory fakes, so
//! these run without a display, tesseract or network access.
//!
//! Run with: cargo test --test pipeline_flow

use calc_snip_lib::app::{App, AppError, Flow};
use calc_snip_lib::capture::{CaptureError, Region, ScreenCapture};
use calc_snip_lib::config::Settings;
use calc_snip_lib::expr::EvalError;
use calc_snip_lib::hotkeys::{Action, HotkeySource, RegionSelector};
use calc_snip_lib::inject::{InjectError, TextInjector};
use calc_snip_lib::ocr::{
    Backend, ProviderSet, RecognitionError, RecognitionProvider, RecognitionResult,
};
use calc_snip_lib::pipeline::run_pipeline;
use image::DynamicImage;
use std::collections::{HashMap, VecDeque};

// ── Fakes ────────────────────────────────────────────────────────────

struct FixedText {
    backend: Backend,
    text: &'static str,
}

impl RecognitionProvider for FixedText {
    fn backend(&self) -> Backend {
        self.backend
    }

    async fn recognize(&self, _image: &DynamicImage) -> Result<RecognitionResult, RecognitionError> {
        Ok(RecognitionResult::new(self.text))
    }
}

struct FailingProvider;

impl RecognitionProvider for FailingProvider {
    fn backend(&self) -> Backend {
        Backend::VisionLlm
    }

    async fn recognize(&self, _image: &DynamicImage) -> Result<RecognitionResult, RecognitionError> {
        Err(RecognitionError::Timeout(30))
    }
}

/// Returns a canned text per backend.
#[derive(Default)]
struct ScriptedRecognizers {
    texts: HashMap<Backend, &'static str>,
}

impl ScriptedRecognizers {
    fn with(mut self, backend: Backend, text: &'static str) -> Self {
        self.texts.insert(backend, text);
        self
    }
}

impl ProviderSet for ScriptedRecognizers {
    async fn recognize(
        &self,
        backend: Backend,
        _image: &DynamicImage,
    ) -> Result<RecognitionResult, RecognitionError> {
        match self.texts.get(&backend) {
            Some(text) => Ok(RecognitionResult::new(*text)),
            None => Err(RecognitionError::NotConfigured(backend)),
        }
    }
}

/// A blank screen of the region's size.
struct BlankScreen;

impl ScreenCapture for BlankScreen {
    fn capture(&self, region: &Region) -> Result<DynamicImage, CaptureError> {
        Ok(DynamicImage::new_rgb8(region.width, region.height))
    }
}

#[derive(Default)]
struct RecordingInjector {
    typed: Vec<String>,
    resets: usize,
}

impl TextInjector for RecordingInjector {
    fn inject_text(&mut self, text: &str) -> Result<(), InjectError> {
        self.typed.push(text.to_string());
        Ok(())
    }

    fn reset(&mut self) -> Result<(), InjectError> {
        self.resets += 1;
        Ok(())
    }
}

/// Replays a fixed list of actions and regions.
#[derive(Default)]
struct ScriptedHost {
    actions: VecDeque<Action>,
    regions: VecDeque<Option<Region>>,
}

impl HotkeySource for ScriptedHost {
    async fn next_action(&mut self) -> Option<Action> {
        self.actions.pop_front()
    }
}

impl RegionSelector for ScriptedHost {
    async fn select_region(&mut self) -> Option<Region> {
        self.regions.pop_front().flatten()
    }
}

const REGION: Region = Region {
    x: 10,
    y: 20,
    width: 40,
    height: 12,
};

fn app_with(
    recognizers: ScriptedRecognizers,
    settings: Settings,
) -> App<BlankScreen, ScriptedRecognizers, RecordingInjector> {
    App::new(settings, BlankScreen, recognizers, RecordingInjector::default())
}

// ── run_pipeline ─────────────────────────────────────────────────────

#[tokio::test]
async fn pipeline_solves_recognized_text() {
    let provider = FixedText {
        backend: Backend::Tesseract,
        text: "12 x 3\n",
    };
    let image = DynamicImage::new_rgb8(4, 4);

    let report = run_pipeline(&provider, &image, false).await.unwrap();
    assert_eq!(report.backend, Backend::Tesseract);
    assert_eq!(report.canonical.as_str(), "12*3");
    assert_eq!(report.value(), Some(36.0));
}

#[tokio::test]
async fn pipeline_applies_division_mode() {
    let provider = FixedText {
        backend: Backend::Tesseract,
        text: "9 + 3",
    };
    let image = DynamicImage::new_rgb8(4, 4);

    let report = run_pipeline(&provider, &image, true).await.unwrap();
    assert_eq!(report.canonical.as_str(), "9/3");
    assert_eq!(report.value(), Some(3.0));
}

#[tokio::test]
async fn pipeline_reports_evaluation_errors() {
    let provider = FixedText {
        backend: Backend::VisionLlm,
        text: "7 : 0",
    };
    let image = DynamicImage::new_rgb8(4, 4);

    let report = run_pipeline(&provider, &image, false).await.unwrap();
    assert_eq!(report.error(), Some(&EvalError::DivisionByZero));
    assert!(report.to_string().contains("Error: division by zero"));
}

#[tokio::test]
async fn pipeline_propagates_recognition_failure() {
    let image = DynamicImage::new_rgb8(4, 4);
    let result = run_pipeline(&FailingProvider, &image, false).await;
    assert!(matches!(result, Err(RecognitionError::Timeout(30))));
}

// ── App ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn running_without_region_reports_no_region() {
    let mut app = app_with(
        ScriptedRecognizers::default().with(Backend::Tesseract, "1+1"),
        Settings::default(),
    );

    let err = app.process(Backend::Tesseract, false).await.unwrap_err();
    assert!(matches!(err, AppError::NoRegion));
    assert_eq!(err.to_string(), "No region selected.");
}

#[tokio::test]
async fn hotkeys_pick_backend_and_division_mode() {
    let recognizers = ScriptedRecognizers::default()
        .with(Backend::Tesseract, "8 + 2")
        .with(Backend::VisionLlm, "8 × 2");
    let mut app = app_with(recognizers, Settings::default());
    app.set_region(REGION);
    let mut host = ScriptedHost::default();

    assert_eq!(app.handle(Action::Classic, &mut host).await, Flow::Continue);
    assert_eq!(app.last_report().and_then(|r| r.value()), Some(10.0));

    app.handle(Action::Division, &mut host).await;
    assert_eq!(app.last_report().and_then(|r| r.value()), Some(4.0));

    app.handle(Action::Vision, &mut host).await;
    assert_eq!(app.last_report().and_then(|r| r.value()), Some(16.0));

    assert_eq!(app.injector().typed, ["10", "4", "16"]);
}

#[tokio::test]
async fn failed_evaluation_is_not_injected() {
    let recognizers = ScriptedRecognizers::default().with(Backend::Tesseract, "5 ÷ 0");
    let mut app = app_with(recognizers, Settings::default());
    app.set_region(REGION);

    app.handle(Action::Classic, &mut ScriptedHost::default()).await;

    let report = app.last_report().unwrap();
    assert_eq!(report.error(), Some(&EvalError::DivisionByZero));
    assert!(app.injector().typed.is_empty());
}

#[tokio::test]
async fn selecting_a_region_runs_vision() {
    let recognizers = ScriptedRecognizers::default().with(Backend::VisionLlm, "6 : 4");
    let mut app = app_with(recognizers, Settings::default());
    let mut host = ScriptedHost {
        regions: VecDeque::from([Some(REGION)]),
        ..Default::default()
    };

    app.handle(Action::SelectRegion, &mut host).await;

    assert_eq!(app.region(), Some(REGION));
    assert_eq!(app.last_report().and_then(|r| r.value()), Some(1.5));
    assert_eq!(app.injector().typed, ["1"]);
}

#[tokio::test]
async fn cancelled_selection_keeps_previous_region() {
    let mut app = app_with(ScriptedRecognizers::default(), Settings::default());
    app.set_region(REGION);
    let mut host = ScriptedHost {
        regions: VecDeque::from([None]),
        ..Default::default()
    };

    app.handle(Action::SelectRegion, &mut host).await;

    assert_eq!(app.region(), Some(REGION));
    assert!(app.last_report().is_none());
}

#[tokio::test]
async fn save_error_writes_last_capture() {
    let tmp = tempfile::tempdir().unwrap();
    let settings = Settings {
        error_dir: tmp.path().join("error"),
        ..Settings::default()
    };
    let recognizers = ScriptedRecognizers::default().with(Backend::Tesseract, "garbage");
    let mut app = app_with(recognizers, settings);

    assert_eq!(app.save_error().unwrap(), None);

    app.set_region(REGION);
    app.handle(Action::Classic, &mut ScriptedHost::default()).await;
    let path = app.save_error().unwrap().expect("a capture was taken");

    assert!(path.starts_with(tmp.path().join("error")));
    let saved = image::open(&path).unwrap();
    assert_eq!((saved.width(), saved.height()), (REGION.width, REGION.height));
}

#[tokio::test]
async fn recognition_failure_still_keeps_capture() {
    let tmp = tempfile::tempdir().unwrap();
    let settings = Settings {
        error_dir: tmp.path().to_path_buf(),
        ..Settings::default()
    };
    let mut app = app_with(ScriptedRecognizers::default(), settings);
    app.set_region(REGION);

    let err = app.process(Backend::Handwriting, false).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Recognition(RecognitionError::NotConfigured(Backend::Handwriting))
    ));
    assert!(app.save_error().unwrap().is_some());
}

#[tokio::test]
async fn run_loop_stops_on_quit_and_resets() {
    let recognizers = ScriptedRecognizers::default().with(Backend::Tesseract, "2+2");
    let mut app = app_with(recognizers, Settings::default());
    app.set_region(REGION);
    let mut host = ScriptedHost {
        actions: VecDeque::from([Action::Classic, Action::Reset, Action::Quit, Action::Classic]),
        ..Default::default()
    };

    app.run(&mut host).await;

    assert_eq!(app.injector().typed, ["4"]);
    assert_eq!(app.injector().resets, 1);
    assert_eq!(host.actions.len(), 1, "actions after Quit stay unread");
}
