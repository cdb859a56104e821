//! calc-snip — OCR calculator entry point.
//!
//! Recognizes an arithmetic expression in a screen region, cleans it up,
//! evaluates it without ever executing text as code, and hands the result
//! back to the focused application.
//!
//! Domains:
//!   - expr/          — normalization profiles, parser, evaluator
//!   - ocr/           — recognition backends (tesseract, handwriting, vision)
//!   - capture/       — regions and screenshots
//!   - pipeline.rs    — recognize → normalize → solve
//!   - app.rs         — host state and hotkey dispatch
//!   - hotkeys.rs     — actions, global and console hosts
//!   - inject.rs      — clipboard / keystroke result delivery
//!   - diagnostics.rs — error screenshots
//!   - config.rs      — settings file, env overrides, keychain

pub mod app;
pub mod capture;
pub mod config;
pub mod diagnostics;
pub mod expr;
pub mod hotkeys;
pub mod inject;
pub mod ocr;
pub mod pipeline;

use config::{HotkeyMode, InjectionMode, Settings};
use ocr::{Backend, Recognizers};
use std::path::PathBuf;

/// What the binary was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Interactive hotkey loop (default).
    Listen,
    /// Normalize and solve text given on the command line.
    Solve {
        text: String,
        backend: Backend,
        division_mode: bool,
    },
    /// Recognize and solve an image file, optionally cropped first.
    Image {
        path: PathBuf,
        region: Option<capture::Region>,
        backend: Backend,
        division_mode: bool,
    },
    /// Store the vision API key in the OS keychain.
    SetKey(String),
}

/// Parse command-line arguments (without the program name).
pub fn parse_args<I, S>(args: I) -> Result<Command, String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();
    let Some((sub, rest)) = args.split_first() else {
        return Ok(Command::Listen);
    };

    let mut backend = None;
    let mut division_mode = false;
    let mut region = None;
    let mut positional = Vec::new();
    let mut iter = rest.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--division" | "-d" => division_mode = true,
            "--backend" | "-b" => {
                let value = iter.next().ok_or("--backend needs a value")?;
                backend = Some(value.parse::<Backend>()?);
            }
            "--region" | "-r" => {
                let value = iter.next().ok_or("--region needs a value")?;
                region = Some(
                    hotkeys::parse_region(value)
                        .ok_or_else(|| format!("invalid region: {}", value))?,
                );
            }
            _ => positional.push(arg.clone()),
        }
    }

    match sub.as_str() {
        "listen" => Ok(Command::Listen),
        "solve" => {
            if positional.is_empty() {
                return Err("solve needs an expression".into());
            }
            Ok(Command::Solve {
                text: positional.join(" "),
                backend: backend.unwrap_or(Backend::Tesseract),
                division_mode,
            })
        }
        "image" => match positional.as_slice() {
            [path] => Ok(Command::Image {
                path: PathBuf::from(path),
                region,
                backend: backend.unwrap_or(Backend::Tesseract),
                division_mode,
            }),
            _ => Err("image needs exactly one file path".into()),
        },
        "set-key" => match positional.as_slice() {
            [key] => Ok(Command::SetKey(key.clone())),
            _ => Err("set-key needs exactly one key".into()),
        },
        other => Err(format!("unknown command: {}", other)),
    }
}

/// Entry point called by the binary.
pub fn run() {
    // Load .env.local → .env from the crate root, then the working directory.
    let manifest_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    'env_load: for dir in [manifest_dir.to_path_buf(), PathBuf::from(".")] {
        for env_file in [".env.local", ".env"] {
            let path = dir.join(env_file);
            if path.exists() {
                match dotenvy::from_path(&path) {
                    Ok(_) => eprintln!("[STARTUP] Loaded {}", path.display()),
                    Err(e) => eprintln!("[STARTUP] Failed to load {}: {}", path.display(), e),
                }
                break 'env_load;
            }
        }
    }

    env_logger::init();

    let command = match parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!(
                "usage: calc-snip [listen | solve <text> | image <path> [--region x,y,w,h] | set-key <key>] [--backend tesseract|handwriting|vision-llm] [--division]"
            );
            std::process::exit(2);
        }
    };

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("[CONFIG] {}; falling back to defaults", e);
            let mut settings = Settings::default();
            settings.apply_env();
            settings
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("[STARTUP] Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    let code = runtime.block_on(execute(command, settings));
    if code != 0 {
        std::process::exit(code);
    }
}

async fn execute(command: Command, settings: Settings) -> i32 {
    match command {
        Command::Solve {
            text,
            backend,
            division_mode,
        } => {
            let report = pipeline::SolveReport::from_text(backend, text, division_mode);
            print!("{}", report);
            if report.value().is_some() {
                0
            } else {
                1
            }
        }
        Command::Image {
            path,
            region,
            backend,
            division_mode,
        } => solve_image(&settings, &path, region, backend, division_mode).await,
        Command::SetKey(key) => match config::save_vision_key(&key) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("{}", e);
                1
            }
        },
        Command::Listen => {
            listen(settings).await;
            0
        }
    }
}

async fn solve_image(
    settings: &Settings,
    path: &std::path::Path,
    region: Option<capture::Region>,
    backend: Backend,
    division_mode: bool,
) -> i32 {
    let image = match image::open(path) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("failed to open {}: {}", path.display(), e);
            return 1;
        }
    };
    let image = match region {
        Some(region) => match capture::crop(&image, &region) {
            Ok(cropped) => cropped,
            Err(e) => {
                eprintln!("{}", e);
                return 1;
            }
        },
        None => image,
    };

    let recognizers = Recognizers::from_settings(settings);
    let result = match backend {
        Backend::Tesseract => {
            pipeline::run_pipeline(&recognizers.tesseract, &image, division_mode).await
        }
        Backend::Handwriting => match &recognizers.handwriting {
            Some(provider) => pipeline::run_pipeline(provider, &image, division_mode).await,
            None => Err(ocr::RecognitionError::NotConfigured(backend)),
        },
        Backend::VisionLlm => {
            pipeline::run_pipeline(&recognizers.vision, &image, division_mode).await
        }
    };

    match result {
        Ok(report) => {
            print!("{}", report);
            if report.value().is_some() {
                0
            } else {
                1
            }
        }
        Err(e) => {
            eprintln!("{}", e);
            1
        }
    }
}

/// Result delivery for the configured mode, falling back towards
/// report-only when the desktop refuses a mode.
fn build_injector(settings: &Settings) -> Box<dyn inject::TextInjector> {
    if settings.injection == InjectionMode::Keystrokes {
        match inject::EnigoSink::new() {
            Ok(sink) => {
                return Box::new(inject::KeystrokeInjector::new(
                    sink,
                    settings.typing.clone(),
                ))
            }
            Err(e) => log::warn!("[INJECT] {}; copying results to the clipboard instead", e),
        }
    }
    match settings.injection {
        InjectionMode::Keystrokes | InjectionMode::Clipboard => {
            match inject::ClipboardInjector::new() {
                Ok(clipboard) => Box::new(clipboard),
                Err(e) => {
                    log::warn!("[INJECT] {}; results will only be printed", e);
                    Box::new(inject::NoopInjector)
                }
            }
        }
        InjectionMode::None => Box::new(inject::NoopInjector),
    }
}

async fn listen(settings: Settings) {
    let injector = build_injector(&settings);

    let recognizers = Recognizers::from_settings(&settings);
    if !recognizers.tesseract.is_available() {
        log::warn!("[OCR] tesseract not found; classic and division hotkeys will fail");
    }
    let mut keys: Vec<_> = settings.keymap.iter().collect();
    keys.sort_by(|a, b| a.0.cmp(b.0));
    for (key, action) in keys {
        eprintln!("  {:<5} {:?}", key, action);
    }

    let global = match settings.hotkeys {
        HotkeyMode::Global => {
            let host = hotkeys::GlobalHost::new(settings.keymap.clone());
            if host.is_none() {
                log::warn!("[HOTKEY] Cannot read the system keyboard; type key names here instead");
            }
            host
        }
        HotkeyMode::Console => None,
    };
    let keymap = settings.keymap.clone();

    log::info!("calc-snip ready");
    let mut app = app::App::new(settings, capture::XcapScreen::new(), recognizers, injector);
    match global {
        Some(mut host) => app.run(&mut host).await,
        None => app.run(&mut hotkeys::ConsoleHost::new(keymap)).await,
    }
}
