//! Diagnostic dumps — the screenshot behind a bad run.
//!
//! Files are named `screenshot_YYYYmmdd-HHMMSS.png` in local time. Two
//! saves within the same second overwrite each other.

use image::DynamicImage;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum DiagnosticsError {
    #[error("failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to save {path}: {source}")]
    Save {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// Filename for a screenshot taken at `at`.
pub fn screenshot_filename<Tz>(at: &chrono::DateTime<Tz>) -> String
where
    Tz: chrono::TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("screenshot_{}.png", at.format("%Y%m%d-%H%M%S"))
}

/// Save `image` into `dir` under a timestamped name.
///
/// The directory is created if missing. Returns the written path.
pub fn save_screenshot(image: &DynamicImage, dir: &Path) -> Result<PathBuf, DiagnosticsError> {
    std::fs::create_dir_all(dir).map_err(|source| DiagnosticsError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(screenshot_filename(&chrono::Local::now()));
    image
        .save_with_format(&path, image::ImageFormat::Png)
        .map_err(|source| DiagnosticsError::Save {
            path: path.clone(),
            source,
        })?;
    log::info!("[DIAG] Saved screenshot to {}", path.display());
    Ok(path)
}
