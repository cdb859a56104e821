//! Screen capture domain — public API.
//!
//! This module owns all screen capture functionality.
//! External code should only use the items exported here.

mod region;
mod screenshot;

pub use region::{crop, encode_png, Region};
pub use screenshot::XcapScreen;

use image::DynamicImage;

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("screen capture failed: {0}")]
    Screen(String),
    #[error("no monitor available")]
    NoMonitor,
    #[error("region {0} lies outside the captured screen")]
    OutOfBounds(Region),
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Grabs the pixels of a screen region.
pub trait ScreenCapture {
    fn capture(&self, region: &Region) -> Result<DynamicImage, CaptureError>;
}
