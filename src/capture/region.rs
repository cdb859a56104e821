//! Region geometry and in-memory PNG encoding.

use super::CaptureError;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A screen rectangle in absolute pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// Build a region from the two corners of a drag, in either direction.
    pub fn from_corners(start: (i32, i32), end: (i32, i32)) -> Self {
        Self {
            x: start.0.min(end.0),
            y: start.1.min(end.1),
            width: start.0.abs_diff(end.0),
            height: start.1.abs_diff(end.1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} at ({},{})", self.width, self.height, self.x, self.y)
    }
}

/// Crop an image to `region`, where `region` is relative to the image's
/// top-left corner. The crop is clamped to the image; a region entirely
/// outside it is an error.
pub fn crop(image: &DynamicImage, region: &Region) -> Result<DynamicImage, CaptureError> {
    let (w, h) = (image.width(), image.height());
    if region.is_empty()
        || region.x < 0
        || region.y < 0
        || region.x as u32 >= w
        || region.y as u32 >= h
    {
        return Err(CaptureError::OutOfBounds(*region));
    }
    let x = region.x as u32;
    let y = region.y as u32;
    let width = region.width.min(w - x);
    let height = region.height.min(h - y);
    Ok(image.crop_imm(x, y, width, height))
}

/// Encode an image to PNG bytes in memory.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, CaptureError> {
    let mut png_bytes = Vec::new();
    image.write_to(
        &mut std::io::Cursor::new(&mut png_bytes),
        image::ImageFormat::Png,
    )?;
    Ok(png_bytes)
}
