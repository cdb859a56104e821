//! Image cleanup before Tesseract.
//!
//! grayscale → 5×5 Gaussian blur → adaptive Gaussian threshold (11×11
//! neighbourhood, offset 2), inverted so strokes come out white on black.

use image::{DynamicImage, GrayImage, Luma};

/// Sigma OpenCV derives for a 5×5 kernel.
const BLUR_SIGMA: f32 = 1.1;
/// Sigma OpenCV derives for the 11×11 threshold neighbourhood.
const THRESHOLD_SIGMA: f32 = 2.0;
/// Subtracted from the local mean before comparing.
const THRESHOLD_OFFSET: f32 = 2.0;

/// Binarize an image for OCR.
pub fn binarize(image: &DynamicImage) -> DynamicImage {
    let gray = image.to_luma8();
    let blurred = image::imageops::blur(&gray, BLUR_SIGMA);
    DynamicImage::ImageLuma8(adaptive_threshold_inv(&blurred))
}

/// Pixels at or below their Gaussian-weighted local mean minus the offset
/// become 255, everything else 0.
pub fn adaptive_threshold_inv(gray: &GrayImage) -> GrayImage {
    let local_mean = image::imageops::blur(gray, THRESHOLD_SIGMA);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let value = gray.get_pixel(x, y)[0] as f32;
        let threshold = local_mean.get_pixel(x, y)[0] as f32 - THRESHOLD_OFFSET;
        if value > threshold {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}
