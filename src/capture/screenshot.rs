//! Screenshot capture via the xcap crate.
//!
//! Captures the monitor containing the region's top-left corner and crops.
//! Regions spanning monitors are clipped to that monitor.

use super::{region, CaptureError, Region, ScreenCapture};
use image::DynamicImage;
use xcap::Monitor;

#[derive(Debug, Default, Clone, Copy)]
pub struct XcapScreen;

impl XcapScreen {
    pub fn new() -> Self {
        Self
    }
}

fn pick_monitor(region: &Region) -> Result<Monitor, CaptureError> {
    if let Ok(monitor) = Monitor::from_point(region.x, region.y) {
        return Ok(monitor);
    }
    let monitors = Monitor::all().map_err(|e| CaptureError::Screen(e.to_string()))?;
    let primary = monitors
        .iter()
        .position(|m| m.is_primary().unwrap_or(false))
        .unwrap_or(0);
    monitors.into_iter().nth(primary).ok_or(CaptureError::NoMonitor)
}

impl ScreenCapture for XcapScreen {
    fn capture(&self, region: &Region) -> Result<DynamicImage, CaptureError> {
        let start = std::time::Instant::now();
        let monitor = pick_monitor(region)?;
        let origin_x = monitor.x().map_err(|e| CaptureError::Screen(e.to_string()))?;
        let origin_y = monitor.y().map_err(|e| CaptureError::Screen(e.to_string()))?;

        let screenshot = monitor
            .capture_image()
            .map_err(|e| CaptureError::Screen(e.to_string()))?;
        let full = DynamicImage::ImageRgba8(screenshot);

        let local = Region {
            x: region.x - origin_x,
            y: region.y - origin_y,
            ..*region
        };
        let cropped = region::crop(&full, &local)?;
        log::info!(
            "[CAPTURE] {} captured in {}ms",
            region,
            start.elapsed().as_millis()
        );
        Ok(cropped)
    }
}
