//! Screenshot capture capability and thumbnail post-processing
//!
//! Actual browser automation lives behind [`ScreenshotCapture`]; this module
//! only owns the trait and the resize step applied to every captured image.

use crate::{GaugeError, Result};
use async_trait::async_trait;
use image::imageops::FilterType;
use image::ImageFormat;
use std::io::Cursor;

/// Captured images wider than this are scaled down, preserving aspect ratio
pub const MAX_WIDTH: u32 = 800;

/// Capability that renders a page and returns a PNG
#[async_trait]
pub trait ScreenshotCapture: Send + Sync {
    async fn capture(&self, url: &str) -> Result<Vec<u8>>;
}

/// Shrinks a PNG to at most [`MAX_WIDTH`] pixels wide
///
/// Images already within the limit pass through re-encoded but unscaled.
pub fn resize_to_thumbnail(png: &[u8]) -> Result<Vec<u8>> {
    let img = image::load_from_memory_with_format(png, ImageFormat::Png)
        .map_err(|e| GaugeError::Screenshot(format!("decode failed: {}", e)))?;

    let img = if img.width() > MAX_WIDTH {
        let ratio = MAX_WIDTH as f64 / img.width() as f64;
        let height = (img.height() as f64 * ratio) as u32;
        img.resize_exact(MAX_WIDTH, height.max(1), FilterType::Lanczos3)
    } else {
        img
    };

    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .map_err(|e| GaugeError::Screenshot(format!("encode failed: {}", e)))?;
    Ok(out.into_inner())
}
