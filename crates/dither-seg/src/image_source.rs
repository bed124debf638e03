//! Uploaded raster images.
//!
//! Bytes are sniffed, decoded, converted to canonical RGBA8 and scaled down
//! to the display bound. The decoded handle is kept for the whole session
//! so redraws never go back to the source bytes.

use image::imageops::FilterType;
use image::RgbaImage;
use tracing::{debug, warn};

use crate::config::DisplayConfig;
use crate::error::ImageLoadError;

/// A decoded image at display (canvas) resolution.
#[derive(Debug, Clone)]
pub struct DisplayImage {
    pixels: RgbaImage,
    source_width: u32,
    source_height: u32,
}

impl DisplayImage {
    /// Decode uploaded bytes and fit them to `bounds`.
    pub fn from_bytes(bytes: &[u8], bounds: DisplayConfig) -> Result<Self, ImageLoadError> {
        if bytes.is_empty() {
            return Err(ImageLoadError::Empty);
        }

        let format = image::guess_format(bytes).map_err(|_| ImageLoadError::UnsupportedFormat)?;
        let decoded = image::load_from_memory_with_format(bytes, format).map_err(|e| {
            warn!(?format, error = %e, "image decode failed");
            ImageLoadError::Decode(e)
        })?;

        Ok(Self::from_rgba(decoded.to_rgba8(), bounds))
    }

    /// Fit an already-decoded image to `bounds`.
    pub fn from_rgba(source: RgbaImage, bounds: DisplayConfig) -> Self {
        let (source_width, source_height) = source.dimensions();
        let (w, h) = fit_within(source_width, source_height, bounds.max_width, bounds.max_height);

        let pixels = if (w, h) == (source_width, source_height) {
            source
        } else {
            debug!(source_width, source_height, w, h, "scaling image to display bound");
            image::imageops::resize(&source, w, h, FilterType::Triangle)
        };

        Self { pixels, source_width, source_height }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn source_size(&self) -> (u32, u32) {
        (self.source_width, self.source_height)
    }

    /// Display pixels divided by source pixels (≤ 1).
    pub fn scale(&self) -> f64 {
        if self.source_width == 0 {
            return 1.0;
        }
        self.width() as f64 / self.source_width as f64
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Isotropic fit of `(width, height)` inside `(max_w, max_h)`.
///
/// Never upscales. Each side is at least 1px.
pub fn fit_within(width: u32, height: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if width == 0 || height == 0 || (width <= max_w && height <= max_h) {
        return (width, height);
    }

    let ratio = (max_w as f64 / width as f64).min(max_h as f64 / height as f64);
    let w = ((width as f64 * ratio).round() as u32).clamp(1, max_w.max(1));
    let h = ((height as f64 * ratio).round() as u32).clamp(1, max_h.max(1));
    (w, h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png).unwrap();
        out
    }

    #[test]
    fn fit_keeps_small_images() {
        assert_eq!(fit_within(640, 480, 800, 600), (640, 480));
    }

    #[test]
    fn fit_scales_wide_and_tall() {
        assert_eq!(fit_within(1600, 600, 800, 600), (800, 300));
        assert_eq!(fit_within(600, 1200, 800, 600), (300, 600));
        assert_eq!(fit_within(4000, 3000, 800, 600), (800, 600));
    }

    #[test]
    fn decodes_and_scales_png() {
        let img = DisplayImage::from_bytes(&png_bytes(1600, 1200), DisplayConfig::default()).unwrap();
        assert_eq!((img.width(), img.height()), (800, 600));
        assert_eq!(img.source_size(), (1600, 1200));
        assert!((img.scale() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn rejects_non_images() {
        let result = DisplayImage::from_bytes(b"hello, not an image", DisplayConfig::default());
        assert!(matches!(result, Err(ImageLoadError::UnsupportedFormat)));
        let result = DisplayImage::from_bytes(&[], DisplayConfig::default());
        assert!(matches!(result, Err(ImageLoadError::Empty)));
    }

    #[test]
    fn truncated_png_is_a_decode_error() {
        let mut bytes = png_bytes(20, 20);
        bytes.truncate(40);
        let result = DisplayImage::from_bytes(&bytes, DisplayConfig::default());
        assert!(matches!(result, Err(ImageLoadError::Decode(_))));
    }
}
