//! Segment masks: rasterized polygons stored as PNG.
//!
//! A mask is an RGBA bitmap at canvas resolution whose alpha channel marks
//! membership. It is kept PNG-encoded so segments stay cheap to clone and
//! serialize; callers decode when they need pixels.

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};

use crate::color::Rgb;
use crate::error::MaskError;
use crate::geometry::Point;
use crate::path::rounded_rect_path;

/// A PNG-encoded membership mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentMask {
    pub width: u32,
    pub height: u32,
    png: Vec<u8>,
}

impl SegmentMask {
    /// Wrap already-encoded PNG bytes. Nothing is validated until decode.
    pub fn from_png(width: u32, height: u32, png: Vec<u8>) -> Self {
        Self { width, height, png }
    }

    /// Encode a decoded mask image.
    pub fn from_image(image: &RgbaImage) -> Result<Self, MaskError> {
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(MaskError::Encode)?;
        Ok(Self {
            width: image.width(),
            height: image.height(),
            png,
        })
    }

    /// A fully transparent mask.
    pub fn empty(width: u32, height: u32) -> Result<Self, MaskError> {
        Self::from_image(&RgbaImage::new(width, height))
    }

    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    /// Decode to RGBA pixels, checking the recorded size.
    pub fn decode(&self) -> Result<RgbaImage, MaskError> {
        let image = image::load_from_memory_with_format(&self.png, ImageFormat::Png)
            .map_err(MaskError::Decode)?
            .to_rgba8();

        if image.width() != self.width || image.height() != self.height {
            return Err(MaskError::SizeMismatch {
                expected_w: self.width,
                expected_h: self.height,
                actual_w: image.width(),
                actual_h: image.height(),
            });
        }
        Ok(image)
    }

    /// Coarse path for the mask: a rounded rectangle over its opaque pixels.
    ///
    /// Returns `Ok(None)` when the mask has no opaque pixel at all.
    pub fn fallback_path(&self) -> Result<Option<String>, MaskError> {
        let image = self.decode()?;
        Ok(opaque_bounds(&image).map(|(min_x, min_y, max_x, max_y)| {
            rounded_rect_path(
                min_x as f64,
                min_y as f64,
                (max_x - min_x + 1) as f64,
                (max_y - min_y + 1) as f64,
            )
        }))
    }
}

/// Fill a closed polygon into a new mask of the given canvas size.
///
/// Even-odd rule, no anti-aliasing: every pixel is either fully inside
/// (alpha 255, painted `color`) or fully outside (alpha 0).
pub fn rasterize_polygon(
    points: &[Point],
    width: u32,
    height: u32,
    color: Rgb,
) -> Result<RgbaImage, MaskError> {
    let raster_err = || MaskError::Raster { width, height };

    let mut pixmap = Pixmap::new(width, height).ok_or_else(raster_err)?;

    let (first, rest) = points.split_first().ok_or_else(raster_err)?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x as f32, first.y as f32);
    for p in rest {
        pb.line_to(p.x as f32, p.y as f32);
    }
    pb.close();
    let path = pb.finish().ok_or_else(raster_err)?;

    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, 255);
    paint.anti_alias = false;
    pixmap.fill_path(&path, &paint, FillRule::EvenOdd, Transform::identity(), None);

    // Alpha is 0 or 255 only, so premultiplied bytes equal straight RGBA.
    RgbaImage::from_raw(width, height, pixmap.take()).ok_or_else(raster_err)
}

/// Bounding box of pixels with non-zero alpha, inclusive.
pub fn opaque_bounds(image: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, px) in image.enumerate_pixels() {
        if px[3] == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bounds
}

/// Whether the pixel under `(x, y)` belongs to the mask.
pub fn mask_contains(image: &RgbaImage, x: f64, y: f64) -> bool {
    if x < 0.0 || y < 0.0 {
        return false;
    }
    let (px, py) = (x as u32, y as u32);
    if px >= image.width() || py >= image.height() {
        return false;
    }
    image.get_pixel(px, py)[3] > 0
}
