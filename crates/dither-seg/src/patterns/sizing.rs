//! Tile sizing relative to the export target.
//!
//! Tiles that stay a fixed size look pixelated on large exports and
//! repeat too densely on small ones, so each pattern scales with the
//! target image inside bounds.

use crate::config::ExportConfig;

use super::PatternDefinition;

/// Rule mapping target dimensions to a tile side length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TileScaling {
    /// `clamp(round(min(w, h) / divisor), min, max)`.
    ShortSide { divisor: f64, min: f64, max: f64 },
    /// `base * min(max(w, h) / reference, cap)` with base, reference and
    /// cap taken from [`ExportConfig`].
    ImageLongSide,
}

/// Side length (user units) of a pattern's tile on a `width`×`height` target.
pub fn tile_size(def: &PatternDefinition, width: u32, height: u32, config: &ExportConfig) -> f64 {
    match def.scaling {
        TileScaling::ShortSide { divisor, min, max } => {
            let short = width.min(height) as f64;
            (short / divisor).round().clamp(min, max)
        }
        TileScaling::ImageLongSide => {
            let long = width.max(height) as f64;
            let reference = if config.image_tile_reference > 0.0 {
                config.image_tile_reference
            } else {
                800.0
            };
            let factor = (long / reference).min(config.image_tile_cap);
            (config.image_tile_base * factor * 100.0).round() / 100.0
        }
    }
}
