//! Session configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! wants to change. The CLI loads this from YAML.

use serde::{Deserialize, Serialize};

/// Top-level configuration for a segmentation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub capture: CaptureConfig,
    /// Delay used to coalesce hover-triggered highlight redraws.
    pub hover_debounce_ms: u64,
    pub highlight: HighlightConfig,
    pub export: ExportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display: DisplayConfig::default(),
            capture: CaptureConfig::default(),
            hover_debounce_ms: 16,
            highlight: HighlightConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

/// Bound that uploaded images are scaled down to fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { max_width: 800, max_height: 600 }
    }
}

/// Polygon capture tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// A click this close (canvas pixels) to the first point closes the polygon.
    pub close_radius: f64,
    /// Minimum vertex count for a polygon to be finalized.
    pub min_vertices: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self { close_radius: 15.0, min_vertices: 3 }
    }
}

/// Colors used when painting the static layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Tint opacity for completed segments drawn over the image.
    pub segment_alpha: f64,
    /// Replacement color for a hovered segment.
    pub color: String,
    pub alpha: f64,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            segment_alpha: 0.35,
            color: "#ffd400".to_string(),
            alpha: 0.6,
        }
    }
}

/// How pattern tiles pick up a segment's color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorStrategy {
    /// One tile per pattern, painted with `currentColor` resolved from the
    /// enclosing `<g color=…>`.
    #[default]
    Inherit,
    /// One tile per (pattern, color) with the color written into the tile.
    PerColor,
}

/// Export tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Side length of an image-backed tile at the reference size.
    pub image_tile_base: f64,
    /// Upper bound on the image tile scale multiplier.
    pub image_tile_cap: f64,
    /// Image long side at which image tiles render at `image_tile_base`.
    pub image_tile_reference: f64,
    /// Prefix prepended to tile image file names.
    pub tile_image_base: String,
    pub color_strategy: ColorStrategy,
    /// Fill opacity for segments exported without a pattern.
    pub unpatterned_opacity: f64,
    pub stroke_width: f64,
    pub background: String,
    pub file_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            image_tile_base: 256.0,
            image_tile_cap: 3.0,
            image_tile_reference: 800.0,
            tile_image_base: "patterns/".to_string(),
            color_strategy: ColorStrategy::Inherit,
            unpatterned_opacity: 0.35,
            stroke_width: 1.0,
            background: "#ffffff".to_string(),
            file_prefix: "segments".to_string(),
        }
    }
}

impl ExportConfig {
    /// Classic tile sizing: smaller image tiles with a higher cap.
    pub fn classic() -> Self {
        Self {
            image_tile_base: 128.0,
            image_tile_cap: 4.0,
            ..Self::default()
        }
    }
}
