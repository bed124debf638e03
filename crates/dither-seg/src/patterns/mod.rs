//! Dither pattern catalogue and SVG tile definitions.
//!
//! Patterns are static: a closed set of vector tiles drawn with
//! `currentColor`, plus three image-backed tiles served from a fixed
//! relative path. Each tile becomes one `<pattern>` element whose size is
//! scaled to the export target.

mod sizing;
mod tiles;

pub use sizing::{TileScaling, tile_size};
pub use tiles::vector_tile_body;

use serde::{Deserialize, Serialize};

use crate::color::Rgb;
use crate::config::ExportConfig;
use crate::error::PatternError;
use crate::path::fmt_num;

/// Where a tile's pixels come from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TileSource {
    /// Inline SVG drawn in a `base_size` square.
    Vector { base_size: f64 },
    /// Static image file, looked up under `ExportConfig::tile_image_base`.
    Image { file: &'static str },
}

/// Static description of one pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternDefinition {
    pub id: PatternId,
    pub name: &'static str,
    pub source: TileSource,
    pub scaling: TileScaling,
}

/// Available dither patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PatternId {
    Dots,
    DenseDots,
    Lines,
    Diagonal,
    Crosshatch,
    Checker,
    Bayer,
    Stipple,
    Zigzag,
    Marble1,
    Marble2,
    Nest,
}

impl PatternId {
    /// Get all available patterns.
    pub fn all() -> &'static [PatternId] {
        &[
            PatternId::Dots,
            PatternId::DenseDots,
            PatternId::Lines,
            PatternId::Diagonal,
            PatternId::Crosshatch,
            PatternId::Checker,
            PatternId::Bayer,
            PatternId::Stipple,
            PatternId::Zigzag,
            PatternId::Marble1,
            PatternId::Marble2,
            PatternId::Nest,
        ]
    }

    /// Identifier used in `url(#…)` references and config files.
    pub fn name(&self) -> &'static str {
        match self {
            PatternId::Dots => "dots",
            PatternId::DenseDots => "dense-dots",
            PatternId::Lines => "lines",
            PatternId::Diagonal => "diagonal",
            PatternId::Crosshatch => "crosshatch",
            PatternId::Checker => "checker",
            PatternId::Bayer => "bayer",
            PatternId::Stipple => "stipple",
            PatternId::Zigzag => "zigzag",
            PatternId::Marble1 => "marble-1",
            PatternId::Marble2 => "marble-2",
            PatternId::Nest => "nest",
        }
    }

    /// Parse pattern from string.
    pub fn from_name(name: &str) -> Option<PatternId> {
        match name.trim().to_lowercase().as_str() {
            "dots" | "dot" => Some(PatternId::Dots),
            "dense-dots" | "dense_dots" | "densedots" => Some(PatternId::DenseDots),
            "lines" | "horizontal" => Some(PatternId::Lines),
            "diagonal" | "hatch" => Some(PatternId::Diagonal),
            "crosshatch" | "cross" => Some(PatternId::Crosshatch),
            "checker" | "checkerboard" => Some(PatternId::Checker),
            "bayer" | "ordered" => Some(PatternId::Bayer),
            "stipple" | "noise" => Some(PatternId::Stipple),
            "zigzag" | "chevron" => Some(PatternId::Zigzag),
            "marble-1" | "marble1" | "dithered_marble_1" => Some(PatternId::Marble1),
            "marble-2" | "marble2" | "dithered_marble_2" => Some(PatternId::Marble2),
            "nest" | "dithered_nest" => Some(PatternId::Nest),
            _ => None,
        }
    }

    /// Static definition for this pattern.
    pub fn definition(&self) -> PatternDefinition {
        use TileScaling::{ImageLongSide, ShortSide};

        let (name, source, scaling) = match self {
            PatternId::Dots => (
                "Dots",
                TileSource::Vector { base_size: 12.0 },
                ShortSide { divisor: 40.0, min: 12.0, max: 48.0 },
            ),
            PatternId::DenseDots => (
                "Dense Dots",
                TileSource::Vector { base_size: 8.0 },
                ShortSide { divisor: 60.0, min: 8.0, max: 32.0 },
            ),
            PatternId::Lines => (
                "Horizontal Lines",
                TileSource::Vector { base_size: 10.0 },
                ShortSide { divisor: 50.0, min: 8.0, max: 40.0 },
            ),
            PatternId::Diagonal => (
                "Diagonal Hatch",
                TileSource::Vector { base_size: 10.0 },
                ShortSide { divisor: 50.0, min: 8.0, max: 40.0 },
            ),
            PatternId::Crosshatch => (
                "Crosshatch",
                TileSource::Vector { base_size: 10.0 },
                ShortSide { divisor: 40.0, min: 10.0, max: 48.0 },
            ),
            PatternId::Checker => (
                "Checkerboard",
                TileSource::Vector { base_size: 8.0 },
                ShortSide { divisor: 100.0, min: 4.0, max: 16.0 },
            ),
            PatternId::Bayer => (
                "Bayer 4x4",
                TileSource::Vector { base_size: 4.0 },
                ShortSide { divisor: 100.0, min: 4.0, max: 16.0 },
            ),
            PatternId::Stipple => (
                "Stipple",
                TileSource::Vector { base_size: 32.0 },
                ShortSide { divisor: 20.0, min: 24.0, max: 96.0 },
            ),
            PatternId::Zigzag => (
                "Zigzag",
                TileSource::Vector { base_size: 12.0 },
                ShortSide { divisor: 50.0, min: 8.0, max: 40.0 },
            ),
            PatternId::Marble1 => (
                "Dithered Marble I",
                TileSource::Image { file: "dithered_marble_1.png" },
                ImageLongSide,
            ),
            PatternId::Marble2 => (
                "Dithered Marble II",
                TileSource::Image { file: "dithered_marble_2.png" },
                ImageLongSide,
            ),
            PatternId::Nest => (
                "Dithered Nest",
                TileSource::Image { file: "dithered_nest.png" },
                ImageLongSide,
            ),
        };

        PatternDefinition { id: *self, name, source, scaling }
    }

    pub fn is_image_backed(&self) -> bool {
        matches!(self.definition().source, TileSource::Image { .. })
    }
}

impl std::fmt::Display for PatternId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for PatternId {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PatternId::from_name(s).ok_or_else(|| PatternError::Unknown(s.to_string()))
    }
}

impl TryFrom<String> for PatternId {
    type Error = PatternError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PatternId> for String {
    fn from(id: PatternId) -> Self {
        id.name().to_string()
    }
}

/// Translation applied to a tile so its phase lines up with a region.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PatternOffset {
    pub x: f64,
    pub y: f64,
}

impl PatternOffset {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True when the offset rounds to zero at output precision.
    pub fn is_zero(&self) -> bool {
        fmt_num(self.x) == "0" && fmt_num(self.y) == "0"
    }
}

/// One `<pattern>` element to emit: pattern, phase and (optionally) a
/// baked-in color.
#[derive(Debug, Clone, PartialEq)]
pub struct TileRequest {
    pub pattern: PatternId,
    pub offset: PatternOffset,
    /// `None` paints with `currentColor`.
    pub color: Option<Rgb>,
}

impl TileRequest {
    /// Element id, unique per (pattern, offset, color).
    pub fn element_id(&self) -> String {
        let mut id = format!("pattern-{}", self.pattern.name());
        if !self.offset.is_zero() {
            id.push_str(&format!(
                "-o{}_{}",
                id_num(self.offset.x),
                id_num(self.offset.y)
            ));
        }
        if let Some(color) = self.color {
            id.push_str(&format!("-{:02x}{:02x}{:02x}", color.r, color.g, color.b));
        }
        id
    }

    /// Two requests share one element when their ids agree.
    pub fn same_tile(&self, other: &TileRequest) -> bool {
        self.element_id() == other.element_id()
    }

    /// Inverse of [`element_id`](Self::element_id).
    pub fn from_element_id(id: &str) -> Option<TileRequest> {
        let rest = id.strip_prefix("pattern-")?;
        let pattern = PatternId::all()
            .iter()
            .copied()
            .filter(|p| rest == p.name() || rest.starts_with(&format!("{}-", p.name())))
            .max_by_key(|p| p.name().len())?;

        let mut tail = &rest[pattern.name().len()..];
        let mut offset = PatternOffset::default();
        if let Some(encoded) = tail.strip_prefix("-o") {
            let end = encoded.find('-').unwrap_or(encoded.len());
            let (x, y) = encoded[..end].split_once('_')?;
            offset = PatternOffset::new(parse_id_num(x)?, parse_id_num(y)?);
            tail = &encoded[end..];
        }

        let color = match tail.strip_prefix('-') {
            Some(hex) if hex.len() == 6 => Some(Rgb::from_hex(hex)?),
            Some(_) => return None,
            None if tail.is_empty() => None,
            None => return None,
        };

        Some(TileRequest { pattern, offset, color })
    }

    /// Tile referenced by a paint value like `url(#pattern-dots)`.
    pub fn from_paint(paint: &str) -> Option<TileRequest> {
        let id = paint.trim().strip_prefix("url(")?.strip_suffix(')')?;
        let id = id.trim().trim_matches(|c: char| c == '"' || c == '\'');
        Self::from_element_id(id.strip_prefix('#')?)
    }
}

/// Number formatted for use inside an XML id (no `-` or `.`).
fn id_num(value: f64) -> String {
    fmt_num(value).replace('-', "m").replace('.', "p")
}

fn parse_id_num(raw: &str) -> Option<f64> {
    raw.replace('m', "-").replace('p', ".").parse().ok()
}

/// Render the `<pattern>` element for a tile at the given target size.
pub fn render_tile(request: &TileRequest, width: u32, height: u32, config: &ExportConfig) -> String {
    let def = request.pattern.definition();
    let side = fmt_num(tile_size(&def, width, height, config));
    let id = request.element_id();

    let transform = if request.offset.is_zero() {
        String::new()
    } else {
        format!(
            r#" patternTransform="translate({} {})""#,
            fmt_num(request.offset.x),
            fmt_num(request.offset.y)
        )
    };

    match def.source {
        TileSource::Vector { base_size } => {
            let paint = request
                .color
                .map(|c| c.to_hex())
                .unwrap_or_else(|| "currentColor".to_string());
            let base = fmt_num(base_size);
            format!(
                r#"<pattern id="{id}" patternUnits="userSpaceOnUse" width="{side}" height="{side}" viewBox="0 0 {base} {base}"{transform}>{body}</pattern>"#,
                body = vector_tile_body(request.pattern, &paint),
            )
        }
        TileSource::Image { file } => {
            let href_raw = format!("{}{}", config.tile_image_base, file);
            let href = quick_xml::escape::escape(href_raw.as_str());
            format!(
                r#"<pattern id="{id}" patternUnits="userSpaceOnUse" width="{side}" height="{side}"{transform}><image href="{href}" x="0" y="0" width="{side}" height="{side}" preserveAspectRatio="none"/></pattern>"#,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_roundtrip_through_from_name() {
        for p in PatternId::all() {
            assert_eq!(PatternId::from_name(p.name()), Some(*p));
        }
        assert_eq!(PatternId::from_name("DITHERED_NEST"), Some(PatternId::Nest));
        assert_eq!(PatternId::from_name("plaid"), None);
    }

    #[test]
    fn parse_unknown_is_an_error() {
        let err = "plaid".parse::<PatternId>().unwrap_err();
        assert_eq!(err, PatternError::Unknown("plaid".to_string()));
    }

    #[test]
    fn image_backed_patterns() {
        let images: Vec<_> = PatternId::all().iter().filter(|p| p.is_image_backed()).collect();
        assert_eq!(images, vec![&PatternId::Marble1, &PatternId::Marble2, &PatternId::Nest]);
    }

    #[test]
    fn element_ids_encode_offset_and_color() {
        let plain = TileRequest { pattern: PatternId::Dots, offset: PatternOffset::default(), color: None };
        assert_eq!(plain.element_id(), "pattern-dots");

        let shifted = TileRequest { offset: PatternOffset::new(4.0, -2.5), ..plain.clone() };
        assert_eq!(shifted.element_id(), "pattern-dots-o4_m2p5");

        let colored = TileRequest { color: Some(Rgb::new(255, 0, 16)), ..plain.clone() };
        assert_eq!(colored.element_id(), "pattern-dots-ff0010");
        assert!(!plain.same_tile(&shifted));
    }

    #[test]
    fn element_ids_parse_back() {
        let requests = [
            TileRequest { pattern: PatternId::DenseDots, offset: PatternOffset::default(), color: None },
            TileRequest { pattern: PatternId::Marble2, offset: PatternOffset::new(-3.25, 8.0), color: None },
            TileRequest { pattern: PatternId::Dots, offset: PatternOffset::new(1.0, 0.0), color: Some(Rgb::new(1, 2, 3)) },
        ];
        for req in requests {
            assert_eq!(TileRequest::from_element_id(&req.element_id()), Some(req.clone()));
        }
        assert_eq!(TileRequest::from_element_id("pattern-plaid"), None);
        assert_eq!(TileRequest::from_element_id("pattern-dots-oops"), None);
        assert_eq!(TileRequest::from_element_id("grid"), None);
    }

    #[test]
    fn paint_references() {
        let req = TileRequest::from_paint("url(#pattern-lines-o2_0)").unwrap();
        assert_eq!(req.pattern, PatternId::Lines);
        assert_eq!(req.offset, PatternOffset::new(2.0, 0.0));
        assert!(TileRequest::from_paint("url('#pattern-nest')").is_some());
        assert!(TileRequest::from_paint("#8b4513").is_none());
    }

    #[test]
    fn vector_tile_uses_current_color() {
        let req = TileRequest { pattern: PatternId::Dots, offset: PatternOffset::default(), color: None };
        let svg = render_tile(&req, 800, 600, &ExportConfig::default());
        assert!(svg.starts_with(r#"<pattern id="pattern-dots" patternUnits="userSpaceOnUse" width="15" height="15""#));
        assert!(svg.contains("currentColor"));
        assert!(!svg.contains("patternTransform"));
    }

    #[test]
    fn offset_becomes_pattern_transform() {
        let req = TileRequest { pattern: PatternId::Lines, offset: PatternOffset::new(3.0, 7.5), color: None };
        let svg = render_tile(&req, 800, 600, &ExportConfig::default());
        assert!(svg.contains(r#"patternTransform="translate(3 7.5)""#));
    }

    #[test]
    fn image_tile_references_fixed_file() {
        let req = TileRequest { pattern: PatternId::Marble1, offset: PatternOffset::default(), color: None };
        let svg = render_tile(&req, 800, 600, &ExportConfig::default());
        assert!(svg.contains(r#"href="patterns/dithered_marble_1.png""#));
        assert!(svg.contains(r#"width="256""#));
    }
}
