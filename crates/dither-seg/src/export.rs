//! SVG export.
//!
//! Export is a pure function of the segment list and target size: the
//! same input always produces the same bytes. The document is
//!
//! ```text
//! <svg width height viewBox>
//!   <rect … fill="#ffffff"/>            opaque background
//!   <defs> <pattern …/> … </defs>       one per distinct tile
//!   <g color="#seg" stroke="#seg">      color context per segment
//!     <path data-segment="id" d="…" fill="url(#pattern-…)"/>
//!   </g> …
//! </svg>
//! ```
//!
//! Vector tiles paint with `currentColor`, so one tile definition renders
//! in each segment's own color through the enclosing group.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt::Write;

use tracing::{debug, info, warn};

use crate::color::Rgb;
use crate::config::{ColorStrategy, ExportConfig};
use crate::path::{EMPTY_PATH, fmt_num};
use crate::patterns::{PatternId, PatternOffset, TileRequest, render_tile};
use crate::segment::Segment;

/// MIME type of every exported document.
pub const SVG_MIME: &str = "image/svg+xml";

/// Which segments a single document includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    /// Every segment; unpatterned ones get a translucent solid fill.
    All,
    /// Only segments with a pattern assigned.
    PatternsOnly,
}

/// Which documents an export produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportRequest {
    /// One document with every segment: `<prefix>-all.svg`.
    All,
    /// One document per segment: `<prefix>-<segmentId>.svg`.
    Separate,
    /// One document with patterned segments only: `<prefix>-patterns.svg`.
    PatternsOnly,
}

impl ExportRequest {
    pub fn from_name(name: &str) -> Option<ExportRequest> {
        match name.trim().to_lowercase().as_str() {
            "all" | "combined" => Some(ExportRequest::All),
            "separate" | "per-segment" | "each" => Some(ExportRequest::Separate),
            "patterns" | "patterns-only" => Some(ExportRequest::PatternsOnly),
            _ => None,
        }
    }
}

/// Bytes to hand to the download mechanism.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedDocument {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportedDocument {
    pub fn svg(filename: String, text: String) -> Self {
        Self { filename, mime: SVG_MIME, bytes: text.into_bytes() }
    }
}

// ============================================================================
// SHARED DOCUMENT WRITER
// ============================================================================

/// How a shape is filled.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeFill {
    Pattern { pattern: PatternId, offset: PatternOffset },
    /// `currentColor` at the given opacity.
    CurrentColor { opacity: f64 },
    /// Keep an existing paint value verbatim.
    Paint(String),
}

/// One path inside its color-context group.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeSpec {
    /// Written as `data-segment`.
    pub key: String,
    pub d: String,
    /// Color the group provides to `currentColor`.
    pub color: Rgb,
    pub stroke: Option<String>,
    pub stroke_width: Option<String>,
    pub fill: ShapeFill,
}

impl ShapeSpec {
    fn tile_request(&self, strategy: ColorStrategy) -> Option<TileRequest> {
        match &self.fill {
            ShapeFill::Pattern { pattern, offset } => Some(TileRequest {
                pattern: *pattern,
                offset: *offset,
                color: match strategy {
                    ColorStrategy::Inherit => None,
                    ColorStrategy::PerColor if !pattern.is_image_backed() => Some(self.color),
                    ColorStrategy::PerColor => None,
                },
            }),
            _ => None,
        }
    }
}

fn esc(raw: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(raw)
}

/// Write a complete document for already-resolved shapes.
pub fn render_document(shapes: &[ShapeSpec], width: u32, height: u32, config: &ExportConfig) -> String {
    // Distinct tiles in first-use order
    let mut tiles: Vec<TileRequest> = Vec::new();
    for shape in shapes {
        if let Some(req) = shape.tile_request(config.color_strategy) {
            if !tiles.iter().any(|t| t.same_tile(&req)) {
                tiles.push(req);
            }
        }
    }

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    let _ = writeln!(
        svg,
        r#"  <rect x="0" y="0" width="{width}" height="{height}" fill="{}"/>"#,
        esc(&config.background)
    );

    if !tiles.is_empty() {
        svg.push_str("  <defs>\n");
        for tile in &tiles {
            let _ = writeln!(svg, "    {}", render_tile(tile, width, height, config));
        }
        svg.push_str("  </defs>\n");
    }

    for shape in shapes {
        let color = shape.color.to_hex();
        let stroke = shape.stroke.clone().unwrap_or_else(|| color.clone());
        let stroke_width = shape
            .stroke_width
            .clone()
            .unwrap_or_else(|| fmt_num(config.stroke_width));

        let _ = writeln!(
            svg,
            r#"  <g data-segment-group="{key}" color="{color}" stroke="{stroke}" stroke-width="{sw}">"#,
            key = esc(&shape.key),
            stroke = esc(&stroke),
            sw = esc(&stroke_width),
        );

        let fill = match (&shape.fill, shape.tile_request(config.color_strategy)) {
            (_, Some(req)) => format!(r#"fill="url(#{})""#, req.element_id()),
            (ShapeFill::CurrentColor { opacity }, None) => {
                format!(r#"fill="currentColor" fill-opacity="{}""#, fmt_num(*opacity))
            }
            (ShapeFill::Paint(paint), None) => format!(r#"fill="{}""#, esc(paint)),
            (ShapeFill::Pattern { .. }, None) => r#"fill="none""#.to_string(),
        };

        let _ = writeln!(
            svg,
            r#"    <path data-segment="{key}" d="{d}" {fill}/>"#,
            key = esc(&shape.key),
            d = esc(&shape.d),
        );
        svg.push_str("  </g>\n");
    }

    svg.push_str("</svg>\n");
    svg
}

// ============================================================================
// SEGMENT EXPORT
// ============================================================================

/// Path data for a segment.
///
/// The stored path wins. Without one, the mask's bounding box gives a
/// coarse rounded rectangle; if the mask can't be read the segment
/// degrades to [`EMPTY_PATH`] and export carries on.
pub fn resolve_path(segment: &Segment) -> String {
    if let Some(d) = segment.path.as_deref().filter(|d| !d.trim().is_empty()) {
        return d.to_string();
    }

    match segment.mask.fallback_path() {
        Ok(Some(d)) => {
            debug!(segment = %segment.id, "using mask bounding-box path");
            d
        }
        Ok(None) => {
            warn!(segment = %segment.id, "mask has no opaque pixels, exporting empty path");
            EMPTY_PATH.to_string()
        }
        Err(e) => {
            warn!(segment = %segment.id, error = %e, "mask decode failed, exporting empty path");
            EMPTY_PATH.to_string()
        }
    }
}

fn segment_shape(segment: &Segment, config: &ExportConfig) -> ShapeSpec {
    let fill = match segment.pattern {
        Some(pattern) => ShapeFill::Pattern {
            pattern,
            offset: segment.offset.unwrap_or_default(),
        },
        None => ShapeFill::CurrentColor { opacity: config.unpatterned_opacity },
    };

    ShapeSpec {
        key: segment.id.as_str().to_string(),
        d: resolve_path(segment),
        color: segment.color(),
        stroke: None,
        stroke_width: None,
        fill,
    }
}

/// Render segments into one SVG document sized `width`×`height`.
pub fn generate_svg(
    segments: &[Segment],
    width: u32,
    height: u32,
    mode: ExportMode,
    config: &ExportConfig,
) -> String {
    let shapes: Vec<ShapeSpec> = segments
        .iter()
        .filter(|s| mode == ExportMode::All || s.pattern.is_some())
        .map(|s| segment_shape(s, config))
        .collect();

    render_document(&shapes, width, height, config)
}

/// Produce the documents for an export request.
pub fn export_documents(
    segments: &[Segment],
    width: u32,
    height: u32,
    request: ExportRequest,
    prefix: &str,
    config: &ExportConfig,
) -> Vec<ExportedDocument> {
    let docs = match request {
        ExportRequest::All => vec![ExportedDocument::svg(
            format!("{prefix}-all.svg"),
            generate_svg(segments, width, height, ExportMode::All, config),
        )],
        ExportRequest::PatternsOnly => vec![ExportedDocument::svg(
            format!("{prefix}-patterns.svg"),
            generate_svg(segments, width, height, ExportMode::PatternsOnly, config),
        )],
        ExportRequest::Separate => {
            let mut stems = HashSet::new();
            segments
                .iter()
                .map(|s| {
                    let base = s.id.file_stem();
                    let mut stem = base.clone();
                    let mut n = 2;
                    while !stems.insert(stem.clone()) {
                        stem = format!("{base}-{n}");
                        n += 1;
                    }
                    ExportedDocument::svg(
                        format!("{prefix}-{stem}.svg"),
                        generate_svg(std::slice::from_ref(s), width, height, ExportMode::All, config),
                    )
                })
                .collect()
        }
    };

    info!(?request, documents = docs.len(), segments = segments.len(), "export complete");
    docs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::mask::SegmentMask;
    use crate::segment::{SegmentId, SegmentKind};

    fn tri(kind: SegmentKind) -> Segment {
        let pts = vec![Point::new(10.0, 10.0), Point::new(60.0, 10.0), Point::new(35.0, 50.0)];
        Segment::from_polygon(kind.into(), pts, 100, 80).unwrap()
    }

    #[test]
    fn empty_export_is_minimal_document() {
        let svg = generate_svg(&[], 320, 240, ExportMode::All, &ExportConfig::default());
        assert!(svg.starts_with("<svg "));
        assert!(svg.contains(r#"width="320" height="240""#));
        assert!(svg.contains(r##"<rect x="0" y="0" width="320" height="240" fill="#ffffff"/>"##));
        assert!(!svg.contains("<g"));
        assert!(!svg.contains("<defs>"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn shared_pattern_emits_one_tile() {
        let a = tri(SegmentKind::Hair).with_pattern(PatternId::Dots);
        let b = tri(SegmentKind::Face).with_pattern(PatternId::Dots);
        let svg = generate_svg(&[a, b], 100, 80, ExportMode::All, &ExportConfig::default());
        assert_eq!(svg.matches("<pattern ").count(), 1);
        assert_eq!(svg.matches(r#"fill="url(#pattern-dots)""#).count(), 2);
        assert!(svg.contains(&format!(r#"color="{}""#, SegmentKind::Hair.color())));
        assert!(svg.contains(&format!(r#"color="{}""#, SegmentKind::Face.color())));
    }

    #[test]
    fn per_color_strategy_duplicates_tiles() {
        let cfg = ExportConfig { color_strategy: ColorStrategy::PerColor, ..ExportConfig::default() };
        let a = tri(SegmentKind::Hair).with_pattern(PatternId::Lines);
        let b = tri(SegmentKind::Face).with_pattern(PatternId::Lines);
        let svg = generate_svg(&[a, b], 100, 80, ExportMode::All, &cfg);
        assert_eq!(svg.matches("<pattern ").count(), 2);
        assert!(!svg.contains("currentColor"));
    }

    #[test]
    fn offsets_split_tiles() {
        let a = tri(SegmentKind::Hair).with_pattern(PatternId::Dots);
        let b = tri(SegmentKind::Face)
            .with_pattern(PatternId::Dots)
            .with_offset(PatternOffset::new(5.0, 0.0));
        let svg = generate_svg(&[a, b], 100, 80, ExportMode::All, &ExportConfig::default());
        assert_eq!(svg.matches("<pattern ").count(), 2);
        assert!(svg.contains(r#"patternTransform="translate(5 0)""#));
    }

    #[test]
    fn background_precedes_segments_in_input_order() {
        let a = tri(SegmentKind::Torso);
        let b = tri(SegmentKind::Hair);
        let svg = generate_svg(&[a, b], 100, 80, ExportMode::All, &ExportConfig::default());
        let rect = svg.find("<rect").unwrap();
        let torso = svg.find(r#"data-segment="torso""#).unwrap();
        let hair = svg.find(r#"data-segment="hair""#).unwrap();
        assert!(rect < torso && torso < hair);
        assert!(svg.contains(r#"fill="currentColor" fill-opacity="0.35""#));
    }

    #[test]
    fn mask_only_segment_uses_fallback() {
        let seg = tri(SegmentKind::Nose);
        let mask_only = Segment::from_mask(seg.id.clone(), seg.mask.clone());
        let d = resolve_path(&mask_only);
        assert!(d.starts_with('M') && d.contains('Q'), "got {}", d);
    }

    #[test]
    fn broken_mask_degrades_to_empty_path() {
        let broken = Segment::from_mask(
            SegmentId::parse("ghost"),
            SegmentMask::from_png(10, 10, b"not a png".to_vec()),
        );
        let good = tri(SegmentKind::Hair);
        let svg = generate_svg(&[broken, good], 100, 80, ExportMode::All, &ExportConfig::default());
        assert!(svg.contains(r#"data-segment="ghost" d="M0 0""#));
        assert!(svg.contains(r#"data-segment="hair" d="M10,10 L60,10 L35,50 Z""#));
    }

    #[test]
    fn custom_ids_are_escaped() {
        let seg = Segment::from_polygon(
            SegmentId::parse("a\"<b>"),
            vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0), Point::new(0.0, 5.0)],
            10,
            10,
        )
        .unwrap();
        let svg = generate_svg(&[seg], 10, 10, ExportMode::All, &ExportConfig::default());
        assert!(svg.contains("a&quot;&lt;b&gt;"));
        assert!(!svg.contains("a\"<b>"));
    }

    #[test]
    fn export_requests_name_files() {
        let segs = vec![tri(SegmentKind::Hair).with_pattern(PatternId::Dots), tri(SegmentKind::LeftEye)];
        let cfg = ExportConfig::default();

        let all = export_documents(&segs, 100, 80, ExportRequest::All, "portrait", &cfg);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].filename, "portrait-all.svg");
        assert_eq!(all[0].mime, "image/svg+xml");

        let separate = export_documents(&segs, 100, 80, ExportRequest::Separate, "portrait", &cfg);
        let names: Vec<_> = separate.iter().map(|d| d.filename.as_str()).collect();
        assert_eq!(names, vec!["portrait-hair.svg", "portrait-left-eye.svg"]);

        let patterns = export_documents(&segs, 100, 80, ExportRequest::PatternsOnly, "portrait", &cfg);
        assert_eq!(patterns[0].filename, "portrait-patterns.svg");
        let text = String::from_utf8(patterns[0].bytes.clone()).unwrap();
        assert!(!text.contains("left-eye"));
    }

    #[test]
    fn separate_export_file_names_are_unique() {
        let custom = |id: &str| {
            Segment::from_polygon(
                SegmentId::parse(id),
                vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0), Point::new(0.0, 5.0)],
                10,
                10,
            )
            .unwrap()
        };
        let segs = vec![custom("my scarf"), custom("my-scarf"), custom("my/scarf")];
        let docs = export_documents(&segs, 10, 10, ExportRequest::Separate, "p", &ExportConfig::default());
        let names: Vec<_> = docs.iter().map(|d| d.filename.as_str()).collect();
        assert_eq!(names, vec!["p-my-scarf.svg", "p-my-scarf-2.svg", "p-my-scarf-3.svg"]);

        let second = String::from_utf8(docs[1].bytes.clone()).unwrap();
        assert!(second.contains(r#"data-segment="my-scarf""#));
    }

    #[test]
    fn export_is_deterministic() {
        let segs = vec![
            tri(SegmentKind::Hair).with_pattern(PatternId::Stipple),
            tri(SegmentKind::Face).with_pattern(PatternId::Nest),
        ];
        let cfg = ExportConfig::default();
        let a = generate_svg(&segs, 100, 80, ExportMode::All, &cfg);
        let b = generate_svg(&segs, 100, 80, ExportMode::All, &cfg);
        assert_eq!(a, b);
    }

    #[test]
    fn request_names() {
        assert_eq!(ExportRequest::from_name("separate"), Some(ExportRequest::Separate));
        assert_eq!(ExportRequest::from_name("patterns"), Some(ExportRequest::PatternsOnly));
        assert_eq!(ExportRequest::from_name("zip"), None);
    }
}
