//! Drawing surfaces for the segmentation view.
//!
//! Two layers:
//! - **static**: the decoded base image plus a tint for every completed
//!   segment. Repainted only when the image or the segment set changes.
//! - **live**: the polygon being captured (edges, closing hint, vertex
//!   markers). Repainted on every point change without touching static.
//!
//! Hover highlight recolors one segment on the static layer using the
//! decoded image and the mask cache from the last static repaint, so it
//! never decodes anything.
//!
//! Mask decoding may happen elsewhere (another thread, a host callback).
//! [`Layers::begin_repaint`] hands out a generation ticket and
//! [`Layers::commit_repaint`] drops results whose ticket was superseded.

use image::{Rgba, RgbaImage};
use tiny_skia::{Color, Paint, PathBuilder, Pixmap, Stroke, StrokeDash, Transform};
use tracing::{debug, warn};

use crate::color::Rgb;
use crate::config::HighlightConfig;
use crate::error::MaskError;
use crate::geometry::Point;
use crate::image_source::DisplayImage;
use crate::segment::{Segment, SegmentId};

const EDGE_WIDTH: f32 = 2.0;
const VERTEX_RADIUS: f32 = 4.0;
const FIRST_VERTEX_RADIUS: f32 = 6.0;

/// A decoded segment mask ready for painting.
#[derive(Debug, Clone)]
pub struct DecodedMask {
    pub id: SegmentId,
    pub color: Rgb,
    pub pixels: RgbaImage,
}

/// Decode every segment's mask. Failures are logged and skipped.
pub fn decode_masks(segments: &[Segment]) -> Vec<DecodedMask> {
    segments
        .iter()
        .filter_map(|segment| match segment.mask.decode() {
            Ok(pixels) => Some(DecodedMask {
                id: segment.id.clone(),
                color: segment.color(),
                pixels,
            }),
            Err(e) => {
                warn!(segment = %segment.id, error = %e, "skipping undecodable mask");
                None
            }
        })
        .collect()
}

/// Static and live drawing layers over one decoded image.
pub struct Layers {
    base: DisplayImage,
    static_layer: RgbaImage,
    live_layer: Pixmap,
    masks: Vec<DecodedMask>,
    highlighted: Option<SegmentId>,
    style: HighlightConfig,
    generation: u64,
    static_repaints: usize,
    live_repaints: usize,
    highlight_repaints: usize,
}

impl Layers {
    pub fn new(base: DisplayImage, style: HighlightConfig) -> Result<Self, MaskError> {
        let (width, height) = (base.width(), base.height());
        let live_layer = Pixmap::new(width, height).ok_or(MaskError::Raster { width, height })?;
        let static_layer = base.pixels().clone();

        Ok(Self {
            base,
            static_layer,
            live_layer,
            masks: Vec::new(),
            highlighted: None,
            style,
            generation: 0,
            static_repaints: 0,
            live_repaints: 0,
            highlight_repaints: 0,
        })
    }

    pub fn width(&self) -> u32 {
        self.base.width()
    }

    pub fn height(&self) -> u32 {
        self.base.height()
    }

    pub fn base(&self) -> &DisplayImage {
        &self.base
    }

    // ------------------------------------------------------------------
    // static layer
    // ------------------------------------------------------------------

    /// Start a static repaint. Any earlier ticket becomes stale.
    pub fn begin_repaint(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Finish a repaint started with `ticket`.
    ///
    /// Returns `false` (and draws nothing) when a newer repaint began since.
    pub fn commit_repaint(&mut self, ticket: u64, masks: Vec<DecodedMask>) -> bool {
        if ticket != self.generation {
            debug!(ticket, current = self.generation, "discarding superseded repaint");
            return false;
        }
        self.masks = masks;
        self.paint_static();
        self.static_repaints += 1;
        true
    }

    /// Decode and repaint in one step.
    pub fn repaint_static(&mut self, segments: &[Segment]) {
        let ticket = self.begin_repaint();
        let masks = decode_masks(segments);
        self.commit_repaint(ticket, masks);
    }

    /// Recolor `id` (or clear the highlight) from cached masks.
    pub fn highlight(&mut self, id: Option<&SegmentId>) {
        if self.highlighted.as_ref() == id {
            return;
        }
        self.highlighted = id.cloned();
        self.paint_static();
        self.highlight_repaints += 1;
    }

    pub fn highlighted(&self) -> Option<&SegmentId> {
        self.highlighted.as_ref()
    }

    fn paint_static(&mut self) {
        let mut layer = self.base.pixels().clone();
        let highlight = Rgb::from_hex(&self.style.color).unwrap_or(Rgb::new(255, 212, 0));

        for mask in &self.masks {
            let (color, alpha) = if self.highlighted.as_ref() == Some(&mask.id) {
                (highlight, self.style.alpha)
            } else {
                (mask.color, self.style.segment_alpha)
            };

            for (x, y, px) in mask.pixels.enumerate_pixels() {
                if px[3] == 0 || x >= layer.width() || y >= layer.height() {
                    continue;
                }
                blend(layer.get_pixel_mut(x, y), color, alpha);
            }
        }

        self.static_layer = layer;
    }

    pub fn static_layer(&self) -> &RgbaImage {
        &self.static_layer
    }

    // ------------------------------------------------------------------
    // live layer
    // ------------------------------------------------------------------

    /// Redraw the in-progress polygon.
    ///
    /// Edges join consecutive points; once there are 3 or more a dashed
    /// edge hints at the closing segment. Every vertex gets a marker, the
    /// first one larger.
    pub fn repaint_live(&mut self, points: &[Point], color: Rgb) {
        self.live_layer.fill(Color::TRANSPARENT);
        self.live_repaints += 1;

        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, 255);
        paint.anti_alias = true;

        if points.len() >= 2 {
            let mut pb = PathBuilder::new();
            pb.move_to(points[0].x as f32, points[0].y as f32);
            for p in &points[1..] {
                pb.line_to(p.x as f32, p.y as f32);
            }
            if let Some(path) = pb.finish() {
                let stroke = Stroke { width: EDGE_WIDTH, ..Stroke::default() };
                self.live_layer
                    .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
        }

        if points.len() >= 3 {
            let (first, last) = (points[0], points[points.len() - 1]);
            let mut pb = PathBuilder::new();
            pb.move_to(last.x as f32, last.y as f32);
            pb.line_to(first.x as f32, first.y as f32);
            if let Some(path) = pb.finish() {
                let stroke = Stroke {
                    width: EDGE_WIDTH * 0.5,
                    dash: StrokeDash::new(vec![6.0, 4.0], 0.0),
                    ..Stroke::default()
                };
                self.live_layer
                    .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
        }

        for (i, p) in points.iter().enumerate() {
            let r = if i == 0 { FIRST_VERTEX_RADIUS } else { VERTEX_RADIUS };
            if let Some(circle) = PathBuilder::from_circle(p.x as f32, p.y as f32, r) {
                self.live_layer.fill_path(
                    &circle,
                    &paint,
                    tiny_skia::FillRule::Winding,
                    Transform::identity(),
                    None,
                );
            }
        }
    }

    /// Clear the live overlay (capture finished or cancelled).
    pub fn clear_live(&mut self) {
        self.live_layer.fill(Color::TRANSPARENT);
        self.live_repaints += 1;
    }

    pub fn live_layer(&self) -> &Pixmap {
        &self.live_layer
    }

    /// Live layer blended over the static layer.
    pub fn composite(&self) -> RgbaImage {
        let mut out = self.static_layer.clone();
        let width = self.live_layer.width();

        for (i, px) in self.live_layer.pixels().iter().enumerate() {
            let c = px.demultiply();
            if c.alpha() == 0 {
                continue;
            }
            let (x, y) = (i as u32 % width, i as u32 / width);
            if x >= out.width() || y >= out.height() {
                continue;
            }
            let color = Rgb::new(c.red(), c.green(), c.blue());
            blend(out.get_pixel_mut(x, y), color, c.alpha() as f64 / 255.0);
        }
        out
    }

    // ------------------------------------------------------------------
    // counters
    // ------------------------------------------------------------------

    pub fn static_repaints(&self) -> usize {
        self.static_repaints
    }

    pub fn live_repaints(&self) -> usize {
        self.live_repaints
    }

    pub fn highlight_repaints(&self) -> usize {
        self.highlight_repaints
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Source-over blend of an opaque color at `alpha` onto `dst`.
fn blend(dst: &mut Rgba<u8>, color: Rgb, alpha: f64) {
    let a = alpha.clamp(0.0, 1.0);
    let mix = |d: u8, s: u8| (d as f64 * (1.0 - a) + s as f64 * a).round() as u8;
    dst[0] = mix(dst[0], color.r);
    dst[1] = mix(dst[1], color.g);
    dst[2] = mix(dst[2], color.b);
    dst[3] = dst[3].max((a * 255.0).round() as u8);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DisplayConfig;
    use crate::segment::SegmentKind;

    fn white_base(w: u32, h: u32) -> DisplayImage {
        DisplayImage::from_rgba(
            RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255])),
            DisplayConfig::default(),
        )
    }

    fn triangle() -> Vec<Point> {
        vec![Point::new(10.0, 10.0), Point::new(50.0, 10.0), Point::new(30.0, 50.0)]
    }

    fn layers() -> Layers {
        Layers::new(white_base(64, 64), HighlightConfig::default()).unwrap()
    }

    #[test]
    fn live_repaint_leaves_static_alone() {
        let mut layers = layers();
        layers.repaint_static(&[]);
        let before = layers.static_layer().clone();

        layers.repaint_live(&triangle()[..1], Rgb::BLACK);
        layers.repaint_live(&triangle()[..2], Rgb::BLACK);
        layers.repaint_live(&triangle(), Rgb::BLACK);

        assert_eq!(layers.static_repaints(), 1);
        assert_eq!(layers.live_repaints(), 3);
        assert_eq!(layers.static_layer(), &before);
    }

    #[test]
    fn live_layer_marks_vertices() {
        let mut layers = layers();
        layers.repaint_live(&triangle(), Rgb::new(255, 0, 0));
        let live = layers.live_layer();
        let idx = (10 * live.width() + 10) as usize;
        assert!(live.pixels()[idx].alpha() > 0);
        // Far from any edge or vertex
        let idx = (60 * live.width() + 60) as usize;
        assert_eq!(live.pixels()[idx].alpha(), 0);
    }

    #[test]
    fn segments_tint_static_layer() {
        let mut layers = layers();
        let seg = Segment::from_polygon(SegmentKind::Mouth.into(), triangle(), 64, 64).unwrap();
        layers.repaint_static(std::slice::from_ref(&seg));

        let inside = layers.static_layer().get_pixel(30, 20);
        let outside = layers.static_layer().get_pixel(60, 60);
        assert_ne!(inside, &Rgba([255, 255, 255, 255]));
        assert_eq!(outside, &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn highlight_recolors_without_repainting_static() {
        let mut layers = layers();
        let seg = Segment::from_polygon(SegmentKind::Mouth.into(), triangle(), 64, 64).unwrap();
        layers.repaint_static(std::slice::from_ref(&seg));
        layers.repaint_live(&[Point::new(1.0, 1.0), Point::new(5.0, 5.0)], Rgb::BLACK);
        let live_before = layers.live_layer().clone();
        let tinted = *layers.static_layer().get_pixel(30, 20);

        layers.highlight(Some(&seg.id));
        assert_ne!(*layers.static_layer().get_pixel(30, 20), tinted);
        assert_eq!(layers.static_repaints(), 1);
        assert_eq!(layers.highlight_repaints(), 1);
        assert_eq!(layers.live_layer().data(), live_before.data());

        // Same highlight again is a no-op
        layers.highlight(Some(&seg.id));
        assert_eq!(layers.highlight_repaints(), 1);

        layers.highlight(None);
        assert_eq!(*layers.static_layer().get_pixel(30, 20), tinted);
    }

    #[test]
    fn superseded_repaint_is_discarded() {
        let mut layers = layers();
        let seg = Segment::from_polygon(SegmentKind::Hair.into(), triangle(), 64, 64).unwrap();

        let stale = layers.begin_repaint();
        let fresh = layers.begin_repaint();
        assert!(layers.commit_repaint(fresh, Vec::new()));
        assert!(!layers.commit_repaint(stale, decode_masks(std::slice::from_ref(&seg))));
        assert_eq!(layers.static_layer().get_pixel(30, 20), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn composite_overlays_live_on_static() {
        let mut layers = layers();
        layers.repaint_live(&triangle(), Rgb::new(255, 0, 0));
        let out = layers.composite();
        let p = out.get_pixel(10, 10);
        assert!(p[1] < 255 && p[0] == 255, "vertex marker should be red-ish, got {:?}", p);
        assert_eq!(out.get_pixel(60, 60), &Rgba([255, 255, 255, 255]));
    }
}
