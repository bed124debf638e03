//! Polygon capture state machine.
//!
//! ```text
//! Idle ──select(id)──▶ Capturing { id, [] }
//!                        │  click far from first point → push point
//!                        │  click near first point (≥3) → Completed
//!                        │  double click (≥3)          → Completed
//!                        ◀──────── points cleared, same id
//! any ──select(other)──▶ Capturing { other, [] }   (pending points dropped)
//! any ──select(None)───▶ Idle
//! ```
//!
//! The state is a plain value owned by whoever drives it; nothing here
//! touches pixels. Finalization with too few points is a silent no-op.

use tracing::debug;

use crate::config::CaptureConfig;
use crate::geometry::Point;
use crate::segment::SegmentId;

/// A polygon that was just closed.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedShape {
    pub segment: SegmentId,
    pub points: Vec<Point>,
}

/// What a pointer event did to the capture.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    /// No segment type selected, or too few points to close.
    Ignored,
    /// A vertex was appended; carries the new vertex count.
    PointAdded(usize),
    Completed(CompletedShape),
}

/// Current capture phase.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Capturing { segment: SegmentId, points: Vec<Point> },
}

impl CaptureState {
    /// Change the active segment type. Pending points are always dropped.
    pub fn select(&mut self, segment: Option<SegmentId>) {
        if let CaptureState::Capturing { segment: current, points } = self {
            if !points.is_empty() {
                debug!(segment = %current, discarded = points.len(), "capture cancelled");
            }
        }
        *self = match segment {
            Some(segment) => CaptureState::Capturing { segment, points: Vec::new() },
            None => CaptureState::Idle,
        };
    }

    /// Primary click at a canvas-space point.
    pub fn click(&mut self, at: Point, config: &CaptureConfig) -> CaptureEvent {
        let CaptureState::Capturing { points, .. } = self else {
            return CaptureEvent::Ignored;
        };

        let min = config.min_vertices.max(3);
        let closes = points.len() >= min
            && points
                .first()
                .is_some_and(|first| first.distance(at) <= config.close_radius);

        if closes {
            return self.finalize(config);
        }

        points.push(at);
        CaptureEvent::PointAdded(points.len())
    }

    /// Explicit completion gesture; no proximity requirement.
    pub fn double_click(&mut self, config: &CaptureConfig) -> CaptureEvent {
        self.finalize(config)
    }

    /// Close the polygon if it has enough vertices.
    pub fn finalize(&mut self, config: &CaptureConfig) -> CaptureEvent {
        let CaptureState::Capturing { segment, points } = self else {
            return CaptureEvent::Ignored;
        };

        if points.len() < config.min_vertices.max(3) {
            debug!(segment = %segment, points = points.len(), "finalize ignored, not enough points");
            return CaptureEvent::Ignored;
        }

        let shape = CompletedShape {
            segment: segment.clone(),
            points: std::mem::take(points),
        };
        debug!(segment = %shape.segment, points = shape.points.len(), "polygon closed");
        CaptureEvent::Completed(shape)
    }

    /// Reopen a closed shape so its vertices can be closed again.
    pub fn restore(&mut self, shape: CompletedShape) {
        debug!(segment = %shape.segment, points = shape.points.len(), "capture restored");
        *self = CaptureState::Capturing { segment: shape.segment, points: shape.points };
    }

    pub fn points(&self) -> &[Point] {
        match self {
            CaptureState::Idle => &[],
            CaptureState::Capturing { points, .. } => points,
        }
    }

    pub fn active_segment(&self) -> Option<&SegmentId> {
        match self {
            CaptureState::Idle => None,
            CaptureState::Capturing { segment, .. } => Some(segment),
        }
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self, CaptureState::Capturing { .. })
    }
}

/// Maps pointer positions on the displayed element to canvas pixels.
///
/// The element may be drawn at any size; each axis is scaled by
/// `canvas / rect` independently.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasMapping {
    pub rect_left: f64,
    pub rect_top: f64,
    pub rect_width: f64,
    pub rect_height: f64,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl CanvasMapping {
    /// Mapping for a canvas drawn 1:1 at the origin.
    pub fn identity(canvas_width: u32, canvas_height: u32) -> Self {
        Self {
            rect_left: 0.0,
            rect_top: 0.0,
            rect_width: canvas_width as f64,
            rect_height: canvas_height as f64,
            canvas_width,
            canvas_height,
        }
    }

    pub fn to_canvas(&self, client_x: f64, client_y: f64) -> Point {
        let sx = if self.rect_width > 0.0 { self.canvas_width as f64 / self.rect_width } else { 1.0 };
        let sy = if self.rect_height > 0.0 { self.canvas_height as f64 / self.rect_height } else { 1.0 };
        Point::new((client_x - self.rect_left) * sx, (client_y - self.rect_top) * sy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::SegmentKind;

    fn cfg() -> CaptureConfig {
        CaptureConfig::default()
    }

    fn capturing(kind: SegmentKind) -> CaptureState {
        let mut state = CaptureState::default();
        state.select(Some(kind.into()));
        state
    }

    #[test]
    fn idle_ignores_clicks() {
        let mut state = CaptureState::Idle;
        assert_eq!(state.click(Point::new(1.0, 1.0), &cfg()), CaptureEvent::Ignored);
        assert_eq!(state.double_click(&cfg()), CaptureEvent::Ignored);
    }

    #[test]
    fn clicks_append_points() {
        let mut state = capturing(SegmentKind::Hair);
        assert_eq!(state.click(Point::new(0.0, 0.0), &cfg()), CaptureEvent::PointAdded(1));
        assert_eq!(state.click(Point::new(100.0, 0.0), &cfg()), CaptureEvent::PointAdded(2));
        assert_eq!(state.points().len(), 2);
    }

    #[test]
    fn near_first_point_with_two_points_adds_instead_of_closing() {
        let mut state = capturing(SegmentKind::Hair);
        state.click(Point::new(0.0, 0.0), &cfg());
        state.click(Point::new(100.0, 0.0), &cfg());
        assert_eq!(state.click(Point::new(5.0, 5.0), &cfg()), CaptureEvent::PointAdded(3));
    }

    #[test]
    fn click_near_first_point_closes() {
        let mut state = capturing(SegmentKind::Face);
        for p in [(0.0, 0.0), (100.0, 0.0), (50.0, 80.0)] {
            state.click(p.into(), &cfg());
        }
        let event = state.click(Point::new(10.0, 10.0), &cfg());
        let CaptureEvent::Completed(shape) = event else {
            panic!("expected completion, got {:?}", event);
        };
        assert_eq!(shape.points.len(), 3);
        assert_eq!(shape.segment, SegmentKind::Face.into());
        // Back to capturing the same type with nothing pending
        assert!(state.points().is_empty());
        assert_eq!(state.active_segment(), Some(&SegmentKind::Face.into()));
    }

    #[test]
    fn click_just_outside_radius_adds_point() {
        let mut state = capturing(SegmentKind::Face);
        for p in [(0.0, 0.0), (100.0, 0.0), (50.0, 80.0)] {
            state.click(p.into(), &cfg());
        }
        assert_eq!(state.click(Point::new(15.5, 0.0), &cfg()), CaptureEvent::PointAdded(4));
    }

    #[test]
    fn double_click_needs_three_points() {
        let mut state = capturing(SegmentKind::Nose);
        state.click(Point::new(0.0, 0.0), &cfg());
        state.click(Point::new(50.0, 0.0), &cfg());
        assert_eq!(state.double_click(&cfg()), CaptureEvent::Ignored);
        // Points survive the ignored finalize
        assert_eq!(state.points().len(), 2);

        state.click(Point::new(25.0, 40.0), &cfg());
        assert!(matches!(state.double_click(&cfg()), CaptureEvent::Completed(_)));
    }

    #[test]
    fn switching_type_discards_points() {
        let mut state = capturing(SegmentKind::Hair);
        state.click(Point::new(0.0, 0.0), &cfg());
        state.click(Point::new(50.0, 0.0), &cfg());

        state.select(Some(SegmentKind::Face.into()));
        assert!(state.points().is_empty());
        state.select(Some(SegmentKind::Hair.into()));
        assert!(state.points().is_empty());

        state.select(None);
        assert_eq!(state, CaptureState::Idle);
    }

    #[test]
    fn mapping_scales_each_axis() {
        let mapping = CanvasMapping {
            rect_left: 10.0,
            rect_top: 20.0,
            rect_width: 400.0,
            rect_height: 150.0,
            canvas_width: 800,
            canvas_height: 600,
        };
        assert_eq!(mapping.to_canvas(10.0, 20.0), Point::new(0.0, 0.0));
        assert_eq!(mapping.to_canvas(210.0, 95.0), Point::new(400.0, 300.0));
        assert_eq!(CanvasMapping::identity(800, 600).to_canvas(3.0, 4.0), Point::new(3.0, 4.0));
    }
}
