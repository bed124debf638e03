//! Path data → polygon rings, for hit-testing uploaded paths.
//!
//! svgtypes normalizes the `d` attribute to absolute move/line/curve/close
//! commands (arcs and shorthands are expanded), then curves are flattened
//! with lyon_geom.

use lyon_geom::{CubicBezierSegment, QuadraticBezierSegment, point};
use svgtypes::{SimplePathSegment, SimplifyingPathParser};

use crate::geometry::{Point, point_in_rings};

/// Flattening tolerance in user units. Sub-pixel at any canvas size we show.
const CURVE_TOLERANCE: f64 = 0.25;

/// True when `d` parses cleanly and contains at least one command.
pub fn is_valid_path_data(d: &str) -> bool {
    let mut count = 0usize;
    for segment in SimplifyingPathParser::from(d) {
        if segment.is_err() {
            return false;
        }
        count += 1;
    }
    count > 0
}

/// Flatten path data into closed rings, one per subpath.
///
/// Subpaths with fewer than three vertices enclose nothing and are dropped.
pub fn path_rings(d: &str) -> Result<Vec<Vec<Point>>, svgtypes::Error> {
    let mut rings = Vec::new();
    let mut ring: Vec<Point> = Vec::new();
    let mut current = Point::new(0.0, 0.0);
    let mut start = current;

    fn flush(ring: &mut Vec<Point>, rings: &mut Vec<Vec<Point>>) {
        let done = std::mem::take(ring);
        if done.len() >= 3 {
            rings.push(done);
        }
    }

    for segment in SimplifyingPathParser::from(d) {
        match segment? {
            SimplePathSegment::MoveTo { x, y } => {
                flush(&mut ring, &mut rings);
                current = Point::new(x, y);
                start = current;
                ring.push(current);
            }
            SimplePathSegment::LineTo { x, y } => {
                if ring.is_empty() {
                    ring.push(current);
                }
                current = Point::new(x, y);
                ring.push(current);
            }
            SimplePathSegment::Quadratic { x1, y1, x, y } => {
                if ring.is_empty() {
                    ring.push(current);
                }
                let curve = QuadraticBezierSegment {
                    from: point(current.x, current.y),
                    ctrl: point(x1, y1),
                    to: point(x, y),
                };
                curve.for_each_flattened(CURVE_TOLERANCE, &mut |line| {
                    ring.push(Point::new(line.to.x, line.to.y));
                });
                current = Point::new(x, y);
            }
            SimplePathSegment::CurveTo { x1, y1, x2, y2, x, y } => {
                if ring.is_empty() {
                    ring.push(current);
                }
                let curve = CubicBezierSegment {
                    from: point(current.x, current.y),
                    ctrl1: point(x1, y1),
                    ctrl2: point(x2, y2),
                    to: point(x, y),
                };
                curve.for_each_flattened(CURVE_TOLERANCE, &mut |line| {
                    ring.push(Point::new(line.to.x, line.to.y));
                });
                current = Point::new(x, y);
            }
            SimplePathSegment::ClosePath => {
                flush(&mut ring, &mut rings);
                current = start;
            }
        }
    }
    flush(&mut ring, &mut rings);

    Ok(rings)
}

/// Flattened outline of one uploaded path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outline {
    rings: Vec<Vec<Point>>,
}

impl Outline {
    /// Outline for `d`; unparseable data gives an outline that contains nothing.
    pub fn from_path_data(d: &str) -> Self {
        Self { rings: path_rings(d).unwrap_or_default() }
    }

    /// Even-odd containment, the way a browser hit-tests a filled path.
    pub fn contains(&self, at: Point) -> bool {
        point_in_rings(at.x, at.y, &self.rings)
    }

    pub fn rings(&self) -> &[Vec<Point>] {
        &self.rings
    }
}
