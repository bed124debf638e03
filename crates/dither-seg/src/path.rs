//! SVG path data generation.
//!
//! Captured polygons are serialized as `M x,y L x,y … Z`. Numbers are
//! rounded to two decimals so identical input always gives identical text.

use std::fmt::Write;

use crate::geometry::Point;

/// Degenerate path used when a segment's geometry can't be recovered.
pub const EMPTY_PATH: &str = "M0 0";

/// Format a coordinate for path data.
///
/// Rounds to two decimals, drops trailing zeros and never prints `-0`.
pub fn fmt_num(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    format!("{}", rounded)
}

/// Serialize an ordered point list as a closed path.
///
/// Move to the first point, line to each subsequent point, close.
/// An empty list gives [`EMPTY_PATH`].
pub fn polygon_to_svg_path(points: &[Point]) -> String {
    let Some((first, rest)) = points.split_first() else {
        return EMPTY_PATH.to_string();
    };

    let mut d = String::with_capacity(points.len() * 14);
    let _ = write!(d, "M{},{}", fmt_num(first.x), fmt_num(first.y));
    for p in rest {
        let _ = write!(d, " L{},{}", fmt_num(p.x), fmt_num(p.y));
    }
    d.push_str(" Z");
    d
}

/// Rounded rectangle covering `(x, y, width, height)`.
///
/// Corner radius is a tenth of the short side, capped at 12px.
pub fn rounded_rect_path(x: f64, y: f64, width: f64, height: f64) -> String {
    let r = (width.min(height) * 0.1).min(12.0).max(0.0);
    let (x1, y1) = (x + width, y + height);

    if r == 0.0 {
        return format!(
            "M{},{} L{},{} L{},{} L{},{} Z",
            fmt_num(x), fmt_num(y),
            fmt_num(x1), fmt_num(y),
            fmt_num(x1), fmt_num(y1),
            fmt_num(x), fmt_num(y1),
        );
    }

    format!(
        "M{},{} L{},{} Q{},{} {},{} L{},{} Q{},{} {},{} L{},{} Q{},{} {},{} L{},{} Q{},{} {},{} Z",
        fmt_num(x + r), fmt_num(y),
        fmt_num(x1 - r), fmt_num(y),
        fmt_num(x1), fmt_num(y), fmt_num(x1), fmt_num(y + r),
        fmt_num(x1), fmt_num(y1 - r),
        fmt_num(x1), fmt_num(y1), fmt_num(x1 - r), fmt_num(y1),
        fmt_num(x + r), fmt_num(y1),
        fmt_num(x), fmt_num(y1), fmt_num(x), fmt_num(y1 - r),
        fmt_num(x), fmt_num(y + r),
        fmt_num(x), fmt_num(y), fmt_num(x + r), fmt_num(y),
    )
}
