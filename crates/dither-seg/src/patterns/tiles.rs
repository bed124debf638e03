//! Inline SVG bodies for the vector tiles.
//!
//! Each body is drawn in its pattern's `base_size` square and scaled by the
//! `<pattern>` viewBox. `paint` is either `currentColor` or a hex color.

use std::fmt::Write;

use super::PatternId;

/// Classic 4x4 ordered-dither threshold matrix.
const BAYER_4X4: [[u8; 4]; 4] = [
    [0, 8, 2, 10],
    [12, 4, 14, 6],
    [3, 11, 1, 9],
    [15, 7, 13, 5],
];

/// Cells below this threshold are inked (50% coverage).
const BAYER_LEVEL: u8 = 8;

const STIPPLE_SEED: u64 = 0x5eed_d07;
const STIPPLE_DOTS: usize = 28;

/// SVG markup for a vector tile. Image-backed patterns have no body.
pub fn vector_tile_body(pattern: PatternId, paint: &str) -> String {
    match pattern {
        PatternId::Dots => format!(r#"<circle cx="6" cy="6" r="2.5" fill="{paint}"/>"#),
        PatternId::DenseDots => format!(
            r#"<circle cx="2" cy="2" r="1.5" fill="{paint}"/><circle cx="6" cy="6" r="1.5" fill="{paint}"/>"#
        ),
        PatternId::Lines => format!(r#"<rect x="0" y="0" width="10" height="3" fill="{paint}"/>"#),
        PatternId::Diagonal => format!(
            r#"<path d="M-2.5,2.5 L2.5,-2.5 M0,10 L10,0 M7.5,12.5 L12.5,7.5" stroke="{paint}" stroke-width="2" fill="none"/>"#
        ),
        PatternId::Crosshatch => format!(
            r#"<path d="M0,0 L10,10 M10,0 L0,10" stroke="{paint}" stroke-width="1.5" fill="none"/>"#
        ),
        PatternId::Checker => format!(
            r#"<rect x="0" y="0" width="4" height="4" fill="{paint}"/><rect x="4" y="4" width="4" height="4" fill="{paint}"/>"#
        ),
        PatternId::Bayer => bayer_body(paint),
        PatternId::Stipple => stipple_body(paint),
        PatternId::Zigzag => format!(
            r#"<polyline points="0,9 3,3 6,9 9,3 12,9" stroke="{paint}" stroke-width="1.5" fill="none"/>"#
        ),
        PatternId::Marble1 | PatternId::Marble2 | PatternId::Nest => String::new(),
    }
}

fn bayer_body(paint: &str) -> String {
    let mut body = String::new();
    for (y, row) in BAYER_4X4.iter().enumerate() {
        for (x, &threshold) in row.iter().enumerate() {
            if threshold < BAYER_LEVEL {
                let _ = write!(
                    body,
                    r#"<rect x="{x}" y="{y}" width="1" height="1" fill="{paint}"/>"#
                );
            }
        }
    }
    body
}

/// Fixed pseudo-random dot scatter. Same seed every time, so exports stay
/// byte-identical.
fn stipple_body(paint: &str) -> String {
    let mut state = STIPPLE_SEED;
    let mut next = || {
        // MMIX LCG constants
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };

    let mut body = String::new();
    for _ in 0..STIPPLE_DOTS {
        let cx = (next() * 320.0).round() / 10.0;
        let cy = (next() * 320.0).round() / 10.0;
        let r = 0.8 + (next() * 8.0).round() / 10.0;
        let _ = write!(body, r#"<circle cx="{cx}" cy="{cy}" r="{r:.1}" fill="{paint}"/>"#);
    }
    body
}
