//! Export output checked as documents: well-formedness through usvg and
//! path-data properties over arbitrary point lists.

use dither_seg::config::{ColorStrategy, ExportConfig};
use dither_seg::path::fmt_num;
use dither_seg::patterns::tile_size;
use dither_seg::{
    ExportMode, PatternId, PatternOffset, Point, Segment, SegmentKind, generate_svg, polygon_to_svg_path,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn parses(svg: &str) -> usvg::Tree {
    usvg::Tree::from_str(svg, &usvg::Options::default())
        .unwrap_or_else(|e| panic!("export is not valid SVG: {}\n{}", e, svg))
}

fn segment(kind: SegmentKind, pts: &[(f64, f64)]) -> Segment {
    let points = pts.iter().map(|p| Point::from(*p)).collect();
    Segment::from_polygon(kind.into(), points, 200, 150).unwrap()
}

#[test]
fn empty_export_is_well_formed() {
    let svg = generate_svg(&[], 640, 480, ExportMode::All, &ExportConfig::default());
    let tree = parses(&svg);
    assert_eq!(tree.size().width(), 640.0);
    assert_eq!(tree.size().height(), 480.0);
    // Only the background rect renders
    assert!(tree.root().has_children());
}

#[test]
fn patterned_export_is_well_formed() {
    let segments = vec![
        segment(SegmentKind::Hair, &[(10.0, 10.0), (90.0, 10.0), (50.0, 60.0)]).with_pattern(PatternId::Dots),
        segment(SegmentKind::Face, &[(20.0, 70.0), (120.0, 70.0), (70.0, 140.0)]),
        segment(SegmentKind::Torso, &[(100.0, 10.0), (190.0, 10.0), (150.0, 90.0)])
            .with_pattern(PatternId::Crosshatch)
            .with_offset(PatternOffset::new(3.0, -2.5)),
    ];

    for strategy in [ColorStrategy::Inherit, ColorStrategy::PerColor] {
        let cfg = ExportConfig { color_strategy: strategy, ..ExportConfig::default() };
        for mode in [ExportMode::All, ExportMode::PatternsOnly] {
            parses(&generate_svg(&segments, 200, 150, mode, &cfg));
        }
    }
}

#[test]
fn every_vector_pattern_renders_valid_tiles() {
    for pattern in PatternId::all().iter().filter(|p| !p.is_image_backed()) {
        let seg = segment(SegmentKind::Legs, &[(0.0, 0.0), (100.0, 0.0), (50.0, 80.0)]).with_pattern(*pattern);
        parses(&generate_svg(&[seg], 200, 150, ExportMode::All, &ExportConfig::default()));
    }
}

/// Every `href="…"` value in `svg`.
fn hrefs(svg: &str) -> Vec<&str> {
    svg.split(r#"href=""#)
        .skip(1)
        .filter_map(|rest| rest.split('"').next())
        .collect()
}

#[test]
fn image_patterns_export_valid_documents() {
    let image_patterns: Vec<PatternId> =
        PatternId::all().iter().copied().filter(|p| p.is_image_backed()).collect();
    let cfg = ExportConfig::default();
    let mut files = BTreeSet::new();

    for pattern in &image_patterns {
        let seg = segment(SegmentKind::Hair, &[(0.0, 0.0), (120.0, 0.0), (60.0, 100.0)]).with_pattern(*pattern);
        let svg = generate_svg(&[seg], 200, 150, ExportMode::All, &cfg);
        parses(&svg);
        assert!(svg.contains(r##"<rect x="0" y="0" width="200" height="150" fill="#ffffff"/>"##));
        assert_eq!(hrefs(&svg).len(), 1, "{}", svg);
        files.extend(hrefs(&svg).into_iter().map(str::to_string));
    }

    let segments: Vec<Segment> = image_patterns
        .iter()
        .zip([SegmentKind::Hair, SegmentKind::Face, SegmentKind::Torso])
        .map(|(pattern, kind)| segment(kind, &[(10.0, 10.0), (90.0, 10.0), (50.0, 60.0)]).with_pattern(*pattern))
        .collect();
    let combined = generate_svg(&segments, 200, 150, ExportMode::All, &cfg);
    parses(&combined);
    assert_eq!(hrefs(&combined).len(), 3);

    let expected: BTreeSet<String> = ["dithered_marble_1", "dithered_marble_2", "dithered_nest"]
        .iter()
        .map(|stem| format!("patterns/{stem}.png"))
        .collect();
    assert_eq!(files, expected);
}

#[test]
fn dots_tile_side_tracks_target_size() {
    let dots = PatternId::Dots.definition();
    let cfg = ExportConfig::default();
    assert_eq!(tile_size(&dots, 4000, 4000, &cfg), 48.0);
    assert_eq!(tile_size(&dots, 150, 150, &cfg), 12.0);
}

proptest! {
    #[test]
    fn path_has_one_command_per_point(
        pts in prop::collection::vec((-2000.0f64..2000.0, -2000.0f64..2000.0), 3..40)
    ) {
        let points: Vec<Point> = pts.iter().map(|p| Point::from(*p)).collect();
        let d = polygon_to_svg_path(&points);

        let head = format!("M{},{}", fmt_num(points[0].x), fmt_num(points[0].y));
        prop_assert!(d.starts_with(&head), "{} should start with {}", d, head);
        prop_assert!(d.ends_with(" Z"));
        prop_assert_eq!(d.matches(" L").count(), points.len() - 1);

        for (token, p) in d.split(" L").skip(1).zip(&points[1..]) {
            let expected = format!("{},{}", fmt_num(p.x), fmt_num(p.y));
            prop_assert!(token.starts_with(&expected));
        }
    }

    #[test]
    fn short_side_tiles_stay_in_bounds(w in 1u32..20_000, h in 1u32..20_000) {
        let side = tile_size(&PatternId::Dots.definition(), w, h, &ExportConfig::default());
        prop_assert!((12.0..=48.0).contains(&side));
    }

    #[test]
    fn export_is_deterministic(w in 50u32..600, h in 50u32..600, offset in -20.0f64..20.0) {
        let seg = Segment::from_polygon(
            SegmentKind::Hands.into(),
            vec![Point::new(1.0, 1.0), Point::new(40.0, 1.0), Point::new(20.0, 40.0)],
            w,
            h,
        ).unwrap()
        .with_pattern(PatternId::Stipple)
        .with_offset(PatternOffset::new(offset, 0.0));

        let cfg = ExportConfig::default();
        let a = generate_svg(std::slice::from_ref(&seg), w, h, ExportMode::All, &cfg);
        let b = generate_svg(std::slice::from_ref(&seg), w, h, ExportMode::All, &cfg);
        prop_assert_eq!(a, b);
    }
}
