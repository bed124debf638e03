//! Segments and the segment collection.
//!
//! A segment is one user-outlined region: identity, mask, equivalent path,
//! and optional pattern assignment. The collection holds at most one
//! segment per id.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::color::Rgb;
use crate::error::{MaskError, SegmentError};
use crate::geometry::{Point, point_in_polygon};
use crate::mask::{SegmentMask, mask_contains, rasterize_polygon};
use crate::path::polygon_to_svg_path;
use crate::patterns::{PatternId, PatternOffset};

// ============================================================================
// TAXONOMY
// ============================================================================

/// Fixed body-part taxonomy for segment identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Hair,
    Face,
    Eyebrows,
    LeftEye,
    RightEye,
    Nose,
    Mouth,
    Ears,
    Neck,
    Torso,
    LeftArm,
    RightArm,
    Hands,
    Legs,
    Feet,
    Background,
}

impl SegmentKind {
    pub fn all() -> &'static [SegmentKind] {
        &[
            SegmentKind::Hair,
            SegmentKind::Face,
            SegmentKind::Eyebrows,
            SegmentKind::LeftEye,
            SegmentKind::RightEye,
            SegmentKind::Nose,
            SegmentKind::Mouth,
            SegmentKind::Ears,
            SegmentKind::Neck,
            SegmentKind::Torso,
            SegmentKind::LeftArm,
            SegmentKind::RightArm,
            SegmentKind::Hands,
            SegmentKind::Legs,
            SegmentKind::Feet,
            SegmentKind::Background,
        ]
    }

    /// Stable identifier, used in `data-segment` and file names.
    pub fn slug(&self) -> &'static str {
        match self {
            SegmentKind::Hair => "hair",
            SegmentKind::Face => "face",
            SegmentKind::Eyebrows => "eyebrows",
            SegmentKind::LeftEye => "left-eye",
            SegmentKind::RightEye => "right-eye",
            SegmentKind::Nose => "nose",
            SegmentKind::Mouth => "mouth",
            SegmentKind::Ears => "ears",
            SegmentKind::Neck => "neck",
            SegmentKind::Torso => "torso",
            SegmentKind::LeftArm => "left-arm",
            SegmentKind::RightArm => "right-arm",
            SegmentKind::Hands => "hands",
            SegmentKind::Legs => "legs",
            SegmentKind::Feet => "feet",
            SegmentKind::Background => "background",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SegmentKind::Hair => "Hair",
            SegmentKind::Face => "Face",
            SegmentKind::Eyebrows => "Eyebrows",
            SegmentKind::LeftEye => "Left Eye",
            SegmentKind::RightEye => "Right Eye",
            SegmentKind::Nose => "Nose",
            SegmentKind::Mouth => "Mouth",
            SegmentKind::Ears => "Ears",
            SegmentKind::Neck => "Neck",
            SegmentKind::Torso => "Torso",
            SegmentKind::LeftArm => "Left Arm",
            SegmentKind::RightArm => "Right Arm",
            SegmentKind::Hands => "Hands",
            SegmentKind::Legs => "Legs",
            SegmentKind::Feet => "Feet",
            SegmentKind::Background => "Background",
        }
    }

    pub fn color(&self) -> Rgb {
        match self {
            SegmentKind::Hair => Rgb::new(0x8b, 0x45, 0x13),
            SegmentKind::Face => Rgb::new(0xe0, 0x8e, 0x5a),
            SegmentKind::Eyebrows => Rgb::new(0x5c, 0x33, 0x17),
            SegmentKind::LeftEye => Rgb::new(0x1e, 0x90, 0xff),
            SegmentKind::RightEye => Rgb::new(0x41, 0x69, 0xe1),
            SegmentKind::Nose => Rgb::new(0xff, 0x7f, 0x50),
            SegmentKind::Mouth => Rgb::new(0xdc, 0x14, 0x3c),
            SegmentKind::Ears => Rgb::new(0xc8, 0x8a, 0x4f),
            SegmentKind::Neck => Rgb::new(0xd2, 0x69, 0x1e),
            SegmentKind::Torso => Rgb::new(0x2e, 0x8b, 0x57),
            SegmentKind::LeftArm => Rgb::new(0x9a, 0xcd, 0x32),
            SegmentKind::RightArm => Rgb::new(0x6b, 0x8e, 0x23),
            SegmentKind::Hands => Rgb::new(0xff, 0xa0, 0x7a),
            SegmentKind::Legs => Rgb::new(0x46, 0x82, 0xb4),
            SegmentKind::Feet => Rgb::new(0x70, 0x80, 0x90),
            SegmentKind::Background => Rgb::new(0x80, 0x80, 0x80),
        }
    }

    pub fn from_slug(slug: &str) -> Option<SegmentKind> {
        SegmentKind::all().iter().copied().find(|k| k.slug() == slug)
    }
}

/// Color for segments outside the taxonomy.
pub const CUSTOM_SEGMENT_COLOR: Rgb = Rgb::new(0x9b, 0x30, 0xff);

/// Segment identity: a taxonomy kind or a free-form custom id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SegmentId {
    Kind(SegmentKind),
    Custom(String),
}

impl SegmentId {
    /// Known slugs map to their kind; anything else is custom.
    pub fn parse(raw: &str) -> SegmentId {
        let trimmed = raw.trim();
        match SegmentKind::from_slug(&trimmed.to_lowercase()) {
            Some(kind) => SegmentId::Kind(kind),
            None => SegmentId::Custom(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SegmentId::Kind(kind) => kind.slug(),
            SegmentId::Custom(id) => id,
        }
    }

    /// Stroke/fill color for this identity. Total: custom ids get
    /// [`CUSTOM_SEGMENT_COLOR`].
    pub fn color(&self) -> Rgb {
        match self {
            SegmentId::Kind(kind) => kind.color(),
            SegmentId::Custom(_) => CUSTOM_SEGMENT_COLOR,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            SegmentId::Kind(kind) => kind.display_name().to_string(),
            SegmentId::Custom(id) => id.clone(),
        }
    }

    /// Id reduced to characters safe in a file name.
    pub fn file_stem(&self) -> String {
        let stem: String = self
            .as_str()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
            .collect();
        if stem.is_empty() { "segment".to_string() } else { stem }
    }
}

impl From<SegmentKind> for SegmentId {
    fn from(kind: SegmentKind) -> Self {
        SegmentId::Kind(kind)
    }
}

impl From<&str> for SegmentId {
    fn from(raw: &str) -> Self {
        SegmentId::parse(raw)
    }
}

impl From<String> for SegmentId {
    fn from(raw: String) -> Self {
        SegmentId::parse(&raw)
    }
}

impl From<SegmentId> for String {
    fn from(id: SegmentId) -> Self {
        id.as_str().to_string()
    }
}

impl std::fmt::Display for SegmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SEGMENT
// ============================================================================

/// One outlined region of the source image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: SegmentId,
    pub name: String,
    pub mask: SegmentMask,
    /// Vector equivalent of `mask`. `None` only for mask-only segments.
    pub path: Option<String>,
    /// Anchor points the segment was captured from.
    #[serde(default)]
    pub points: Vec<Point>,
    #[serde(default)]
    pub pattern: Option<PatternId>,
    #[serde(default)]
    pub offset: Option<PatternOffset>,
}

impl Segment {
    /// Build a segment from a closed polygon.
    ///
    /// Mask and path come from the same point list, so they always agree.
    pub fn from_polygon(
        id: SegmentId,
        points: Vec<Point>,
        canvas_width: u32,
        canvas_height: u32,
    ) -> Result<Self, MaskError> {
        let image = rasterize_polygon(&points, canvas_width, canvas_height, id.color())?;
        let mask = SegmentMask::from_image(&image)?;
        let path = polygon_to_svg_path(&points);

        Ok(Self {
            name: id.display_name(),
            id,
            mask,
            path: Some(path),
            points,
            pattern: None,
            offset: None,
        })
    }

    /// A segment known only by its mask; export falls back to a coarse path.
    pub fn from_mask(id: SegmentId, mask: SegmentMask) -> Self {
        Self {
            name: id.display_name(),
            id,
            mask,
            path: None,
            points: Vec::new(),
            pattern: None,
            offset: None,
        }
    }

    pub fn with_pattern(mut self, pattern: PatternId) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn with_offset(mut self, offset: PatternOffset) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn color(&self) -> Rgb {
        self.id.color()
    }

    /// Whether the point lies inside this segment.
    ///
    /// Uses the anchor polygon when present, otherwise decodes the mask.
    pub fn contains(&self, point: Point) -> bool {
        if self.points.len() >= 3 {
            return point_in_polygon(point.x, point.y, &self.points);
        }
        self.mask
            .decode()
            .map(|img| mask_contains(&img, point.x, point.y))
            .unwrap_or(false)
    }
}

// ============================================================================
// COLLECTION
// ============================================================================

/// Segments keyed by id, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentStore {
    segments: Vec<Segment>,
}

impl SegmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a segment, replacing any existing one with the same id.
    ///
    /// The replacement goes to the end of the order. Returns the old one.
    pub fn upsert(&mut self, segment: Segment) -> Option<Segment> {
        let replaced = self
            .segments
            .iter()
            .position(|s| s.id == segment.id)
            .map(|i| self.segments.remove(i));

        if replaced.is_some() {
            info!(segment = %segment.id, "replacing segment");
        } else {
            info!(segment = %segment.id, "adding segment");
        }
        self.segments.push(segment);
        replaced
    }

    pub fn get(&self, id: &SegmentId) -> Option<&Segment> {
        self.segments.iter().find(|s| &s.id == id)
    }

    fn get_mut(&mut self, id: &SegmentId) -> Result<&mut Segment, SegmentError> {
        self.segments
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| SegmentError::NotFound(id.to_string()))
    }

    pub fn remove(&mut self, id: &SegmentId) -> Option<Segment> {
        let index = self.segments.iter().position(|s| &s.id == id)?;
        Some(self.segments.remove(index))
    }

    /// Assign or clear a segment's pattern.
    pub fn set_pattern(&mut self, id: &SegmentId, pattern: Option<PatternId>) -> Result<(), SegmentError> {
        let segment = self.get_mut(id)?;
        debug!(segment = %id, pattern = ?pattern, "pattern changed");
        segment.pattern = pattern;
        Ok(())
    }

    pub fn set_offset(&mut self, id: &SegmentId, offset: PatternOffset) -> Result<(), SegmentError> {
        let segment = self.get_mut(id)?;
        debug!(segment = %id, x = offset.x, y = offset.y, "pattern offset changed");
        segment.offset = Some(offset);
        Ok(())
    }

    /// Topmost (most recently added) segment containing the point.
    pub fn segment_at(&self, point: Point) -> Option<&Segment> {
        self.segments.iter().rev().find(|s| s.contains(point))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    pub fn as_slice(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(offset: f64) -> Vec<Point> {
        vec![
            Point::new(10.0 + offset, 10.0),
            Point::new(40.0 + offset, 10.0),
            Point::new(25.0 + offset, 40.0),
        ]
    }

    #[test]
    fn taxonomy_slugs_parse_back() {
        for kind in SegmentKind::all() {
            assert_eq!(SegmentId::parse(kind.slug()), SegmentId::Kind(*kind));
        }
        assert_eq!(SegmentId::parse("Hair"), SegmentId::Kind(SegmentKind::Hair));
        assert_eq!(SegmentId::parse("tattoo"), SegmentId::Custom("tattoo".to_string()));
    }

    #[test]
    fn custom_ids_get_the_default_color() {
        let custom = SegmentId::parse("scarf");
        assert_eq!(custom.color(), CUSTOM_SEGMENT_COLOR);
        assert_eq!(SegmentId::from(SegmentKind::Hair).color(), SegmentKind::Hair.color());
    }

    #[test]
    fn file_stem_is_sanitized() {
        assert_eq!(SegmentId::parse("my scarf/1").file_stem(), "my-scarf-1");
        assert_eq!(SegmentId::parse("left-eye").file_stem(), "left-eye");
    }

    #[test]
    fn polygon_segment_has_matching_mask_and_path() {
        let seg = Segment::from_polygon(SegmentKind::Face.into(), triangle(0.0), 64, 64).unwrap();
        assert_eq!(seg.path.as_deref(), Some("M10,10 L40,10 L25,40 Z"));
        let img = seg.mask.decode().unwrap();
        assert_eq!(img.get_pixel(25, 20)[3], 255);
        assert_eq!(img.get_pixel(5, 5)[3], 0);
        assert_eq!(seg.name, "Face");
    }

    #[test]
    fn upsert_replaces_same_id() {
        let mut store = SegmentStore::new();
        let first = Segment::from_polygon(SegmentKind::Hair.into(), triangle(0.0), 64, 64).unwrap();
        let second = Segment::from_polygon(SegmentKind::Hair.into(), triangle(10.0), 64, 64).unwrap();

        assert!(store.upsert(first.clone()).is_none());
        let replaced = store.upsert(second.clone()).unwrap();

        assert_eq!(replaced, first);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&SegmentKind::Hair.into()), Some(&second));
    }

    #[test]
    fn pattern_and_offset_updates() {
        let mut store = SegmentStore::new();
        let id: SegmentId = SegmentKind::Nose.into();
        store.upsert(Segment::from_polygon(id.clone(), triangle(0.0), 64, 64).unwrap());

        store.set_pattern(&id, Some(PatternId::Dots)).unwrap();
        store.set_offset(&id, PatternOffset::new(2.0, 3.0)).unwrap();
        let seg = store.get(&id).unwrap();
        assert_eq!(seg.pattern, Some(PatternId::Dots));
        assert_eq!(seg.offset, Some(PatternOffset::new(2.0, 3.0)));

        let missing = store.set_pattern(&SegmentKind::Feet.into(), None);
        assert_eq!(missing, Err(SegmentError::NotFound("feet".to_string())));
    }

    #[test]
    fn hit_test_prefers_latest() {
        let mut store = SegmentStore::new();
        store.upsert(Segment::from_polygon(SegmentKind::Face.into(), triangle(0.0), 64, 64).unwrap());
        store.upsert(Segment::from_polygon(SegmentKind::Nose.into(), triangle(0.0), 64, 64).unwrap());

        let hit = store.segment_at(Point::new(25.0, 20.0)).unwrap();
        assert_eq!(hit.id, SegmentId::Kind(SegmentKind::Nose));
        assert!(store.segment_at(Point::new(60.0, 60.0)).is_none());
    }

    #[test]
    fn mask_only_segment_hit_tests_by_pixels() {
        let img = rasterize_polygon(&triangle(0.0), 64, 64, Rgb::BLACK).unwrap();
        let seg = Segment::from_mask("blob".into(), SegmentMask::from_image(&img).unwrap());
        assert!(seg.path.is_none());
        assert!(seg.contains(Point::new(25.0, 20.0)));
        assert!(!seg.contains(Point::new(2.0, 2.0)));
    }
}
