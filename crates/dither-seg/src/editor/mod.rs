//! Pattern editor for uploaded SVG documents.
//!
//! An existing SVG (typically a previous export) is parsed into a path
//! list; the user selects paths by key or by clicking, assigns patterns and
//! offsets, and regenerates a patterned document. Assignments live in their
//! own map keyed by path key, separate from any [`SegmentStore`].
//!
//! [`SegmentStore`]: crate::segment::SegmentStore

mod document;
mod outline;

pub use document::{DEFAULT_DOCUMENT_SIZE, ParsedDocument, UploadedDocument, UploadedPath, parse_document};
pub use outline::{Outline, is_valid_path_data, path_rings};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::color::Rgb;
use crate::config::ExportConfig;
use crate::error::EditorError;
use crate::export::{ExportedDocument, ShapeFill, ShapeSpec, render_document};
use crate::geometry::Point;
use crate::patterns::{PatternId, PatternOffset, TileRequest};
use crate::segment::SegmentId;

/// Shown instead of the path list when a document yields nothing editable.
pub const EMPTY_STATE_MESSAGE: &str =
    "No editable paths found. Upload an SVG containing <path> elements, such as a segment export.";

// ============================================================================
// ASSIGNMENTS
// ============================================================================

/// Pattern state for one uploaded path.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Assignment {
    pub pattern: Option<PatternId>,
    #[serde(default)]
    pub offset: PatternOffset,
}

/// Path key → assignment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternAssignments {
    entries: BTreeMap<String, Assignment>,
}

impl PatternAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear the pattern for a path, keeping any offset.
    pub fn assign(&mut self, key: &str, pattern: Option<PatternId>) {
        self.entries.entry(key.to_string()).or_default().pattern = pattern;
    }

    pub fn set_offset(&mut self, key: &str, offset: PatternOffset) {
        self.entries.entry(key.to_string()).or_default().offset = offset;
    }

    /// Forget everything about a path.
    pub fn clear(&mut self, key: &str) -> Option<Assignment> {
        self.entries.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Assignment> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Assignment)> {
        self.entries.iter().map(|(k, a)| (k.as_str(), a))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// REGENERATION
// ============================================================================

/// Color that `currentColor` should resolve to for a path.
///
/// A solid fill wins, then a solid stroke, then the taxonomy color of its
/// `data-segment`, then black.
fn context_color(path: &UploadedPath) -> Rgb {
    path.fill
        .as_deref()
        .and_then(Rgb::from_hex)
        .or_else(|| path.stroke.as_deref().and_then(Rgb::from_hex))
        .or_else(|| path.segment.as_deref().map(|s| SegmentId::parse(s).color()))
        .unwrap_or(Rgb::BLACK)
}

/// Assignments implied by paths already filled with one of our tiles, so a
/// re-uploaded export starts with the patterns it was exported with.
pub fn assignments_from_fills(parsed: &ParsedDocument) -> PatternAssignments {
    let mut assignments = PatternAssignments::new();
    for path in &parsed.paths {
        if let Some(tile) = path.fill.as_deref().and_then(TileRequest::from_paint) {
            assignments.assign(&path.key, Some(tile.pattern));
            assignments.set_offset(&path.key, tile.offset);
        }
    }
    assignments
}

/// Rebuild a document from its parsed paths with patterns applied.
///
/// Paths keep their own stroke. Assigned paths get a tile reference
/// resolved through the same tile dedup and color-context grouping as
/// segment export. Unassigned paths keep a solid fill; a `url(…)` fill
/// can't be kept (the source `<defs>` are not carried over) and becomes
/// the translucent unpatterned fill.
pub fn regenerate(parsed: &ParsedDocument, assignments: &PatternAssignments, config: &ExportConfig) -> String {
    let shapes: Vec<ShapeSpec> = parsed
        .paths
        .iter()
        .map(|path| {
            let assignment = assignments.get(&path.key).copied().unwrap_or_default();
            let fill = match (assignment.pattern, path.fill.as_deref()) {
                (Some(pattern), _) => ShapeFill::Pattern { pattern, offset: assignment.offset },
                (None, Some(paint)) if paint.trim_start().starts_with("url(") => {
                    ShapeFill::CurrentColor { opacity: config.unpatterned_opacity }
                }
                (None, Some(paint)) => ShapeFill::Paint(paint.to_string()),
                // SVG's initial fill is black
                (None, None) => ShapeFill::Paint("#000000".to_string()),
            };
            ShapeSpec {
                key: path.key.clone(),
                d: path.d.clone(),
                color: context_color(path),
                stroke: Some(path.stroke.clone().unwrap_or_else(|| "none".to_string())),
                stroke_width: path.stroke_width.clone(),
                fill,
            }
        })
        .collect();

    render_document(&shapes, parsed.width, parsed.height, config)
}

// ============================================================================
// SESSION
// ============================================================================

/// Editor state for one uploaded document.
#[derive(Debug, Clone)]
pub struct EditorSession {
    document: UploadedDocument,
    parsed: ParsedDocument,
    outlines: Vec<Outline>,
    selected: Option<String>,
    assignments: PatternAssignments,
}

impl EditorSession {
    /// Open a document. Unreadable documents open with no paths.
    pub fn open(document: UploadedDocument) -> Self {
        let parsed = match document.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(document = %document.name, error = %e, "could not parse uploaded SVG");
                ParsedDocument::empty()
            }
        };
        let outlines = parsed.paths.iter().map(|p| Outline::from_path_data(&p.d)).collect();
        let assignments = assignments_from_fills(&parsed);

        info!(
            document = %document.name,
            id = %document.id,
            paths = parsed.paths.len(),
            patterned = assignments.len(),
            "opened document"
        );
        Self {
            document,
            parsed,
            outlines,
            selected: None,
            assignments,
        }
    }

    pub fn document(&self) -> &UploadedDocument {
        &self.document
    }

    pub fn parsed(&self) -> &ParsedDocument {
        &self.parsed
    }

    pub fn paths(&self) -> &[UploadedPath] {
        &self.parsed.paths
    }

    pub fn assignments(&self) -> &PatternAssignments {
        &self.assignments
    }

    pub fn is_empty(&self) -> bool {
        self.parsed.paths.is_empty()
    }

    pub fn empty_state_message(&self) -> Option<&'static str> {
        self.is_empty().then_some(EMPTY_STATE_MESSAGE)
    }

    fn require(&self, key: &str) -> Result<(), EditorError> {
        match self.parsed.path(key) {
            Some(_) => Ok(()),
            None => Err(EditorError::UnknownPath(key.to_string())),
        }
    }

    /// Select a path by key.
    pub fn select(&mut self, key: &str) -> Result<(), EditorError> {
        self.require(key)?;
        debug!(key, "path selected");
        self.selected = Some(key.to_string());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Select the topmost path under a point in document coordinates.
    /// Clicking empty space clears the selection.
    pub fn select_at(&mut self, at: Point) -> Option<&UploadedPath> {
        let hit = self
            .outlines
            .iter()
            .rposition(|outline| outline.contains(at));

        self.selected = hit.map(|i| self.parsed.paths[i].key.clone());
        debug!(x = at.x, y = at.y, selected = ?self.selected, "hit test");
        hit.map(|i| &self.parsed.paths[i])
    }

    pub fn selected(&self) -> Option<&UploadedPath> {
        self.selected.as_deref().and_then(|key| self.parsed.path(key))
    }

    fn selected_key(&self) -> Result<String, EditorError> {
        self.selected.clone().ok_or(EditorError::NoSelection)
    }

    pub fn assign(&mut self, key: &str, pattern: Option<PatternId>) -> Result<(), EditorError> {
        self.require(key)?;
        debug!(key, pattern = ?pattern, "pattern assigned");
        self.assignments.assign(key, pattern);
        Ok(())
    }

    pub fn set_offset(&mut self, key: &str, offset: PatternOffset) -> Result<(), EditorError> {
        self.require(key)?;
        self.assignments.set_offset(key, offset);
        Ok(())
    }

    pub fn assign_selected(&mut self, pattern: Option<PatternId>) -> Result<(), EditorError> {
        let key = self.selected_key()?;
        self.assign(&key, pattern)
    }

    pub fn offset_selected(&mut self, offset: PatternOffset) -> Result<(), EditorError> {
        let key = self.selected_key()?;
        self.set_offset(&key, offset)
    }

    pub fn regenerate(&self, config: &ExportConfig) -> String {
        regenerate(&self.parsed, &self.assignments, config)
    }

    /// The patterned document as `<name>-patterned.svg`.
    pub fn export(&self, config: &ExportConfig) -> ExportedDocument {
        let filename = format!("{}-patterned.svg", self.document.stem());
        info!(filename = %filename, assigned = self.assignments.len(), "exporting patterned document");
        ExportedDocument::svg(filename, self.regenerate(config))
    }
}
