//! Uploaded SVG documents and their path list.
//!
//! Parsing streams through the XML with quick-xml instead of resolving a
//! full render tree, so `data-segment` attributes and the original path
//! data survive untouched. Only the subset the editor cares about is read:
//! root dimensions, `<path>` elements and the fill/stroke they inherit
//! from enclosing groups.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::outline::is_valid_path_data;
use crate::error::DocumentError;

/// Size assumed when a document declares neither dimensions nor a viewBox.
pub const DEFAULT_DOCUMENT_SIZE: (u32, u32) = (800, 600);

/// An SVG file handed to the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedDocument {
    pub id: Uuid,
    pub name: String,
    pub content: String,
    pub uploaded_at: DateTime<Utc>,
}

impl UploadedDocument {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            content: content.into(),
            uploaded_at: Utc::now(),
        }
    }

    /// File name without a trailing `.svg`.
    pub fn stem(&self) -> &str {
        let name = self.name.as_str();
        match name.len().checked_sub(4) {
            Some(cut) if name.is_char_boundary(cut) && name[cut..].eq_ignore_ascii_case(".svg") => &name[..cut],
            _ => name,
        }
    }

    pub fn parse(&self) -> Result<ParsedDocument, DocumentError> {
        parse_document(&self.content)
    }
}

/// One `<path>` from an uploaded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedPath {
    /// Stable handle: `data-segment`, else `id`, else `path-<n>`.
    pub key: String,
    pub d: String,
    /// Effective fill, own attribute or inherited from a group.
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: Option<String>,
    /// `data-segment` value when the path came from a segment export.
    pub segment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub width: u32,
    pub height: u32,
    pub paths: Vec<UploadedPath>,
}

impl ParsedDocument {
    pub fn empty() -> Self {
        Self {
            width: DEFAULT_DOCUMENT_SIZE.0,
            height: DEFAULT_DOCUMENT_SIZE.1,
            paths: Vec::new(),
        }
    }

    pub fn path(&self, key: &str) -> Option<&UploadedPath> {
        self.paths.iter().find(|p| p.key == key)
    }
}

// ============================================================================
// PARSER
// ============================================================================

/// Presentation state inherited down the element tree.
#[derive(Debug, Clone, Default)]
struct Inherited {
    fill: Option<String>,
    stroke: Option<String>,
    stroke_width: Option<String>,
    /// Inside `<defs>`, `<pattern>` or another non-rendered container.
    hidden: bool,
}

/// Attributes of interest on one element.
#[derive(Debug, Default)]
struct Attrs {
    id: Option<String>,
    d: Option<String>,
    fill: Option<String>,
    stroke: Option<String>,
    stroke_width: Option<String>,
    segment: Option<String>,
    width: Option<String>,
    height: Option<String>,
    view_box: Option<String>,
}

impl Attrs {
    fn read(e: &BytesStart) -> Self {
        let mut attrs = Attrs::default();
        for attr in e.attributes().flatten() {
            let value = match attr.unescape_value() {
                Ok(v) => v.into_owned(),
                Err(_) => continue,
            };
            match attr.key.as_ref() {
                b"id" => attrs.id = Some(value),
                b"d" => attrs.d = Some(value),
                b"fill" => attrs.fill = Some(value),
                b"stroke" => attrs.stroke = Some(value),
                b"stroke-width" => attrs.stroke_width = Some(value),
                b"data-segment" => attrs.segment = Some(value),
                b"width" => attrs.width = Some(value),
                b"height" => attrs.height = Some(value),
                b"viewBox" | b"viewbox" => attrs.view_box = Some(value),
                b"style" => attrs.apply_style(&value),
                _ => {}
            }
        }
        attrs
    }

    /// Inline `style` declarations override presentation attributes.
    fn apply_style(&mut self, style: &str) {
        for decl in style.split(';') {
            let Some((prop, value)) = decl.split_once(':') else {
                continue;
            };
            let value = Some(value.trim().to_string());
            match prop.trim() {
                "fill" => self.fill = value,
                "stroke" => self.stroke = value,
                "stroke-width" => self.stroke_width = value,
                _ => {}
            }
        }
    }

    fn inherit(&self, parent: &Inherited, hidden: bool) -> Inherited {
        Inherited {
            fill: self.fill.clone().or_else(|| parent.fill.clone()),
            stroke: self.stroke.clone().or_else(|| parent.stroke.clone()),
            stroke_width: self.stroke_width.clone().or_else(|| parent.stroke_width.clone()),
            hidden: parent.hidden || hidden,
        }
    }
}

/// Elements whose children are never rendered directly.
fn hides_children(name: &[u8]) -> bool {
    matches!(
        name,
        b"defs" | b"pattern" | b"clipPath" | b"mask" | b"symbol" | b"marker" | b"linearGradient" | b"radialGradient"
    )
}

/// `base`, or `base-2`, `base-3`, ... when `base` is already taken.
fn unique_key(base: String, issued: &HashSet<String>) -> String {
    if !issued.contains(&base) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}-{n}");
        if !issued.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Parse a length like `640`, `640px` or `640.5`. Percentages and other
/// units are not resolvable here.
fn parse_length(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix("px").unwrap_or(trimmed).trim();
    number.parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0)
}

/// Width and height from a `viewBox="minx miny w h"`.
fn parse_view_box(raw: &str) -> Option<(f64, f64)> {
    let nums: Vec<f64> = raw
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();
    match nums.as_slice() {
        [_, _, w, h] if *w > 0.0 && *h > 0.0 => Some((*w, *h)),
        _ => None,
    }
}

fn document_size(attrs: &Attrs) -> (u32, u32) {
    let view_box = attrs.view_box.as_deref().and_then(parse_view_box);
    let width = attrs
        .width
        .as_deref()
        .and_then(parse_length)
        .or(view_box.map(|(w, _)| w));
    let height = attrs
        .height
        .as_deref()
        .and_then(parse_length)
        .or(view_box.map(|(_, h)| h));

    match (width, height) {
        (Some(w), Some(h)) => (w.round().max(1.0) as u32, h.round().max(1.0) as u32),
        _ => DEFAULT_DOCUMENT_SIZE,
    }
}

/// Read the editable paths out of SVG text.
///
/// Paths with unparseable `d` are skipped with a warning. Duplicate keys
/// fall back to the positional `path-<n>` key.
pub fn parse_document(text: &str) -> Result<ParsedDocument, DocumentError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Inherited> = Vec::new();
    let mut size: Option<(u32, u32)> = None;
    let mut paths: Vec<UploadedPath> = Vec::new();
    let mut seen = 0usize;
    let mut issued: HashSet<String> = HashSet::new();

    loop {
        let (e, is_empty) = match reader.read_event() {
            Ok(Event::Start(e)) => (e, false),
            Ok(Event::Empty(e)) => (e, true),
            Ok(Event::End(_)) => {
                stack.pop();
                continue;
            }
            Ok(Event::Eof) => break,
            Ok(_) => continue,
            Err(e) => {
                return Err(DocumentError::Xml {
                    position: reader.error_position(),
                    message: e.to_string(),
                });
            }
        };

        let local = e.local_name();
        let name = local.as_ref();
        let attrs = Attrs::read(&e);
        let parent = stack.last().cloned().unwrap_or_default();

        if name == b"svg" && size.is_none() {
            size = Some(document_size(&attrs));
        }

        if name == b"path" && !parent.hidden {
            let index = seen;
            seen += 1;
            let inherited = attrs.inherit(&parent, false);

            match attrs.d.as_deref() {
                Some(d) if is_valid_path_data(d) => {
                    let preferred = attrs
                        .segment
                        .clone()
                        .or_else(|| attrs.id.clone())
                        .filter(|k| !k.trim().is_empty())
                        .filter(|k| !issued.contains(k))
                        .unwrap_or_else(|| format!("path-{index}"));
                    let key = unique_key(preferred, &issued);
                    issued.insert(key.clone());
                    paths.push(UploadedPath {
                        key,
                        d: d.to_string(),
                        fill: inherited.fill,
                        stroke: inherited.stroke,
                        stroke_width: inherited.stroke_width,
                        segment: attrs.segment.clone(),
                    });
                }
                _ => warn!(index, "skipping path with missing or invalid path data"),
            }
        }

        if !is_empty {
            stack.push(attrs.inherit(&parent, hides_children(name)));
        }
    }

    let Some((width, height)) = size else {
        return Err(DocumentError::MissingRoot);
    };

    debug!(width, height, paths = paths.len(), "parsed uploaded document");
    Ok(ParsedDocument { width, height, paths })
}
