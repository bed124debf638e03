//! # dither-seg
//!
//! Manual polygon segmentation of a raster image, dither pattern fills and
//! SVG export.
//!
//! The pieces, bottom up:
//! - [`capture`]: the lasso state machine (points in, closed polygons out)
//! - [`mask`] / [`path`]: a closed polygon as a raster mask and as path data
//! - [`segment`]: segment identities and the collection keyed by them
//! - [`canvas`]: static and live drawing layers with hover highlight
//! - [`patterns`] / [`export`]: the tile catalogue and SVG generation
//! - [`editor`]: re-patterning paths of an uploaded SVG
//! - [`session`]: ties image, capture, layers and store together
//!
//! ## Rust Lesson: State as a value
//!
//! The capture state is a plain enum owned by the session, not a set of
//! flags scattered over globals. Every transition is a method taking
//! `&mut self`, so tests can drive it click by click.

pub mod canvas;
pub mod capture;
pub mod color;
pub mod config;
pub mod debounce;
pub mod editor;
pub mod error;
pub mod export;
pub mod geometry;
pub mod image_source;
pub mod mask;
pub mod path;
pub mod patterns;
pub mod segment;
pub mod session;

// Re-export common types at crate root for convenience.
pub use capture::{CanvasMapping, CaptureEvent, CaptureState, CompletedShape};
pub use color::Rgb;
pub use config::{ColorStrategy, Config, ExportConfig};
pub use editor::{EditorSession, PatternAssignments, UploadedDocument, parse_document, regenerate};
pub use error::{DocumentError, EditorError, ImageLoadError, MaskError, PatternError, SegmentError, SessionError};
pub use export::{ExportMode, ExportRequest, ExportedDocument, export_documents, generate_svg};
pub use geometry::Point;
pub use path::{EMPTY_PATH, polygon_to_svg_path};
pub use patterns::{PatternId, PatternOffset};
pub use segment::{Segment, SegmentId, SegmentKind, SegmentStore};
pub use session::SegmentationSession;
