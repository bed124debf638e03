//! CLI command implementations.
//!
//! - `patterns` - list the dither catalogue
//! - `segment` - replay a scripted session over an image and export
//! - `repattern` - assign patterns to paths of an existing SVG
//! - `inspect` - show the editable paths of an SVG
//! - `preview` - rasterize an SVG to PNG

pub mod args;
pub mod common;
pub mod inspect;
pub mod patterns;
pub mod preview;
pub mod repattern;
pub mod script;
pub mod segment;

pub use args::{Cli, Commands};
pub use inspect::cmd_inspect;
pub use patterns::cmd_patterns;
pub use preview::cmd_preview;
pub use repattern::cmd_repattern;
pub use segment::{SegmentArgs, cmd_segment};
