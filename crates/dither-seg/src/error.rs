//! Error types for dither-seg.
//!
//! One enum per concern. Every failure here is local: the surrounding
//! session stays usable and nothing is retried.

use thiserror::Error;

/// Failure to turn uploaded bytes into a drawable image.
#[derive(Debug, Error)]
pub enum ImageLoadError {
    /// No bytes were supplied.
    #[error("image data is empty")]
    Empty,

    /// The bytes don't look like any raster format we can decode.
    #[error("unsupported file type: not a recognised raster image")]
    UnsupportedFormat,

    /// The format was recognised but decoding failed.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Failure while producing or reading a segment mask.
#[derive(Debug, Error)]
pub enum MaskError {
    /// Canvas size was zero or the polygon produced no drawable path.
    #[error("cannot rasterize polygon onto a {width}x{height} canvas")]
    Raster { width: u32, height: u32 },

    #[error("failed to encode mask: {0}")]
    Encode(image::ImageError),

    #[error("failed to decode mask: {0}")]
    Decode(image::ImageError),

    /// Decoded mask dimensions disagree with the recorded ones.
    #[error("mask is {actual_w}x{actual_h}, expected {expected_w}x{expected_h}")]
    SizeMismatch {
        expected_w: u32,
        expected_h: u32,
        actual_w: u32,
        actual_h: u32,
    },
}

/// Failure while reading an uploaded SVG document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("XML parse error at position {position}: {message}")]
    Xml { position: u64, message: String },

    /// The document never opened an `<svg>` element.
    #[error("document has no <svg> root element")]
    MissingRoot,
}

/// Pattern name lookup failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("unknown pattern: {0}")]
    Unknown(String),
}

/// Segment collection lookup failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SegmentError {
    #[error("no segment with id '{0}'")]
    NotFound(String),
}

/// Editor operation that needs a target path it doesn't have.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("no path is selected")]
    NoSelection,

    #[error("no path with key '{0}' in the document")]
    UnknownPath(String),
}

/// Failure inside a segmentation session. The session stays usable.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Image(#[from] ImageLoadError),

    #[error(transparent)]
    Mask(#[from] MaskError),
}
