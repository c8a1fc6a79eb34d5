//! Custom error types for boxbox.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the boxbox library.
#[derive(Error, Debug)]
pub enum Error {
    /// Region, box or resize metadata could not be parsed.
    #[error("failed to parse {what}: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Image buffer has the wrong rank, channel count or batch size.
    #[error("image shape mismatch: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    /// The crop box has no area once clamped to the image.
    #[error("region ({x1}, {y1})-({x2}, {y2}) is empty within a {width}x{height} image")]
    EmptyRegion {
        x1: i64,
        y1: i64,
        x2: i64,
        y2: i64,
        width: usize,
        height: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Failed to load an image file.
    #[error("failed to load image from {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to save an image file.
    #[error("failed to save image to {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn shape(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::Shape {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Result type alias for boxbox operations.
pub type Result<T> = std::result::Result<T, Error>;
