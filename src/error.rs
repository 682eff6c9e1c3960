//! Error types for the effect pipeline and its frame driver.
//!
//! Per-pixel evaluation never fails: numeric edge cases are guarded inside
//! the filters. Errors only surface at the boundaries where images and
//! configuration enter the crate.

use thiserror::Error;

/// Error type for effect evaluation boundaries.
#[derive(Error, Debug)]
pub enum FxError {
    /// Image has a zero dimension or a buffer does not match its shape.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Image channel count is not 1, 3 or 4.
    #[error("unsupported channel count {0} (expected 1, 3 or 4)")]
    UnsupportedChannels(usize),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration document could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type for effect evaluation boundaries.
pub type FxResult<T> = Result<T, FxError>;
