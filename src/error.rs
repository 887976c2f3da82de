//! Error taxonomy shared by every stage of the pipeline.
//!
//! The first four variants are the user-facing failures of generation and export. All of them
//! are recoverable: the caller reports them and the session is left exactly as it was before the
//! call.

use std::path::PathBuf;

use crate::capacity::ErrorCorrectionLevel;

/// Errors produced while sanitizing, sizing, encoding, compositing or exporting a symbol.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The text was empty once trimmed and sanitized.
    #[error("nothing to encode: the text is empty after cleaning")]
    EmptyInput,

    /// No capacity tier can hold the estimated encoded length.
    #[error("text too long: {estimated} estimated bytes exceed the largest symbol at level {level}")]
    CapacityExceeded {
        estimated: usize,
        level: ErrorCorrectionLevel,
    },

    /// The symbol encoder refused the request or handed back a malformed matrix.
    #[error("symbol encoding unavailable: {0}")]
    EncodingUnavailable(String),

    /// Export was requested before any successful generation.
    #[error("no symbol generated yet: generate one before exporting")]
    NoActiveSession,

    #[error("invalid pixel size {0}: must be a positive integer")]
    InvalidSize(u32),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("failed to access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// The background icon decoder stopped before delivering a result.
    #[error("icon loading was interrupted")]
    IconLoadInterrupted,
}

pub type Result<T> = std::result::Result<T, Error>;
