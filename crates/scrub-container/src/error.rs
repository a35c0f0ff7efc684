//! Error types for container operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing an event container.
#[derive(Error, Debug)]
pub enum ContainerError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An event line could not be decoded
    #[error("failed to decode event at line {line}: {message}")]
    Read { line: usize, message: String },

    /// Output could not be committed
    #[error("failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },

    /// First line is not a container header
    #[error("missing container header in {path}")]
    MissingHeader { path: PathBuf },

    /// Header names a version this build cannot read
    #[error("unsupported container version: {version} (supported: {supported})")]
    UnsupportedVersion { version: u32, supported: u32 },
}

/// Result type alias for container operations.
pub type Result<T> = std::result::Result<T, ContainerError>;
