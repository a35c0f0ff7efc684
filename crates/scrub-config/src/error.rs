//! Error types for configuration loading.

use crate::validate::ValidationError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading and resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config not found: {identifier}")]
    NotFound { identifier: String },

    #[error("Invalid config document {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    #[error("Config inheritance cycle: {chain}")]
    Cycle { chain: String },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Semantic validation failed: {0}")]
    Validation(#[from] ValidationError),
}

impl ConfigError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ConfigError::NotFound { .. } => 50,
            ConfigError::Parse { .. } => 51,
            ConfigError::Cycle { .. } => 52,
            ConfigError::Io { .. } => 53,
            ConfigError::Validation(e) => e.code(),
        }
    }
}
