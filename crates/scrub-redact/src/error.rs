//! Error types for the redaction engine.

use thiserror::Error;

/// Result type for redaction operations.
pub type Result<T> = std::result::Result<T, RedactionError>;

/// Errors that can occur while building or running the engine.
#[derive(Error, Debug)]
pub enum RedactionError {
    /// A pattern failed to compile.
    #[error("pattern error in {source_text:?}: {message}")]
    PatternError {
        source_text: String,
        message: String,
    },

    /// A text rule is malformed.
    #[error("invalid rule {rule:?}: {message}")]
    RuleError { rule: String, message: String },

    /// Failed to generate the pseudonym key.
    #[error("key error: {0}")]
    KeyError(String),
}

impl RedactionError {
    pub(crate) fn pattern(source_text: &str, message: impl Into<String>) -> Self {
        RedactionError::PatternError {
            source_text: source_text.to_string(),
            message: message.into(),
        }
    }
}
