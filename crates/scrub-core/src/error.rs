//! Errors surfaced by the scrub pipeline and their exit codes.

use crate::exit_codes::ExitCode;
use scrub_config::ConfigError;
use scrub_container::ContainerError;
use scrub_redact::RedactionError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Redaction(#[from] RedactionError),

    #[error("Input {path} contains no events (pass --allow-empty to accept it)")]
    EmptyInput { path: PathBuf },

    #[error("Input {path} is not UTF-8 text (line {line})")]
    InvalidText { path: PathBuf, line: u64 },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid arguments: {0}")]
    Args(String),
}

impl CoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CoreError::Io {
            path: path.into(),
            source,
        }
    }

    /// Exit code for this failure.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CoreError::Config(_) => ExitCode::ConfigError,
            CoreError::Container(e) => match e {
                ContainerError::Io(_) | ContainerError::Write { .. } => ExitCode::IoError,
                ContainerError::Json(_)
                | ContainerError::Read { .. }
                | ContainerError::MissingHeader { .. }
                | ContainerError::UnsupportedVersion { .. } => ExitCode::InputError,
            },
            // patterns and rules come from the config
            CoreError::Redaction(RedactionError::KeyError(_)) => ExitCode::InternalError,
            CoreError::Redaction(_) => ExitCode::ConfigError,
            CoreError::EmptyInput { .. } | CoreError::InvalidText { .. } => ExitCode::InputError,
            CoreError::Io { .. } => ExitCode::IoError,
            CoreError::Args(_) => ExitCode::ArgsError,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
