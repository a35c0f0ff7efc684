//! scrub: redact and pseudonymize sensitive values in event recordings.
//!
//! This crate holds the orchestration used by the `scrub` binary:
//! - [`pipeline`]: one- and two-pass processing of recordings and text files
//! - [`logging`]: tracing subscriber setup
//! - [`exit_codes`]: the stable exit code contract
//! - [`schema`]: JSON Schemas for config documents and run reports

pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod pipeline;
pub mod schema;

pub use error::{CoreError, Result};
pub use exit_codes::ExitCode;
pub use pipeline::{
    default_output_path, process_recording, process_text_file, PipelineOptions, RunReport,
};
