//! Structured logging for scrub.
//!
//! Provides dual-mode logging:
//! - Human-readable console output for interactive use
//! - Machine-parseable JSON lines for automation
//!
//! stdout is reserved for command payloads; all log output goes to stderr.
//! Log events carry counts, identifiers and pattern names, never the values
//! being redacted.

pub mod config;

pub use config::{LogConfig, LogFormat};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter for a config: the environment directive if valid, else the level.
fn build_filter(config: &LogConfig) -> EnvFilter {
    if let Some(directive) = &config.directive {
        match EnvFilter::try_new(directive) {
            Ok(filter) => return filter,
            Err(e) => eprintln!("Warning: ignoring invalid log filter {directive:?}: {e}"),
        }
    }
    EnvFilter::default().add_directive(config.level.into())
}

/// Initialize the logging subsystem.
///
/// Should be called once at startup. A second call is a no-op.
pub fn init_logging(config: &LogConfig) {
    let filter = build_filter(config);

    let result = match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi);
            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init()
            }
        }
        LogFormat::Jsonl => {
            let json_layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .with_span_list(false);
            tracing_subscriber::registry()
                .with(filter)
                .with(json_layer)
                .try_init()
        }
    };
    if result.is_err() {
        tracing::debug!("logging already initialized");
    }
}

/// Generate a unique run ID for this invocation.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("run-{}", &uuid[..12])
}
