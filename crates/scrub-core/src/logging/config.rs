//! Logging configuration.
//!
//! Sources, lowest precedence first:
//! - `SCRUB_LOG`, else `RUST_LOG`: a level name or a full filter directive
//! - `SCRUB_LOG_FORMAT`: `human` or `jsonl`
//! - CLI flags (`-v`/`-q`, `--log-format`)

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::LevelFilter;

/// Log output format on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable console lines.
    #[default]
    Human,
    /// One JSON object per line.
    #[value(alias = "json")]
    Jsonl,
}

impl LogFormat {
    fn from_env_value(value: &str) -> Option<Self> {
        LogFormat::from_str(value.trim(), true).ok()
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Level applied to every target when no directive is set.
    pub level: LevelFilter,
    /// Whether to include timestamps in human output.
    pub timestamps: bool,
    /// Per-target filter directive from the environment, e.g. `scrub_redact=debug`.
    pub directive: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LevelFilter::WARN,
            timestamps: true,
            directive: None,
        }
    }
}

impl LogConfig {
    /// Create config from environment and CLI overrides.
    ///
    /// An explicit CLI level replaces any environment directive.
    pub fn from_env(cli_level: Option<LevelFilter>, cli_format: Option<LogFormat>) -> Self {
        let env = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self::from_sources(
            env("SCRUB_LOG").or_else(|| env("RUST_LOG")),
            env("SCRUB_LOG_FORMAT"),
            cli_level,
            cli_format,
        )
    }

    fn from_sources(
        directive: Option<String>,
        env_format: Option<String>,
        cli_level: Option<LevelFilter>,
        cli_format: Option<LogFormat>,
    ) -> Self {
        let mut config = LogConfig::default();

        if let Some(directive) = directive {
            match directive.trim().parse::<LevelFilter>() {
                Ok(level) => config.level = level,
                Err(_) => config.directive = Some(directive),
            }
        }
        if let Some(format) = env_format.as_deref().and_then(LogFormat::from_env_value) {
            config.format = format;
        }

        if let Some(level) = cli_level {
            config.level = level;
            config.directive = None;
        }
        if let Some(format) = cli_format {
            config.format = format;
        }
        config
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_values() {
        assert_eq!(LogFormat::from_env_value("jsonl"), Some(LogFormat::Jsonl));
        assert_eq!(LogFormat::from_env_value("JSON"), Some(LogFormat::Jsonl));
        assert_eq!(LogFormat::from_env_value(" human "), Some(LogFormat::Human));
        assert_eq!(LogFormat::from_env_value("xml"), None);
    }

    #[test]
    fn test_env_level_and_directive() {
        let config = LogConfig::from_sources(Some("debug".into()), None, None, None);
        assert_eq!(config.level, LevelFilter::DEBUG);
        assert_eq!(config.directive, None);

        let config = LogConfig::from_sources(
            Some("scrub_redact=trace".into()),
            Some("jsonl".into()),
            None,
            None,
        );
        assert_eq!(config.level, LevelFilter::WARN);
        assert_eq!(config.directive.as_deref(), Some("scrub_redact=trace"));
        assert_eq!(config.format, LogFormat::Jsonl);
    }

    #[test]
    fn test_cli_overrides_env() {
        let config = LogConfig::from_sources(
            Some("scrub_redact=trace".into()),
            Some("jsonl".into()),
            Some(LevelFilter::ERROR),
            Some(LogFormat::Human),
        );
        assert_eq!(config.level, LevelFilter::ERROR);
        assert_eq!(config.directive, None);
        assert_eq!(config.format, LogFormat::Human);
    }

    #[test]
    fn test_builder() {
        let config = LogConfig::default()
            .with_format(LogFormat::Jsonl)
            .with_level(LevelFilter::DEBUG)
            .with_timestamps(false);
        assert_eq!(config.format, LogFormat::Jsonl);
        assert_eq!(config.level, LevelFilter::DEBUG);
        assert!(!config.timestamps);
    }
}
