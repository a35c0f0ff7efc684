//! Command-line overrides applied on top of a resolved configuration.

use crate::model::{CustomPattern, DiscoveryMode, PatternCategory, RedactionConfig};

/// Options collected from command-line flags.
///
/// List options are cumulative: they extend the configured lists, they never
/// replace them. Giving any `redaction_regexes` also turns `strings.enabled`
/// on, even when the configuration disabled it, so the extra patterns apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOptions {
    pub include_events: Vec<String>,
    pub exclude_events: Vec<String>,
    pub include_categories: Vec<String>,
    pub exclude_categories: Vec<String>,
    pub include_threads: Vec<String>,
    pub exclude_threads: Vec<String>,
    pub remove_events: Vec<String>,
    pub redaction_regexes: Vec<String>,
    pub pseudonymize: bool,
    pub discovery_mode: Option<DiscoveryMode>,
    pub rules: Vec<String>,
}

impl CliOptions {
    /// True when no override was given.
    pub fn is_empty(&self) -> bool {
        *self == CliOptions::default()
    }
}

impl RedactionConfig {
    /// Return a copy of this configuration with the command-line overrides applied.
    ///
    /// Each extra regex becomes a custom category named `cli_pattern_<index>`,
    /// where the index is its position in the custom list.
    pub fn with_cli_options(&self, options: &CliOptions) -> RedactionConfig {
        let mut config = self.clone();

        let filtering = &mut config.events.filtering;
        filtering
            .include_events
            .extend(options.include_events.iter().cloned());
        filtering
            .exclude_events
            .extend(options.exclude_events.iter().cloned());
        filtering
            .include_categories
            .extend(options.include_categories.iter().cloned());
        filtering
            .exclude_categories
            .extend(options.exclude_categories.iter().cloned());
        filtering
            .include_threads
            .extend(options.include_threads.iter().cloned());
        filtering
            .exclude_threads
            .extend(options.exclude_threads.iter().cloned());

        if !options.remove_events.is_empty() {
            config.events.remove_enabled = true;
            config
                .events
                .removed_types
                .extend(options.remove_events.iter().cloned());
        }

        for regex in &options.redaction_regexes {
            let name = format!("cli_pattern_{}", config.strings.custom.len());
            config.strings.custom.push(CustomPattern {
                name,
                category: PatternCategory {
                    patterns: vec![regex.clone()],
                    ..PatternCategory::default()
                },
            });
        }
        if !options.redaction_regexes.is_empty() {
            config.strings.enabled = true;
        }

        if options.pseudonymize {
            config.general.pseudonymize = true;
        }
        if let Some(mode) = options.discovery_mode {
            config.discovery.mode = mode;
        }
        config.strings.rules.extend(options.rules.iter().cloned());

        config
    }
}
