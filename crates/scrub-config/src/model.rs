//! Resolved configuration types.
//!
//! A [`RedactionConfig`] is what the engine consumes: every `$PARENT` marker
//! has been expanded and every unset field has taken its inherited value.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Marker text used when no other redaction text is configured.
pub const DEFAULT_REDACTION_TEXT: &str = "***";

/// Default number of hex characters in a hashed pseudonym.
pub const DEFAULT_HASH_LENGTH: usize = 8;

/// Default discovery threshold.
pub const DEFAULT_MIN_OCCURRENCES: usize = 3;

/// Fully resolved redaction configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedactionConfig {
    pub general: GeneralConfig,
    pub properties: PropertiesConfig,
    pub strings: StringsConfig,
    pub events: EventConfig,
    pub discovery: DiscoveryConfig,
}

impl RedactionConfig {
    /// The empty base every inheritance chain ends in (`parent: none`).
    ///
    /// Sections are enabled but carry no patterns, so nothing is redacted,
    /// removed or filtered.
    pub fn base() -> Self {
        Self {
            general: GeneralConfig::default(),
            properties: PropertiesConfig::default(),
            strings: StringsConfig::default(),
            events: EventConfig::default(),
            discovery: DiscoveryConfig::default(),
        }
    }

    /// Iterate the built-in categories with their names, in scan order.
    pub fn builtin_categories(&self) -> [(&'static str, &PatternCategory); 7] {
        let s = &self.strings;
        [
            ("emails", &s.emails),
            ("ip_addresses", &s.ip_addresses),
            ("user", &s.user),
            ("hostnames", &s.hostnames),
            ("ssh_hosts", &s.ssh_hosts),
            ("internal_urls", &s.internal_urls),
            ("uuids", &s.uuids),
        ]
    }
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self::base()
    }
}

/// `general` section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneralConfig {
    pub redaction_text: String,
    pub pseudonymize: bool,
    pub pseudonymization: PseudonymizationConfig,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            redaction_text: DEFAULT_REDACTION_TEXT.to_string(),
            pseudonymize: false,
            pseudonymization: PseudonymizationConfig::default(),
        }
    }
}

/// How pseudonym labels are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PseudonymMode {
    /// Keyed hash of the original, with a per-run key.
    #[default]
    Hash,
    /// Sequential numbers in first-seen order.
    Counter,
}

/// How a pseudonym label is wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PseudonymFormat {
    /// `<redacted:LABEL>`
    #[default]
    Redacted,
    /// `<hash:LABEL>`
    Hash,
    /// `prefix + LABEL + suffix`
    Custom,
}

/// `general.pseudonymization` section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PseudonymizationConfig {
    pub mode: PseudonymMode,
    pub format: PseudonymFormat,
    pub hash_length: usize,
    pub prefix: String,
    pub suffix: String,
}

impl Default for PseudonymizationConfig {
    fn default() -> Self {
        Self {
            mode: PseudonymMode::Hash,
            format: PseudonymFormat::Redacted,
            hash_length: DEFAULT_HASH_LENGTH,
            prefix: "<".to_string(),
            suffix: ">".to_string(),
        }
    }
}

/// `properties` section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertiesConfig {
    pub enabled: bool,
    pub patterns: Vec<String>,
    pub case_sensitive: bool,
    pub full_match: bool,
    pub ignore_exact: Vec<String>,
    pub ignore: Vec<String>,
    pub key_fields: Vec<String>,
    pub value_fields: Vec<String>,
}

impl Default for PropertiesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            patterns: Vec::new(),
            case_sensitive: false,
            full_match: false,
            ignore_exact: Vec::new(),
            ignore: Vec::new(),
            key_fields: Vec::new(),
            value_fields: Vec::new(),
        }
    }
}

/// Discovery settings attached to a pattern category.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CategoryDiscovery {
    pub enabled: bool,
    /// `None` means: group 1 if the regex has one, else the whole match.
    pub capture_group: Option<usize>,
    /// `None` means the global `discovery.min_occurrences`.
    pub min_occurrences: Option<usize>,
    /// `None` means the global `discovery.case_sensitive`.
    pub case_sensitive: Option<bool>,
}

/// Capability set shared by built-in and custom string categories.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternCategory {
    pub enabled: bool,
    pub patterns: Vec<String>,
    pub case_sensitive: bool,
    pub ignore_exact: Vec<String>,
    pub ignore: Vec<String>,
    pub ignore_after: Vec<String>,
    pub group: Option<usize>,
    pub replacement: Option<String>,
    pub discovery: Option<CategoryDiscovery>,
}

impl Default for PatternCategory {
    fn default() -> Self {
        Self {
            enabled: true,
            patterns: Vec::new(),
            case_sensitive: false,
            ignore_exact: Vec::new(),
            ignore: Vec::new(),
            ignore_after: Vec::new(),
            group: None,
            replacement: None,
            discovery: None,
        }
    }
}

impl PatternCategory {
    /// A category is active when it is enabled and has something to match.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.patterns.is_empty()
    }
}

/// A named, user-defined category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomPattern {
    pub name: String,
    #[serde(flatten)]
    pub category: PatternCategory,
}

/// `strings` section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StringsConfig {
    pub enabled: bool,
    pub rules: Vec<String>,
    pub emails: PatternCategory,
    pub ip_addresses: PatternCategory,
    pub user: PatternCategory,
    pub hostnames: PatternCategory,
    pub ssh_hosts: PatternCategory,
    pub internal_urls: PatternCategory,
    pub uuids: PatternCategory,
    pub custom: Vec<CustomPattern>,
}

impl Default for StringsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rules: Vec::new(),
            emails: PatternCategory::default(),
            ip_addresses: PatternCategory::default(),
            user: PatternCategory::default(),
            hostnames: PatternCategory::default(),
            ssh_hosts: PatternCategory::default(),
            internal_urls: PatternCategory::default(),
            uuids: PatternCategory::default(),
            custom: Vec::new(),
        }
    }
}

/// `events` section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventConfig {
    pub remove_enabled: bool,
    pub removed_types: Vec<String>,
    pub filtering: FilteringConfig,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            remove_enabled: true,
            removed_types: Vec::new(),
            filtering: FilteringConfig::default(),
        }
    }
}

/// `events.filtering` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilteringConfig {
    pub include_events: Vec<String>,
    pub exclude_events: Vec<String>,
    pub include_categories: Vec<String>,
    pub exclude_categories: Vec<String>,
    pub include_threads: Vec<String>,
    pub exclude_threads: Vec<String>,
    pub case_sensitive: bool,
}

impl FilteringConfig {
    /// True when at least one include or exclude list is non-empty.
    pub fn has_filters(&self) -> bool {
        !(self.include_events.is_empty()
            && self.exclude_events.is_empty()
            && self.include_categories.is_empty()
            && self.exclude_categories.is_empty()
            && self.include_threads.is_empty()
            && self.exclude_threads.is_empty())
    }
}

/// Discovery scan strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryMode {
    /// Discovery off.
    #[default]
    None,
    /// Single streaming pass; redacts from the threshold crossing onward.
    Fast,
    /// Two passes; redacts every occurrence of qualifying values.
    #[serde(alias = "full")]
    Comprehensive,
}

impl DiscoveryMode {
    /// Parse a mode name (`none`, `fast`, `comprehensive`/`full`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" | "off" => Some(DiscoveryMode::None),
            "fast" => Some(DiscoveryMode::Fast),
            "comprehensive" | "full" => Some(DiscoveryMode::Comprehensive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DiscoveryMode::None => "none",
            DiscoveryMode::Fast => "fast",
            DiscoveryMode::Comprehensive => "comprehensive",
        }
    }
}

impl std::fmt::Display for DiscoveryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DiscoveryMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DiscoveryMode::parse(s).ok_or_else(|| format!("unknown discovery mode: {}", s))
    }
}

/// What part of a field value is counted by a field extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionUnit {
    /// The whole field value.
    #[default]
    Value,
    /// Each `/` or `\` separated path segment.
    Path,
    /// Each word-like token.
    Tokens,
}

/// `discovery` section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveryConfig {
    pub mode: DiscoveryMode,
    pub min_occurrences: usize,
    pub case_sensitive: bool,
    pub min_length: usize,
    pub ignore_exact: Vec<String>,
    pub ignore: Vec<String>,
    pub fields: Vec<crate::layer::FieldExtraction>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            mode: DiscoveryMode::None,
            min_occurrences: DEFAULT_MIN_OCCURRENCES,
            case_sensitive: false,
            min_length: 1,
            ignore_exact: Vec::new(),
            ignore: Vec::new(),
            fields: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_redacts_nothing() {
        let base = RedactionConfig::base();
        assert_eq!(base.general.redaction_text, "***");
        assert!(!base.general.pseudonymize);
        assert!(base.properties.patterns.is_empty());
        assert!(base.events.removed_types.is_empty());
        assert!(!base.events.filtering.has_filters());
        assert_eq!(base.discovery.mode, DiscoveryMode::None);
        for (_, category) in base.builtin_categories() {
            assert!(!category.is_active());
        }
    }

    #[test]
    fn discovery_mode_parsing() {
        assert_eq!(DiscoveryMode::parse("FAST"), Some(DiscoveryMode::Fast));
        assert_eq!(
            DiscoveryMode::parse("full"),
            Some(DiscoveryMode::Comprehensive)
        );
        assert_eq!(DiscoveryMode::parse("off"), Some(DiscoveryMode::None));
        assert_eq!(DiscoveryMode::parse("sometimes"), None);
    }

    #[test]
    fn discovery_mode_alias_deserializes() {
        let mode: DiscoveryMode = serde_json::from_str("\"full\"").unwrap();
        assert_eq!(mode, DiscoveryMode::Comprehensive);
    }
}
