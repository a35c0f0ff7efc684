//! Built-in configuration presets.
//!
//! Provides named starting points:
//! - Default: common PII categories, secret-looking properties, no discovery
//! - Strict: adds hostnames, UUIDs, more removed event types, fast discovery
//! - Pseudonymize: the default preset with stable pseudonyms instead of `***`
//!
//! The pseudo-preset `none` is the empty base that ends every inheritance chain.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the empty base configuration.
pub const BASE_IDENTIFIER: &str = "none";

/// Available configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    /// Common PII categories and secret-looking properties
    Default,
    /// Aggressive redaction, fast discovery, extra removals
    Strict,
    /// Default rules, pseudonyms instead of a fixed marker
    Pseudonymize,
}

impl PresetName {
    /// All available preset names.
    pub const ALL: &'static [PresetName] = &[
        PresetName::Default,
        PresetName::Strict,
        PresetName::Pseudonymize,
    ];

    /// Get preset name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Default => "default",
            PresetName::Strict => "strict",
            PresetName::Pseudonymize => "pseudonymize",
        }
    }

    /// Parse preset name from string.
    pub fn parse(s: &str) -> Option<PresetName> {
        match s.to_lowercase().as_str() {
            "default" => Some(PresetName::Default),
            "strict" | "paranoid" => Some(PresetName::Strict),
            "pseudonymize" | "pseudonymise" | "pseudo" => Some(PresetName::Pseudonymize),
            _ => None,
        }
    }

    /// Get a description of the preset.
    pub fn description(&self) -> &'static str {
        match self {
            PresetName::Default => {
                "Emails, IPs, home directories, SSH hosts, internal URLs, secret-looking properties"
            }
            PresetName::Strict => {
                "Default plus hostnames, UUIDs, extra removed event types and fast discovery"
            }
            PresetName::Pseudonymize => "Default rules with stable per-run pseudonyms",
        }
    }

    /// The preset's YAML document.
    pub fn document(&self) -> &'static str {
        match self {
            PresetName::Default => include_str!("../presets/default.yaml"),
            PresetName::Strict => include_str!("../presets/strict.yaml"),
            PresetName::Pseudonymize => include_str!("../presets/pseudonymize.yaml"),
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresetName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetName::parse(s).ok_or_else(|| {
            format!(
                "Unknown preset '{}'. Available: {}",
                s,
                PresetName::ALL
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        })
    }
}

/// Summary of a preset for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetInfo {
    pub name: String,
    pub description: String,
}

impl PresetInfo {
    pub fn from_preset(name: PresetName) -> Self {
        Self {
            name: name.as_str().to_string(),
            description: name.description().to_string(),
        }
    }
}

/// List all built-in presets.
pub fn list_presets() -> Vec<PresetInfo> {
    PresetName::ALL
        .iter()
        .map(|&name| PresetInfo::from_preset(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::ConfigLayer;

    #[test]
    fn parse_aliases() {
        assert_eq!(PresetName::parse("DEFAULT"), Some(PresetName::Default));
        assert_eq!(PresetName::parse("paranoid"), Some(PresetName::Strict));
        assert_eq!(PresetName::parse("pseudo"), Some(PresetName::Pseudonymize));
        assert_eq!(PresetName::parse("none"), None);
        assert_eq!(PresetName::parse("bogus"), None);
    }

    #[test]
    fn unknown_preset_error_lists_available() {
        let err = "bogus".parse::<PresetName>().unwrap_err();
        assert!(err.contains("default, strict, pseudonymize"));
    }

    #[test]
    fn every_preset_document_parses() {
        for preset in PresetName::ALL {
            let layer: ConfigLayer = serde_yaml::from_str(preset.document())
                .unwrap_or_else(|e| panic!("preset {} failed to parse: {}", preset, e));
            assert!(layer.parent.is_some(), "preset {} must name its parent", preset);
        }
    }

    #[test]
    fn list_presets_covers_all_names() {
        let names: Vec<_> = list_presets().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["default", "strict", "pseudonymize"]);
    }
}
