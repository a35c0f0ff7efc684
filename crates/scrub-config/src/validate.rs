//! Semantic validation of resolved configuration.

use crate::model::{PatternCategory, RedactionConfig};
use regex::Regex;
use thiserror::Error;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid regex in {field}: {message}")]
    InvalidRegex { field: String, message: String },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::InvalidRegex { .. } => 61,
            ValidationError::InvalidValue { .. } => 65,
        }
    }
}

/// Strip the `/.../` delimiters of a regex-form pattern, if present.
fn regex_body(pattern: &str) -> Option<&str> {
    if pattern.len() >= 2 && pattern.starts_with('/') && pattern.ends_with('/') {
        Some(&pattern[1..pattern.len() - 1])
    } else {
        None
    }
}

fn check_regex(field: &str, source: &str) -> ValidationResult<Regex> {
    Regex::new(source).map_err(|e| ValidationError::InvalidRegex {
        field: field.to_string(),
        message: e.to_string(),
    })
}

/// Name patterns only need checking when they use the `/regex/` form.
fn check_name_patterns(field: &str, patterns: &[String]) -> ValidationResult<()> {
    for (i, pattern) in patterns.iter().enumerate() {
        if let Some(body) = regex_body(pattern) {
            check_regex(&format!("{}[{}]", field, i), body)?;
        }
    }
    Ok(())
}

fn check_min_occurrences(field: &str, value: usize) -> ValidationResult<()> {
    if value == 0 {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: "must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_category(name: &str, category: &PatternCategory) -> ValidationResult<()> {
    for (i, pattern) in category.patterns.iter().enumerate() {
        let field = format!("strings.{}.patterns[{}]", name, i);
        let source = regex_body(pattern).unwrap_or(pattern);
        let regex = check_regex(&field, source)?;
        let groups = regex.captures_len() - 1;

        if let Some(group) = category.group {
            if group > groups {
                return Err(ValidationError::InvalidValue {
                    field: format!("strings.{}.group", name),
                    message: format!("pattern {} has only {} capture groups", i, groups),
                });
            }
        }
        if let Some(group) = category.discovery.as_ref().and_then(|d| d.capture_group) {
            if group > groups {
                return Err(ValidationError::InvalidValue {
                    field: format!("strings.{}.discovery.capture_group", name),
                    message: format!("pattern {} has only {} capture groups", i, groups),
                });
            }
        }
    }
    for (i, ctx) in category.ignore_after.iter().enumerate() {
        let source = regex_body(ctx).unwrap_or(ctx);
        check_regex(&format!("strings.{}.ignore_after[{}]", name, i), source)?;
    }
    check_name_patterns(&format!("strings.{}.ignore", name), &category.ignore)?;
    if let Some(min) = category.discovery.as_ref().and_then(|d| d.min_occurrences) {
        check_min_occurrences(&format!("strings.{}.discovery.min_occurrences", name), min)?;
    }
    Ok(())
}

/// Validate a resolved configuration.
pub fn validate_config(config: &RedactionConfig) -> ValidationResult<()> {
    if config.general.redaction_text.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "general.redaction_text".to_string(),
            message: "must not be empty".to_string(),
        });
    }

    let hash_length = config.general.pseudonymization.hash_length;
    if !(4..=64).contains(&hash_length) {
        return Err(ValidationError::InvalidValue {
            field: "general.pseudonymization.hash_length".to_string(),
            message: format!("must be in [4, 64], got {}", hash_length),
        });
    }

    check_name_patterns("properties.patterns", &config.properties.patterns)?;
    check_name_patterns("properties.ignore", &config.properties.ignore)?;

    for (name, category) in config.builtin_categories() {
        validate_category(name, category)?;
    }
    for custom in &config.strings.custom {
        if custom.name.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "strings.custom.name".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        validate_category(&format!("custom.{}", custom.name), &custom.category)?;
    }

    for (i, rule) in config.strings.rules.iter().enumerate() {
        let trimmed = rule.trim_start();
        let valid = trimmed.starts_with('-') || trimmed.starts_with('+') || trimmed.starts_with('!');
        if !valid || trimmed[1..].trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: format!("strings.rules[{}]", i),
                message: format!("expected '- pattern', '+ pattern' or '! pattern replacement', got {:?}", rule),
            });
        }
    }

    let filtering = &config.events.filtering;
    check_name_patterns("events.removed_types", &config.events.removed_types)?;
    check_name_patterns("events.filtering.include_events", &filtering.include_events)?;
    check_name_patterns("events.filtering.exclude_events", &filtering.exclude_events)?;
    check_name_patterns("events.filtering.include_categories", &filtering.include_categories)?;
    check_name_patterns("events.filtering.exclude_categories", &filtering.exclude_categories)?;
    check_name_patterns("events.filtering.include_threads", &filtering.include_threads)?;
    check_name_patterns("events.filtering.exclude_threads", &filtering.exclude_threads)?;

    check_min_occurrences("discovery.min_occurrences", config.discovery.min_occurrences)?;
    check_name_patterns("discovery.ignore", &config.discovery.ignore)?;
    for (i, extraction) in config.discovery.fields.iter().enumerate() {
        check_name_patterns(
            &format!("discovery.fields[{}].field", i),
            std::slice::from_ref(&extraction.field),
        )?;
        if let Some(min) = extraction.min_occurrences {
            check_min_occurrences(&format!("discovery.fields[{}].min_occurrences", i), min)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CategoryDiscovery, CustomPattern};

    #[test]
    fn base_config_is_valid() {
        assert!(validate_config(&RedactionConfig::base()).is_ok());
    }

    #[test]
    fn bad_regex_rejected() {
        let mut config = RedactionConfig::base();
        config.strings.emails.patterns = vec!["([a-z".to_string()];
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidRegex { .. }));
        assert_eq!(err.code(), 61);
    }

    #[test]
    fn missing_capture_group_rejected() {
        let mut config = RedactionConfig::base();
        config.strings.custom.push(CustomPattern {
            name: "ids".to_string(),
            category: PatternCategory {
                patterns: vec![r"ID-\d+".to_string()],
                discovery: Some(CategoryDiscovery {
                    enabled: true,
                    capture_group: Some(1),
                    ..CategoryDiscovery::default()
                }),
                ..PatternCategory::default()
            },
        });
        assert!(matches!(
            validate_config(&config),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn zero_threshold_rejected() {
        let mut config = RedactionConfig::base();
        config.discovery.min_occurrences = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn malformed_rule_rejected() {
        let mut config = RedactionConfig::base();
        config.strings.rules = vec!["secret*".to_string()];
        assert!(validate_config(&config).is_err());
        config.strings.rules = vec!["- secret*".to_string(), "! prod-* PROD".to_string()];
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn hash_length_bounds() {
        let mut config = RedactionConfig::base();
        config.general.pseudonymization.hash_length = 2;
        assert!(validate_config(&config).is_err());
        config.general.pseudonymization.hash_length = 64;
        assert!(validate_config(&config).is_ok());
    }
}
