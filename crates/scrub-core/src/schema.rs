//! JSON Schema generation for documents scrub reads and writes.
//!
//! ```bash
//! scrub schema --list
//! scrub schema config
//! scrub schema report
//! ```

use crate::pipeline::RunReport;
use schemars::schema_for;
use serde_json::Value;

/// Available schema types with their descriptions.
pub fn available_schemas() -> Vec<(&'static str, &'static str)> {
    vec![
        ("config", "Config document (one inheritance layer)"),
        ("report", "Run report printed after a redaction"),
    ]
}

/// Generate JSON Schema for a type by name.
///
/// Returns `None` if the name is unknown.
pub fn get_schema(name: &str) -> Option<Value> {
    match name.to_lowercase().as_str() {
        "config" => Some(scrub_config::config_schema()),
        "report" => serde_json::to_value(schema_for!(RunReport)).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_listed_schemas_resolve() {
        for (name, _) in available_schemas() {
            let schema = get_schema(name).unwrap_or_else(|| panic!("no schema for {name}"));
            assert!(schema.is_object(), "{name} schema should be an object");
        }
    }

    #[test]
    fn test_report_schema_mentions_stats() {
        let schema = get_schema("report").unwrap();
        let text = schema.to_string();
        assert!(text.contains("events_removed"));
        assert!(text.contains("passes"));
    }

    #[test]
    fn test_unknown_schema() {
        assert!(get_schema("nope").is_none());
    }
}
