//! JSON Schema for config documents and the list of known config keys.

use crate::layer::ConfigLayer;
use crate::model::RedactionConfig;
use schemars::schema_for;
use serde_json::Value;

/// JSON Schema describing one config document (a [`ConfigLayer`]).
pub fn config_schema() -> Value {
    let schema = schema_for!(ConfigLayer);
    serde_json::to_value(&schema).unwrap_or_default()
}

/// Every dotted config key, sorted.
///
/// Keys are derived from the resolved model so they always match what a
/// document may set. `parent` is included even though it only exists on layers.
pub fn config_keys() -> Vec<String> {
    let mut keys = vec!["parent".to_string()];
    if let Ok(value) = serde_json::to_value(RedactionConfig::base()) {
        collect_keys(&value, "", &mut keys);
    }
    keys.sort();
    keys
}

fn collect_keys(value: &Value, prefix: &str, out: &mut Vec<String>) {
    let Value::Object(map) = value else {
        return;
    };
    for (key, child) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        if child.is_object() {
            collect_keys(child, &path, out);
        } else {
            out.push(path);
        }
    }
}
