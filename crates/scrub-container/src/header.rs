//! Container header (first line of every container).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Format identifier written to the header.
pub const FORMAT_NAME: &str = "scrub-events";

/// Current container version.
pub const FORMAT_VERSION: u32 = 1;

/// Container header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerHeader {
    pub format: String,
    pub version: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl ContainerHeader {
    pub fn new() -> Self {
        Self {
            format: FORMAT_NAME.to_string(),
            version: FORMAT_VERSION,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl Default for ContainerHeader {
    fn default() -> Self {
        Self::new()
    }
}
