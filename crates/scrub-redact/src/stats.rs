//! Per-run counters. Never consulted for decisions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RunStats {
    pub events_read: u64,
    pub events_kept: u64,
    pub events_removed: u64,
    pub events_filtered: u64,
    /// Field values that were replaced or had text substituted.
    pub fields_redacted: u64,
    /// Values of unrecognized type passed through.
    pub opaque_values: u64,
    /// Distinct originals that received a pseudonym.
    pub pseudonyms: u64,
    pub discovered_values: u64,
    /// Substitutions per source (category name, `rules`, `discovered`, `properties`).
    pub matches: BTreeMap<String, u64>,
}

impl RunStats {
    pub fn record_match(&mut self, source: &str) {
        *self.matches.entry(source.to_string()).or_insert(0) += 1;
    }

    pub fn total_matches(&self) -> u64 {
        self.matches.values().sum()
    }
}
