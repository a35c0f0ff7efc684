//! Run-scoped pseudonyms.
//!
//! The same original always maps to the same pseudonym within one run, and
//! distinct originals never share one. Hash labels are HMAC-SHA256 digests
//! under a key generated per run, so labels are not comparable across runs.

use crate::error::{RedactionError, Result};
use hmac::{Hmac, Mac};
use scrub_config::{PseudonymFormat, PseudonymMode, PseudonymizationConfig};
use sha2::Sha256;
use std::collections::{HashMap, HashSet};

type HmacSha256 = Hmac<Sha256>;

/// Maximum label length in hash mode (full SHA-256 hex).
const MAX_HASH_LABEL: usize = 64;

pub struct Pseudonymizer {
    settings: PseudonymizationConfig,
    mac: HmacSha256,
    assigned: HashMap<String, String>,
    labels: HashSet<String>,
    next_counter: u64,
}

impl Pseudonymizer {
    /// Create a pseudonymizer with a fresh random key.
    pub fn new(settings: PseudonymizationConfig) -> Result<Self> {
        let mut key = [0u8; 32];
        getrandom::getrandom(&mut key).map_err(|e| {
            RedactionError::KeyError(format!("failed to generate random key: {}", e))
        })?;
        Self::with_key(settings, key)
    }

    /// Create a pseudonymizer with explicit key material.
    pub fn with_key(settings: PseudonymizationConfig, key: [u8; 32]) -> Result<Self> {
        let mac = HmacSha256::new_from_slice(&key)
            .map_err(|e| RedactionError::KeyError(e.to_string()))?;
        Ok(Self {
            settings,
            mac,
            assigned: HashMap::new(),
            labels: HashSet::new(),
            next_counter: 1,
        })
    }

    /// Pseudonym for `original`, assigning one on first sight.
    pub fn pseudonymize(&mut self, original: &str) -> String {
        if let Some(existing) = self.assigned.get(original) {
            return existing.clone();
        }

        let label = match self.settings.mode {
            PseudonymMode::Counter => {
                let label = self.next_counter.to_string();
                self.next_counter += 1;
                label
            }
            PseudonymMode::Hash => self.hash_label(original),
        };
        self.labels.insert(label.clone());

        let pseudonym = self.wrap(&label);
        self.assigned.insert(original.to_string(), pseudonym.clone());
        pseudonym
    }

    /// Number of distinct originals seen.
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    /// Truncated digest, lengthened while it collides with a label in use.
    fn hash_label(&self, original: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(original.as_bytes());
        let digest = hex::encode(mac.finalize().into_bytes());

        let mut len = self.settings.hash_length.clamp(1, MAX_HASH_LABEL);
        while len < MAX_HASH_LABEL && self.labels.contains(&digest[..len]) {
            len += 1;
        }
        let label = &digest[..len];
        if !self.labels.contains(label) {
            return label.to_string();
        }
        // full digests collided; disambiguate
        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", digest, n);
            if !self.labels.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    fn wrap(&self, label: &str) -> String {
        match self.settings.format {
            PseudonymFormat::Redacted => format!("<redacted:{}>", label),
            PseudonymFormat::Hash => format!("<hash:{}>", label),
            PseudonymFormat::Custom => {
                format!("{}{}{}", self.settings.prefix, label, self.settings.suffix)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hashed(len: usize) -> Pseudonymizer {
        let settings = PseudonymizationConfig {
            hash_length: len,
            ..PseudonymizationConfig::default()
        };
        Pseudonymizer::with_key(settings, [7u8; 32]).unwrap()
    }

    #[test]
    fn repeated_original_same_pseudonym() {
        let mut p = hashed(8);
        let first = p.pseudonymize("alice");
        for _ in 0..5 {
            assert_eq!(p.pseudonymize("alice"), first);
        }
        assert!(first.starts_with("<redacted:"));
        assert_eq!(first.len(), "<redacted:>".len() + 8);
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn counter_mode_numbers_in_first_seen_order() {
        let settings = PseudonymizationConfig {
            mode: PseudonymMode::Counter,
            format: PseudonymFormat::Custom,
            prefix: "user_".to_string(),
            suffix: String::new(),
            ..PseudonymizationConfig::default()
        };
        let mut p = Pseudonymizer::with_key(settings, [0u8; 32]).unwrap();
        assert_eq!(p.pseudonymize("bob"), "user_1");
        assert_eq!(p.pseudonymize("carol"), "user_2");
        assert_eq!(p.pseudonymize("bob"), "user_1");
    }

    #[test]
    fn hash_format() {
        let settings = PseudonymizationConfig {
            format: PseudonymFormat::Hash,
            ..PseudonymizationConfig::default()
        };
        let mut p = Pseudonymizer::with_key(settings, [1u8; 32]).unwrap();
        assert!(p.pseudonymize("x").starts_with("<hash:"));
    }

    #[test]
    fn short_labels_lengthen_on_collision() {
        // with 1 hex char at most 16 labels exist, so collisions are certain
        let mut p = hashed(1);
        let values: Vec<String> = (0..40).map(|i| p.pseudonymize(&format!("v{}", i))).collect();
        let unique: HashSet<_> = values.iter().collect();
        assert_eq!(unique.len(), 40);
    }

    #[test]
    fn different_keys_different_labels() {
        let settings = PseudonymizationConfig::default();
        let mut a = Pseudonymizer::with_key(settings.clone(), [1u8; 32]).unwrap();
        let mut b = Pseudonymizer::with_key(settings, [2u8; 32]).unwrap();
        assert_ne!(a.pseudonymize("alice"), b.pseudonymize("alice"));
    }

    proptest! {
        #[test]
        fn distinct_originals_distinct_pseudonyms(values in proptest::collection::hash_set("[a-z0-9]{1,12}", 1..60)) {
            let mut p = hashed(4);
            let mut seen = HashSet::new();
            for v in &values {
                prop_assert!(seen.insert(p.pseudonymize(v)));
            }
            for v in &values {
                let again = p.pseudonymize(v);
                prop_assert!(seen.contains(&again));
            }
        }
    }
}
