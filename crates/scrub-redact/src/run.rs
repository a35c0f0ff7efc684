//! One redaction run: discovery state, pseudonyms and stats.
//!
//! A run processes events (or text) in order. With fast discovery each string
//! value is observed right before it is transformed, and a value promoted
//! inside that string is only replaced from its crossing occurrence onward.
//! With comprehensive discovery the caller feeds the whole input to
//! [`RedactionRun::observe_event`] first, calls
//! [`RedactionRun::finish_observation`], then processes it again.

use crate::discovery::DiscoveryState;
use crate::engine::{EventDecision, RedactionEngine};
use crate::error::Result;
use crate::pseudonym::Pseudonymizer;
use crate::rules::{token_spans, RuleAction};
use crate::stats::RunStats;
use scrub_config::{DiscoveryMode, ExtractionUnit};
use scrub_container::{Event, Field, TypedValue};
use std::cmp::Reverse;
use tracing::{debug, info};

const RULES_SOURCE: &str = "rules";
const DISCOVERED_SOURCE: &str = "discovered";
const PROPERTIES_SOURCE: &str = "properties";

#[derive(Debug, Clone)]
enum Substitute {
    /// Redaction text or pseudonym of the matched text.
    Marker,
    /// Redaction text or pseudonym of a canonical spelling.
    MarkerOf(String),
    Fixed(String),
}

/// A value promoted while observing one string, and where it crossed.
#[derive(Debug, Clone)]
struct Crossing {
    value: String,
    offset: usize,
}

#[derive(Debug, Clone)]
struct Candidate {
    start: usize,
    end: usize,
    priority: usize,
    source: String,
    substitute: Substitute,
}

pub struct RedactionRun<'e> {
    engine: &'e RedactionEngine,
    discovery: DiscoveryState,
    pseudonyms: Pseudonymizer,
    stats: RunStats,
    counting: bool,
}

impl<'e> RedactionRun<'e> {
    pub(crate) fn new(engine: &'e RedactionEngine, key: Option<[u8; 32]>) -> Result<Self> {
        let settings = engine.config().general.pseudonymization.clone();
        let pseudonyms = match key {
            Some(key) => Pseudonymizer::with_key(settings, key)?,
            None => Pseudonymizer::new(settings)?,
        };
        Ok(Self {
            engine,
            discovery: DiscoveryState::new(),
            pseudonyms,
            stats: RunStats::default(),
            counting: !engine.discovery.jobs.is_empty(),
        })
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn into_stats(self) -> RunStats {
        self.stats
    }

    pub fn discovery(&self) -> &DiscoveryState {
        &self.discovery
    }

    /// Whether this run needs an observation pass before processing.
    pub fn needs_observation_pass(&self) -> bool {
        self.counting && self.engine.discovery_mode() == DiscoveryMode::Comprehensive
    }

    /// Count discovery candidates of an event without transforming it.
    ///
    /// Removed and filtered events are not counted. Does nothing once
    /// observation is finished.
    pub fn observe_event(&mut self, event: &Event) {
        if !self.counting || self.engine.decide(event) != EventDecision::Keep {
            return;
        }
        self.observe_fields(&event.fields);
    }

    /// Count discovery candidates in free text.
    pub fn observe_text(&mut self, text: &str) {
        if self.counting {
            self.observe_leaf(None, text);
        }
    }

    /// Stop counting; the discovered set is frozen from here on.
    pub fn finish_observation(&mut self) {
        if self.counting {
            self.counting = false;
            self.stats.discovered_values = self.discovery.discovered_len() as u64;
            info!(
                discovered = self.discovery.discovered_len(),
                "discovery pass complete"
            );
        }
    }

    /// Remove, filter or transform one event.
    pub fn process_event(&mut self, mut event: Event) -> Option<Event> {
        self.stats.events_read += 1;
        match self.engine.decide(&event) {
            EventDecision::Removed => {
                self.stats.events_removed += 1;
                debug!(event_type = %event.type_name, "event removed");
                return None;
            }
            EventDecision::Filtered => {
                self.stats.events_filtered += 1;
                return None;
            }
            EventDecision::Keep => {}
        }

        self.process_fields(&mut event.fields);
        self.stats.events_kept += 1;
        self.sync_counts();
        Some(event)
    }

    /// Apply rules, string categories and discovered values to free text.
    pub fn redact_text(&mut self, text: &str) -> String {
        let fresh = self.observe_inline(None, text);
        let out = self
            .scan_text(text, &fresh)
            .unwrap_or_else(|| text.to_string());
        self.sync_counts();
        out
    }

    /// Pseudonym of `original` in this run.
    pub fn pseudonymize(&mut self, original: &str) -> String {
        self.pseudonyms.pseudonymize(original)
    }

    fn sync_counts(&mut self) {
        self.stats.pseudonyms = self.pseudonyms.len() as u64;
        self.stats.discovered_values = self.discovery.discovered_len() as u64;
    }

    fn marker(&mut self, original: &str) -> String {
        let engine = self.engine;
        let general = &engine.config().general;
        if general.pseudonymize {
            self.pseudonyms.pseudonymize(original)
        } else {
            general.redaction_text.clone()
        }
    }

    // -- observation -------------------------------------------------------

    fn counts_inline(&self) -> bool {
        self.counting && self.engine.discovery_mode() == DiscoveryMode::Fast
    }

    /// Fast-mode observation of one string just before it is transformed.
    fn observe_inline(&mut self, field_name: Option<&str>, text: &str) -> Vec<Crossing> {
        if self.counts_inline() {
            self.observe_leaf(field_name, text)
        } else {
            Vec::new()
        }
    }

    fn observe_fields(&mut self, fields: &[Field]) {
        for field in fields {
            self.observe_field(field);
        }
    }

    fn observe_field(&mut self, field: &Field) {
        match &field.value {
            TypedValue::String(s) => {
                self.observe_leaf(Some(&field.name), s);
            }
            other => self.observe_value(other),
        }
    }

    fn observe_value(&mut self, value: &TypedValue) {
        match value {
            TypedValue::String(s) => {
                self.observe_leaf(None, s);
            }
            TypedValue::Array(items) => {
                for item in items {
                    self.observe_value(item);
                }
            }
            TypedValue::Object(fields) => self.observe_fields(fields),
            _ => {}
        }
    }

    /// Count one string: field extractions for `field_name`, then category
    /// captures. Returns the values this string promoted.
    fn observe_leaf(&mut self, field_name: Option<&str>, text: &str) -> Vec<Crossing> {
        let engine = self.engine;
        let mut crossings = Vec::new();
        if let Some(name) = field_name {
            for fj in &engine.discovery.fields {
                if fj.names.matches(name) {
                    self.observe_units(fj.job, fj.unit, text, &mut crossings);
                }
            }
        }
        self.observe_captures(text, &mut crossings);
        crossings
    }

    fn observe_units(
        &mut self,
        job: usize,
        unit: ExtractionUnit,
        text: &str,
        crossings: &mut Vec<Crossing>,
    ) {
        match unit {
            ExtractionUnit::Value => {
                let offset = text.len() - text.trim_start().len();
                self.observe_candidate(job, text.trim(), offset, crossings);
            }
            ExtractionUnit::Path => {
                let mut start = 0;
                for (i, c) in text.char_indices().chain([(text.len(), '/')]) {
                    if c != '/' && c != '\\' {
                        continue;
                    }
                    let segment = &text[start..i];
                    let offset = start + segment.len() - segment.trim_start().len();
                    self.observe_candidate(job, segment.trim(), offset, crossings);
                    start = i + 1;
                }
            }
            ExtractionUnit::Tokens => {
                for (start, end) in token_spans(text) {
                    self.observe_candidate(job, &text[start..end], start, crossings);
                }
            }
        }
    }

    /// Capture groups of categories that carry discovery.
    fn observe_captures(&mut self, text: &str, crossings: &mut Vec<Crossing>) {
        let engine = self.engine;
        for category in &engine.categories {
            let Some(plan) = &category.discovery else {
                continue;
            };
            for regex in &category.regexes {
                let group = plan
                    .capture_group
                    .unwrap_or(if regex.captures_len() > 1 { 1 } else { 0 });
                for caps in regex.captures_iter(text) {
                    let Some(m) = caps.get(group) else {
                        continue;
                    };
                    if category.ignore.is_ignored(m.as_str(), &text[..m.start()]) {
                        continue;
                    }
                    self.observe_candidate(plan.job, m.as_str(), m.start(), crossings);
                }
            }
        }
    }

    fn observe_candidate(
        &mut self,
        job: usize,
        candidate: &str,
        offset: usize,
        crossings: &mut Vec<Crossing>,
    ) {
        let engine = self.engine;
        if !engine.discovery.filter.accepts(candidate) {
            return;
        }
        let Some(job_def) = engine.discovery.jobs.get(job) else {
            return;
        };
        if self.discovery.observe(job, job_def, candidate) {
            if let Some(value) = self.discovery.canonical(candidate) {
                crossings.push(Crossing {
                    value: value.to_string(),
                    offset,
                });
            }
        }
    }

    // -- transformation ----------------------------------------------------

    fn process_fields(&mut self, fields: &mut [Field]) {
        let engine = self.engine;
        let key_value_hit = engine
            .properties
            .as_ref()
            .is_some_and(|p| p.key_value_hit(fields));

        for field in fields.iter_mut() {
            let sensitive = engine.properties.as_ref().is_some_and(|p| {
                p.is_sensitive(&field.name) || (key_value_hit && p.is_value_field(&field.name))
            });
            if sensitive {
                if self.counts_inline() {
                    self.observe_field(field);
                }
                if self.replace_whole(&mut field.value) {
                    self.stats.fields_redacted += 1;
                    self.stats.record_match(PROPERTIES_SOURCE);
                }
                continue;
            }
            let changed = match &mut field.value {
                TypedValue::String(s) => {
                    let fresh = self.observe_inline(Some(&field.name), s);
                    self.replace_text(s, &fresh)
                }
                other => self.transform_value(other),
            };
            if changed {
                self.stats.fields_redacted += 1;
            }
        }
    }

    /// Scan textual content. Returns true if anything changed.
    fn transform_value(&mut self, value: &mut TypedValue) -> bool {
        match value {
            TypedValue::String(s) => {
                let fresh = self.observe_inline(None, s);
                self.replace_text(s, &fresh)
            }
            TypedValue::Array(items) => {
                let mut changed = false;
                for item in items.iter_mut() {
                    changed |= self.transform_value(item);
                }
                changed
            }
            TypedValue::Object(fields) => {
                self.process_fields(fields);
                false
            }
            TypedValue::Opaque(_) => {
                self.stats.opaque_values += 1;
                false
            }
            TypedValue::Null | TypedValue::Bool(_) | TypedValue::Int(_) | TypedValue::Float(_) => {
                false
            }
        }
    }

    fn replace_text(&mut self, s: &mut String, fresh: &[Crossing]) -> bool {
        match self.scan_text(s, fresh) {
            Some(out) => {
                *s = out;
                true
            }
            None => false,
        }
    }

    /// Replace a sensitive value leaf by leaf. Returns true if anything changed.
    fn replace_whole(&mut self, value: &mut TypedValue) -> bool {
        match value {
            TypedValue::String(s) => {
                *s = self.marker(s);
                true
            }
            TypedValue::Int(i) => {
                *i = 0;
                true
            }
            TypedValue::Float(f) => {
                *f = 0.0;
                true
            }
            TypedValue::Array(items) => {
                let mut changed = false;
                for item in items.iter_mut() {
                    changed |= self.replace_whole(item);
                }
                changed
            }
            TypedValue::Object(fields) => {
                let mut changed = false;
                for field in fields.iter_mut() {
                    changed |= self.replace_whole(&mut field.value);
                }
                changed
            }
            TypedValue::Opaque(_) => {
                self.stats.opaque_values += 1;
                false
            }
            TypedValue::Null | TypedValue::Bool(_) => false,
        }
    }

    /// Find every substitution in `text`; `None` when nothing matched.
    ///
    /// Values in `fresh` were promoted inside `text` and are only replaced
    /// at or after their crossing offset.
    fn scan_text(&mut self, text: &str, fresh: &[Crossing]) -> Option<String> {
        if text.is_empty() {
            return None;
        }
        let engine = self.engine;
        let mut candidates: Vec<Candidate> = Vec::new();
        let mut shields: Vec<(usize, usize)> = Vec::new();

        if !engine.rules.is_empty() {
            for (start, end) in token_spans(text) {
                let substitute = match engine.rules.decide(&text[start..end]) {
                    Some(RuleAction::Keep) => {
                        shields.push((start, end));
                        continue;
                    }
                    Some(RuleAction::Redact) => Substitute::Marker,
                    Some(RuleAction::Replace(r)) => Substitute::Fixed(r.clone()),
                    None => continue,
                };
                candidates.push(Candidate {
                    start,
                    end,
                    priority: 0,
                    source: RULES_SOURCE.to_string(),
                    substitute,
                });
            }
        }

        let shielded =
            |s: usize, e: usize| shields.iter().any(|&(ks, ke)| s < ke && ks < e);

        for (order, category) in engine.categories.iter().enumerate() {
            for regex in &category.regexes {
                for caps in regex.captures_iter(text) {
                    let m = match category.group {
                        Some(g) => caps.get(g),
                        None => caps.get(0),
                    };
                    let Some(m) = m else {
                        continue;
                    };
                    if m.as_str().is_empty() || shielded(m.start(), m.end()) {
                        continue;
                    }
                    if category.ignore.is_ignored(m.as_str(), &text[..m.start()]) {
                        continue;
                    }
                    candidates.push(Candidate {
                        start: m.start(),
                        end: m.end(),
                        priority: order + 1,
                        source: category.name.clone(),
                        substitute: category
                            .replacement
                            .clone()
                            .map_or(Substitute::Marker, Substitute::Fixed),
                    });
                }
            }
        }

        if self.discovery.discovered_len() > 0 {
            for (start, end) in self.discovery.find_spans(text) {
                if shielded(start, end) {
                    continue;
                }
                let canonical = self
                    .discovery
                    .canonical(&text[start..end])
                    .unwrap_or(&text[start..end])
                    .to_string();
                if fresh
                    .iter()
                    .any(|c| c.value == canonical && start < c.offset)
                {
                    continue;
                }
                candidates.push(Candidate {
                    start,
                    end,
                    priority: usize::MAX,
                    source: DISCOVERED_SOURCE.to_string(),
                    substitute: Substitute::MarkerOf(canonical),
                });
            }
        }

        if candidates.is_empty() {
            return None;
        }

        // leftmost first, then longest, then rules before categories before discovery
        candidates.sort_by_key(|c| (c.start, Reverse(c.end - c.start), c.priority));

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for candidate in candidates {
            if candidate.start < cursor {
                continue;
            }
            out.push_str(&text[cursor..candidate.start]);
            let replacement = match &candidate.substitute {
                Substitute::Marker => self.marker(&text[candidate.start..candidate.end]),
                Substitute::MarkerOf(canonical) => self.marker(canonical),
                Substitute::Fixed(fixed) => fixed.clone(),
            };
            out.push_str(&replacement);
            self.stats.record_match(&candidate.source);
            cursor = candidate.end;
        }
        out.push_str(&text[cursor..]);
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrub_config::{CategoryDiscovery, CustomPattern, PatternCategory, RedactionConfig};
    use std::sync::Arc;

    fn engine_with(f: impl FnOnce(&mut RedactionConfig)) -> RedactionEngine {
        let mut config = RedactionConfig::base();
        f(&mut config);
        RedactionEngine::new(Arc::new(config)).unwrap()
    }

    fn custom(name: &str, pattern: &str) -> CustomPattern {
        CustomPattern {
            name: name.to_string(),
            category: PatternCategory {
                patterns: vec![pattern.to_string()],
                ..PatternCategory::default()
            },
        }
    }

    #[test]
    fn redact_rule_scenario() {
        let engine = engine_with(|c| c.strings.rules = vec!["- secret*".to_string()]);
        let mut run = engine.start_run().unwrap();
        assert_eq!(
            run.redact_text("Values: secret123, secretKey, mysecret, public"),
            "Values: ***, ***, mysecret, public"
        );
    }

    #[test]
    fn keep_rules_checked_first_scenario() {
        let engine = engine_with(|c| {
            c.strings.rules = vec![
                "+ admin*".to_string(),
                "- user*".to_string(),
                "- Administrator".to_string(),
            ]
        });
        let mut run = engine.start_run().unwrap();
        assert_eq!(
            run.redact_text("Users: admin, adminUser, Administrator, user123"),
            "Users: admin, adminUser, ***, ***"
        );
    }

    #[test]
    fn replace_rule_scenario() {
        let engine =
            engine_with(|c| c.strings.rules = vec!["! prod-server-* PRODUCTION".to_string()]);
        let mut run = engine.start_run().unwrap();
        assert_eq!(
            run.redact_text("Servers: prod-server-01, prod-server-02, dev-server"),
            "Servers: PRODUCTION, PRODUCTION, dev-server"
        );
    }

    #[test]
    fn kept_tokens_shield_category_matches() {
        let engine = engine_with(|c| {
            c.strings.rules = vec!["+ build-42".to_string()];
            c.strings.custom.push(custom("ids", r"\w+-\d+"));
        });
        let mut run = engine.start_run().unwrap();
        assert_eq!(run.redact_text("build-42 and job-7"), "build-42 and ***");
    }

    #[test]
    fn overlapping_matches_leftmost_longest() {
        let engine = engine_with(|c| {
            c.strings.custom.push(custom("short", r"abc"));
            c.strings.custom.push(CustomPattern {
                name: "long".to_string(),
                category: PatternCategory {
                    patterns: vec![r"abcdef".to_string()],
                    replacement: Some("[L]".to_string()),
                    ..PatternCategory::default()
                },
            });
        });
        let mut run = engine.start_run().unwrap();
        assert_eq!(run.redact_text("xx abcdef abc"), "xx [L] ***");
        assert_eq!(run.stats().matches.get("long"), Some(&1));
        assert_eq!(run.stats().matches.get("short"), Some(&1));
    }

    #[test]
    fn capture_group_limits_replacement() {
        let engine = engine_with(|c| {
            c.strings.user.patterns = vec![r"/home/([^/\s]+)".to_string()];
            c.strings.user.group = Some(1);
        });
        let mut run = engine.start_run().unwrap();
        assert_eq!(run.redact_text("cd /home/alice/src"), "cd /home/***/src");
    }

    #[test]
    fn ignore_after_context_exempts_match() {
        let engine = engine_with(|c| {
            c.strings.ip_addresses.patterns = vec![r"\b(?:\d{1,3}\.){3}\d{1,3}\b".to_string()];
            c.strings.ip_addresses.ignore_after = vec!["version ".to_string()];
        });
        let mut run = engine.start_run().unwrap();
        assert_eq!(
            run.redact_text("version 1.2.3.4 from 10.0.0.1"),
            "version 1.2.3.4 from ***"
        );
    }

    #[test]
    fn property_values_replaced_by_type() {
        let engine = engine_with(|c| c.properties.patterns = vec!["secret".to_string()]);
        let mut run = engine.start_run().unwrap();
        let event = Event::new("e")
            .with_field("secret_text", "hunter2")
            .with_field("secret_num", 42_i64)
            .with_field("secret_float", 1.5_f64)
            .with_field("secret_flag", true)
            .with_field(
                "secret_list",
                vec![TypedValue::from("a"), TypedValue::Int(3), TypedValue::Null],
            )
            .with_field("public", "hunter2");
        let out = run.process_event(event).unwrap();
        assert_eq!(out.fields[0].value, TypedValue::from("***"));
        assert_eq!(out.fields[1].value, TypedValue::Int(0));
        assert_eq!(out.fields[2].value, TypedValue::Float(0.0));
        assert_eq!(out.fields[3].value, TypedValue::Bool(true));
        assert_eq!(
            out.fields[4].value,
            TypedValue::Array(vec![TypedValue::from("***"), TypedValue::Int(0), TypedValue::Null])
        );
        assert_eq!(out.fields[5].value, TypedValue::from("hunter2"));
        assert_eq!(run.stats().fields_redacted, 4);
    }

    #[test]
    fn key_value_property_events() {
        let engine = engine_with(|c| {
            c.properties.patterns = vec!["password".to_string()];
            c.properties.key_fields = vec!["key".to_string()];
            c.properties.value_fields = vec!["value".to_string()];
        });
        let mut run = engine.start_run().unwrap();
        let hit = Event::new("jdk.InitialSystemProperty")
            .with_field("key", "db.password")
            .with_field("value", "s3cr3t");
        let miss = Event::new("jdk.InitialSystemProperty")
            .with_field("key", "java.version")
            .with_field("value", "21");
        let hit = run.process_event(hit).unwrap();
        let miss = run.process_event(miss).unwrap();
        assert_eq!(hit.fields[0].value.as_str(), Some("db.password"));
        assert_eq!(hit.fields[1].value.as_str(), Some("***"));
        assert_eq!(miss.fields[1].value.as_str(), Some("21"));
    }

    #[test]
    fn nested_objects_processed() {
        let engine = engine_with(|c| {
            c.properties.patterns = vec!["token".to_string()];
            c.strings.emails.patterns = vec![r"[a-z]+@[a-z]+\.com".to_string()];
        });
        let mut run = engine.start_run().unwrap();
        let event = Event::new("e").with_field(
            "request",
            vec![
                Field::new("token", "abc"),
                Field::new("from", "mail bob@corp.com"),
            ],
        );
        let out = run.process_event(event).unwrap();
        let TypedValue::Object(inner) = &out.fields[0].value else {
            panic!("expected object");
        };
        assert_eq!(inner[0].value.as_str(), Some("***"));
        assert_eq!(inner[1].value.as_str(), Some("mail ***"));
    }

    #[test]
    fn pseudonyms_stable_across_events() {
        let engine = engine_with(|c| {
            c.general.pseudonymize = true;
            c.strings.emails.patterns = vec![r"[a-z]+@[a-z]+\.com".to_string()];
        });
        let mut run = engine.start_run_with_key([3u8; 32]).unwrap();
        let a = run.redact_text("from bob@corp.com");
        let b = run.redact_text("to bob@corp.com");
        let c = run.redact_text("to eve@corp.com");
        assert_eq!(a.trim_start_matches("from "), b.trim_start_matches("to "));
        assert_ne!(b, c);
        assert!(a.contains("<redacted:"));
        assert_eq!(run.stats().pseudonyms, 2);
    }

    #[test]
    fn opaque_values_counted_and_untouched() {
        let engine = engine_with(|c| c.properties.patterns = vec!["cls".to_string()]);
        let mut run = engine.start_run().unwrap();
        let raw = serde_json::json!({"type": "class", "value": {"name": "Foo"}});
        let event = Event::new("e")
            .with_field("cls", TypedValue::Opaque(raw.clone()))
            .with_field("other", TypedValue::Opaque(raw.clone()));
        let out = run.process_event(event).unwrap();
        assert_eq!(out.fields[0].value, TypedValue::Opaque(raw.clone()));
        assert_eq!(out.fields[1].value, TypedValue::Opaque(raw));
        assert_eq!(run.stats().opaque_values, 2);
    }

    #[test]
    fn fast_discovery_redacts_from_crossing_on() {
        let engine = engine_with(|c| {
            c.discovery.mode = DiscoveryMode::Fast;
            c.discovery.min_occurrences = 3;
            c.discovery.fields = vec![scrub_config::FieldExtraction {
                field: "user".to_string(),
                unit: ExtractionUnit::Value,
                min_occurrences: None,
            }];
        });
        let mut run = engine.start_run().unwrap();
        let outputs: Vec<String> = (0..4)
            .map(|_| {
                let event = Event::new("e")
                    .with_field("user", "alice")
                    .with_field("msg", "login by alice");
                let out = run.process_event(event).unwrap();
                out.fields[1].value.as_str().unwrap_or_default().to_string()
            })
            .collect();
        assert_eq!(outputs[0], "login by alice");
        assert_eq!(outputs[1], "login by alice");
        assert_eq!(outputs[2], "login by ***");
        assert_eq!(outputs[3], "login by ***");
    }

    #[test]
    fn fast_discovery_keeps_earlier_fields_of_same_event() {
        let engine = engine_with(|c| {
            c.discovery.mode = DiscoveryMode::Fast;
            c.discovery.min_occurrences = 2;
            c.discovery.fields = vec![scrub_config::FieldExtraction {
                field: "owner".to_string(),
                unit: ExtractionUnit::Value,
                min_occurrences: None,
            }];
        });
        let mut run = engine.start_run().unwrap();
        let event = Event::new("e")
            .with_field("owner", "zed")
            .with_field("owner", "zed")
            .with_field("note", "zed again");
        let out = run.process_event(event).unwrap();
        let values: Vec<_> = out.fields.iter().map(|f| f.value.as_str().unwrap()).collect();
        assert_eq!(values, vec!["zed", "***", "*** again"]);
    }

    #[test]
    fn fast_discovery_keeps_earlier_occurrences_in_same_line() {
        let engine = engine_with(|c| {
            c.discovery.mode = DiscoveryMode::Fast;
            c.strings.custom.push(CustomPattern {
                name: "owners".to_string(),
                category: PatternCategory {
                    patterns: vec![r"owner=(\w+)".to_string()],
                    group: Some(1),
                    discovery: Some(CategoryDiscovery {
                        enabled: true,
                        min_occurrences: Some(2),
                        ..CategoryDiscovery::default()
                    }),
                    ..PatternCategory::default()
                },
            });
        });
        let mut run = engine.start_run().unwrap();
        assert_eq!(
            run.redact_text("dave owner=dave owner=dave dave"),
            "dave owner=*** owner=*** ***"
        );
        assert_eq!(run.redact_text("dave"), "***");
    }

    #[test]
    fn category_discovery_spreads_to_other_text() {
        let engine = engine_with(|c| {
            c.discovery.mode = DiscoveryMode::Comprehensive;
            c.strings.user.patterns = vec![r"/home/([^/\s]+)".to_string()];
            c.strings.user.group = Some(1);
            c.strings.user.discovery = Some(CategoryDiscovery {
                enabled: true,
                min_occurrences: Some(2),
                ..CategoryDiscovery::default()
            });
        });
        let mut run = engine.start_run().unwrap();
        let lines = ["user carol logged in", "/home/carol/a", "/home/carol/b"];
        assert!(run.needs_observation_pass());
        for line in lines {
            run.observe_text(line);
        }
        run.finish_observation();
        assert_eq!(run.redact_text(lines[0]), "user *** logged in");
        assert_eq!(run.redact_text(lines[1]), "/home/***/a");
        assert_eq!(run.stats().discovered_values, 1);
    }

    #[test]
    fn discovery_respects_category_ignore_exact() {
        let engine = engine_with(|c| {
            c.discovery.mode = DiscoveryMode::Fast;
            c.strings.custom.push(CustomPattern {
                name: "owners".to_string(),
                category: PatternCategory {
                    patterns: vec![r"owner=(\w+)".to_string()],
                    ignore_exact: vec!["system".to_string()],
                    group: Some(1),
                    discovery: Some(CategoryDiscovery {
                        enabled: true,
                        min_occurrences: Some(1),
                        ..CategoryDiscovery::default()
                    }),
                    ..PatternCategory::default()
                },
            });
        });
        let mut run = engine.start_run().unwrap();
        assert_eq!(run.redact_text("owner=system"), "owner=system");
        assert_eq!(run.redact_text("owner=dave"), "owner=***");
        assert_eq!(run.redact_text("system dave"), "system ***");
    }

    #[test]
    fn disabled_strings_leave_text_alone() {
        let engine = engine_with(|c| {
            c.strings.enabled = false;
            c.strings.rules = vec!["- secret*".to_string()];
            c.strings.custom.push(custom("x", "secret"));
        });
        let mut run = engine.start_run().unwrap();
        assert_eq!(run.redact_text("secret1"), "secret1");
    }
}
