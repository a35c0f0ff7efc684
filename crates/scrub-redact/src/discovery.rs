//! Frequency-based discovery of recurring sensitive values.
//!
//! Candidates are counted per job (a field extraction or a pattern category
//! with discovery enabled). A candidate whose count reaches the job's
//! threshold is promoted to discovered; promotion is one-way for the run.
//! Discovered values are then found in any text at token boundaries.

use crate::pattern::{fold, IgnoreRules, PatternSet};
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Counting parameters of one discovery source.
#[derive(Debug, Clone)]
pub struct DiscoveryJob {
    pub name: String,
    pub min_occurrences: usize,
    pub case_sensitive: bool,
}

/// Global candidate filters from the `discovery` section.
#[derive(Debug, Clone, Default)]
pub struct CandidateFilter {
    pub min_length: usize,
    pub ignore: IgnoreRules,
}

impl CandidateFilter {
    pub fn new(min_length: usize, ignore_exact: &[String], ignore: &[String], case_sensitive: bool) -> crate::Result<Self> {
        let empty: [String; 0] = [];
        Ok(Self {
            min_length,
            ignore: IgnoreRules::compile(ignore_exact, ignore, &empty, case_sensitive)?,
        })
    }

    pub fn accepts(&self, candidate: &str) -> bool {
        !candidate.is_empty()
            && candidate.chars().count() >= self.min_length
            && !self.ignore.is_ignored(candidate, "")
    }
}

/// A discovered value, for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredValue {
    pub value: String,
    pub occurrences: usize,
    pub source: String,
}

#[derive(Debug)]
struct Counter {
    original: String,
    source: String,
    count: usize,
    discovered: bool,
}

#[derive(Debug)]
struct Promoted {
    value: String,
    case_sensitive: bool,
}

/// Run-scoped discovery counters and the discovered set.
#[derive(Debug, Default)]
pub struct DiscoveryState {
    counters: HashMap<(usize, String), Counter>,
    promoted: Vec<Promoted>,
    exact: HashMap<String, usize>,
    folded: HashMap<String, usize>,
    matcher: Option<Regex>,
    /// One `\A`-anchored regex per value, longest first.
    anchored: Vec<Regex>,
    dirty: bool,
}

impl DiscoveryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence. Returns true when this occurrence added the value
    /// to the discovered set.
    pub fn observe(&mut self, job_index: usize, job: &DiscoveryJob, candidate: &str) -> bool {
        if candidate.is_empty() {
            return false;
        }
        let key = fold(candidate, job.case_sensitive);
        let counter = self
            .counters
            .entry((job_index, key))
            .or_insert_with(|| Counter {
                original: candidate.to_string(),
                source: job.name.clone(),
                count: 0,
                discovered: false,
            });
        counter.count += 1;
        if counter.discovered || counter.count < job.min_occurrences {
            return false;
        }
        counter.discovered = true;
        let value = counter.original.clone();
        debug!(
            source = %job.name,
            occurrences = counter.count,
            "value promoted to discovered"
        );
        self.promote(value, job.case_sensitive)
    }

    fn promote(&mut self, value: String, case_sensitive: bool) -> bool {
        if self.lookup(&value).is_some() {
            return false;
        }
        let index = self.promoted.len();
        if case_sensitive {
            self.exact.insert(value.clone(), index);
        } else {
            self.folded.insert(value.to_lowercase(), index);
        }
        self.promoted.push(Promoted {
            value,
            case_sensitive,
        });
        self.dirty = true;
        true
    }

    /// Number of discovered values.
    pub fn discovered_len(&self) -> usize {
        self.promoted.len()
    }

    /// Whether `value` is discovered, under its job's case rules.
    pub fn is_discovered(&self, value: &str) -> bool {
        self.lookup(value).is_some()
    }

    /// Discovered values with their counts, sorted by value.
    pub fn discovered_values(&self) -> Vec<DiscoveredValue> {
        let mut values: Vec<DiscoveredValue> = self
            .counters
            .values()
            .filter(|c| c.discovered)
            .map(|c| DiscoveredValue {
                value: c.original.clone(),
                occurrences: c.count,
                source: c.source.clone(),
            })
            .collect();
        values.sort_by(|a, b| a.value.cmp(&b.value).then(a.source.cmp(&b.source)));
        values
    }

    /// First-seen spelling of a discovered value matching `text`.
    pub fn canonical(&self, text: &str) -> Option<&str> {
        self.lookup(text).map(|i| self.promoted[i].value.as_str())
    }

    fn lookup(&self, text: &str) -> Option<usize> {
        self.exact
            .get(text)
            .or_else(|| self.folded.get(&text.to_lowercase()))
            .copied()
    }

    fn rebuild_matcher(&mut self) {
        self.dirty = false;
        self.anchored.clear();
        if self.promoted.is_empty() {
            self.matcher = None;
            return;
        }
        let mut ordered: Vec<&Promoted> = self.promoted.iter().collect();
        // longest first so the alternation prefers the longest value at a position
        ordered.sort_by(|a, b| b.value.len().cmp(&a.value.len()));
        let alternatives: Vec<String> = ordered
            .iter()
            .map(|p| {
                let flag = if p.case_sensitive { "-i" } else { "i" };
                format!("(?{}:{})", flag, regex::escape(&p.value))
            })
            .collect();
        match RegexBuilder::new(&alternatives.join("|"))
            .size_limit(64 << 20)
            .build()
        {
            Ok(re) => self.matcher = Some(re),
            Err(e) => {
                warn!(values = self.promoted.len(), error = %e, "discovered-value matcher too large");
                self.matcher = None;
                return;
            }
        }
        self.anchored = alternatives
            .iter()
            .filter_map(|alt| Regex::new(&format!(r"\A{}", alt)).ok())
            .collect();
    }

    /// Byte spans of discovered values in `text`, at token boundaries.
    pub fn find_spans(&mut self, text: &str) -> Vec<(usize, usize)> {
        if self.dirty {
            self.rebuild_matcher();
        }
        let Some(matcher) = &self.matcher else {
            return Vec::new();
        };

        let mut spans = Vec::new();
        let mut pos = 0;
        while pos < text.len() {
            let Some(m) = matcher.find_at(text, pos) else {
                break;
            };
            if m.start() == m.end() {
                break;
            }
            let start = m.start();
            let hit = if at_token_boundary(text, start, m.end()) {
                Some(m.end())
            } else {
                // a shorter value may still end on a boundary here
                self.anchored
                    .iter()
                    .filter_map(|re| re.find(&text[start..]))
                    .map(|am| start + am.end())
                    .find(|&end| end > start && at_token_boundary(text, start, end))
            };
            match hit {
                Some(end) => {
                    spans.push((start, end));
                    pos = end;
                }
                None => pos = next_char_boundary(text, start),
            }
        }
        spans
    }
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A value edge made of a word character must not touch another word character.
fn at_token_boundary(text: &str, start: usize, end: usize) -> bool {
    let value = &text[start..end];
    let first = value.chars().next();
    let last = value.chars().next_back();
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();

    let left_ok = !(first.is_some_and(is_word) && before.is_some_and(is_word));
    let right_ok = !(last.is_some_and(is_word) && after.is_some_and(is_word));
    left_ok && right_ok
}

fn next_char_boundary(text: &str, from: usize) -> usize {
    text[from..]
        .chars()
        .next()
        .map_or(text.len(), |c| from + c.len_utf8())
}

/// Field-name patterns that feed a discovery job.
#[derive(Debug, Clone)]
pub struct FieldJob {
    pub names: PatternSet,
    pub unit: scrub_config::ExtractionUnit,
    pub job: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(min: usize, case_sensitive: bool) -> DiscoveryJob {
        DiscoveryJob {
            name: "test".to_string(),
            min_occurrences: min,
            case_sensitive,
        }
    }

    #[test]
    fn promotes_at_threshold_once() {
        let mut state = DiscoveryState::new();
        let j = job(3, true);
        assert!(!state.observe(0, &j, "alice"));
        assert!(!state.observe(0, &j, "alice"));
        assert!(state.observe(0, &j, "alice"));
        assert!(!state.observe(0, &j, "alice"));
        assert_eq!(state.discovered_len(), 1);
        assert_eq!(state.discovered_values()[0].occurrences, 4);
    }

    #[test]
    fn case_insensitive_keeps_first_spelling() {
        let mut state = DiscoveryState::new();
        let j = job(2, false);
        state.observe(0, &j, "Alice");
        state.observe(0, &j, "ALICE");
        assert_eq!(state.canonical("alice"), Some("Alice"));
        let spans = state.find_spans("alice met ALICE and Alice");
        assert_eq!(spans.len(), 3);
    }

    #[test]
    fn case_sensitive_counts_separately() {
        let mut state = DiscoveryState::new();
        let j = job(2, true);
        state.observe(0, &j, "Bob");
        state.observe(0, &j, "bob");
        assert_eq!(state.discovered_len(), 0);
    }

    #[test]
    fn jobs_count_independently() {
        let mut state = DiscoveryState::new();
        let j = job(2, true);
        state.observe(0, &j, "x1");
        state.observe(1, &j, "x1");
        assert_eq!(state.discovered_len(), 0);
    }

    #[test]
    fn spans_respect_token_boundaries() {
        let mut state = DiscoveryState::new();
        let j = job(1, true);
        state.observe(0, &j, "bob");
        let text = "bobby bob /home/bob x_bob bob.";
        let spans = state.find_spans(text);
        let found: Vec<_> = spans.iter().map(|&(s, _)| s).collect();
        assert_eq!(found, vec![6, 16, 26]);
    }

    #[test]
    fn longest_value_preferred() {
        let mut state = DiscoveryState::new();
        let j = job(1, true);
        state.observe(0, &j, "db");
        state.observe(0, &j, "db-prod");
        let text = "connect db-prod now";
        assert_eq!(state.find_spans(text), vec![(8, 15)]);
    }

    #[test]
    fn shorter_value_tried_when_longest_breaks_boundary() {
        let mut state = DiscoveryState::new();
        let j = job(1, true);
        state.observe(0, &j, "db");
        state.observe(0, &j, "db-prod");
        assert_eq!(
            state.find_spans("db-production and db"),
            vec![(0, 2), (18, 20)]
        );
    }

    #[test]
    fn observe_reports_only_new_values() {
        let mut state = DiscoveryState::new();
        let j = job(1, false);
        assert!(state.observe(0, &j, "Carol"));
        // same value reaching the threshold in another job is not new
        assert!(!state.observe(1, &j, "carol"));
        assert_eq!(state.discovered_len(), 1);
    }

    #[test]
    fn candidate_filter() {
        let filter = CandidateFilter::new(
            3,
            &["root".to_string()],
            &["tmp*".to_string()],
            false,
        )
        .unwrap();
        assert!(filter.accepts("alice"));
        assert!(!filter.accepts("ab"));
        assert!(!filter.accepts("ROOT"));
        assert!(!filter.accepts("tmp123"));
    }
}
