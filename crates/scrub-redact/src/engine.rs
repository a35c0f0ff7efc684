//! Compiled redaction engine.
//!
//! [`RedactionEngine`] compiles every pattern of a resolved configuration once.
//! It is immutable and can be shared; per-run state lives in a
//! [`RedactionRun`](crate::RedactionRun).

use crate::discovery::{CandidateFilter, DiscoveryJob, FieldJob};
use crate::error::Result;
use crate::pattern::{build_regex, regex_body, IgnoreRules, PatternSet};
use crate::rules::RuleSet;
use crate::run::RedactionRun;
use regex::Regex;
use scrub_config::{DiscoveryMode, PatternCategory, RedactionConfig};
use scrub_container::{Event, Field};
use std::sync::Arc;
use tracing::debug;

/// Outcome of the removal and filtering stages for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDecision {
    Keep,
    Removed,
    Filtered,
}

/// Discovery settings of a category.
#[derive(Debug, Clone)]
pub(crate) struct CategoryDiscoveryPlan {
    pub job: usize,
    pub capture_group: Option<usize>,
}

/// A string category ready for scanning.
#[derive(Debug, Clone)]
pub(crate) struct CompiledCategory {
    pub name: String,
    pub regexes: Vec<Regex>,
    pub group: Option<usize>,
    pub ignore: IgnoreRules,
    pub replacement: Option<String>,
    pub discovery: Option<CategoryDiscoveryPlan>,
}

impl CompiledCategory {
    fn compile(name: &str, category: &PatternCategory) -> Result<Self> {
        let regexes = category
            .patterns
            .iter()
            .map(|p| build_regex(p, regex_body(p).unwrap_or(p), category.case_sensitive))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            name: name.to_string(),
            regexes,
            group: category.group,
            ignore: IgnoreRules::compile(
                &category.ignore_exact,
                &category.ignore,
                &category.ignore_after,
                category.case_sensitive,
            )?,
            replacement: category.replacement.clone(),
            discovery: None,
        })
    }
}

/// Property-name matching.
#[derive(Debug, Clone, Default)]
pub(crate) struct PropertyMatcher {
    names: PatternSet,
    ignore: IgnoreRules,
    key_fields: Vec<String>,
    value_fields: Vec<String>,
}

impl PropertyMatcher {
    pub fn is_sensitive(&self, name: &str) -> bool {
        self.names.matches(name) && !self.ignore.is_ignored(name, "")
    }

    /// Whether a sibling key field names a sensitive property.
    pub fn key_value_hit(&self, fields: &[Field]) -> bool {
        !self.value_fields.is_empty()
            && fields.iter().any(|f| {
                self.key_fields.contains(&f.name)
                    && f.value.as_str().is_some_and(|k| self.is_sensitive(k))
            })
    }

    pub fn is_value_field(&self, name: &str) -> bool {
        self.value_fields.iter().any(|v| v == name)
    }
}

#[derive(Debug, Clone, Default)]
struct EventFilter {
    include_events: PatternSet,
    exclude_events: PatternSet,
    include_categories: PatternSet,
    exclude_categories: PatternSet,
    include_threads: PatternSet,
    exclude_threads: PatternSet,
}

impl EventFilter {
    fn allows(&self, event: &Event) -> bool {
        if !self.include_events.is_empty() && !self.include_events.matches(&event.type_name) {
            return false;
        }
        if !self.include_categories.is_empty()
            && !event
                .categories
                .iter()
                .any(|c| self.include_categories.matches(c))
        {
            return false;
        }
        if !self.include_threads.is_empty()
            && !event
                .thread_name()
                .is_some_and(|t| self.include_threads.matches(t))
        {
            return false;
        }
        true
    }

    fn denies(&self, event: &Event) -> bool {
        self.exclude_events.matches(&event.type_name)
            || event
                .categories
                .iter()
                .any(|c| self.exclude_categories.matches(c))
            || event
                .thread_name()
                .is_some_and(|t| self.exclude_threads.matches(t))
    }
}

/// Discovery jobs and filters derived from the config.
#[derive(Debug, Clone, Default)]
pub(crate) struct DiscoveryPlan {
    pub mode: DiscoveryMode,
    pub jobs: Vec<DiscoveryJob>,
    pub fields: Vec<FieldJob>,
    pub filter: CandidateFilter,
}

/// Compiled, immutable redaction engine.
pub struct RedactionEngine {
    config: Arc<RedactionConfig>,
    pub(crate) properties: Option<PropertyMatcher>,
    pub(crate) rules: RuleSet,
    pub(crate) categories: Vec<CompiledCategory>,
    pub(crate) discovery: DiscoveryPlan,
    removed: Option<PatternSet>,
    filter: Option<EventFilter>,
}

impl RedactionEngine {
    /// Compile a resolved configuration.
    pub fn new(config: Arc<RedactionConfig>) -> Result<Self> {
        let properties = if config.properties.enabled && !config.properties.patterns.is_empty() {
            let p = &config.properties;
            let empty: [String; 0] = [];
            Some(PropertyMatcher {
                names: PatternSet::compile(&p.patterns, p.case_sensitive, p.full_match)?,
                ignore: IgnoreRules::compile(&p.ignore_exact, &p.ignore, &empty, p.case_sensitive)?,
                key_fields: p.key_fields.clone(),
                value_fields: p.value_fields.clone(),
            })
        } else {
            None
        };

        let strings = &config.strings;
        let rules = if strings.enabled {
            RuleSet::parse(&strings.rules)?
        } else {
            RuleSet::default()
        };

        let mut categories = Vec::new();
        if strings.enabled {
            for (name, category) in config.builtin_categories() {
                if category.is_active() {
                    categories.push((CompiledCategory::compile(name, category)?, category));
                }
            }
            for custom in &strings.custom {
                if custom.category.is_active() {
                    categories.push((
                        CompiledCategory::compile(&custom.name, &custom.category)?,
                        &custom.category,
                    ));
                }
            }
        }

        let d = &config.discovery;
        let mut discovery = DiscoveryPlan {
            mode: d.mode,
            filter: CandidateFilter::new(d.min_length, &d.ignore_exact, &d.ignore, d.case_sensitive)?,
            ..DiscoveryPlan::default()
        };
        if d.mode != DiscoveryMode::None {
            for extraction in &d.fields {
                let job = discovery.jobs.len();
                discovery.jobs.push(DiscoveryJob {
                    name: format!("field:{}", extraction.field),
                    min_occurrences: extraction.min_occurrences.unwrap_or(d.min_occurrences),
                    case_sensitive: d.case_sensitive,
                });
                discovery.fields.push(FieldJob {
                    names: PatternSet::compile(std::slice::from_ref(&extraction.field), false, false)?,
                    unit: extraction.unit,
                    job,
                });
            }
            for (compiled, category) in categories.iter_mut() {
                let Some(cd) = category.discovery.as_ref().filter(|cd| cd.enabled) else {
                    continue;
                };
                let job = discovery.jobs.len();
                discovery.jobs.push(DiscoveryJob {
                    name: compiled.name.clone(),
                    min_occurrences: cd.min_occurrences.unwrap_or(d.min_occurrences),
                    case_sensitive: cd.case_sensitive.unwrap_or(d.case_sensitive),
                });
                compiled.discovery = Some(CategoryDiscoveryPlan {
                    job,
                    capture_group: cd.capture_group,
                });
            }
        }
        let categories: Vec<CompiledCategory> = categories.into_iter().map(|(c, _)| c).collect();

        let events = &config.events;
        let removed = if events.remove_enabled && !events.removed_types.is_empty() {
            Some(PatternSet::compile(
                &events.removed_types,
                events.filtering.case_sensitive,
                true,
            )?)
        } else {
            None
        };

        let f = &events.filtering;
        let filter = if f.has_filters() {
            let set = |list: &[String]| PatternSet::compile(list, f.case_sensitive, true);
            Some(EventFilter {
                include_events: set(&f.include_events)?,
                exclude_events: set(&f.exclude_events)?,
                include_categories: set(&f.include_categories)?,
                exclude_categories: set(&f.exclude_categories)?,
                include_threads: set(&f.include_threads)?,
                exclude_threads: set(&f.exclude_threads)?,
            })
        } else {
            None
        };

        debug!(
            categories = categories.len(),
            rules = !rules.is_empty(),
            discovery_jobs = discovery.jobs.len(),
            discovery_mode = %discovery.mode,
            "redaction engine compiled"
        );

        Ok(Self {
            config,
            properties,
            rules,
            categories,
            discovery,
            removed,
            filter,
        })
    }

    pub fn config(&self) -> &RedactionConfig {
        &self.config
    }

    pub fn discovery_mode(&self) -> DiscoveryMode {
        self.discovery.mode
    }

    /// Names of the active string categories, in scan order.
    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    /// Whether a field with this name has its whole value replaced.
    pub fn is_sensitive_property(&self, name: &str) -> bool {
        self.properties.as_ref().is_some_and(|p| p.is_sensitive(name))
    }

    /// Removal first, then the include/exclude filters.
    pub fn decide(&self, event: &Event) -> EventDecision {
        if self
            .removed
            .as_ref()
            .is_some_and(|r| r.matches(&event.type_name))
        {
            return EventDecision::Removed;
        }
        match &self.filter {
            Some(filter) if !filter.allows(event) || filter.denies(event) => {
                EventDecision::Filtered
            }
            _ => EventDecision::Keep,
        }
    }

    /// Start a run with a freshly generated pseudonym key.
    pub fn start_run(&self) -> Result<RedactionRun<'_>> {
        RedactionRun::new(self, None)
    }

    /// Start a run with explicit pseudonym key material.
    pub fn start_run_with_key(&self, key: [u8; 32]) -> Result<RedactionRun<'_>> {
        RedactionRun::new(self, Some(key))
    }
}
