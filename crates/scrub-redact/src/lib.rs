//! Redaction engine for scrub.
//!
//! Given a resolved [`RedactionConfig`](scrub_config::RedactionConfig), the
//! engine decides per event whether to drop it (removal, filtering) and
//! otherwise rewrites its field values:
//!
//! - fields whose names match the property patterns are replaced wholesale
//! - text is scanned by token rules, string categories and discovered values
//! - everything else (thread, stack trace, timing, metadata) is left as is
//!
//! # Example
//!
//! ```
//! use scrub_config::RedactionConfig;
//! use scrub_redact::RedactionEngine;
//! use std::sync::Arc;
//!
//! let mut config = RedactionConfig::base();
//! config.strings.rules = vec!["- secret*".to_string()];
//! let engine = RedactionEngine::new(Arc::new(config)).unwrap();
//! let mut run = engine.start_run().unwrap();
//! assert_eq!(run.redact_text("key secret42"), "key ***");
//! ```

pub mod discovery;
pub mod engine;
pub mod error;
pub mod pattern;
pub mod pseudonym;
pub mod rules;
pub mod run;
pub mod stats;

pub use discovery::{DiscoveredValue, DiscoveryState};
pub use engine::{EventDecision, RedactionEngine};
pub use error::{RedactionError, Result};
pub use pattern::{IgnoreRules, Pattern, PatternKind, PatternSet};
pub use pseudonym::Pseudonymizer;
pub use rules::{RuleAction, RuleSet, TextRule};
pub use run::RedactionRun;
pub use stats::RunStats;
