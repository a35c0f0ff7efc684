//! No-mock config loading tests.
//!
//! Covers:
//! - Two-level inheritance through real files
//! - `$PARENT` splicing across files
//! - Cache identity and invalidation
//! - Cycle and not-found errors
//! - Cumulative CLI overrides

use scrub_config::{
    CliOptions, ConfigError, ConfigLoader, DiscoveryMode, DocumentFormat, RedactionConfig,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, content).expect("write config fixture");
    path.to_string_lossy().into_owned()
}

#[test]
fn two_level_inheritance_child_overrides_boolean() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "parent.yaml",
        r#"
parent: none
strings:
  emails:
    enabled: true
    patterns: ['[a-z]+@[a-z]+\.com']
"#,
    );
    let child = write(
        dir.path(),
        "child.yaml",
        r#"
parent: parent.yaml
strings:
  emails:
    enabled: false
"#,
    );

    let loader = ConfigLoader::new();
    let config = loader.load(&child).unwrap();
    assert!(!config.strings.emails.enabled);
    // unset fields still inherit
    assert_eq!(config.strings.emails.patterns, vec![r"[a-z]+@[a-z]+\.com"]);
}

#[test]
fn parent_marker_splices_across_files() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "parent.yaml",
        "parent: none\nproperties:\n  patterns: [A, B]\n",
    );
    let child = write(
        dir.path(),
        "child.yaml",
        "parent: parent.yaml\nproperties:\n  patterns: [$PARENT, X, $PARENT]\n",
    );
    let replacing = write(
        dir.path(),
        "replacing.yaml",
        "parent: parent.yaml\nproperties:\n  patterns: [Y]\n",
    );

    let loader = ConfigLoader::new();
    assert_eq!(
        loader.load(&child).unwrap().properties.patterns,
        vec!["A", "B", "X", "A", "B"]
    );
    assert_eq!(loader.load(&replacing).unwrap().properties.patterns, vec!["Y"]);
}

#[test]
fn custom_patterns_inherit_through_marker() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "parent.yaml",
        r#"
parent: none
strings:
  custom:
    - name: tickets
      patterns: ['TICKET-\d+']
"#,
    );
    let child = write(
        dir.path(),
        "child.yaml",
        r#"
parent: parent.yaml
strings:
  custom:
    - $PARENT
    - name: orders
      patterns: ['ORD-\d+']
      discovery_min_occurrences: 2
"#,
    );

    let loader = ConfigLoader::new();
    let config = loader.load(&child).unwrap();
    let names: Vec<_> = config.strings.custom.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["tickets", "orders"]);
    let discovery = config.strings.custom[1].category.discovery.as_ref().unwrap();
    assert!(discovery.enabled);
    assert_eq!(discovery.min_occurrences, Some(2));
}

#[test]
fn repeated_loads_share_instance_until_cleared() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "cfg.yaml", "parent: strict\n");

    let loader = ConfigLoader::new();
    let first = loader.load(&path).unwrap();
    let second = loader.load(&path).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    loader.clear_cache();
    let third = loader.load(&path).unwrap();
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(*first, *third);
}

#[test]
fn cache_reflects_file_changes_only_after_clear() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "cfg.yaml",
        "parent: none\ngeneral:\n  redaction_text: one\n",
    );

    let loader = ConfigLoader::new();
    assert_eq!(loader.load(&path).unwrap().general.redaction_text, "one");

    write(
        dir.path(),
        "cfg.yaml",
        "parent: none\ngeneral:\n  redaction_text: two\n",
    );
    assert_eq!(loader.load(&path).unwrap().general.redaction_text, "one");
    loader.clear_cache();
    assert_eq!(loader.load(&path).unwrap().general.redaction_text, "two");
}

#[test]
fn three_file_cycle_names_chain() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.yaml", "parent: b.yaml\n");
    write(dir.path(), "b.yaml", "parent: c.yaml\n");
    write(dir.path(), "c.yaml", "parent: a.yaml\n");

    let loader = ConfigLoader::new();
    let err = loader
        .load(&dir.path().join("a.yaml").to_string_lossy())
        .unwrap_err();
    assert_eq!(err.code(), 52);
    let ConfigError::Cycle { chain } = err else {
        panic!("expected cycle error");
    };
    assert_eq!(chain.matches(" -> ").count(), 3);
}

#[test]
fn missing_parent_is_not_found() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "orphan.yaml", "parent: missing.yaml\n");

    let loader = ConfigLoader::new();
    let err = loader.load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { ref identifier } if identifier == "missing.yaml"));
}

#[test]
fn unknown_key_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "typo.yaml", "parent: none\nstrngs: {}\n");

    let loader = ConfigLoader::new();
    assert!(matches!(
        loader.load(&path),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn invalid_regex_is_validation_error() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "bad.yaml",
        "parent: none\nstrings:\n  custom:\n    - name: broken\n      patterns: ['(unclosed']\n",
    );

    let loader = ConfigLoader::new();
    assert!(matches!(
        loader.load(&path),
        Err(ConfigError::Validation(_))
    ));
}

#[test]
fn json_document_with_parent_preset() {
    let dir = TempDir::new().unwrap();
    let path = write(
        dir.path(),
        "cfg.json",
        r#"{"parent": "default", "events": {"removed_types": ["$PARENT", "jdk.Custom"]}}"#,
    );

    let loader = ConfigLoader::new();
    let config = loader.load(&path).unwrap();
    let default = loader.load("default").unwrap();
    assert_eq!(
        config.events.removed_types.last().map(String::as_str),
        Some("jdk.Custom")
    );
    assert_eq!(
        config.events.removed_types.len(),
        default.events.removed_types.len() + 1
    );
}

#[test]
fn cli_overrides_are_cumulative() {
    let config = RedactionConfig::base();
    let once = CliOptions {
        include_events: vec!["jdk.A".to_string()],
        redaction_regexes: vec![r"ID-\d+".to_string()],
        ..CliOptions::default()
    };
    let twice = CliOptions {
        include_events: vec!["jdk.B".to_string()],
        redaction_regexes: vec![r"KEY-\d+".to_string()],
        discovery_mode: Some(DiscoveryMode::Fast),
        ..CliOptions::default()
    };

    let out = config.with_cli_options(&once).with_cli_options(&twice);
    assert_eq!(out.events.filtering.include_events, vec!["jdk.A", "jdk.B"]);
    let names: Vec<_> = out.strings.custom.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["cli_pattern_0", "cli_pattern_1"]);
    assert_eq!(out.discovery.mode, DiscoveryMode::Fast);

    // pseudonymize=false never switches an enabled config off
    let mut pseudo = RedactionConfig::base();
    pseudo.general.pseudonymize = true;
    assert!(pseudo
        .with_cli_options(&CliOptions::default())
        .general
        .pseudonymize);
}

#[test]
fn inline_document_relative_parent() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "base.toml",
        "parent = \"none\"\n[general]\nredaction_text = \"[gone]\"\n",
    );

    let loader = ConfigLoader::new();
    let config = loader
        .load_document("parent: base.toml\n", DocumentFormat::Yaml, Some(dir.path()))
        .unwrap();
    assert_eq!(config.general.redaction_text, "[gone]");
}

#[test]
fn concurrent_loads_and_clears() {
    let loader = Arc::new(ConfigLoader::new());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let loader = Arc::clone(&loader);
            std::thread::spawn(move || {
                for _ in 0..20 {
                    let config = loader.load("strict").unwrap();
                    assert!(config.strings.uuids.enabled);
                    if i == 0 {
                        loader.clear_cache();
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}
