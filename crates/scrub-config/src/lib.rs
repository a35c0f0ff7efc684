//! Layered redaction configuration for scrub.
//!
//! A config document names a parent (a built-in preset, a file path, a
//! `file://` URL or `none`) and overrides part of it. Lists may contain the
//! `$PARENT` marker to splice the inherited list in place. Resolution walks
//! the parent chain, merges each layer over its parent, validates the result
//! and caches it.

pub mod cli;
pub mod error;
pub mod layer;
pub mod loader;
pub mod merge;
pub mod model;
pub mod preset;
pub mod schema;
pub mod validate;

pub use cli::CliOptions;
pub use error::{ConfigError, Result};
pub use layer::{ConfigLayer, FieldExtraction, ListEntry, ParentMarker, PARENT_MARKER};
pub use loader::{clear_cache, load, parse_layer, ConfigLoader, DocumentFormat};
pub use merge::{expand_parent_markers, merge};
pub use model::{
    CategoryDiscovery, CustomPattern, DiscoveryConfig, DiscoveryMode, EventConfig,
    ExtractionUnit, FilteringConfig, GeneralConfig, PatternCategory, PropertiesConfig,
    PseudonymFormat, PseudonymMode, PseudonymizationConfig, RedactionConfig, StringsConfig,
};
pub use preset::{list_presets, PresetInfo, PresetName};
pub use schema::{config_keys, config_schema};
pub use validate::{validate_config, ValidationError};
