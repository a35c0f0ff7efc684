//! Configuration document types, as written on disk.
//!
//! A layer is one unresolved document: every scalar is optional (unset means
//! "inherit from the parent") and every list may contain the `$PARENT` marker.
//! Layers are turned into a [`RedactionConfig`](crate::RedactionConfig) by
//! [`merge`](crate::merge::merge).

use crate::model::{DiscoveryMode, ExtractionUnit, PseudonymFormat, PseudonymMode};
use schemars::{json_schema, JsonSchema, Schema, SchemaGenerator};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;

/// The literal token that splices the parent's list into a child list.
pub const PARENT_MARKER: &str = "$PARENT";

/// The `$PARENT` list marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParentMarker;

impl Serialize for ParentMarker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(PARENT_MARKER)
    }
}

impl<'de> Deserialize<'de> for ParentMarker {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MarkerVisitor;

        impl Visitor<'_> for MarkerVisitor {
            type Value = ParentMarker;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "the string {:?}", PARENT_MARKER)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                if v == PARENT_MARKER {
                    Ok(ParentMarker)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }
        }

        deserializer.deserialize_str(MarkerVisitor)
    }
}

impl JsonSchema for ParentMarker {
    fn schema_name() -> Cow<'static, str> {
        "ParentMarker".into()
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "string",
            "const": PARENT_MARKER,
            "description": "Splices the parent's resolved list in at this position"
        })
    }
}

/// One element of an inheritable list: either the `$PARENT` marker or a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ListEntry<T> {
    /// Placeholder for the parent's full list.
    Parent(ParentMarker),
    /// A concrete list element.
    Item(T),
}

impl<T> ListEntry<T> {
    /// Map the item, keeping markers in place.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ListEntry<U> {
        match self {
            ListEntry::Parent(marker) => ListEntry::Parent(marker),
            ListEntry::Item(item) => ListEntry::Item(f(item)),
        }
    }

    /// Whether this entry is the `$PARENT` marker.
    pub fn is_marker(&self) -> bool {
        matches!(self, ListEntry::Parent(_))
    }
}

impl From<&str> for ListEntry<String> {
    fn from(value: &str) -> Self {
        if value == PARENT_MARKER {
            ListEntry::Parent(ParentMarker)
        } else {
            ListEntry::Item(value.to_string())
        }
    }
}

impl From<String> for ListEntry<String> {
    fn from(value: String) -> Self {
        if value == PARENT_MARKER {
            ListEntry::Parent(ParentMarker)
        } else {
            ListEntry::Item(value)
        }
    }
}

/// An inheritable list.
pub type ListLayer<T> = Vec<ListEntry<T>>;

/// A whole configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ConfigLayer {
    /// Preset name, path, `file://` URL, or `none`. Defaults to `default`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general: Option<GeneralLayer>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<PropertiesLayer>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strings: Option<StringsLayer>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<EventsLayer>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery: Option<DiscoveryLayer>,
}

/// `general` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GeneralLayer {
    /// Text that replaces redacted values.
    #[serde(default)]
    pub redaction_text: Option<String>,

    /// Replace values with stable pseudonyms instead of the redaction text.
    #[serde(default)]
    pub pseudonymize: Option<bool>,

    #[serde(default)]
    pub pseudonymization: Option<PseudonymizationLayer>,
}

/// `general.pseudonymization` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PseudonymizationLayer {
    #[serde(default)]
    pub mode: Option<PseudonymMode>,
    #[serde(default)]
    pub format: Option<PseudonymFormat>,
    /// Hex characters kept from the keyed hash.
    #[serde(default)]
    pub hash_length: Option<usize>,
    /// Prefix for the `custom` format.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Suffix for the `custom` format.
    #[serde(default)]
    pub suffix: Option<String>,
}

/// `properties` section: field names whose whole value is redacted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PropertiesLayer {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub patterns: Option<ListLayer<String>>,
    #[serde(default)]
    pub case_sensitive: Option<bool>,
    /// Plain patterns must equal the field name instead of being contained in it.
    #[serde(default)]
    pub full_match: Option<bool>,
    #[serde(default)]
    pub ignore_exact: Option<ListLayer<String>>,
    #[serde(default)]
    pub ignore: Option<ListLayer<String>>,
    /// Fields holding a property key (key/value property events).
    #[serde(default)]
    pub key_fields: Option<ListLayer<String>>,
    /// Fields holding the value that belongs to a matching key.
    #[serde(default)]
    pub value_fields: Option<ListLayer<String>>,
}

/// Discovery sub-config of a pattern category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CategoryDiscoveryLayer {
    #[serde(default)]
    pub enabled: Option<bool>,
    /// Capture group whose text is counted.
    #[serde(default)]
    pub capture_group: Option<usize>,
    #[serde(default)]
    pub min_occurrences: Option<usize>,
    #[serde(default)]
    pub case_sensitive: Option<bool>,
}

/// A built-in string pattern category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PatternCategoryLayer {
    #[serde(default)]
    pub enabled: Option<bool>,
    /// Regular expressions that find the sensitive text.
    #[serde(default)]
    pub patterns: Option<ListLayer<String>>,
    #[serde(default)]
    pub case_sensitive: Option<bool>,
    #[serde(default)]
    pub ignore_exact: Option<ListLayer<String>>,
    #[serde(default)]
    pub ignore: Option<ListLayer<String>>,
    /// Context regexes; a match directly before the candidate exempts it.
    #[serde(default)]
    pub ignore_after: Option<ListLayer<String>>,
    /// Capture group that is replaced instead of the whole match.
    #[serde(default)]
    pub group: Option<usize>,
    /// Fixed replacement text for this category.
    #[serde(default)]
    pub replacement: Option<String>,
    #[serde(default)]
    pub discovery: Option<CategoryDiscoveryLayer>,
}

/// A user-defined, named string pattern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CustomPatternLayer {
    pub name: String,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub patterns: Option<Vec<String>>,
    #[serde(default)]
    pub case_sensitive: Option<bool>,
    #[serde(default)]
    pub ignore_exact: Option<Vec<String>>,
    #[serde(default)]
    pub ignore: Option<Vec<String>>,
    #[serde(default)]
    pub ignore_after: Option<Vec<String>>,
    #[serde(default)]
    pub group: Option<usize>,
    #[serde(default)]
    pub replacement: Option<String>,
    #[serde(default)]
    pub discovery: Option<CategoryDiscoveryLayer>,
    /// Shorthand that enables discovery with this threshold.
    #[serde(default)]
    pub discovery_min_occurrences: Option<usize>,
}

/// `strings` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct StringsLayer {
    #[serde(default)]
    pub enabled: Option<bool>,
    /// Token rules: `- pattern`, `+ pattern`, `! pattern replacement`.
    #[serde(default)]
    pub rules: Option<ListLayer<String>>,
    #[serde(default)]
    pub emails: Option<PatternCategoryLayer>,
    #[serde(default)]
    pub ip_addresses: Option<PatternCategoryLayer>,
    #[serde(default)]
    pub user: Option<PatternCategoryLayer>,
    #[serde(default)]
    pub hostnames: Option<PatternCategoryLayer>,
    #[serde(default)]
    pub ssh_hosts: Option<PatternCategoryLayer>,
    #[serde(default)]
    pub internal_urls: Option<PatternCategoryLayer>,
    #[serde(default)]
    pub uuids: Option<PatternCategoryLayer>,
    #[serde(default)]
    pub custom: Option<ListLayer<CustomPatternLayer>>,
}

/// `events` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EventsLayer {
    #[serde(default)]
    pub remove_enabled: Option<bool>,
    #[serde(default)]
    pub removed_types: Option<ListLayer<String>>,
    #[serde(default)]
    pub filtering: Option<FilteringLayer>,
}

/// `events.filtering` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FilteringLayer {
    #[serde(default)]
    pub include_events: Option<ListLayer<String>>,
    #[serde(default)]
    pub exclude_events: Option<ListLayer<String>>,
    #[serde(default)]
    pub include_categories: Option<ListLayer<String>>,
    #[serde(default)]
    pub exclude_categories: Option<ListLayer<String>>,
    #[serde(default)]
    pub include_threads: Option<ListLayer<String>>,
    #[serde(default)]
    pub exclude_threads: Option<ListLayer<String>>,
    #[serde(default)]
    pub case_sensitive: Option<bool>,
}

/// A field-driven discovery extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FieldExtraction {
    /// Field-name pattern (literal, glob or `/regex/`).
    pub field: String,
    #[serde(default)]
    pub unit: ExtractionUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_occurrences: Option<usize>,
}

/// `discovery` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DiscoveryLayer {
    #[serde(default)]
    pub mode: Option<DiscoveryMode>,
    #[serde(default)]
    pub min_occurrences: Option<usize>,
    #[serde(default)]
    pub case_sensitive: Option<bool>,
    /// Candidates shorter than this are never counted.
    #[serde(default)]
    pub min_length: Option<usize>,
    #[serde(default)]
    pub ignore_exact: Option<ListLayer<String>>,
    #[serde(default)]
    pub ignore: Option<ListLayer<String>>,
    #[serde(default)]
    pub fields: Option<ListLayer<FieldExtraction>>,
}
