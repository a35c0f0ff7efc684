//! Pure inheritance merge: `merge(child_layer, parent) -> resolved`.
//!
//! Scalars: an explicit child value wins, unset inherits.
//! Lists: `$PARENT` markers splice the parent's list in place; a child list
//! without any marker replaces the parent list wholesale.

use crate::layer::{
    CategoryDiscoveryLayer, ConfigLayer, CustomPatternLayer, DiscoveryLayer, EventsLayer,
    FilteringLayer, GeneralLayer, ListEntry, ListLayer, PatternCategoryLayer, PropertiesLayer,
    PseudonymizationLayer, StringsLayer,
};
use crate::model::{
    CategoryDiscovery, CustomPattern, DiscoveryConfig, EventConfig, FilteringConfig,
    GeneralConfig, PatternCategory, PropertiesConfig, PseudonymizationConfig, RedactionConfig,
    StringsConfig,
};

/// Expand every `$PARENT` marker in `child` into the full `parent` list.
///
/// With no marker present the child list is returned as-is and the parent is
/// ignored.
pub fn expand_parent_markers<T: Clone>(child: &[ListEntry<T>], parent: &[T]) -> Vec<T> {
    let markers = child.iter().filter(|e| e.is_marker()).count();
    let mut out = Vec::with_capacity(child.len() - markers + markers * parent.len());
    for entry in child {
        match entry {
            ListEntry::Parent(_) => out.extend_from_slice(parent),
            ListEntry::Item(item) => out.push(item.clone()),
        }
    }
    out
}

fn merge_list<T: Clone>(child: Option<&ListLayer<T>>, parent: &[T]) -> Vec<T> {
    match child {
        Some(entries) => expand_parent_markers(entries, parent),
        None => parent.to_vec(),
    }
}

/// Resolve `layer` on top of an already resolved `parent`.
pub fn merge(layer: &ConfigLayer, parent: &RedactionConfig) -> RedactionConfig {
    RedactionConfig {
        general: merge_general(layer.general.as_ref(), &parent.general),
        properties: merge_properties(layer.properties.as_ref(), &parent.properties),
        strings: merge_strings(layer.strings.as_ref(), &parent.strings),
        events: merge_events(layer.events.as_ref(), &parent.events),
        discovery: merge_discovery(layer.discovery.as_ref(), &parent.discovery),
    }
}

fn merge_general(layer: Option<&GeneralLayer>, parent: &GeneralConfig) -> GeneralConfig {
    let Some(layer) = layer else {
        return parent.clone();
    };
    GeneralConfig {
        redaction_text: layer
            .redaction_text
            .clone()
            .unwrap_or_else(|| parent.redaction_text.clone()),
        pseudonymize: layer.pseudonymize.unwrap_or(parent.pseudonymize),
        pseudonymization: merge_pseudonymization(
            layer.pseudonymization.as_ref(),
            &parent.pseudonymization,
        ),
    }
}

fn merge_pseudonymization(
    layer: Option<&PseudonymizationLayer>,
    parent: &PseudonymizationConfig,
) -> PseudonymizationConfig {
    let Some(layer) = layer else {
        return parent.clone();
    };
    PseudonymizationConfig {
        mode: layer.mode.unwrap_or(parent.mode),
        format: layer.format.unwrap_or(parent.format),
        hash_length: layer.hash_length.unwrap_or(parent.hash_length),
        prefix: layer.prefix.clone().unwrap_or_else(|| parent.prefix.clone()),
        suffix: layer.suffix.clone().unwrap_or_else(|| parent.suffix.clone()),
    }
}

fn merge_properties(layer: Option<&PropertiesLayer>, parent: &PropertiesConfig) -> PropertiesConfig {
    let Some(layer) = layer else {
        return parent.clone();
    };
    PropertiesConfig {
        enabled: layer.enabled.unwrap_or(parent.enabled),
        patterns: merge_list(layer.patterns.as_ref(), &parent.patterns),
        case_sensitive: layer.case_sensitive.unwrap_or(parent.case_sensitive),
        full_match: layer.full_match.unwrap_or(parent.full_match),
        ignore_exact: merge_list(layer.ignore_exact.as_ref(), &parent.ignore_exact),
        ignore: merge_list(layer.ignore.as_ref(), &parent.ignore),
        key_fields: merge_list(layer.key_fields.as_ref(), &parent.key_fields),
        value_fields: merge_list(layer.value_fields.as_ref(), &parent.value_fields),
    }
}

fn merge_category_discovery(
    layer: Option<&CategoryDiscoveryLayer>,
    parent: Option<&CategoryDiscovery>,
) -> Option<CategoryDiscovery> {
    let Some(layer) = layer else {
        return parent.cloned();
    };
    let base = parent.cloned().unwrap_or(CategoryDiscovery {
        enabled: true,
        ..CategoryDiscovery::default()
    });
    Some(CategoryDiscovery {
        enabled: layer.enabled.unwrap_or(base.enabled),
        capture_group: layer.capture_group.or(base.capture_group),
        min_occurrences: layer.min_occurrences.or(base.min_occurrences),
        case_sensitive: layer.case_sensitive.or(base.case_sensitive),
    })
}

fn merge_category(layer: Option<&PatternCategoryLayer>, parent: &PatternCategory) -> PatternCategory {
    let Some(layer) = layer else {
        return parent.clone();
    };
    PatternCategory {
        enabled: layer.enabled.unwrap_or(parent.enabled),
        patterns: merge_list(layer.patterns.as_ref(), &parent.patterns),
        case_sensitive: layer.case_sensitive.unwrap_or(parent.case_sensitive),
        ignore_exact: merge_list(layer.ignore_exact.as_ref(), &parent.ignore_exact),
        ignore: merge_list(layer.ignore.as_ref(), &parent.ignore),
        ignore_after: merge_list(layer.ignore_after.as_ref(), &parent.ignore_after),
        group: layer.group.or(parent.group),
        replacement: layer.replacement.clone().or_else(|| parent.replacement.clone()),
        discovery: merge_category_discovery(layer.discovery.as_ref(), parent.discovery.as_ref()),
    }
}

/// Resolve a custom pattern item. Items do not inherit from parent items;
/// unset fields take the category defaults.
pub fn resolve_custom(layer: &CustomPatternLayer) -> CustomPattern {
    let defaults = PatternCategory::default();
    let mut discovery = merge_category_discovery(layer.discovery.as_ref(), None);
    if let Some(min) = layer.discovery_min_occurrences {
        let mut d = discovery.unwrap_or(CategoryDiscovery {
            enabled: true,
            ..CategoryDiscovery::default()
        });
        d.min_occurrences = Some(min);
        discovery = Some(d);
    }
    CustomPattern {
        name: layer.name.clone(),
        category: PatternCategory {
            enabled: layer.enabled.unwrap_or(defaults.enabled),
            patterns: layer.patterns.clone().unwrap_or_default(),
            case_sensitive: layer.case_sensitive.unwrap_or(defaults.case_sensitive),
            ignore_exact: layer.ignore_exact.clone().unwrap_or_default(),
            ignore: layer.ignore.clone().unwrap_or_default(),
            ignore_after: layer.ignore_after.clone().unwrap_or_default(),
            group: layer.group,
            replacement: layer.replacement.clone(),
            discovery,
        },
    }
}

fn merge_strings(layer: Option<&StringsLayer>, parent: &StringsConfig) -> StringsConfig {
    let Some(layer) = layer else {
        return parent.clone();
    };
    let custom = match &layer.custom {
        Some(entries) => {
            let resolved: Vec<ListEntry<CustomPattern>> = entries
                .iter()
                .cloned()
                .map(|entry| entry.map(|item| resolve_custom(&item)))
                .collect();
            expand_parent_markers(&resolved, &parent.custom)
        }
        None => parent.custom.clone(),
    };
    StringsConfig {
        enabled: layer.enabled.unwrap_or(parent.enabled),
        rules: merge_list(layer.rules.as_ref(), &parent.rules),
        emails: merge_category(layer.emails.as_ref(), &parent.emails),
        ip_addresses: merge_category(layer.ip_addresses.as_ref(), &parent.ip_addresses),
        user: merge_category(layer.user.as_ref(), &parent.user),
        hostnames: merge_category(layer.hostnames.as_ref(), &parent.hostnames),
        ssh_hosts: merge_category(layer.ssh_hosts.as_ref(), &parent.ssh_hosts),
        internal_urls: merge_category(layer.internal_urls.as_ref(), &parent.internal_urls),
        uuids: merge_category(layer.uuids.as_ref(), &parent.uuids),
        custom,
    }
}

fn merge_filtering(layer: Option<&FilteringLayer>, parent: &FilteringConfig) -> FilteringConfig {
    let Some(layer) = layer else {
        return parent.clone();
    };
    FilteringConfig {
        include_events: merge_list(layer.include_events.as_ref(), &parent.include_events),
        exclude_events: merge_list(layer.exclude_events.as_ref(), &parent.exclude_events),
        include_categories: merge_list(
            layer.include_categories.as_ref(),
            &parent.include_categories,
        ),
        exclude_categories: merge_list(
            layer.exclude_categories.as_ref(),
            &parent.exclude_categories,
        ),
        include_threads: merge_list(layer.include_threads.as_ref(), &parent.include_threads),
        exclude_threads: merge_list(layer.exclude_threads.as_ref(), &parent.exclude_threads),
        case_sensitive: layer.case_sensitive.unwrap_or(parent.case_sensitive),
    }
}

fn merge_events(layer: Option<&EventsLayer>, parent: &EventConfig) -> EventConfig {
    let Some(layer) = layer else {
        return parent.clone();
    };
    EventConfig {
        remove_enabled: layer.remove_enabled.unwrap_or(parent.remove_enabled),
        removed_types: merge_list(layer.removed_types.as_ref(), &parent.removed_types),
        filtering: merge_filtering(layer.filtering.as_ref(), &parent.filtering),
    }
}

fn merge_discovery(layer: Option<&DiscoveryLayer>, parent: &DiscoveryConfig) -> DiscoveryConfig {
    let Some(layer) = layer else {
        return parent.clone();
    };
    DiscoveryConfig {
        mode: layer.mode.unwrap_or(parent.mode),
        min_occurrences: layer.min_occurrences.unwrap_or(parent.min_occurrences),
        case_sensitive: layer.case_sensitive.unwrap_or(parent.case_sensitive),
        min_length: layer.min_length.unwrap_or(parent.min_length),
        ignore_exact: merge_list(layer.ignore_exact.as_ref(), &parent.ignore_exact),
        ignore: merge_list(layer.ignore.as_ref(), &parent.ignore),
        fields: merge_list(layer.fields.as_ref(), &parent.fields),
    }
}
