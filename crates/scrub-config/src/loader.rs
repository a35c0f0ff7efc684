//! Configuration loading, inheritance resolution and caching.
//!
//! Identifier resolution order:
//! 1. `none` (the empty base)
//! 2. `file://` URLs
//! 3. Built-in preset names
//! 4. Filesystem paths (relative paths resolve against the including file)
//! 5. User presets in `$XDG_CONFIG_HOME/scrub/presets/<name>.yaml`

use crate::error::{ConfigError, Result};
use crate::layer::ConfigLayer;
use crate::merge::merge;
use crate::model::RedactionConfig;
use crate::preset::{PresetName, BASE_IDENTIFIER};
use crate::validate::validate_config;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, RwLock};
use tracing::debug;

/// Application name for XDG directories.
const APP_NAME: &str = "scrub";

/// Parent used by documents that do not name one.
pub const IMPLICIT_PARENT: &str = "default";

/// Serialization format of a config document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
    Toml,
}

impl DocumentFormat {
    /// Pick the format from a file extension; YAML is the fallback.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("json") => DocumentFormat::Json,
            Some("toml") => DocumentFormat::Toml,
            _ => DocumentFormat::Yaml,
        }
    }
}

/// Parse one document into a layer.
pub fn parse_layer(content: &str, format: DocumentFormat, source_name: &str) -> Result<ConfigLayer> {
    let parsed = match format {
        DocumentFormat::Yaml => {
            if content.trim().is_empty() {
                Ok(ConfigLayer::default())
            } else {
                serde_yaml::from_str(content).map_err(|e| e.to_string())
            }
        }
        DocumentFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        DocumentFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|message| ConfigError::Parse {
        source_name: source_name.to_string(),
        message,
    })
}

/// Where a config identifier points.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ConfigSource {
    Base,
    Preset(PresetName),
    File(PathBuf),
}

impl ConfigSource {
    fn cache_key(&self) -> String {
        match self {
            ConfigSource::Base => format!("preset:{}", BASE_IDENTIFIER),
            ConfigSource::Preset(name) => format!("preset:{}", name),
            ConfigSource::File(path) => format!("file:{}", path.display()),
        }
    }

    /// Directory that relative parent paths resolve against.
    fn base_dir(&self) -> Option<PathBuf> {
        match self {
            ConfigSource::File(path) => path.parent().map(Path::to_path_buf),
            _ => None,
        }
    }
}

/// Get the user preset directory for scrub.
pub fn user_preset_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME).join("presets"))
}

fn resolve_identifier(identifier: &str, relative_to: Option<&Path>) -> Result<ConfigSource> {
    let trimmed = identifier.trim();
    let not_found = || ConfigError::NotFound {
        identifier: identifier.to_string(),
    };

    if trimmed.eq_ignore_ascii_case(BASE_IDENTIFIER) {
        return Ok(ConfigSource::Base);
    }

    if trimmed.starts_with("file://") {
        let url = url::Url::parse(trimmed).map_err(|_| not_found())?;
        let path = url.to_file_path().map_err(|_| not_found())?;
        return canonical_file(&path).ok_or_else(not_found);
    }

    if let Some(preset) = PresetName::parse(trimmed) {
        return Ok(ConfigSource::Preset(preset));
    }

    let path = PathBuf::from(trimmed);
    let candidate = match relative_to {
        Some(dir) if path.is_relative() => dir.join(&path),
        _ => path,
    };
    if let Some(source) = canonical_file(&candidate) {
        return Ok(source);
    }

    if let Some(dir) = user_preset_dir() {
        for ext in ["yaml", "yml", "json", "toml"] {
            if let Some(source) = canonical_file(&dir.join(format!("{}.{}", trimmed, ext))) {
                return Ok(source);
            }
        }
    }

    Err(not_found())
}

fn canonical_file(path: &Path) -> Option<ConfigSource> {
    if path.is_file() {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Some(ConfigSource::File(canonical))
    } else {
        None
    }
}

/// Loads configurations and caches the resolved results.
///
/// The cache is keyed by the resolved source (preset name or canonical path),
/// so `strict`, `STRICT` and `paranoid` share one entry.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    cache: RwLock<HashMap<String, Arc<RedactionConfig>>>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide loader used by [`load`] and [`clear_cache`].
    pub fn global() -> &'static ConfigLoader {
        static GLOBAL: OnceLock<ConfigLoader> = OnceLock::new();
        GLOBAL.get_or_init(ConfigLoader::new)
    }

    /// Load and resolve a configuration by preset name, path or `file://` URL.
    ///
    /// Repeated loads of the same source return the same `Arc`.
    pub fn load(&self, identifier: &str) -> Result<Arc<RedactionConfig>> {
        let source = resolve_identifier(identifier, None)?;
        let mut stack = Vec::new();
        self.load_source(&source, &mut stack)
    }

    /// Resolve an in-memory document without caching it.
    ///
    /// Its parent chain is loaded through the cache as usual.
    pub fn load_document(
        &self,
        content: &str,
        format: DocumentFormat,
        base_dir: Option<&Path>,
    ) -> Result<RedactionConfig> {
        let layer = parse_layer(content, format, "<inline>")?;
        let parent_id = layer.parent.as_deref().unwrap_or(IMPLICIT_PARENT);
        let parent_source = resolve_identifier(parent_id, base_dir)?;
        let mut stack = vec!["<inline>".to_string()];
        let parent = self.load_source(&parent_source, &mut stack)?;
        let resolved = merge(&layer, &parent);
        validate_config(&resolved)?;
        Ok(resolved)
    }

    /// Drop every cached configuration.
    pub fn clear_cache(&self) {
        match self.cache.write() {
            Ok(mut cache) => cache.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
        debug!("config cache cleared");
    }

    /// Number of cached configurations.
    pub fn cached_len(&self) -> usize {
        match self.cache.read() {
            Ok(cache) => cache.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    fn cached(&self, key: &str) -> Option<Arc<RedactionConfig>> {
        let cache = match self.cache.read() {
            Ok(cache) => cache,
            Err(poisoned) => poisoned.into_inner(),
        };
        cache.get(key).cloned()
    }

    fn insert(&self, key: String, config: RedactionConfig) -> Arc<RedactionConfig> {
        let mut cache = match self.cache.write() {
            Ok(cache) => cache,
            Err(poisoned) => poisoned.into_inner(),
        };
        // A concurrent loader may have won the race; keep its instance.
        cache
            .entry(key)
            .or_insert_with(|| Arc::new(config))
            .clone()
    }

    fn load_source(
        &self,
        source: &ConfigSource,
        stack: &mut Vec<String>,
    ) -> Result<Arc<RedactionConfig>> {
        let key = source.cache_key();
        if let Some(hit) = self.cached(&key) {
            return Ok(hit);
        }

        if stack.contains(&key) {
            let mut chain = stack.clone();
            chain.push(key);
            return Err(ConfigError::Cycle {
                chain: chain.join(" -> "),
            });
        }

        let resolved = match source {
            ConfigSource::Base => RedactionConfig::base(),
            ConfigSource::Preset(name) => {
                let layer = parse_layer(name.document(), DocumentFormat::Yaml, name.as_str())?;
                self.resolve_layer(&layer, source, key.clone(), stack)?
            }
            ConfigSource::File(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
                    path: path.clone(),
                    source: e,
                })?;
                let name = path.display().to_string();
                let layer = parse_layer(&content, DocumentFormat::from_path(path), &name)?;
                self.resolve_layer(&layer, source, key.clone(), stack)?
            }
        };

        debug!(source = %key, "config resolved");
        Ok(self.insert(key, resolved))
    }

    fn resolve_layer(
        &self,
        layer: &ConfigLayer,
        source: &ConfigSource,
        key: String,
        stack: &mut Vec<String>,
    ) -> Result<RedactionConfig> {
        let parent_id = layer.parent.as_deref().unwrap_or(IMPLICIT_PARENT);
        let parent_source = resolve_identifier(parent_id, source.base_dir().as_deref())?;

        stack.push(key);
        let parent = self.load_source(&parent_source, stack);
        stack.pop();
        let parent = parent?;

        let resolved = merge(layer, &parent);
        validate_config(&resolved)?;
        Ok(resolved)
    }
}

/// Load a configuration through the process-wide loader.
pub fn load(identifier: &str) -> Result<Arc<RedactionConfig>> {
    ConfigLoader::global().load(identifier)
}

/// Clear the process-wide loader's cache.
pub fn clear_cache() {
    ConfigLoader::global().clear_cache()
}
