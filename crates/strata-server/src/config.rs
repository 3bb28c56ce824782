//! Server configuration and runtime config registry.
//!
//! `StrataConfig` is the file-level view (TOML, with CLI/env overrides
//! applied on top by `main`). `ConfigRegistry` holds the same settings as
//! strings for CONFIG GET/SET at runtime.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use strata_core::KeyspaceConfig;

const ZSET_MAX_LISTPACK_ENTRIES: &str = "zset-max-listpack-entries";
const ZSET_MAX_LISTPACK_VALUE: &str = "zset-max-listpack-value";

/// Settings loaded from a TOML file.
///
/// Missing keys fall back to their defaults, so an empty file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StrataConfig {
    /// Sorted sets with more entries than this use the skip list layout.
    pub zset_max_listpack_entries: usize,
    /// A member longer than this many bytes forces the skip list layout.
    pub zset_max_listpack_value: usize,
}

impl Default for StrataConfig {
    fn default() -> Self {
        let ks = KeyspaceConfig::default();
        Self {
            zset_max_listpack_entries: ks.zset_max_listpack_entries,
            zset_max_listpack_value: ks.zset_max_listpack_value,
        }
    }
}

impl StrataConfig {
    /// Reads and parses a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config file {}: {e}", path.display()))?;
        Self::from_toml(&text)
            .map_err(|e| format!("invalid config file {}: {e}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Renders the config as TOML, used by `--config-template`.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// The engine-side view of these settings.
    pub fn build_keyspace_config(&self) -> KeyspaceConfig {
        KeyspaceConfig {
            zset_max_listpack_entries: self.zset_max_listpack_entries,
            zset_max_listpack_value: self.zset_max_listpack_value,
        }
    }
}

/// Runtime configuration registry for CONFIG GET/SET.
///
/// Stores all parameters as strings (matching Redis convention). Only the
/// parameters in `MUTABLE_PARAMS` can be changed at runtime.
pub struct ConfigRegistry {
    params: RwLock<HashMap<String, String>>,
}

impl std::fmt::Debug for ConfigRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigRegistry").finish_non_exhaustive()
    }
}

/// Parameters that can be changed at runtime via CONFIG SET.
const MUTABLE_PARAMS: &[&str] = &[ZSET_MAX_LISTPACK_ENTRIES, ZSET_MAX_LISTPACK_VALUE];

impl ConfigRegistry {
    /// Creates a new registry from the initial parameter map.
    pub fn new(params: HashMap<String, String>) -> Self {
        Self {
            params: RwLock::new(params),
        }
    }

    /// Seeds a registry with the values of a loaded config.
    pub fn from_config(cfg: &StrataConfig) -> Self {
        let mut params = HashMap::new();
        params.insert(
            ZSET_MAX_LISTPACK_ENTRIES.to_string(),
            cfg.zset_max_listpack_entries.to_string(),
        );
        params.insert(
            ZSET_MAX_LISTPACK_VALUE.to_string(),
            cfg.zset_max_listpack_value.to_string(),
        );
        Self::new(params)
    }

    /// Returns all parameters matching the glob pattern, sorted by name.
    pub fn get_matching(&self, pattern: &str) -> Vec<(String, String)> {
        let params = self.params.read().unwrap_or_else(|e| e.into_inner());
        let mut results: Vec<_> = params
            .iter()
            .filter(|(k, _)| glob_match(pattern, k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        results.sort_by(|a, b| a.0.cmp(&b.0));
        results
    }

    /// Sets a configuration parameter at runtime.
    ///
    /// Only parameters in the mutable whitelist can be changed, and both
    /// current ones take a non-negative integer.
    pub fn set(&self, param: &str, value: &str) -> Result<(), String> {
        let key = param.to_ascii_lowercase();
        if !MUTABLE_PARAMS.contains(&key.as_str()) {
            return Err(format!("ERR Unsupported CONFIG parameter: {param}"));
        }
        if value.parse::<usize>().is_err() {
            return Err(format!(
                "ERR Invalid argument '{value}' for CONFIG SET '{param}'"
            ));
        }
        let mut params = self.params.write().unwrap_or_else(|e| e.into_inner());
        params.insert(key, value.to_string());
        Ok(())
    }

    /// Rebuilds the keyspace config from the current parameter values.
    pub fn keyspace_config(&self) -> KeyspaceConfig {
        let params = self.params.read().unwrap_or_else(|e| e.into_inner());
        let defaults = KeyspaceConfig::default();
        let read = |name: &str, fallback: usize| {
            params
                .get(name)
                .and_then(|v| v.parse().ok())
                .unwrap_or(fallback)
        };
        KeyspaceConfig {
            zset_max_listpack_entries: read(
                ZSET_MAX_LISTPACK_ENTRIES,
                defaults.zset_max_listpack_entries,
            ),
            zset_max_listpack_value: read(ZSET_MAX_LISTPACK_VALUE, defaults.zset_max_listpack_value),
        }
    }
}

/// Simple glob matching for CONFIG GET patterns.
///
/// Supports `*` (match everything), `foo*` (prefix), `*foo` (suffix),
/// and exact match.
fn glob_match(pattern: &str, name: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    let lower_pattern = pattern.to_ascii_lowercase();
    let lower_name = name.to_ascii_lowercase();

    if let Some(prefix) = lower_pattern.strip_suffix('*') {
        lower_name.starts_with(prefix)
    } else if let Some(suffix) = lower_pattern.strip_prefix('*') {
        lower_name.ends_with(suffix)
    } else {
        lower_pattern == lower_name
    }
}
