//! Environment overrides for cache settings.

use crate::cache::CacheSettings;
use std::collections::HashMap;

pub const ENV_PREFIX: &str = "SCOREMAP_";
pub const ENV_CACHE_MAX_ENTRIES: &str = "SCOREMAP_CACHE_MAX_ENTRIES";
pub const ENV_CACHE_STALE_SECS: &str = "SCOREMAP_CACHE_STALE_SECS";
pub const ENV_CACHE_MIN_HITS: &str = "SCOREMAP_CACHE_MIN_HITS";

/// Environment variable snapshot for configuration resolution
#[derive(Debug, Clone, Default)]
pub struct EnvironmentSnapshot {
    /// Map of environment variable names to values
    pub vars: HashMap<String, String>,
}

impl EnvironmentSnapshot {
    /// Capture the `SCOREMAP_*` variables of the current process
    pub fn from_current_env() -> Self {
        Self {
            vars: std::env::vars()
                .filter(|(key, _)| key.starts_with(ENV_PREFIX))
                .collect(),
        }
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|s| s.as_str())
    }

    /// Parse environment variable as type T
    pub fn parse<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.get(key)?.trim().parse().ok()
    }
}

/// Apply `SCOREMAP_CACHE_*` overrides. Unparseable values are ignored.
pub fn apply_cache_overrides(
    mut settings: CacheSettings,
    env: &EnvironmentSnapshot,
) -> CacheSettings {
    if let Some(max_entries) = env.parse::<usize>(ENV_CACHE_MAX_ENTRIES) {
        settings.max_entries = max_entries;
    }
    if let Some(stale_secs) = env.parse::<u64>(ENV_CACHE_STALE_SECS) {
        settings.stale_after_secs = stale_secs;
    }
    if let Some(min_hits) = env.parse::<u64>(ENV_CACHE_MIN_HITS) {
        settings.min_hits = min_hits;
    }
    settings
}
