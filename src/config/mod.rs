//! Configuration for the scoremap pipeline.
//!
//! Loaded from `.scoremap.toml` (see [`loader`]); every section is optional
//! and falls back to its defaults.
//!
//! ```toml
//! [cache]
//! max_entries = 128
//! stale_after_secs = 600
//! min_hits = 2
//! sweep_interval_secs = 60
//!
//! [rule_cache]
//! idle_window_secs = 300
//! min_hits = 2
//!
//! [validation]
//! max_subject_name_len = 32
//!
//! [styles."英語"]
//! color = "#4E79A7"
//! pattern = "striped"
//!
//! [default_style]
//! color = "#9E9E9E"
//! pattern = "solid"
//! ```

pub mod env;
pub mod loader;
pub mod validation;

pub use env::{apply_cache_overrides, EnvironmentSnapshot};
pub use loader::{
    default_config_toml, directory_ancestors, find_config_file, load_config, load_config_from_path,
    parse_and_validate_config, CONFIG_FILE_NAME,
};
pub use validation::{config_issues, validate_config, validate_config_result};

use crate::cache::CacheSettings;
use crate::chart::{CategoryStyle, StyleTable};
use crate::core::Category;
use crate::validation::score_rules::DEFAULT_MAX_SUBJECT_NAME_LEN;
use crate::validation::RuleCacheConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    pub max_subject_name_len: usize,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            max_subject_name_len: DEFAULT_MAX_SUBJECT_NAME_LEN,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoremapConfig {
    pub cache: CacheSettings,
    pub rule_cache: RuleCacheConfig,
    pub validation: ValidationSettings,
    /// Per-category styles layered over the built-in table.
    pub styles: BTreeMap<Category, CategoryStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_style: Option<CategoryStyle>,
}

impl ScoremapConfig {
    /// Built-in styles with the configured ones layered on top.
    pub fn style_table(&self) -> StyleTable {
        let table = self
            .styles
            .iter()
            .fold(StyleTable::builtin(), |table, (category, style)| {
                table.with(category.clone(), style.clone())
            });
        match &self.default_style {
            Some(style) => table.with_default(style.clone()),
            None => table,
        }
    }

    /// Apply `SCOREMAP_CACHE_*` overrides from `env`.
    pub fn with_env_overrides(mut self, env: &EnvironmentSnapshot) -> Self {
        self.cache = apply_cache_overrides(self.cache, env);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::PatternKind;

    #[test]
    fn test_style_table_layers_config_over_builtin() {
        let mut config = ScoremapConfig::default();
        config.styles.insert(
            Category::from("英語"),
            CategoryStyle::new("#000000", PatternKind::Dotted),
        );
        config.default_style = Some(CategoryStyle::new("#111111", PatternKind::Solid));

        let table = config.style_table();

        assert_eq!(table.style_for(&Category::from("英語")).color, "#000000");
        assert_eq!(table.style_for(&Category::from("数学")).color, "#F28E2B");
        assert_eq!(table.style_for(&Category::from("情報")).color, "#111111");
    }

    #[test]
    fn test_env_overrides() {
        let env = EnvironmentSnapshot::from_pairs([(env::ENV_CACHE_MIN_HITS, "7")]);
        let config = ScoremapConfig::default().with_env_overrides(&env);
        assert_eq!(config.cache.min_hits, 7);
    }
}
