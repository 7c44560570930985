use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::validation::validate_config_result;
use super::ScoremapConfig;
use crate::errors::{Result, ScoremapError};

pub const CONFIG_FILE_NAME: &str = ".scoremap.toml";

const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Pure function to parse and validate config from TOML string
pub fn parse_and_validate_config(contents: &str) -> Result<ScoremapConfig> {
    let config = toml::from_str::<ScoremapConfig>(contents)?;
    validate_config_result(&config, None)?;
    Ok(config)
}

/// Read, parse and validate the config at `path`.
pub fn load_config_from_path(path: &Path) -> Result<ScoremapConfig> {
    let contents = fs::read_to_string(path).map_err(|e| {
        ScoremapError::config(
            format!("Failed to read {}: {}", path.display(), e),
            Some(path.to_path_buf()),
        )
    })?;

    let config = toml::from_str::<ScoremapConfig>(&contents).map_err(|e| {
        ScoremapError::config(
            format!("Failed to parse {}: {}", path.display(), e),
            Some(path.to_path_buf()),
        )
    })?;
    validate_config_result(&config, Some(path))?;

    debug!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Pure function to generate directory ancestors up to a depth limit
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// First `.scoremap.toml` in `start` or its ancestors.
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    directory_ancestors(start.to_path_buf(), MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|path| path.is_file())
}

/// Load the explicit config if given, else search from the current directory.
///
/// No file found gives the defaults; a file that exists but is invalid is an error.
pub fn load_config(explicit: Option<&Path>) -> Result<(ScoremapConfig, Option<PathBuf>)> {
    if let Some(path) = explicit {
        return Ok((load_config_from_path(path)?, Some(path.to_path_buf())));
    }

    let current = std::env::current_dir()?;
    match find_config_file(&current) {
        Some(path) => Ok((load_config_from_path(&path)?, Some(path))),
        None => {
            debug!(
                depth = MAX_TRAVERSAL_DEPTH,
                "No config found, using defaults"
            );
            Ok((ScoremapConfig::default(), None))
        }
    }
}

/// Contents written by `scoremap init`.
pub fn default_config_toml() -> Result<String> {
    let config = ScoremapConfig {
        styles: crate::chart::StyleTable::builtin()
            .categories()
            .map(|(category, style)| (category.clone(), style.clone()))
            .collect(),
        ..ScoremapConfig::default()
    };
    toml::to_string_pretty(&config)
        .map_err(|e| ScoremapError::System(format!("Failed to render default config: {}", e)))
}
