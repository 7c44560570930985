//! Command handlers.
//!
//! Each handler is a thin shell: load config and input at the edge, call the
//! library, print the result.

pub mod init;
pub mod render;
pub mod validate;

pub use init::handle_init_command;
pub use render::{handle_render_command, RenderConfig};
pub use validate::handle_validate_command;

use crate::config::{load_config, EnvironmentSnapshot, ScoremapConfig};
use crate::core::SubjectScores;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

/// Load the config (explicit path or nearest `.scoremap.toml`) with env overrides.
pub fn load_settings(explicit: Option<&Path>) -> Result<ScoremapConfig> {
    let (config, source) = load_config(explicit).context("Failed to load configuration")?;
    if let Some(path) = &source {
        info!(path = %path.display(), "Using config file");
    }
    Ok(config.with_env_overrides(&EnvironmentSnapshot::from_current_env()))
}

/// Read a `{ subject: { commonTest, secondTest, ... } }` JSON file.
pub fn read_scores(path: &Path) -> Result<SubjectScores> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scores from {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse scores in {}", path.display()))
}
