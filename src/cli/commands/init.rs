use crate::config::{default_config_toml, CONFIG_FILE_NAME};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Write the default config into `dir`, refusing to clobber unless `force`.
pub fn write_default_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    let contents = default_config_toml()?;
    fs::write(&config_path, contents)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    Ok(config_path)
}

pub fn handle_init_command(force: bool) -> Result<()> {
    let current = std::env::current_dir().context("Failed to resolve current directory")?;
    write_default_config(&current, force)?;
    println!("Created {} configuration file", CONFIG_FILE_NAME);
    Ok(())
}
