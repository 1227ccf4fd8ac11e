//! Storage Layer
//!
//! Locates the configuration directory. Card data and camera frames are
//! never written to disk.

use anyhow::Result;
use std::path::PathBuf;

/// Name of the configuration file inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

/// Get the configuration directory, creating it if needed
pub fn get_config_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "cardscan", "CardScan")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    let config_dir = proj_dirs.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir)
}

/// Path of the default configuration file
pub fn default_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE))
}
