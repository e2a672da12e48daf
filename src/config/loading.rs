//! Configuration loading functionality.
//!
//! Resolves the configuration path, reads and parses the TOML file and runs validation.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::Config;
use super::validation::validate_config;
use crate::common::constants::*;

/// Default configuration file location: `<config dir>/duskswitch/duskswitch.toml`.
pub fn get_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load configuration.
///
/// An explicit path must exist. Without one, the default location is used when a file is
/// there and built-in defaults otherwise.
pub fn load(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_from_path(path);
    }

    let default_path = get_config_path()?;
    if default_path.exists() {
        load_from_path(&default_path)
    } else {
        let config = Config::default();
        validate_config(&config)?;
        Ok(config)
    }
}

/// Load configuration from a specific path.
pub fn load_from_path(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!("Configuration file not found: {}", path.display());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;

    parse(&content).with_context(|| format!("Invalid configuration in {}", path.display()))
}

/// Parse and validate configuration text.
pub fn parse(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse TOML")?;
    validate_config(&config)?;
    Ok(config)
}
