// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file and return the raw, unvalidated `RawConfigFile`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    let config: RawConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Load a configuration file, validate it, and resolve relative directories
/// against the file's own directory.
///
/// This is the entry point the rest of the application uses.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let raw = load_from_path(path)?;
    let config = ConfigFile::try_from(raw)?;
    Ok(config.resolve_relative_to(&config_root_dir(path)))
}

/// Load `path` if it exists, otherwise fall back to built-in defaults
/// anchored at the current directory.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    if path.exists() {
        return load_and_validate(path);
    }
    let config = ConfigFile::try_from(RawConfigFile::default())?;
    Ok(config.resolve_relative_to(&config_root_dir(path)))
}

/// Helper to resolve a default config path.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Scriptrun.toml")
}

/// Directory used to anchor relative paths from the config.
///
/// A bare filename like `Scriptrun.toml` has an empty parent, in which case
/// the current working directory is used.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
