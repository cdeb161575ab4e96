// src/config/mod.rs

//! Configuration loading and validation for scriptrun.
//!
//! - `model.rs` defines the TOML-backed data model and its validation
//!   (`RawConfigFile` -> `ConfigFile`).
//! - `loader.rs` reads a config file from disk.

pub mod loader;
pub mod model;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{ConfigFile, RawConfigFile, RawOrchestratorSection};
