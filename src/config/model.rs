// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::errors::ScriptrunError;
use crate::exec::OrchestratorSettings;
use crate::types::parse_duration;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [orchestrator]
/// scripts_dir = "scripts"
/// interpreter = "python3"
/// interpreter_args = ["-u"]
/// timeout = "1000s"
/// drain_grace = "5s"
/// default_script = "ProXeek_main.py"
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub orchestrator: RawOrchestratorSection,
}

/// `[orchestrator]` section, before validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawOrchestratorSection {
    /// Directory the script identifiers are resolved in.
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: String,

    /// Program used to launch scripts. When absent, the script is executed
    /// directly.
    #[serde(default)]
    pub interpreter: Option<String>,

    /// Extra arguments placed between the interpreter and the script path.
    #[serde(default)]
    pub interpreter_args: Vec<String>,

    /// Hard execution deadline, e.g. `"30s"`.
    #[serde(default = "default_timeout")]
    pub timeout: String,

    /// How long to wait for output drains after the child was killed.
    #[serde(default = "default_drain_grace")]
    pub drain_grace: String,

    /// Where parameter files are staged. Defaults to the OS temp directory.
    #[serde(default)]
    pub staging_dir: Option<String>,

    /// Script used when a request names none.
    #[serde(default = "default_script")]
    pub default_script: String,
}

fn default_scripts_dir() -> String {
    "scripts".to_string()
}

fn default_timeout() -> String {
    "1000s".to_string()
}

fn default_drain_grace() -> String {
    "5s".to_string()
}

fn default_script() -> String {
    "ProXeek_main.py".to_string()
}

impl Default for RawOrchestratorSection {
    fn default() -> Self {
        Self {
            scripts_dir: default_scripts_dir(),
            interpreter: None,
            interpreter_args: Vec::new(),
            timeout: default_timeout(),
            drain_grace: default_drain_grace(),
            staging_dir: None,
            default_script: default_script(),
        }
    }
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub orchestrator: OrchestratorSettings,
}

impl ConfigFile {
    /// Re-anchor relative directories onto `base` (normally the directory
    /// holding the config file).
    pub fn resolve_relative_to(mut self, base: &Path) -> Self {
        let settings = &mut self.orchestrator;
        if settings.scripts_dir.is_relative() {
            settings.scripts_dir = base.join(&settings.scripts_dir);
        }
        if settings.staging_dir.is_relative() {
            settings.staging_dir = base.join(&settings.staging_dir);
        }
        self
    }
}

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ScriptrunError;

    fn try_from(raw: RawConfigFile) -> Result<Self, Self::Error> {
        let section = raw.orchestrator;

        if section.scripts_dir.trim().is_empty() {
            return Err(ScriptrunError::Config(
                "[orchestrator].scripts_dir must not be empty".to_string(),
            ));
        }

        let timeout = section_duration("timeout", &section.timeout)?;
        if timeout.is_zero() {
            return Err(ScriptrunError::Config(
                "[orchestrator].timeout must be greater than zero".to_string(),
            ));
        }
        let drain_grace = section_duration("drain_grace", &section.drain_grace)?;
        if drain_grace.is_zero() {
            return Err(ScriptrunError::Config(
                "[orchestrator].drain_grace must be greater than zero".to_string(),
            ));
        }

        let interpreter = match section.interpreter {
            Some(i) if i.trim().is_empty() => {
                return Err(ScriptrunError::Config(
                    "[orchestrator].interpreter must not be blank".to_string(),
                ));
            }
            other => other,
        };
        if interpreter.is_none() && !section.interpreter_args.is_empty() {
            return Err(ScriptrunError::Config(
                "[orchestrator].interpreter_args requires an interpreter".to_string(),
            ));
        }

        if section.default_script.trim().is_empty() {
            return Err(ScriptrunError::Config(
                "[orchestrator].default_script must not be empty".to_string(),
            ));
        }

        let staging_dir = section
            .staging_dir
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);

        Ok(ConfigFile {
            orchestrator: OrchestratorSettings {
                scripts_dir: PathBuf::from(section.scripts_dir),
                interpreter,
                interpreter_args: section.interpreter_args,
                timeout,
                drain_grace,
                staging_dir,
                default_script: section.default_script,
            },
        })
    }
}

fn section_duration(key: &str, value: &str) -> Result<Duration, ScriptrunError> {
    parse_duration(value)
        .map_err(|e| ScriptrunError::Config(format!("[orchestrator].{key}: {e}")))
}
