// src/exec/settings.rs

use std::path::PathBuf;
use std::time::Duration;

/// Everything the orchestrator needs to know about its environment.
///
/// Built from the `[orchestrator]` config section in production and
/// constructed directly in tests.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub scripts_dir: PathBuf,
    pub interpreter: Option<String>,
    pub interpreter_args: Vec<String>,
    pub timeout: Duration,
    /// Upper bound on waiting for output drains once the child is gone.
    pub drain_grace: Duration,
    pub staging_dir: PathBuf,
    pub default_script: String,
}

impl OrchestratorSettings {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1000);
    pub const DEFAULT_DRAIN_GRACE: Duration = Duration::from_secs(5);

    pub fn new(scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            scripts_dir: scripts_dir.into(),
            interpreter: None,
            interpreter_args: Vec::new(),
            timeout: Self::DEFAULT_TIMEOUT,
            drain_grace: Self::DEFAULT_DRAIN_GRACE,
            staging_dir: std::env::temp_dir(),
            default_script: "ProXeek_main.py".to_string(),
        }
    }
}
