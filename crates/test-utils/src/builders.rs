#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;

use scriptrun::exec::OrchestratorSettings;

/// A throwaway scripts directory plus a private staging directory.
///
/// Scripts are plain `sh` scripts; pair with [`SettingsBuilder::sh`] so they
/// don't need the executable bit.
pub struct ScriptDir {
    root: TempDir,
}

impl ScriptDir {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("creating temp script dir");
        fs::create_dir(root.path().join("scripts")).expect("creating scripts dir");
        fs::create_dir(root.path().join("staging")).expect("creating staging dir");
        Self { root }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn scripts_dir(&self) -> PathBuf {
        self.root.path().join("scripts")
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.root.path().join("staging")
    }

    /// Write `body` to `scripts/<name>`.
    pub fn with_script(self, name: &str, body: &str) -> Self {
        self.write_script(name, body);
        self
    }

    /// Write `body` to `scripts/<name>`, returning its path.
    pub fn write_script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.scripts_dir().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("creating script parent dir");
        }
        fs::write(&path, body).expect("writing script");
        path
    }

    /// Write a `Scriptrun.toml` at the root pointing at this directory with
    /// the `sh` interpreter. `extra` lines are appended to `[orchestrator]`.
    pub fn write_config(&self, extra: &str) -> PathBuf {
        let body = format!(
            "[orchestrator]\nscripts_dir = {:?}\nstaging_dir = {:?}\ninterpreter = \"sh\"\n{extra}",
            self.scripts_dir().to_string_lossy(),
            self.staging_dir().to_string_lossy(),
        );
        let path = self.root().join("Scriptrun.toml");
        fs::write(&path, body).expect("writing config");
        path
    }

    /// Entries currently left in the staging directory.
    pub fn staged_files(&self) -> Vec<PathBuf> {
        list_dir(&self.staging_dir())
    }

    /// Settings pointing at this directory, launching scripts through `sh`.
    pub fn settings(&self) -> SettingsBuilder {
        SettingsBuilder::new(self.scripts_dir())
            .staging_dir(self.staging_dir())
            .sh()
    }
}

impl Default for ScriptDir {
    fn default() -> Self {
        Self::new()
    }
}

fn list_dir(dir: &Path) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok().map(|e| e.path())).collect())
        .unwrap_or_default()
}

/// Builder for `OrchestratorSettings` to simplify test setup.
pub struct SettingsBuilder {
    settings: OrchestratorSettings,
}

impl SettingsBuilder {
    pub fn new(scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            settings: OrchestratorSettings::new(scripts_dir),
        }
    }

    pub fn sh(self) -> Self {
        self.interpreter("sh")
    }

    pub fn interpreter(mut self, program: &str) -> Self {
        self.settings.interpreter = Some(program.to_string());
        self
    }

    pub fn no_interpreter(mut self) -> Self {
        self.settings.interpreter = None;
        self.settings.interpreter_args.clear();
        self
    }

    pub fn interpreter_arg(mut self, arg: &str) -> Self {
        self.settings.interpreter_args.push(arg.to_string());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = timeout;
        self
    }

    pub fn drain_grace(mut self, grace: Duration) -> Self {
        self.settings.drain_grace = grace;
        self
    }

    pub fn staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.settings.staging_dir = dir.into();
        self
    }

    pub fn default_script(mut self, name: &str) -> Self {
        self.settings.default_script = name.to_string();
        self
    }

    pub fn build(self) -> OrchestratorSettings {
        self.settings
    }
}
