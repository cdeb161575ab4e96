// src/exec/locate.rs

use std::path::{Component, Path, PathBuf};

use tracing::warn;

use crate::errors::{Result, ScriptrunError};
use crate::fs::{FileSystem, RealFileSystem};

/// Maps script identifiers onto files inside the scripts directory.
#[derive(Debug, Clone)]
pub struct ScriptLocator<F: FileSystem = RealFileSystem> {
    scripts_dir: PathBuf,
    fs: F,
}

impl<F: FileSystem> ScriptLocator<F> {
    pub fn new(scripts_dir: impl Into<PathBuf>, fs: F) -> Self {
        Self {
            scripts_dir: scripts_dir.into(),
            fs,
        }
    }

    pub fn scripts_dir(&self) -> &Path {
        &self.scripts_dir
    }

    /// Resolve `script` to an existing file.
    ///
    /// Identifiers are relative paths that must stay inside the scripts
    /// directory; anything else is `InvalidScriptName`. A well-formed name
    /// with no file behind it is `ScriptNotFound`.
    pub fn resolve(&self, script: &str) -> Result<PathBuf> {
        validate_identifier(script)?;

        let path = self.scripts_dir.join(script);
        if !self.fs.is_file(&path) {
            if !self.fs.is_dir(&self.scripts_dir) {
                warn!(
                    scripts_dir = %self.scripts_dir.display(),
                    "scripts directory does not exist"
                );
            }
            return Err(ScriptrunError::ScriptNotFound(script.to_string()));
        }
        Ok(path)
    }
}

fn validate_identifier(script: &str) -> Result<()> {
    if script.trim().is_empty() {
        return Err(ScriptrunError::InvalidScriptName(
            "script name is empty".to_string(),
        ));
    }

    let escapes = Path::new(script)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(ScriptrunError::InvalidScriptName(format!(
            "'{script}' must be a relative path inside the scripts directory"
        )));
    }
    Ok(())
}
