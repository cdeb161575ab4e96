// src/staging.rs

//! Parameter staging.
//!
//! A request's parameters are written to a uniquely named JSON file that the
//! child process receives as its only argument. The file belongs to exactly
//! one execution: `stage` creates it, `release` (or `Drop`) removes it.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::{Builder, TempPath};
use tracing::{debug, warn};

use crate::errors::Result;

/// A parameter file on disk, owned by one in-flight execution.
#[derive(Debug)]
pub struct StagedParameterFile {
    path: PathBuf,
    temp: Option<TempPath>,
}

/// Serialize `params` as JSON into a fresh file inside `dir`.
///
/// Serialization runs before anything touches the filesystem, so a
/// `Serialization` error leaves no artifact behind.
pub fn stage<T>(params: &T, dir: &Path) -> Result<StagedParameterFile>
where
    T: Serialize + ?Sized,
{
    let bytes = serde_json::to_vec(params)?;

    let mut file = Builder::new()
        .prefix("params-")
        .suffix(".json")
        .tempfile_in(dir)?;
    file.write_all(&bytes)?;
    file.as_file().sync_all()?;

    // Close our handle; the path stays owned and is deleted on drop.
    let temp = file.into_temp_path();
    let path = temp.to_path_buf();

    debug!(path = %path.display(), bytes = bytes.len(), "staged parameter file");

    Ok(StagedParameterFile {
        path,
        temp: Some(temp),
    })
}

impl StagedParameterFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_released(&self) -> bool {
        self.temp.is_none()
    }

    /// Remove the backing file.
    ///
    /// Calling this more than once is a no-op, as is releasing a file that
    /// something else already deleted.
    pub fn release(&mut self) -> Result<()> {
        let Some(temp) = self.temp.take() else {
            return Ok(());
        };

        match temp.close() {
            Ok(()) => {
                debug!(path = %self.path.display(), "released parameter file");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "parameter file already gone");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for StagedParameterFile {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove parameter file"
            );
        }
    }
}
