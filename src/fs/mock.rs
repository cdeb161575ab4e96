// src/fs/mock.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::FileSystem;

/// In-memory filesystem holding a set of file paths.
///
/// Directories exist implicitly as the ancestors of added files.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashSet<PathBuf>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>) {
        self.lock().insert(path.as_ref().to_path_buf());
    }

    pub fn remove_file(&self, path: impl AsRef<Path>) {
        self.lock().remove(path.as_ref());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<PathBuf>> {
        // A panicked test thread must not wedge the others.
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl FileSystem for MockFileSystem {
    fn is_file(&self, path: &Path) -> bool {
        self.lock().contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.lock()
            .iter()
            .any(|f| f.ancestors().skip(1).any(|a| a == path))
    }
}
