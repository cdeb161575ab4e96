// src/fs/mod.rs

use std::fmt::Debug;
use std::path::Path;

pub mod mock;

/// Existence checks made while resolving a script name.
///
/// The orchestrator is generic over this so tests can resolve against an
/// in-memory tree.
pub trait FileSystem: Send + Sync + Debug {
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
}

/// Asks the OS.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}
