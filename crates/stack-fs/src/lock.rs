//! Per-project build lock
//!
//! One orchestrator run per project directory at a time. The lock is an
//! advisory exclusive lock on `.stack/build.lock`, released on drop.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::{Error, ProjectPath, Result};

/// Held for the lifetime of a build run.
#[derive(Debug)]
pub struct ProjectLock {
    file: File,
    path: PathBuf,
}

impl ProjectLock {
    /// Try to take the lock for the project at `root` without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProjectLocked`] if another process holds the lock.
    pub fn acquire(root: &Path) -> Result<Self> {
        let path = ProjectPath::BuildLock.under(root);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| Error::io(&path, e))?;

        file.try_lock_exclusive()
            .map_err(|_| Error::ProjectLocked { path: path.clone() })?;

        tracing::debug!(path = %path.display(), "Acquired project lock");
        Ok(Self { file, path })
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ProjectLock {
    fn drop(&mut self) {
        if FileExt::unlock(&self.file).is_err() {
            tracing::warn!(path = %self.path.display(), "Failed to release project lock");
        }
    }
}
