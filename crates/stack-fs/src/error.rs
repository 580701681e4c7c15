//! Error types for stack-fs

use std::path::PathBuf;

/// Result type for stack-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in stack-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML at {path}: {message}")]
    TomlParse { path: PathBuf, message: String },

    #[error("Failed to serialize TOML for {path}: {message}")]
    TomlSerialize { path: PathBuf, message: String },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },

    #[error("Another build is already running for this project (lock held at {path})")]
    ProjectLocked { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
