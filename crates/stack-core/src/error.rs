//! Error types for stack-core

use std::path::PathBuf;

/// Result type for stack-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in stack-core operations
///
/// Configuration problems are never raised through this type: unreadable
/// sources and validation findings are collected as warnings and issues so a
/// single run reports everything at once.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An environment name that matches no known synonym
    #[error("Unknown environment: {value} (expected dev, staging or prod)")]
    InvalidEnvironment { value: String },

    /// An external tool a generator needs is not installed
    #[error("External tool unavailable: {tool}")]
    ToolUnavailable { tool: String },

    /// A generator or the subprocess it drives exceeded its time budget
    #[error("{what} timed out after {seconds}s")]
    Timeout { what: String, seconds: u64 },

    /// A generator ran but could not produce its artifacts
    #[error("Generation failed for {family}: {reason}")]
    GenerationFailed { family: String, reason: String },

    /// A backup could not be created or read
    #[error("Backup error at {path}: {message}")]
    Backup { path: PathBuf, message: String },

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from stack-fs
    #[error(transparent)]
    Fs(#[from] stack_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error
    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),
}

impl Error {
    /// Whether this error means a collaborator is missing rather than broken.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::ToolUnavailable { .. })
    }
}
