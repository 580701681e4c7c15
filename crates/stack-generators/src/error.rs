//! Error types for stack-generators

use std::path::PathBuf;

use stack_core::ArtifactFamily;

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while producing artifacts
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Command '{command}' was not found on PATH")]
    CommandNotFound { command: String },

    #[error("Command '{command}' failed (exit code: {code:?}): {stderr}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Command '{command}' timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Fs(#[from] stack_fs::Error),

    #[error("Failed to serialize YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Map into the orchestrator's error type for `family`.
    ///
    /// A missing command becomes [`stack_core::Error::ToolUnavailable`] so
    /// the family is skipped rather than failed.
    pub fn into_core(self, family: ArtifactFamily) -> stack_core::Error {
        match self {
            Error::CommandNotFound { command } => stack_core::Error::ToolUnavailable { tool: command },
            Error::Timeout { command, seconds } => stack_core::Error::Timeout {
                what: command,
                seconds,
            },
            Error::Fs(e) => stack_core::Error::Fs(e),
            other => stack_core::Error::GenerationFailed {
                family: family.to_string(),
                reason: other.to_string(),
            },
        }
    }
}
