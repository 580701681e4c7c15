//! Writing generated files into a project

use std::fs;
use std::path::{Path, PathBuf};

use stack_core::GenerationOutcome;
use stack_fs::WriteStatus;

use crate::{Error, Result};

/// First-line marker of every file the generators own.
pub const GENERATED_MARKER: &str = "Generated by stack build; edits are overwritten";

/// Change-aware writer that tallies outputs relative to the project root.
#[derive(Debug)]
pub struct OutputWriter<'a> {
    root: &'a Path,
    outcome: GenerationOutcome,
}

impl<'a> OutputWriter<'a> {
    pub fn new(root: &'a Path) -> Self {
        Self {
            root,
            outcome: GenerationOutcome::new(),
        }
    }

    pub fn root(&self) -> &Path {
        self.root
    }

    /// Write `content` to `relative` unless it is already there.
    pub fn write(&mut self, relative: impl AsRef<Path>, content: &str) -> Result<WriteStatus> {
        let relative = relative.as_ref();
        let status = stack_fs::write_if_changed(&self.root.join(relative), content)?;
        self.outcome.record(relative, status);
        Ok(status)
    }

    /// Write `content` only when nothing exists at `relative` yet.
    ///
    /// Existing files are still recorded as outputs.
    pub fn write_new(&mut self, relative: impl AsRef<Path>, content: &[u8]) -> Result<WriteStatus> {
        let relative = relative.as_ref();
        let path = self.root.join(relative);
        if path.exists() {
            self.outcome.record(relative, WriteStatus::Unchanged);
            return Ok(WriteStatus::Unchanged);
        }
        stack_fs::write_atomic(&path, content)?;
        self.outcome.record(relative, WriteStatus::Created);
        Ok(WriteStatus::Created)
    }

    /// Record a file written by an external command.
    pub fn record(&mut self, relative: impl Into<PathBuf>, status: WriteStatus) {
        self.outcome.record(relative, status);
    }

    /// Remove a file at `relative` if a generator wrote it.
    pub fn remove_generated(&mut self, relative: impl AsRef<Path>) -> Result<bool> {
        let relative = relative.as_ref();
        let path = self.root.join(relative);
        if !is_generated(&path) {
            return Ok(false);
        }
        fs::remove_file(&path).map_err(|e| Error::io(&path, e))?;
        self.note(format!("removed {}", relative.display()));
        Ok(true)
    }

    pub fn note(&mut self, note: impl Into<String>) {
        self.outcome.note(note);
    }

    pub fn finish(self) -> GenerationOutcome {
        self.outcome
    }
}

/// Prefix `body` with the generated-file marker as a comment.
pub fn with_header(comment: &str, body: &str) -> String {
    format!("{comment} {GENERATED_MARKER}\n{body}")
}

/// Whether the file at `path` starts with the generated-file marker.
pub fn is_generated(path: &Path) -> bool {
    fs::read_to_string(path)
        .ok()
        .and_then(|content| content.lines().next().map(|line| line.contains(GENERATED_MARKER)))
        .unwrap_or(false)
}
