//! Artifact generator abstraction
//!
//! Each [`ArtifactFamily`] is produced by one [`ArtifactGenerator`]. The
//! orchestrator decides *whether* a family runs; generators only decide
//! *what* to write.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use stack_fs::WriteStatus;

use super::ArtifactFamily;
use crate::Result;
use crate::config::EffectiveConfig;
use crate::services::ServiceSet;

/// Default bound on any single external command, in seconds.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 120;

/// Key overriding [`DEFAULT_COMMAND_TIMEOUT_SECS`].
pub const TIMEOUT_KEY: &str = "STACK_GENERATOR_TIMEOUT";

/// Key overriding the scaffold template directory.
pub const TEMPLATES_DIR_KEY: &str = "STACK_TEMPLATES_DIR";
pub const DEFAULT_TEMPLATES_DIR: &str = "templates";

/// Everything a generator may read.
#[derive(Debug, Clone, Copy)]
pub struct GenerationContext<'a> {
    pub root: &'a Path,
    pub config: &'a EffectiveConfig,
    pub services: &'a ServiceSet,
    pub command_timeout: Duration,
}

impl<'a> GenerationContext<'a> {
    pub fn new(root: &'a Path, config: &'a EffectiveConfig, services: &'a ServiceSet) -> Self {
        Self {
            root,
            config,
            services,
            command_timeout: command_timeout(config),
        }
    }

    /// Directory holding service templates, resolved against the root.
    pub fn templates_dir(&self) -> PathBuf {
        templates_dir(self.root, self.config)
    }
}

/// `STACK_TEMPLATES_DIR` (default `templates`) under `root`.
pub fn templates_dir(root: &Path, cfg: &EffectiveConfig) -> PathBuf {
    root.join(cfg.non_empty(TEMPLATES_DIR_KEY).unwrap_or(DEFAULT_TEMPLATES_DIR))
}

/// Command timeout configured for `cfg`.
pub fn command_timeout(cfg: &EffectiveConfig) -> Duration {
    let secs = cfg
        .non_empty(TIMEOUT_KEY)
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|s| *s > 0)
        .unwrap_or(DEFAULT_COMMAND_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

/// Files a generator wrote, or chose not to write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationOutcome {
    pub created: Vec<PathBuf>,
    pub updated: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    /// Set when the generator deliberately produced nothing
    pub skipped: Option<String>,
    /// Free-form remarks for the summary (skipped services and the like)
    pub notes: Vec<String>,
}

impl GenerationOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// An outcome for a generator that had nothing to do.
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            skipped: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Record a write. `path` should be relative to the project root.
    pub fn record(&mut self, path: impl Into<PathBuf>, status: WriteStatus) {
        let path = path.into();
        match status {
            WriteStatus::Created => self.created.push(path),
            WriteStatus::Updated => self.updated.push(path),
            WriteStatus::Unchanged => self.unchanged.push(path),
        }
    }

    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn merge(&mut self, other: GenerationOutcome) {
        self.created.extend(other.created);
        self.updated.extend(other.updated);
        self.unchanged.extend(other.unchanged);
        self.notes.extend(other.notes);
    }

    /// Every file this generation is responsible for.
    pub fn outputs(&self) -> Vec<PathBuf> {
        let mut outputs: Vec<PathBuf> = self
            .created
            .iter()
            .chain(&self.updated)
            .chain(&self.unchanged)
            .cloned()
            .collect();
        outputs.sort();
        outputs.dedup();
        outputs
    }
}

/// Produces the outputs of one artifact family.
#[async_trait]
pub trait ArtifactGenerator: Send + Sync {
    fn family(&self) -> ArtifactFamily;

    /// Generate the family's outputs.
    ///
    /// Return [`crate::Error::ToolUnavailable`] when an external tool is
    /// missing; the orchestrator reports the family as skipped and retries on
    /// the next build.
    async fn generate(&self, ctx: &GenerationContext<'_>) -> Result<GenerationOutcome>;
}

/// Generators keyed by family.
#[derive(Default, Clone)]
pub struct GeneratorRegistry {
    generators: BTreeMap<ArtifactFamily, Arc<dyn ArtifactGenerator>>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a generator, replacing any earlier one for the same family.
    pub fn register(&mut self, generator: Arc<dyn ArtifactGenerator>) {
        self.generators.insert(generator.family(), generator);
    }

    pub fn with(mut self, generator: Arc<dyn ArtifactGenerator>) -> Self {
        self.register(generator);
        self
    }

    pub fn get(&self, family: ArtifactFamily) -> Option<Arc<dyn ArtifactGenerator>> {
        self.generators.get(&family).cloned()
    }

    pub fn families(&self) -> impl Iterator<Item = ArtifactFamily> + '_ {
        self.generators.keys().copied()
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("families", &self.generators.keys().collect::<Vec<_>>())
            .finish()
    }
}
