//! Configuration cascade resolution
//!
//! The `CascadeResolver` picks the layers for the target environment, merges
//! them last-writer-wins and fills computed and smart defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::defaults::{apply_computed_defaults, apply_smart_defaults};
use super::effective::LoadedSource;
use super::envfile::parse_entries;
use super::environment::{DetectedEnvironment, EnvironmentHints, detect_environment};
use super::source::{ConfigSource, SourceKind, resolve_cascade};
use super::{EffectiveConfig, Environment};

/// A source that exists but could not be read. The run continues without it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceWarning {
    pub path: PathBuf,
    pub message: String,
}

/// Output of [`CascadeResolver::resolve`].
#[derive(Debug, Clone)]
pub struct Resolution {
    pub config: EffectiveConfig,
    pub detected: DetectedEnvironment,
    pub warnings: Vec<SourceWarning>,
}

/// Resolves the effective configuration for a project directory.
#[derive(Debug, Clone)]
pub struct CascadeResolver {
    root: PathBuf,
    project_hint: Option<String>,
}

impl CascadeResolver {
    /// Create a resolver for the project at `root`.
    ///
    /// The directory name seeds `PROJECT_NAME` when no source sets it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let project_hint = root
            .file_name()
            .map(|name| name.to_string_lossy().to_string());
        Self { root, project_hint }
    }

    /// Override the name used to derive `PROJECT_NAME`.
    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        self.project_hint = Some(name.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn local_override_path(&self) -> PathBuf {
        SourceKind::LocalOverride.project_path().under(&self.root)
    }

    pub fn detect_environment(&self, hints: &EnvironmentHints) -> DetectedEnvironment {
        detect_environment(hints, &self.local_override_path())
    }

    /// Sources for `env`, in merge order.
    pub fn sources(&self, env: Environment) -> Vec<ConfigSource> {
        resolve_cascade(env)
            .into_iter()
            .map(|kind| ConfigSource::new(kind, &self.root))
            .collect()
    }

    /// Detect the environment, merge its cascade and apply defaults.
    pub fn resolve(&self, hints: &EnvironmentHints) -> Resolution {
        let detected = self.detect_environment(hints);
        self.resolve_detected(detected)
    }

    /// Resolve for an environment that was already decided.
    pub fn resolve_detected(&self, detected: DetectedEnvironment) -> Resolution {
        let sources = self.sources(detected.environment);
        let (merged, warnings) = merge(detected.environment, &sources);

        let config = apply_computed_defaults(merged);
        let config = apply_smart_defaults(config, self.project_hint.as_deref());

        tracing::debug!(
            environment = %detected.environment,
            keys = config.len(),
            sources = config.sources().len(),
            "Resolved configuration"
        );

        Resolution {
            config,
            detected,
            warnings,
        }
    }
}

/// Merge `sources` in order. Later assignments replace earlier ones per key.
///
/// Missing files are skipped silently; unreadable files are skipped with a
/// warning. Merging itself cannot fail.
pub fn merge(env: Environment, sources: &[ConfigSource]) -> (EffectiveConfig, Vec<SourceWarning>) {
    let mut config = EffectiveConfig::new(env);
    let mut warnings = Vec::new();

    for source in sources {
        if !source.path.exists() {
            tracing::debug!(path = %source.path.display(), kind = ?source.kind, "Source not present, skipping");
            continue;
        }

        let content = match fs::read_to_string(&source.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %source.path.display(), error = %e, "Skipping unreadable source");
                warnings.push(SourceWarning {
                    path: source.path.clone(),
                    message: e.to_string(),
                });
                continue;
            }
        };

        let entries = parse_entries(&content);
        tracing::debug!(path = %source.path.display(), entries = entries.len(), "Loaded source");
        let count = entries.len();
        for entry in entries {
            config.set(entry.key, entry.value);
        }
        config.push_source(LoadedSource {
            kind: source.kind,
            path: source.path.clone(),
            entries: count,
        });
    }

    (config, warnings)
}
