//! Configuration sources and the per-environment cascade

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stack_fs::ProjectPath;

use super::Environment;

/// A cascade layer, ordered by precedence (later variants win).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    BaseShared,
    StagingShared,
    ProdShared,
    Secrets,
    LocalOverride,
}

impl SourceKind {
    pub fn project_path(&self) -> ProjectPath {
        match self {
            Self::BaseShared => ProjectPath::BaseShared,
            Self::StagingShared => ProjectPath::StagingShared,
            Self::ProdShared => ProjectPath::ProdShared,
            Self::Secrets => ProjectPath::Secrets,
            Self::LocalOverride => ProjectPath::LocalOverride,
        }
    }

    /// Team-level sources are committed and never rewritten by the tool.
    pub fn is_shared(&self) -> bool {
        !matches!(self, Self::LocalOverride)
    }
}

/// A file-backed layer of the cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigSource {
    pub kind: SourceKind,
    pub path: PathBuf,
}

impl ConfigSource {
    pub fn new(kind: SourceKind, root: &Path) -> Self {
        Self {
            kind,
            path: kind.project_path().under(root),
        }
    }
}

/// Layers loaded for `env`, in merge order.
///
/// The base layer is always first and the local override always last.
pub fn resolve_cascade(env: Environment) -> Vec<SourceKind> {
    let mut layers = vec![SourceKind::BaseShared];
    match env {
        Environment::Dev => {}
        Environment::Staging => layers.push(SourceKind::StagingShared),
        Environment::Prod => layers.extend([
            SourceKind::StagingShared,
            SourceKind::ProdShared,
            SourceKind::Secrets,
        ]),
    }
    layers.push(SourceKind::LocalOverride);
    layers
}
