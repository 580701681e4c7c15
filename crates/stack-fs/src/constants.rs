//! Well-known paths inside a project directory.

use std::path::{Path, PathBuf};

/// Files and directories the build reads or owns, relative to the project root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectPath {
    /// `.env.dev`: team-shared defaults, the base layer of every environment
    BaseShared,
    /// `.env.staging`: shared staging layer
    StagingShared,
    /// `.env.prod`: shared production layer
    ProdShared,
    /// `.env.secrets`: production secrets layer
    Secrets,
    /// `.env`: developer-local overrides, the only source the tool writes
    LocalOverride,
    /// `.env.runtime`: the resolved configuration handed to the runtime
    RuntimeArtifact,
    /// `.stack`: tool state directory
    StateDir,
    /// `.stack/build-state.toml`
    BuildState,
    /// `.stack/build.lock`
    BuildLock,
    /// `.stack/backups`
    BackupsDir,
    /// `docker-compose.yml`
    ContainerDescriptor,
}

impl ProjectPath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BaseShared => ".env.dev",
            Self::StagingShared => ".env.staging",
            Self::ProdShared => ".env.prod",
            Self::Secrets => ".env.secrets",
            Self::LocalOverride => ".env",
            Self::RuntimeArtifact => ".env.runtime",
            Self::StateDir => ".stack",
            Self::BuildState => ".stack/build-state.toml",
            Self::BuildLock => ".stack/build.lock",
            Self::BackupsDir => ".stack/backups",
            Self::ContainerDescriptor => "docker-compose.yml",
        }
    }

    /// Resolve this path against a project root.
    pub fn under(&self, root: &Path) -> PathBuf {
        root.join(self.as_str())
    }
}

impl AsRef<Path> for ProjectPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl std::fmt::Display for ProjectPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn under_joins_relative_path() {
        let root = Path::new("/srv/app");
        assert_eq!(
            ProjectPath::BuildState.under(root),
            PathBuf::from("/srv/app/.stack/build-state.toml")
        );
        assert_eq!(ProjectPath::LocalOverride.to_string(), ".env");
    }
}
