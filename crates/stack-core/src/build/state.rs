//! Persisted build state
//!
//! The state file records, per artifact family, the fingerprint of the
//! inputs it was last generated from and the files it produced. It is read
//! when planning and written once execution finishes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stack_fs::{ProjectPath, TomlStore};

use super::ArtifactFamily;
use crate::Result;

const STATE_VERSION: &str = "1";

/// What was generated for one family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyRecord {
    pub fingerprint: String,
    /// Generated files, relative to the project root
    #[serde(default)]
    pub outputs: Vec<PathBuf>,
    pub updated: DateTime<Utc>,
}

impl FamilyRecord {
    /// Recorded outputs that no longer exist under `root`.
    pub fn missing_outputs(&self, root: &Path) -> Vec<PathBuf> {
        self.outputs
            .iter()
            .filter(|output| !root.join(output).exists())
            .cloned()
            .collect()
    }
}

/// Snapshot of every family's last successful generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildState {
    version: String,
    /// Keyed by [`ArtifactFamily::as_str`]
    #[serde(default)]
    families: BTreeMap<String, FamilyRecord>,
}

impl Default for BuildState {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildState {
    pub fn new() -> Self {
        Self {
            version: STATE_VERSION.to_string(),
            families: BTreeMap::new(),
        }
    }

    pub fn get(&self, family: ArtifactFamily) -> Option<&FamilyRecord> {
        self.families.get(family.as_str())
    }

    pub fn record(&mut self, family: ArtifactFamily, record: FamilyRecord) {
        self.families.insert(family.as_str().to_string(), record);
    }

    pub fn families(&self) -> impl Iterator<Item = (&str, &FamilyRecord)> {
        self.families.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

/// Reads and writes `.stack/build-state.toml` for one project.
#[derive(Debug, Clone)]
pub struct BuildStore {
    path: PathBuf,
}

impl BuildStore {
    pub fn new(root: &Path) -> Self {
        Self {
            path: ProjectPath::BuildState.under(root),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the prior state, `None` on a project that was never built.
    ///
    /// A state file that cannot be parsed is treated as absent so the next
    /// build regenerates everything instead of failing.
    pub fn load(&self) -> Option<BuildState> {
        match TomlStore::new().load_optional(&self.path) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring unreadable build state");
                None
            }
        }
    }

    pub fn save(&self, state: &BuildState) -> Result<()> {
        TomlStore::new().save(&self.path, state)?;
        tracing::debug!(path = %self.path.display(), "Saved build state");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn record(fingerprint: &str, outputs: &[&str]) -> FamilyRecord {
        FamilyRecord {
            fingerprint: fingerprint.to_string(),
            outputs: outputs.iter().map(PathBuf::from).collect(),
            updated: Utc::now(),
        }
    }

    #[test]
    fn never_built_project_has_no_state() {
        let temp = TempDir::new().unwrap();
        assert!(BuildStore::new(temp.path()).load().is_none());
    }

    #[test]
    fn save_and_reload() {
        let temp = TempDir::new().unwrap();
        let store = BuildStore::new(temp.path());

        let mut state = BuildState::new();
        state.record(ArtifactFamily::ProxyConfig, record("sha256:abc", &["nginx/nginx.conf"]));
        store.save(&state).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, state);
        assert!(temp.path().join(".stack/build-state.toml").is_file());
    }

    #[test]
    fn corrupt_state_is_treated_as_absent() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".stack")).unwrap();
        fs::write(temp.path().join(".stack/build-state.toml"), "not = [toml").unwrap();

        assert!(BuildStore::new(temp.path()).load().is_none());
    }

    #[test]
    fn missing_outputs_are_reported() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("present.txt"), "x").unwrap();

        let rec = record("sha256:1", &["present.txt", "gone.txt"]);
        assert_eq!(rec.missing_outputs(temp.path()), vec![PathBuf::from("gone.txt")]);
    }
}
