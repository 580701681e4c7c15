//! Timestamped snapshots of the local-override source
//!
//! Every writer of `.env` snapshots it here first. Each snapshot is a
//! directory `.stack/backups/<timestamp>/` holding the copied files and a
//! `metadata.toml`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stack_fs::ProjectPath;

use crate::{Error, Result};

/// Metadata stored next to the snapshot files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupMetadata {
    /// When the snapshot was taken
    pub created: DateTime<Utc>,
    /// Why the snapshot was taken (e.g. "validation fixes")
    pub reason: String,
    /// Snapshotted files, relative to the project root
    pub files: Vec<String>,
    /// `sha256:` checksum of each snapshotted file
    #[serde(default)]
    pub checksums: BTreeMap<String, String>,
}

/// A snapshot on disk
#[derive(Debug, Clone)]
pub struct SourceBackup {
    /// Directory name, the snapshot timestamp
    pub id: String,
    pub path: PathBuf,
    pub metadata: BackupMetadata,
}

/// Creates, lists and restores source snapshots
pub struct BackupManager {
    root: PathBuf,
    backups_dir: PathBuf,
}

impl BackupManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let backups_dir = ProjectPath::BackupsDir.under(&root);
        Self { root, backups_dir }
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    fn metadata_path(dir: &Path) -> PathBuf {
        dir.join("metadata.toml")
    }

    /// Pick a fresh directory name for a snapshot taken at `now`.
    fn allocate_dir(&self, now: DateTime<Utc>) -> (String, PathBuf) {
        let base = now.format("%Y%m%dT%H%M%S%.3fZ").to_string();
        let mut id = base.clone();
        let mut counter = 1;
        while self.backups_dir.join(&id).exists() {
            id = format!("{base}-{counter}");
            counter += 1;
        }
        let path = self.backups_dir.join(&id);
        (id, path)
    }

    /// Snapshot `files` (relative to the project root).
    ///
    /// Files that do not exist are left out. Returns `None` when there was
    /// nothing to snapshot.
    pub fn snapshot(&self, files: &[&Path], reason: &str) -> Result<Option<SourceBackup>> {
        let existing: Vec<&Path> = files
            .iter()
            .copied()
            .filter(|f| self.root.join(f).is_file())
            .collect();
        if existing.is_empty() {
            return Ok(None);
        }

        let now = Utc::now();
        let (id, dir) = self.allocate_dir(now);
        fs::create_dir_all(&dir)?;

        let mut copied = Vec::new();
        let mut checksums = BTreeMap::new();
        for file in existing {
            let dest = dir.join(file);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(self.root.join(file), &dest)?;
            let name = file.to_string_lossy().to_string();
            checksums.insert(name.clone(), stack_fs::compute_file_checksum(&dest)?);
            copied.push(name);
        }

        let metadata = BackupMetadata {
            created: now,
            reason: reason.to_string(),
            files: copied,
            checksums,
        };
        fs::write(Self::metadata_path(&dir), toml::to_string_pretty(&metadata)?)?;

        tracing::info!(backup = %id, reason, "Backed up configuration sources");
        Ok(Some(SourceBackup {
            id,
            path: dir,
            metadata,
        }))
    }

    /// Read one snapshot by id.
    pub fn get(&self, id: &str) -> Result<Option<SourceBackup>> {
        if id.contains('/') || id.contains('\\') || id.contains("..") {
            return Err(Error::Backup {
                path: self.backups_dir.join(id),
                message: "invalid backup id".to_string(),
            });
        }
        let dir = self.backups_dir.join(id);
        let metadata_path = Self::metadata_path(&dir);
        if !metadata_path.is_file() {
            return Ok(None);
        }
        let metadata: BackupMetadata = toml::from_str(&fs::read_to_string(&metadata_path)?)?;
        Ok(Some(SourceBackup {
            id: id.to_string(),
            path: dir,
            metadata,
        }))
    }

    /// All snapshots, oldest first.
    pub fn list(&self) -> Result<Vec<SourceBackup>> {
        if !self.backups_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let entry = entry?;
            if entry.path().is_dir()
                && let Some(id) = entry.file_name().to_str()
                && let Ok(Some(backup)) = self.get(id)
            {
                backups.push(backup);
            }
        }
        backups.sort_by(|a, b| a.metadata.created.cmp(&b.metadata.created).then(a.id.cmp(&b.id)));
        Ok(backups)
    }

    /// Copy a snapshot's files back over the project sources.
    pub fn restore(&self, id: &str) -> Result<Vec<PathBuf>> {
        let backup = self
            .get(id)?
            .ok_or_else(|| Error::NotFound(format!("backup {id}")))?;

        let mut restored = Vec::new();
        for file in &backup.metadata.files {
            let relative = Path::new(file);
            if relative.is_absolute() || file.contains("..") {
                return Err(Error::Backup {
                    path: backup.path.clone(),
                    message: format!("refusing to restore file outside project: {file}"),
                });
            }
            let source = backup.path.join(relative);
            if source.is_file() {
                if let Some(expected) = backup.metadata.checksums.get(file)
                    && stack_fs::compute_file_checksum(&source)? != *expected
                {
                    return Err(Error::Backup {
                        path: source,
                        message: "snapshot copy does not match its recorded checksum".to_string(),
                    });
                }
                let dest = self.root.join(relative);
                stack_fs::write_atomic(&dest, &fs::read(&source)?)?;
                restored.push(relative.to_path_buf());
            }
        }
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, BackupManager) {
        let temp = TempDir::new().unwrap();
        let manager = BackupManager::new(temp.path());
        (temp, manager)
    }

    #[test]
    fn snapshot_of_missing_file_is_none() {
        let (_temp, manager) = setup();
        let backup = manager.snapshot(&[Path::new(".env")], "test").unwrap();
        assert!(backup.is_none());
        assert!(manager.list().unwrap().is_empty());
    }

    #[test]
    fn snapshot_copies_file_and_writes_metadata() {
        let (temp, manager) = setup();
        fs::write(temp.path().join(".env"), "PROJECT_NAME=Shop\n").unwrap();

        let backup = manager
            .snapshot(&[Path::new(".env")], "validation fixes")
            .unwrap()
            .unwrap();

        assert_eq!(
            fs::read_to_string(backup.path.join(".env")).unwrap(),
            "PROJECT_NAME=Shop\n"
        );
        assert_eq!(backup.metadata.files, vec![".env".to_string()]);
        assert!(backup.path.join("metadata.toml").is_file());
        assert!(backup.path.starts_with(temp.path().join(".stack/backups")));
    }

    #[test]
    fn consecutive_snapshots_get_distinct_ids() {
        let (temp, manager) = setup();
        fs::write(temp.path().join(".env"), "A=1\n").unwrap();

        let first = manager.snapshot(&[Path::new(".env")], "one").unwrap().unwrap();
        let second = manager.snapshot(&[Path::new(".env")], "two").unwrap().unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(manager.list().unwrap().len(), 2);
    }

    #[test]
    fn restore_puts_snapshot_back() {
        let (temp, manager) = setup();
        fs::write(temp.path().join(".env"), "A=original\n").unwrap();
        let backup = manager.snapshot(&[Path::new(".env")], "test").unwrap().unwrap();

        fs::write(temp.path().join(".env"), "A=changed\n").unwrap();
        let restored = manager.restore(&backup.id).unwrap();

        assert_eq!(restored, vec![PathBuf::from(".env")]);
        assert_eq!(fs::read_to_string(temp.path().join(".env")).unwrap(), "A=original\n");
    }

    #[test]
    fn restore_rejects_tampered_snapshot() {
        let (temp, manager) = setup();
        fs::write(temp.path().join(".env"), "A=original\n").unwrap();
        let backup = manager.snapshot(&[Path::new(".env")], "test").unwrap().unwrap();
        assert!(backup.metadata.checksums[".env"].starts_with("sha256:"));

        fs::write(backup.path.join(".env"), "A=tampered\n").unwrap();
        fs::write(temp.path().join(".env"), "A=current\n").unwrap();

        assert!(matches!(manager.restore(&backup.id), Err(Error::Backup { .. })));
        assert_eq!(fs::read_to_string(temp.path().join(".env")).unwrap(), "A=current\n");
    }

    #[test]
    fn restore_unknown_id_fails() {
        let (_temp, manager) = setup();
        assert!(manager.restore("20260101T000000.000Z").is_err());
        assert!(manager.get("../escape").is_err());
    }
}
