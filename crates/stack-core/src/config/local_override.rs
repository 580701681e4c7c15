//! Writes to the local-override source
//!
//! The validator and the route auto-fixer both change `.env`. They share this
//! one path: snapshot the file, edit only the targeted keys, write atomically.

use std::path::{Path, PathBuf};

use stack_fs::ProjectPath;

use super::EnvDocument;
use crate::Result;
use crate::backup::{BackupManager, SourceBackup};

/// Outcome of [`update_local_override`].
#[derive(Debug, Clone)]
pub struct OverrideUpdate {
    pub path: PathBuf,
    /// Snapshot taken before writing, if the file existed
    pub backup: Option<SourceBackup>,
    /// Keys whose value actually changed
    pub changed: Vec<String>,
}

/// Set `updates` in the project's local-override source.
///
/// Lines other than the updated assignments are kept verbatim. Nothing is
/// written (and no backup taken) when every key already has its value.
pub fn update_local_override(root: &Path, updates: &[(String, String)], reason: &str) -> Result<OverrideUpdate> {
    let path = ProjectPath::LocalOverride.under(root);
    let original = if path.is_file() {
        stack_fs::read_text(&path)?
    } else {
        String::new()
    };

    let mut doc = EnvDocument::parse(&original);
    let changed: Vec<String> = updates
        .iter()
        .filter(|(key, value)| doc.set(key, value))
        .map(|(key, _)| key.clone())
        .collect();

    if changed.is_empty() {
        return Ok(OverrideUpdate {
            path,
            backup: None,
            changed,
        });
    }

    let backup = BackupManager::new(root).snapshot(&[ProjectPath::LocalOverride.as_ref()], reason)?;
    stack_fs::write_atomic(&path, doc.render().as_bytes())?;
    tracing::info!(path = %path.display(), keys = ?changed, reason, "Updated local override");

    Ok(OverrideUpdate {
        path,
        backup,
        changed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn creates_file_when_missing_without_backup() {
        let temp = TempDir::new().unwrap();
        let update = update_local_override(temp.path(), &pairs(&[("A", "1")]), "test").unwrap();

        assert!(update.backup.is_none());
        assert_eq!(update.changed, vec!["A".to_string()]);
        assert_eq!(fs::read_to_string(temp.path().join(".env")).unwrap(), "A=1\n");
    }

    #[test]
    fn backs_up_and_preserves_comments() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".env"), "# mine\nA=old\n\nB=keep\n").unwrap();

        let update = update_local_override(temp.path(), &pairs(&[("A", "new")]), "test").unwrap();

        let backup = update.backup.unwrap();
        assert_eq!(
            fs::read_to_string(backup.path.join(".env")).unwrap(),
            "# mine\nA=old\n\nB=keep\n"
        );
        assert_eq!(
            fs::read_to_string(temp.path().join(".env")).unwrap(),
            "# mine\nA=new\n\nB=keep\n"
        );
    }

    #[test]
    fn unchanged_values_write_nothing() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".env"), "A=1\n").unwrap();

        let update = update_local_override(temp.path(), &pairs(&[("A", "1")]), "test").unwrap();
        assert!(update.changed.is_empty());
        assert!(update.backup.is_none());
        assert!(!temp.path().join(".stack/backups").exists());
    }

    #[test]
    fn shared_sources_are_untouched() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".env.dev"), "A=team\n").unwrap();

        update_local_override(temp.path(), &pairs(&[("A", "mine")]), "test").unwrap();
        assert_eq!(fs::read_to_string(temp.path().join(".env.dev")).unwrap(), "A=team\n");
    }
}
