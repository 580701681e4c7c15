//! Source backup and restore
//!
//! Before the tool rewrites the local-override source it copies the current
//! file to `.stack/backups/<timestamp>/` with a `metadata.toml` describing
//! why the snapshot was taken.

mod source_backup;

pub use source_backup::{BackupManager, BackupMetadata, SourceBackup};
