//! Backups command implementation

use std::path::Path;

use colored::Colorize;
use serde_json::json;
use stack_core::BackupManager;
use stack_fs::ProjectLock;

use crate::error::{CliError, Result};

/// Run the backups command
///
/// Lists local-override snapshots, or restores one when `restore` names it.
pub fn run_backups(root: &Path, restore: Option<&str>, json: bool) -> Result<()> {
    let manager = BackupManager::new(root);

    if let Some(id) = restore {
        let _lock = ProjectLock::acquire(root)?;
        if manager.get(id)?.is_none() {
            return Err(CliError::user(format!("No backup named '{id}'")));
        }
        let restored = manager.restore(id)?;
        tracing::info!(backup = id, files = restored.len(), "Restored backup");

        if json {
            let files: Vec<String> = restored.iter().map(|p| p.display().to_string()).collect();
            println!("{}", serde_json::to_string_pretty(&json!({ "restored": id, "files": files }))?);
        } else {
            println!("{} backup {}", "Restored".green().bold(), id.cyan());
            for file in restored {
                println!("  {}", file.display());
            }
        }
        return Ok(());
    }

    let backups = manager.list()?;
    if json {
        let entries: Vec<_> = backups
            .iter()
            .map(|b| json!({ "id": b.id, "metadata": b.metadata }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if backups.is_empty() {
        println!("No backups in {}", manager.backups_dir().display());
        return Ok(());
    }
    println!("{}", "Backups".bold());
    for backup in backups {
        println!(
            "  {} {} ({})",
            backup.id.cyan(),
            backup.metadata.reason,
            backup.metadata.files.join(", ").dimmed()
        );
    }
    Ok(())
}
