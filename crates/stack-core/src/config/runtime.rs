//! Runtime artifact emission
//!
//! The runtime artifact is the merged configuration written as a single
//! `KEY=value` file. The container runtime reads it as its environment file,
//! so nothing downstream has to know the cascade order.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};

use super::EffectiveConfig;
use super::envfile::format_entry;
use crate::Result;

/// Render the artifact text: provenance header followed by sorted entries.
pub fn render_runtime_artifact(cfg: &EffectiveConfig, root: &Path, generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();
    out.push_str("# Resolved runtime configuration. Generated by `stack build`; do not edit.\n");
    out.push_str(&format!("# Environment: {}\n", cfg.environment()));
    if cfg.sources().is_empty() {
        out.push_str("# Sources: none (defaults only)\n");
    } else {
        out.push_str("# Sources (merge order):\n");
        for (idx, source) in cfg.sources().iter().enumerate() {
            let shown = source.path.strip_prefix(root).unwrap_or(&source.path);
            out.push_str(&format!("#   {}. {}\n", idx + 1, shown.display()));
        }
    }
    out.push_str(&format!(
        "# Generated at: {}\n\n",
        generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    ));

    for (key, value) in cfg.iter() {
        out.push_str(&format_entry(key, value));
        out.push('\n');
    }
    out
}

/// Write the runtime artifact to `path`, replacing any previous one.
pub fn emit_runtime_artifact(cfg: &EffectiveConfig, root: &Path, path: &Path) -> Result<PathBuf> {
    let content = render_runtime_artifact(cfg, root, Utc::now());
    stack_fs::write_atomic(path, content.as_bytes())?;
    tracing::debug!(path = %path.display(), keys = cfg.len(), "Emitted runtime artifact");
    Ok(path.to_path_buf())
}
