//! Configuration validation and auto-repair
//!
//! Validation never fails: every check records [`ValidationIssue`]s on a
//! [`ValidationReport`] and the pass returns a corrected copy of the
//! configuration. Fixes can then be written back to the local override with
//! [`persist_fixes`].

mod booleans;
mod dependencies;
pub mod identity;
mod report;
mod services;

use std::path::Path;

pub use booleans::{BOOLEAN_KEYS, FlagValue, interpret_flag, known_boolean_keys, validate_booleans};
pub use dependencies::validate_dependencies;
pub use identity::{is_valid_identity, repair_identity, validate_domain, validate_identity};
pub use report::{IssueKind, ValidationIssue, ValidationReport, ValidationStatus};
pub use services::validate_service_descriptors;

use crate::Result;
use crate::config::{EffectiveConfig, OverrideUpdate, update_local_override};

/// A configuration after validation, with its findings.
#[derive(Debug, Clone)]
pub struct Validated {
    pub config: EffectiveConfig,
    pub report: ValidationReport,
}

/// Runs every check in a fixed order.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, cfg: &EffectiveConfig) -> Validated {
        let mut config = cfg.clone();
        let mut report = ValidationReport::new();

        validate_identity(&mut config, &mut report);
        validate_domain(&mut config, &mut report);
        validate_booleans(&mut config, &mut report);
        validate_service_descriptors(&config, &mut report);
        validate_dependencies(&mut config, &mut report);

        tracing::debug!(
            issues = report.issues().len(),
            status = ?report.status(),
            "Validation complete"
        );
        Validated { config, report }
    }
}

/// Write the report's fixes to the local-override source.
///
/// Returns `None` when the report has no fixes; nothing is backed up or
/// written in that case.
pub fn persist_fixes(root: &Path, report: &ValidationReport) -> Result<Option<OverrideUpdate>> {
    if !report.has_fixes() {
        return Ok(None);
    }
    let updates: Vec<(String, String)> = report
        .fixes()
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    update_local_override(root, &updates, "validation fixes").map(Some)
}
