//! Validation issues and their aggregate report

use std::collections::BTreeMap;

use serde::Serialize;

/// Severity of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    /// Blocks the affected sub-resource; the run continues
    Error,
    /// Surfaced to the user, nothing changed
    Warning,
    /// Auto-corrected; persisted to the local override
    Fix,
}

/// One finding against a configuration key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub key: String,
    pub message: String,
}

/// User-visible outcome category for a validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationStatus {
    UpToDate,
    AutoFixed,
    NeedsManualAction,
}

/// All findings of one validation pass.
///
/// Issues are collected across the full pass instead of failing fast.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
    /// Corrected values by key, in the order fixes should be written
    fixes: BTreeMap<String, String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.push(IssueKind::Error, key.into(), message.into());
    }

    pub fn warning(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.push(IssueKind::Warning, key.into(), message.into());
    }

    /// Record that `key` was corrected to `value`.
    pub fn fix(&mut self, key: impl Into<String>, value: impl Into<String>, message: impl Into<String>) {
        let key = key.into();
        self.fixes.insert(key.clone(), value.into());
        self.push(IssueKind::Fix, key, message.into());
    }

    fn push(&mut self, kind: IssueKind, key: String, message: String) {
        match kind {
            IssueKind::Error => tracing::warn!(key = %key, "Validation error: {message}"),
            IssueKind::Warning => tracing::warn!(key = %key, "{message}"),
            IssueKind::Fix => tracing::info!(key = %key, "Auto-fixed: {message}"),
        }
        self.issues.push(ValidationIssue { kind, key, message });
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn of_kind(&self, kind: IssueKind) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.of_kind(IssueKind::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.of_kind(IssueKind::Warning)
    }

    /// Corrected values to persist.
    pub fn fixes(&self) -> &BTreeMap<String, String> {
        &self.fixes
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn has_fixes(&self) -> bool {
        !self.fixes.is_empty()
    }

    pub fn status(&self) -> ValidationStatus {
        if self.has_errors() {
            ValidationStatus::NeedsManualAction
        } else if self.has_fixes() {
            ValidationStatus::AutoFixed
        } else {
            ValidationStatus::UpToDate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_is_up_to_date() {
        assert_eq!(ValidationReport::new().status(), ValidationStatus::UpToDate);
    }

    #[test]
    fn fixes_are_recorded_as_issues_and_values() {
        let mut report = ValidationReport::new();
        report.fix("DEBUG", "true", "normalized 'yes'");
        report.warning("CS_1", "unknown template");

        assert_eq!(report.status(), ValidationStatus::AutoFixed);
        assert_eq!(report.fixes().get("DEBUG").map(String::as_str), Some("true"));
        assert_eq!(report.issues().len(), 2);
        assert_eq!(report.warnings().count(), 1);
    }

    #[test]
    fn any_error_needs_manual_action() {
        let mut report = ValidationReport::new();
        report.fix("DEBUG", "true", "normalized");
        report.error("CS_2", "duplicate name");
        assert_eq!(report.status(), ValidationStatus::NeedsManualAction);
    }
}
