//! Validate command implementation

use colored::Colorize;
use serde_json::json;
use stack_core::{BuildOrchestrator, BuildRequest, GeneratorRegistry, ValidationStatus};

use super::print_issues;
use crate::error::Result;

/// Run the validate command, returning the process exit code.
///
/// Fixes are persisted like a build would; errors exit non-zero.
pub fn run_validate(request: &BuildRequest, json: bool) -> Result<i32> {
    let prepared = BuildOrchestrator::new(GeneratorRegistry::new()).prepare(request)?;
    let report = &prepared.report;
    let code = if report.has_errors() { 1 } else { 0 };

    if json {
        let value = json!({
            "environment": prepared.detected.environment,
            "status": report.status(),
            "issues": report.issues(),
            "fixes": report.fixes(),
            "backup": prepared
                .persisted
                .as_ref()
                .and_then(|update| update.backup.as_ref())
                .map(|backup| backup.path.display().to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(code);
    }

    let headline = match report.status() {
        ValidationStatus::UpToDate => "Configuration is valid".green().bold(),
        ValidationStatus::AutoFixed => "Configuration was repaired".yellow().bold(),
        ValidationStatus::NeedsManualAction => "Configuration needs attention".red().bold(),
    };
    println!("{} ({})", headline, prepared.detected.environment);

    if !report.issues().is_empty() {
        println!();
        print_issues(report);
    }

    if let Some(update) = &prepared.persisted {
        println!();
        println!("{} {}", "Wrote fixes to".dimmed(), update.path.display());
        if let Some(backup) = &update.backup {
            println!("{} {}", "Previous file saved in".dimmed(), backup.path.display());
        }
    }

    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stack_test_utils::TestProject;

    #[test]
    fn test_duplicate_service_exits_non_zero() {
        let project = TestProject::new().with_base(&[("CS_1", "api-svc:fastapi"), ("CS_2", "api-svc:flask")]);
        let request = BuildRequest::new(project.root());
        assert_eq!(run_validate(&request, false).unwrap(), 1);
    }

    #[test]
    fn test_fixes_are_persisted() {
        let project = TestProject::new().with_base(&[("PROJECT_NAME", "My Shop")]);
        let request = BuildRequest::new(project.root());

        assert_eq!(run_validate(&request, true).unwrap(), 0);
        project.assert_file_contains(".env", "PROJECT_NAME=my-shop");
    }

    #[test]
    fn test_locked_project_is_not_rewritten() {
        let project = TestProject::new().with_base(&[("PROJECT_NAME", "My Shop")]);
        let _held = stack_fs::ProjectLock::acquire(project.root()).unwrap();

        let err = run_validate(&BuildRequest::new(project.root()), false).unwrap_err();
        assert!(err.to_string().contains("already running"));
        project.assert_file_not_exists(".env");
    }
}
