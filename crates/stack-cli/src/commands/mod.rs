//! Command implementations

mod backups;
mod build;
mod env;
mod services;
mod validate;

pub use backups::run_backups;
pub use build::run_build;
pub use env::run_env;
pub use services::run_services;
pub use validate::run_validate;

use std::path::Path;

use colored::Colorize;
use stack_core::config::EnvironmentOrigin;
use stack_core::{BuildRequest, IssueKind, ValidationReport};

use crate::cli::EnvArgs;

/// Build request for `root` from the shared environment options.
pub fn request(root: &Path, args: &EnvArgs, process_env: Option<&str>) -> BuildRequest {
    let mut request = BuildRequest::new(root);
    request.environment = args.env.clone();
    request.project_name = args.name.clone();
    request.process_environment = process_env.map(str::to_string);
    request
}

pub(crate) fn origin_label(origin: EnvironmentOrigin) -> &'static str {
    match origin {
        EnvironmentOrigin::Flag => "--env flag",
        EnvironmentOrigin::ProcessOverride => "STACK_ENV",
        EnvironmentOrigin::LocalOverride => "ENV in .env",
        EnvironmentOrigin::Default => "default",
    }
}

/// Print every validation issue, one line each.
pub(crate) fn print_issues(report: &ValidationReport) {
    for issue in report.issues() {
        let marker = match issue.kind {
            IssueKind::Error => "error".red().bold(),
            IssueKind::Warning => "warning".yellow().bold(),
            IssueKind::Fix => "fixed".green().bold(),
        };
        println!("  {} {}: {}", marker, issue.key.cyan(), issue.message);
    }
}
