//! Build command implementation

use colored::Colorize;
use stack_core::{BuildOrchestrator, BuildOutcome, BuildRequest, FamilyStatus};
use stack_generators::default_registry;

use super::print_issues;
use crate::error::Result;

/// Run the build command, returning the process exit code.
pub async fn run_build(request: &BuildRequest, json: bool) -> Result<i32> {
    let orchestrator = BuildOrchestrator::new(default_registry());
    let outcome = orchestrator.run(request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.summary)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(outcome.exit_code())
}

fn print_outcome(outcome: &BuildOutcome) {
    let summary = &outcome.summary;
    println!(
        "{} {} ({}, {})",
        "Building".green().bold(),
        summary.project.cyan(),
        summary.environment,
        summary.run_kind
    );

    if !outcome.validation.issues().is_empty() {
        println!();
        println!("{}:", "Validation".bold());
        print_issues(&outcome.validation);
    }

    println!();
    println!("{}:", "Services".bold());
    for (tier, count) in &summary.service_counts {
        println!("  {:<12} {}", tier.to_string().dimmed(), count);
    }

    for fix in &summary.route_fixes {
        println!(
            "  {} route of {} moved from {} to {}",
            "fixed".green().bold(),
            fix.service.cyan(),
            fix.from,
            fix.to.cyan()
        );
    }
    for conflict in &summary.unresolved_conflicts {
        println!(
            "  {} route '{}' of {} is already used by {}",
            "error".red().bold(),
            conflict.route,
            conflict.service.cyan(),
            conflict.conflicts_with.cyan()
        );
    }

    println!();
    println!("{}:", "Artifacts".bold());
    for report in &summary.families {
        let status = match &report.status {
            FamilyStatus::UpToDate => "up to date".dimmed(),
            FamilyStatus::Generated { reason } => format!(
                "generated ({reason}; {} created, {} updated)",
                report.created, report.updated
            )
            .green(),
            FamilyStatus::Skipped { reason } => format!("skipped ({reason})").yellow(),
            FamilyStatus::Failed { reason } => format!("failed ({reason})").red(),
            FamilyStatus::NotRun => "not run".red(),
        };
        println!("  {:<22} {}", report.family.to_string(), status);
        for note in &report.notes {
            println!("  {:<22} {}", "", note.dimmed());
        }
    }

    println!();
    if summary.succeeded() {
        println!(
            "{} {} created, {} updated",
            "Done:".green().bold(),
            summary.created_total(),
            summary.updated_total()
        );
    } else {
        println!("{}", "Build failed".red().bold());
    }
}
