//! Env command implementation

use colored::Colorize;
use serde_json::json;
use stack_core::BuildRequest;

use super::origin_label;
use crate::error::Result;

/// Run the env command
pub fn run_env(request: &BuildRequest, json: bool) -> Result<()> {
    let resolver = request.resolver();
    let resolution = resolver.resolve(&request.hints());
    let config = &resolution.config;

    if json {
        let value = json!({
            "environment": resolution.detected.environment,
            "origin": resolution.detected.origin,
            "project": config.get("PROJECT_NAME"),
            "sources": config.sources(),
            "warnings": resolution.warnings,
            "keys": config.len(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", "Environment".bold());
    println!();
    println!(
        "{}:  {} (from {})",
        "Target".dimmed(),
        resolution.detected.environment.to_string().cyan(),
        origin_label(resolution.detected.origin)
    );
    println!(
        "{}: {}",
        "Project".dimmed(),
        config.get("PROJECT_NAME").unwrap_or_default().cyan()
    );
    println!("{}:    {}", "Keys".dimmed(), config.len());
    println!();

    println!("{}:", "Cascade (lowest precedence first)".bold());
    let loaded = config.sources();
    for source in resolver.sources(resolution.detected.environment) {
        let name = source.kind.project_path().as_str();
        match loaded.iter().find(|l| l.kind == source.kind) {
            Some(l) => println!("  {} {} ({} entries)", "+".green(), name.cyan(), l.entries),
            None => println!("  {} {} {}", "-".dimmed(), name, "(not present)".dimmed()),
        }
    }

    for warning in &resolution.warnings {
        println!(
            "  {} {}: {}",
            "warning".yellow().bold(),
            warning.path.display(),
            warning.message
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stack_test_utils::TestProject;

    #[test]
    fn test_env_without_sources() {
        let project = TestProject::new();
        let request = BuildRequest::new(project.root());
        assert!(run_env(&request, false).is_ok());
        assert!(run_env(&request, true).is_ok());
    }
}
