//! Services command implementation

use colored::Colorize;
use stack_core::{BuildRequest, ConfigValidator, ServiceDetector, ServiceTier};

use crate::error::Result;

/// Run the services command
///
/// Read-only: validation fixes are applied in memory but not persisted.
pub fn run_services(request: &BuildRequest, json: bool) -> Result<()> {
    let resolution = request.resolver().resolve(&request.hints());
    let validated = ConfigValidator::new().validate(&resolution.config);
    let services = ServiceDetector::new().detect(&validated.config);

    if json {
        println!("{}", serde_json::to_string_pretty(&services)?);
        return Ok(());
    }

    println!(
        "{} ({})",
        "Services".bold(),
        resolution.detected.environment
    );
    for tier in ServiceTier::ALL {
        let members: Vec<_> = services.by_tier(tier).collect();
        if members.is_empty() {
            continue;
        }
        println!();
        println!("{}:", tier.to_string().bold());
        for service in members {
            let marker = if service.enabled {
                "+".green()
            } else {
                "-".dimmed()
            };
            let port = service
                .port
                .map(|p| format!(":{p}"))
                .unwrap_or_default();
            let route = service
                .route
                .as_deref()
                .map(|r| format!(" -> {r}"))
                .unwrap_or_default();
            println!(
                "  {} {}{} {}{}",
                marker,
                service.name.cyan(),
                port,
                service.kind.dimmed(),
                route
            );
        }
    }
    Ok(())
}
