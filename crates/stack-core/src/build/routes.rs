//! Route conflict detection and reassignment

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::services::{ServiceSet, ServiceTier};

/// A routed service whose route is already taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteConflict {
    pub service: String,
    pub route: String,
    /// The service that claimed the route first
    pub conflicts_with: String,
    /// Key to persist a new route under, when the service has a slot
    pub route_key: Option<String>,
}

/// A new route chosen for a conflicting service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteFix {
    pub service: String,
    pub key: String,
    pub from: String,
    pub to: String,
}

fn is_slotted(tier: ServiceTier) -> bool {
    matches!(tier, ServiceTier::Custom | ServiceTier::Frontend)
}

/// Find routed custom services and frontend apps whose route collides with
/// an enabled built-in route or with an earlier slotted service.
pub fn find_route_conflicts(services: &ServiceSet) -> Vec<RouteConflict> {
    let mut claimed: HashMap<&str, &str> = HashMap::new();
    for service in services.routed().filter(|s| !is_slotted(s.tier)) {
        if let Some(route) = service.route.as_deref() {
            claimed.entry(route).or_insert(service.name.as_str());
        }
    }

    let mut conflicts = Vec::new();
    for service in services.routed().filter(|s| is_slotted(s.tier)) {
        let Some(route) = service.route.as_deref() else {
            continue;
        };
        match claimed.get(route) {
            Some(owner) => conflicts.push(RouteConflict {
                service: service.name.clone(),
                route: route.to_string(),
                conflicts_with: (*owner).to_string(),
                route_key: service.route_key(),
            }),
            None => {
                claimed.insert(route, service.name.as_str());
            }
        }
    }
    conflicts
}

/// Pick `<route>-<k>` (smallest free `k >= 2`) for each conflict.
///
/// Conflicts without a route key cannot be persisted and are left out.
pub fn plan_route_fixes(services: &ServiceSet, conflicts: &[RouteConflict]) -> Vec<RouteFix> {
    let mut taken: HashSet<String> = services
        .routed()
        .filter_map(|s| s.route.clone())
        .collect();

    conflicts
        .iter()
        .filter_map(|conflict| {
            let key = conflict.route_key.clone()?;
            let to = (2..)
                .map(|k| format!("{}-{k}", conflict.route))
                .find(|candidate| !taken.contains(candidate))?;
            taken.insert(to.clone());
            Some(RouteFix {
                service: conflict.service.clone(),
                key,
                from: conflict.route.clone(),
                to,
            })
        })
        .collect()
}
