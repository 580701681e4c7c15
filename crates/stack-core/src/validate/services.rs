//! Custom service and frontend app slot checks

use std::collections::HashMap;

use super::ValidationReport;
use crate::config::EffectiveConfig;
use crate::services::catalog::{is_known_template, reserved_ports};
use crate::services::slots::{
    APP_SLOTS, FRONTEND_APPS_KEY, app_list_overflow, scan_custom_services, scan_frontend_apps,
};

/// Report problems with custom-service and frontend-app slots.
///
/// Nothing here is auto-fixed: a duplicate name produces a single error on
/// the later slot and the name is left as written.
pub fn validate_service_descriptors(cfg: &EffectiveConfig, report: &mut ValidationReport) {
    let reserved = reserved_ports(cfg);
    let mut claimed: HashMap<u16, String> = HashMap::new();

    for scanned in scan_custom_services(cfg) {
        let key = scanned.decl.key();
        for problem in &scanned.problems {
            report.error(key.clone(), format!("custom service slot {}: {problem}", scanned.decl.index));
        }
        if !scanned.is_accepted() {
            continue;
        }

        let name = &scanned.decl.name;
        if !is_known_template(&scanned.decl.template) {
            report.warning(
                key.clone(),
                format!("service '{name}' uses unknown template '{}'", scanned.decl.template),
            );
        }

        if let Some(port) = scanned.port {
            if reserved.contains(&port) {
                report.warning(
                    key.clone(),
                    format!("service '{name}' port {port} collides with a reserved core port"),
                );
            } else if let Some(owner) = claimed.get(&port) {
                report.warning(
                    key.clone(),
                    format!("service '{name}' port {port} is already used by '{owner}'"),
                );
            } else {
                claimed.insert(port, name.clone());
            }
        }
    }

    for scanned in scan_frontend_apps(cfg) {
        let key = scanned.decl.key();
        for problem in &scanned.problems {
            report.error(key.clone(), format!("frontend app slot {}: {problem}", scanned.decl.index));
        }
    }

    for item in app_list_overflow(cfg) {
        report.error(
            FRONTEND_APPS_KEY,
            format!(
                "frontend app '{item}' does not fit in the {} available app slots",
                APP_SLOTS.end()
            ),
        );
    }
}
