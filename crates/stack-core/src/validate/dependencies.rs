//! Hard dependency enforcement between core services

use super::ValidationReport;
use crate::config::EffectiveConfig;
use crate::services::catalog::{CORE_SERVICES, POSTGRES};

/// Re-enable the datastore when a core service that needs it is enabled.
pub fn validate_dependencies(cfg: &mut EffectiveConfig, report: &mut ValidationReport) {
    for spec in CORE_SERVICES.iter().filter(|s| s.depends_on.contains(&POSTGRES)) {
        let datastore_key = "POSTGRES_ENABLED";
        if !cfg.is_enabled(&spec.enabled_key(), true) || !cfg.is_explicitly_false(datastore_key) {
            continue;
        }
        report.fix(
            datastore_key,
            "true",
            format!("{} requires {POSTGRES}; enabling it", spec.name),
        );
        cfg.set(datastore_key, "true");
    }
}
