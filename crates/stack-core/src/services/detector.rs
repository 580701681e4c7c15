//! Expands sparse configuration into a concrete service set

use super::catalog::{
    self, CORE_SERVICES, MONITORING_KEY, MONITORING_SERVICES, OPTIONAL_SERVICES, REDIS_EXPORTER,
    ServiceSpec,
};
use super::slots::{scan_custom_services, scan_frontend_apps};
use super::{ServiceDescriptor, ServiceSet, ServiceTier};
use crate::config::EffectiveConfig;

/// Builds the [`ServiceSet`] for a configuration.
///
/// Detection is a pure function of the configuration; the orchestrator runs
/// it on every build, including no-op ones.
#[derive(Debug, Default, Clone, Copy)]
pub struct ServiceDetector;

impl ServiceDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn detect(&self, cfg: &EffectiveConfig) -> ServiceSet {
        let mut services = Vec::new();

        for spec in CORE_SERVICES {
            services.push(builtin(
                spec,
                ServiceTier::Core,
                cfg.is_enabled(&spec.enabled_key(), true),
                cfg,
            ));
        }
        for spec in OPTIONAL_SERVICES {
            services.push(builtin(
                spec,
                ServiceTier::Optional,
                cfg.is_enabled(&spec.enabled_key(), false),
                cfg,
            ));
        }

        if cfg.is_enabled(MONITORING_KEY, false) {
            for spec in MONITORING_SERVICES {
                services.push(builtin(spec, ServiceTier::Monitoring, true, cfg));
            }
            let cache_enabled = services
                .iter()
                .any(|s| s.name == catalog::REDIS && s.enabled);
            if cache_enabled {
                services.push(builtin(&REDIS_EXPORTER, ServiceTier::Monitoring, true, cfg));
            }
        }

        for scanned in scan_custom_services(cfg).into_iter().filter(|s| s.is_accepted()) {
            let decl = scanned.decl;
            services.push(ServiceDescriptor {
                route: Some(decl.route.clone().unwrap_or_else(|| decl.name.clone())),
                name: decl.name,
                kind: decl.template,
                tier: ServiceTier::Custom,
                image: None,
                port: scanned.port,
                enabled: true,
                dependencies: Vec::new(),
                slot: Some(decl.index),
            });
        }

        for scanned in scan_frontend_apps(cfg).into_iter().filter(|s| s.is_accepted()) {
            let decl = scanned.decl;
            services.push(ServiceDescriptor {
                route: Some(decl.route.clone().unwrap_or_else(|| decl.name.clone())),
                name: decl.name,
                kind: decl.framework.unwrap_or_else(|| "static".to_string()),
                tier: ServiceTier::Frontend,
                image: None,
                port: scanned.port,
                enabled: true,
                dependencies: Vec::new(),
                slot: Some(decl.index),
            });
        }

        let mut set = ServiceSet::new(services);
        enforce_dependencies(&mut set);
        tracing::debug!(total = set.len(), enabled = set.enabled().count(), "Detected services");
        set
    }
}

fn builtin(spec: &ServiceSpec, tier: ServiceTier, enabled: bool, cfg: &EffectiveConfig) -> ServiceDescriptor {
    ServiceDescriptor {
        name: spec.name.to_string(),
        kind: spec.name.to_string(),
        tier,
        image: Some(spec.image.to_string()),
        port: Some(spec.port(cfg)),
        enabled,
        dependencies: spec.depends_on.iter().map(|d| d.to_string()).collect(),
        route: spec.route.map(str::to_string),
        slot: None,
    }
}

/// Enable every dependency of an enabled service, transitively.
fn enforce_dependencies(set: &mut ServiceSet) {
    loop {
        let missing: Vec<(String, String)> = set
            .enabled()
            .flat_map(|s| s.dependencies.iter().map(move |d| (s.name.clone(), d.clone())))
            .filter(|(_, dep)| set.get(dep).is_some_and(|d| !d.enabled))
            .collect();

        if missing.is_empty() {
            return;
        }
        for (dependent, dep) in missing {
            if let Some(service) = set.get_mut(&dep) {
                tracing::info!(service = %dep, required_by = %dependent, "Enabling required dependency");
                service.enabled = true;
            }
        }
    }
}
