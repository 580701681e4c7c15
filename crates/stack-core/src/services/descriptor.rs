//! Service descriptors

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::slots;

/// Where a service comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceTier {
    Core,
    Optional,
    Monitoring,
    Custom,
    Frontend,
}

impl ServiceTier {
    pub const ALL: [ServiceTier; 5] = [
        ServiceTier::Core,
        ServiceTier::Optional,
        ServiceTier::Monitoring,
        ServiceTier::Custom,
        ServiceTier::Frontend,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceTier::Core => "core",
            ServiceTier::Optional => "optional",
            ServiceTier::Monitoring => "monitoring",
            ServiceTier::Custom => "custom",
            ServiceTier::Frontend => "frontend",
        }
    }
}

impl fmt::Display for ServiceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One concrete service of the stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDescriptor {
    pub name: String,
    /// Catalog name for built-ins, template for custom services,
    /// framework for frontend apps
    pub kind: String,
    pub tier: ServiceTier,
    /// Container image, built-ins only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub port: Option<u16>,
    pub enabled: bool,
    pub dependencies: Vec<String>,
    pub route: Option<String>,
    /// Slot index for custom services and frontend apps
    pub slot: Option<u8>,
}

impl ServiceDescriptor {
    /// Key that persists a route change for this service, if it has a slot.
    pub fn route_key(&self) -> Option<String> {
        let slot = self.slot?;
        match self.tier {
            ServiceTier::Custom => Some(slots::custom_route_key(slot)),
            ServiceTier::Frontend => Some(slots::app_route_key(slot)),
            _ => None,
        }
    }
}

/// The detected services, in deterministic order: core, optional,
/// monitoring, custom by slot, frontend by slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ServiceSet {
    services: Vec<ServiceDescriptor>,
}

impl ServiceSet {
    pub fn new(services: Vec<ServiceDescriptor>) -> Self {
        Self { services }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.services.iter()
    }

    pub fn enabled(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.services.iter().filter(|s| s.enabled)
    }

    pub fn get(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.get(name).is_some_and(|s| s.enabled)
    }

    pub fn by_tier(&self, tier: ServiceTier) -> impl Iterator<Item = &ServiceDescriptor> {
        self.services.iter().filter(move |s| s.tier == tier)
    }

    /// Enabled services with a route, in set order.
    pub fn routed(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.enabled().filter(|s| s.route.is_some())
    }

    /// Number of enabled services per tier. Every tier is present.
    pub fn count_by_tier(&self) -> BTreeMap<ServiceTier, usize> {
        let mut counts: BTreeMap<ServiceTier, usize> =
            ServiceTier::ALL.iter().map(|tier| (*tier, 0)).collect();
        for service in self.enabled() {
            *counts.entry(service.tier).or_default() += 1;
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut ServiceDescriptor> {
        self.services.iter_mut().find(|s| s.name == name)
    }
}

impl<'a> IntoIterator for &'a ServiceSet {
    type Item = &'a ServiceDescriptor;
    type IntoIter = std::slice::Iter<'a, ServiceDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.services.iter()
    }
}
