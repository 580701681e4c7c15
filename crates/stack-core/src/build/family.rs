//! Artifact families and their tracked inputs

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::generator::templates_dir;
use crate::config::EffectiveConfig;
use crate::services::catalog::POSTGRES;
use crate::services::{ServiceDescriptor, ServiceSet, ServiceTier};
use crate::{Error, Result};

/// A named group of generated outputs that is regenerated as a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactFamily {
    Directories,
    TlsMaterial,
    DatabaseBootstrap,
    ServiceScaffolds,
    ProxyConfig,
    ContainerDescriptor,
}

impl ArtifactFamily {
    /// Every family, in execution order.
    pub const ALL: [ArtifactFamily; 6] = [
        ArtifactFamily::Directories,
        ArtifactFamily::TlsMaterial,
        ArtifactFamily::DatabaseBootstrap,
        ArtifactFamily::ServiceScaffolds,
        ArtifactFamily::ProxyConfig,
        ArtifactFamily::ContainerDescriptor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactFamily::Directories => "directories",
            ArtifactFamily::TlsMaterial => "tls-material",
            ArtifactFamily::DatabaseBootstrap => "database-bootstrap",
            ArtifactFamily::ServiceScaffolds => "service-scaffolds",
            ArtifactFamily::ProxyConfig => "proxy-config",
            ArtifactFamily::ContainerDescriptor => "container-descriptor",
        }
    }

    /// A failure in a required family makes the whole build fail.
    pub fn is_required(&self) -> bool {
        matches!(
            self,
            ArtifactFamily::Directories | ArtifactFamily::ContainerDescriptor
        )
    }

    /// Whether this family's outputs depend on service routes.
    pub fn uses_routes(&self) -> bool {
        matches!(self, ArtifactFamily::ProxyConfig)
    }

    /// Canonical text of everything this family's outputs depend on.
    ///
    /// Two configurations with the same tracked inputs produce the same
    /// outputs, so the fingerprint of this text decides staleness. Scaffolds
    /// also track whether each custom service's template exists under `root`.
    pub fn tracked_inputs(&self, root: &Path, cfg: &EffectiveConfig, services: &ServiceSet) -> String {
        let mut lines = vec![format!("family={}", self.as_str())];
        let keys: &[&str] = match self {
            ArtifactFamily::Directories => &[],
            ArtifactFamily::TlsMaterial => &["SSL_MODE", "BASE_DOMAIN"],
            ArtifactFamily::DatabaseBootstrap => &[
                "POSTGRES_DB",
                "POSTGRES_USER",
                "SEED_DATABASE",
                "LOAD_DEMO_DATA",
            ],
            ArtifactFamily::ServiceScaffolds => &["PROJECT_NAME", "BASE_DOMAIN", "STACK_TEMPLATES_DIR"],
            ArtifactFamily::ProxyConfig => &["BASE_DOMAIN", "SSL_MODE", "PROJECT_NAME"],
            ArtifactFamily::ContainerDescriptor => &["PROJECT_NAME", "DOCKER_NETWORK", "ENV"],
        };
        for key in keys {
            lines.push(format!("{key}={}", cfg.get(key).unwrap_or_default()));
        }

        let service_line = |s: &ServiceDescriptor, with_route: bool| {
            let mut line = format!(
                "service={}|{}|{}|{}",
                s.name,
                s.kind,
                s.port.map(|p| p.to_string()).unwrap_or_default(),
                s.dependencies.join(","),
            );
            if with_route {
                line.push('|');
                line.push_str(s.route.as_deref().unwrap_or_default());
            }
            line
        };

        match self {
            ArtifactFamily::Directories | ArtifactFamily::TlsMaterial => {}
            ArtifactFamily::DatabaseBootstrap => {
                lines.push(format!("{POSTGRES}={}", services.is_enabled(POSTGRES)));
            }
            ArtifactFamily::ServiceScaffolds => {
                let templates = templates_dir(root, cfg);
                lines.extend(
                    services
                        .enabled()
                        .filter(|s| s.tier == ServiceTier::Custom)
                        .map(|s| {
                            let template = if templates.join(&s.kind).is_dir() {
                                "present"
                            } else {
                                "missing"
                            };
                            format!("{}|template={template}", service_line(s, false))
                        }),
                );
            }
            ArtifactFamily::ProxyConfig => {
                lines.extend(services.routed().map(|s| service_line(s, true)));
            }
            ArtifactFamily::ContainerDescriptor => {
                lines.extend(services.enabled().map(|s| service_line(s, false)));
            }
        }

        lines.join("\n")
    }

    /// SHA-256 fingerprint of [`Self::tracked_inputs`].
    pub fn fingerprint(&self, root: &Path, cfg: &EffectiveConfig, services: &ServiceSet) -> String {
        stack_fs::compute_content_checksum(&self.tracked_inputs(root, cfg, services))
    }
}

impl fmt::Display for ArtifactFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ArtifactFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ArtifactFamily::ALL
            .into_iter()
            .find(|family| family.as_str() == s)
            .ok_or_else(|| Error::NotFound(format!("artifact family '{s}'")))
    }
}
