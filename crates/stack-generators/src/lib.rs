//! Built-in artifact generators for Stack Builder
//!
//! One [`ArtifactGenerator`] per [`ArtifactFamily`]:
//!
//! | Family | Generator | Writes |
//! |--------|-----------|--------|
//! | directories | [`DirectoryGenerator`] | project layout |
//! | tls-material | [`TlsGenerator`] | `ssl/certificates/<domain>/` via `openssl` |
//! | database-bootstrap | [`DatabaseBootstrapGenerator`] | `postgres/init/*.sql` |
//! | service-scaffolds | [`ScaffoldGenerator`] | `services/<name>/` from templates |
//! | proxy-config | [`ProxyConfigGenerator`] | `nginx/nginx.conf`, `nginx/conf.d/*.conf` |
//! | container-descriptor | [`ComposeGenerator`] | `docker-compose.yml` |
//!
//! Every writer goes through [`stack_fs::write_if_changed`], so an
//! unchanged artifact is never touched.

pub mod command;
pub mod compose;
pub mod database;
pub mod directories;
pub mod error;
pub mod output;
pub mod proxy;
pub mod scaffold;
pub mod tls;

use std::sync::Arc;

use stack_core::GeneratorRegistry;

pub use compose::ComposeGenerator;
pub use database::DatabaseBootstrapGenerator;
pub use directories::DirectoryGenerator;
pub use error::{Error, Result};
pub use proxy::ProxyConfigGenerator;
pub use scaffold::ScaffoldGenerator;
pub use tls::TlsGenerator;

/// Registry with the built-in generator for every family.
pub fn default_registry() -> GeneratorRegistry {
    GeneratorRegistry::new()
        .with(Arc::new(DirectoryGenerator))
        .with(Arc::new(TlsGenerator))
        .with(Arc::new(DatabaseBootstrapGenerator))
        .with(Arc::new(ScaffoldGenerator))
        .with(Arc::new(ProxyConfigGenerator))
        .with(Arc::new(ComposeGenerator))
}

#[cfg(test)]
pub(crate) mod test_support {
    use stack_core::config::{CascadeResolver, EnvironmentHints};
    use stack_core::{ConfigValidator, EffectiveConfig, ServiceDetector, ServiceSet};
    use stack_test_utils::TestProject;

    /// Resolve, validate and detect services for a dev project.
    pub fn prepare(project: &TestProject) -> (EffectiveConfig, ServiceSet) {
        let resolution = CascadeResolver::new(project.root()).resolve(&EnvironmentHints::explicit("dev"));
        let validated = ConfigValidator::new().validate(&resolution.config);
        let services = ServiceDetector::new().detect(&validated.config);
        (validated.config, services)
    }
}
