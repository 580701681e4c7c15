//! Container descriptor (`docker-compose.yml`)

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use stack_core::services::catalog::{NGINX, POSTGRES};
use stack_core::{
    ArtifactFamily, ArtifactGenerator, GenerationContext, GenerationOutcome, ServiceDescriptor,
    ServiceTier,
};
use stack_fs::ProjectPath;

use crate::Result;
use crate::output::{OutputWriter, with_header};
use crate::proxy::{CONTAINER_SSL_DIR, MAIN_CONFIG, SITES_DIR};
use crate::scaffold::SERVICES_DIR;
use crate::tls::CERTIFICATES_DIR;

#[derive(Debug, Serialize)]
pub struct ComposeFile {
    pub name: String,
    pub services: BTreeMap<String, ComposeService>,
    pub networks: BTreeMap<String, ComposeNetwork>,
}

#[derive(Debug, Serialize)]
pub struct ComposeService {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,
    pub container_name: String,
    pub restart: String,
    pub env_file: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,
    pub networks: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ComposeNetwork {
    pub name: String,
}

fn volumes(service: &ServiceDescriptor) -> Vec<String> {
    match service.name.as_str() {
        POSTGRES => vec![
            "./postgres/init:/docker-entrypoint-initdb.d:ro".to_string(),
            "postgres_data:/var/lib/postgresql/data".to_string(),
        ],
        NGINX => vec![
            format!("./{MAIN_CONFIG}:/etc/nginx/nginx.conf:ro"),
            format!("./{SITES_DIR}:/etc/nginx/conf.d:ro"),
            format!("./{CERTIFICATES_DIR}:{CONTAINER_SSL_DIR}:ro"),
            "./logs:/var/log/nginx".to_string(),
        ],
        _ => Vec::new(),
    }
}

fn ports(service: &ServiceDescriptor) -> Vec<String> {
    if service.name == NGINX {
        return vec!["80:80".to_string(), "443:443".to_string()];
    }
    service.port.map(|p| format!("{p}:{p}")).into_iter().collect()
}

/// Build the descriptor for every enabled containerized service.
///
/// Frontend apps run on the host and are only reached through the proxy.
pub fn compose_file(ctx: &GenerationContext<'_>) -> ComposeFile {
    let project = ctx.config.get("PROJECT_NAME").unwrap_or_default().to_string();
    let network = ctx
        .config
        .non_empty("DOCKER_NETWORK")
        .map(str::to_string)
        .unwrap_or_else(|| format!("{project}_network"));
    let runtime = format!("./{}", ProjectPath::RuntimeArtifact.as_str());

    let services = ctx
        .services
        .enabled()
        .filter(|s| s.tier != ServiceTier::Frontend)
        .map(|service| {
            let (image, build) = match service.tier {
                ServiceTier::Custom => (None, Some(format!("./{SERVICES_DIR}/{}", service.name))),
                _ => (service.image.clone(), None),
            };
            let entry = ComposeService {
                image,
                build,
                container_name: format!("{project}_{}", service.name),
                restart: "unless-stopped".to_string(),
                env_file: vec![runtime.clone()],
                ports: ports(service),
                depends_on: service.dependencies.clone(),
                volumes: volumes(service),
                networks: vec![network.clone()],
            };
            (service.name.clone(), entry)
        })
        .collect();

    let mut networks = BTreeMap::new();
    networks.insert(network.clone(), ComposeNetwork { name: network });

    ComposeFile {
        name: project,
        services,
        networks,
    }
}

/// Writes `docker-compose.yml`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComposeGenerator;

impl ComposeGenerator {
    fn render(&self, ctx: &GenerationContext<'_>) -> Result<GenerationOutcome> {
        let file = compose_file(ctx);
        let mut yaml = serde_yaml::to_string(&file)?;
        if ctx.services.is_enabled(POSTGRES) {
            yaml.push_str("volumes:\n  postgres_data: {}\n");
        }

        let mut writer = OutputWriter::new(ctx.root);
        writer.write(ProjectPath::ContainerDescriptor.as_str(), &with_header("#", &yaml))?;
        tracing::info!(services = file.services.len(), "Container descriptor ready");
        Ok(writer.finish())
    }
}

#[async_trait]
impl ArtifactGenerator for ComposeGenerator {
    fn family(&self) -> ArtifactFamily {
        ArtifactFamily::ContainerDescriptor
    }

    async fn generate(&self, ctx: &GenerationContext<'_>) -> stack_core::Result<GenerationOutcome> {
        self.render(ctx).map_err(|e| e.into_core(self.family()))
    }
}
