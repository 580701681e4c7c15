//! Reverse proxy configuration

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use stack_core::{
    ArtifactFamily, ArtifactGenerator, GenerationContext, GenerationOutcome, ServiceDescriptor,
    ServiceTier,
};

use crate::output::{OutputWriter, with_header};
use crate::tls::{SSL_MODE_KEY, TlsMode};
use crate::{Error, Result};

pub const MAIN_CONFIG: &str = "nginx/nginx.conf";
pub const SITES_DIR: &str = "nginx/conf.d";
/// Where the container descriptor mounts `ssl/certificates`
pub const CONTAINER_SSL_DIR: &str = "/etc/nginx/ssl";
/// Frontend apps run on the host, outside the container network
const HOST_GATEWAY: &str = "host.docker.internal";

fn main_config(https: bool) -> String {
    let fallback = if https {
        "return 301 https://$host$request_uri;"
    } else {
        "return 404;"
    };
    let body = format!(
        r#"worker_processes auto;

events {{
    worker_connections 1024;
}}

http {{
    include /etc/nginx/mime.types;
    default_type application/octet-stream;
    sendfile on;
    keepalive_timeout 65;
    client_max_body_size 100m;

    map $http_upgrade $connection_upgrade {{
        default upgrade;
        '' close;
    }}

    server {{
        listen 80 default_server;
        server_name _;
        {fallback}
    }}

    include /etc/nginx/conf.d/*.conf;
}}
"#
    );
    with_header("#", &body)
}

/// Upstream `host:port` for a routed service.
pub fn upstream(service: &ServiceDescriptor) -> String {
    let host = match service.tier {
        ServiceTier::Frontend => HOST_GATEWAY,
        _ => service.name.as_str(),
    };
    format!("{host}:{}", service.port.unwrap_or(80))
}

fn site_config(service: &ServiceDescriptor, route: &str, domain: &str, mode: TlsMode) -> String {
    let listen = if mode.serves_https() {
        let (cert, key) = match mode {
            TlsMode::LetsEncrypt => ("fullchain.pem", "privkey.pem"),
            _ => ("cert.pem", "key.pem"),
        };
        format!(
            "    listen 443 ssl;\n    http2 on;\n    \
             ssl_certificate {CONTAINER_SSL_DIR}/{domain}/{cert};\n    \
             ssl_certificate_key {CONTAINER_SSL_DIR}/{domain}/{key};\n"
        )
    } else {
        "    listen 80;\n".to_string()
    };
    let body = format!(
        r#"# {name} ({tier})
server {{
{listen}    server_name {route}.{domain};

    location / {{
        proxy_pass http://{upstream};
        proxy_http_version 1.1;
        proxy_set_header Host $host;
        proxy_set_header X-Real-IP $remote_addr;
        proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;
        proxy_set_header X-Forwarded-Proto $scheme;
        proxy_set_header Upgrade $http_upgrade;
        proxy_set_header Connection $connection_upgrade;
    }}
}}
"#,
        name = service.name,
        tier = service.tier,
        upstream = upstream(service),
    );
    with_header("#", &body)
}

fn existing_sites(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut sites = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let path = entry.map_err(|e| Error::io(dir, e))?.path();
        if path.extension().is_some_and(|ext| ext == "conf") {
            sites.push(path);
        }
    }
    sites.sort();
    Ok(sites)
}

/// Writes the proxy's main config and one site per routed service.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProxyConfigGenerator;

impl ProxyConfigGenerator {
    fn render(&self, ctx: &GenerationContext<'_>) -> Result<GenerationOutcome> {
        let mode = TlsMode::from_config(ctx.config.get(SSL_MODE_KEY));
        let domain = ctx.config.non_empty("BASE_DOMAIN").unwrap_or("localhost");

        let mut writer = OutputWriter::new(ctx.root);
        writer.write(MAIN_CONFIG, &main_config(mode.serves_https()))?;

        let mut written = BTreeSet::new();
        for service in ctx.services.routed() {
            let Some(route) = service.route.as_deref() else {
                continue;
            };
            let relative = Path::new(SITES_DIR).join(format!("{route}.conf"));
            writer.write(&relative, &site_config(service, route, domain, mode))?;
            written.insert(ctx.root.join(relative));
        }

        // Sites of services that lost their route or were disabled
        for site in existing_sites(&ctx.root.join(SITES_DIR))? {
            if !written.contains(&site)
                && let Ok(relative) = site.strip_prefix(ctx.root)
            {
                writer.remove_generated(relative)?;
            }
        }

        tracing::info!(sites = written.len(), %domain, "Proxy configuration ready");
        Ok(writer.finish())
    }
}

#[async_trait]
impl ArtifactGenerator for ProxyConfigGenerator {
    fn family(&self) -> ArtifactFamily {
        ArtifactFamily::ProxyConfig
    }

    async fn generate(&self, ctx: &GenerationContext<'_>) -> stack_core::Result<GenerationOutcome> {
        self.render(ctx).map_err(|e| e.into_core(self.family()))
    }
}
