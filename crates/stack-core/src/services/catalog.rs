//! Built-in service catalog

use crate::config::EffectiveConfig;

/// Static description of a service the stack knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSpec {
    /// Service name, also the container name suffix
    pub name: &'static str,
    /// Prefix of the service's configuration keys (`<PREFIX>_ENABLED`, `<PREFIX>_PORT`)
    pub key: &'static str,
    /// Container image the built-in compose generator uses
    pub image: &'static str,
    pub default_port: u16,
    /// Subdomain under `BASE_DOMAIN` when the proxy exposes the service
    pub route: Option<&'static str>,
    /// Hard dependencies, by service name
    pub depends_on: &'static [&'static str],
}

impl ServiceSpec {
    pub fn enabled_key(&self) -> String {
        format!("{}_ENABLED", self.key)
    }

    pub fn port_key(&self) -> String {
        format!("{}_PORT", self.key)
    }

    /// Configured port, falling back to the catalog default.
    pub fn port(&self, cfg: &EffectiveConfig) -> u16 {
        cfg.port(&self.port_key()).unwrap_or(self.default_port)
    }
}

pub const POSTGRES: &str = "postgres";
pub const HASURA: &str = "hasura";
pub const AUTH: &str = "auth";
pub const NGINX: &str = "nginx";
pub const REDIS: &str = "redis";

/// Core services: enabled unless explicitly disabled.
pub const CORE_SERVICES: &[ServiceSpec] = &[
    ServiceSpec {
        name: POSTGRES,
        key: "POSTGRES",
        image: "postgres:16-alpine",
        default_port: 5432,
        route: None,
        depends_on: &[],
    },
    ServiceSpec {
        name: HASURA,
        key: "HASURA",
        image: "hasura/graphql-engine:v2.44.0",
        default_port: 8080,
        route: Some("api"),
        depends_on: &[POSTGRES],
    },
    ServiceSpec {
        name: AUTH,
        key: "AUTH",
        image: "nhost/hasura-auth:0.36.0",
        default_port: 4000,
        route: Some("auth"),
        depends_on: &[POSTGRES],
    },
    ServiceSpec {
        name: NGINX,
        key: "NGINX",
        image: "nginx:1.27-alpine",
        default_port: 80,
        route: None,
        depends_on: &[],
    },
];

/// Optional services: disabled unless `<PREFIX>_ENABLED=true`.
pub const OPTIONAL_SERVICES: &[ServiceSpec] = &[
    ServiceSpec {
        name: "minio",
        key: "MINIO",
        image: "minio/minio:latest",
        default_port: 9000,
        route: Some("storage"),
        depends_on: &[],
    },
    ServiceSpec {
        name: REDIS,
        key: "REDIS",
        image: "redis:7-alpine",
        default_port: 6379,
        route: None,
        depends_on: &[],
    },
    ServiceSpec {
        name: "meilisearch",
        key: "MEILISEARCH",
        image: "getmeili/meilisearch:v1.11",
        default_port: 7700,
        route: Some("search"),
        depends_on: &[],
    },
    ServiceSpec {
        name: "mailpit",
        key: "MAILPIT",
        image: "axllent/mailpit:latest",
        default_port: 8025,
        route: Some("mail"),
        depends_on: &[],
    },
    ServiceSpec {
        name: "admin",
        key: "ADMIN",
        image: "stack/admin:latest",
        default_port: 3021,
        route: Some("admin"),
        depends_on: &[],
    },
    ServiceSpec {
        name: "functions",
        key: "FUNCTIONS",
        image: "nhost/functions:latest",
        default_port: 3008,
        route: Some("functions"),
        depends_on: &[],
    },
    ServiceSpec {
        name: "mlflow",
        key: "MLFLOW",
        image: "ghcr.io/mlflow/mlflow:latest",
        default_port: 5005,
        route: Some("mlflow"),
        depends_on: &[POSTGRES],
    },
];

/// Key that turns on the whole observability bundle.
pub const MONITORING_KEY: &str = "MONITORING_ENABLED";

/// Observability bundle enabled by [`MONITORING_KEY`].
pub const MONITORING_SERVICES: &[ServiceSpec] = &[
    ServiceSpec {
        name: "prometheus",
        key: "PROMETHEUS",
        image: "prom/prometheus:latest",
        default_port: 9090,
        route: Some("prometheus"),
        depends_on: &[],
    },
    ServiceSpec {
        name: "grafana",
        key: "GRAFANA",
        image: "grafana/grafana:latest",
        default_port: 3000,
        route: Some("grafana"),
        depends_on: &["prometheus", "loki"],
    },
    ServiceSpec {
        name: "loki",
        key: "LOKI",
        image: "grafana/loki:latest",
        default_port: 3100,
        route: None,
        depends_on: &[],
    },
    ServiceSpec {
        name: "promtail",
        key: "PROMTAIL",
        image: "grafana/promtail:latest",
        default_port: 9080,
        route: None,
        depends_on: &["loki"],
    },
    ServiceSpec {
        name: "tempo",
        key: "TEMPO",
        image: "grafana/tempo:latest",
        default_port: 3200,
        route: None,
        depends_on: &[],
    },
    ServiceSpec {
        name: "alertmanager",
        key: "ALERTMANAGER",
        image: "prom/alertmanager:latest",
        default_port: 9093,
        route: Some("alerts"),
        depends_on: &[],
    },
    ServiceSpec {
        name: "cadvisor",
        key: "CADVISOR",
        image: "gcr.io/cadvisor/cadvisor:latest",
        default_port: 8082,
        route: None,
        depends_on: &[],
    },
    ServiceSpec {
        name: "node-exporter",
        key: "NODE_EXPORTER",
        image: "prom/node-exporter:latest",
        default_port: 9100,
        route: None,
        depends_on: &[],
    },
    ServiceSpec {
        name: "postgres-exporter",
        key: "POSTGRES_EXPORTER",
        image: "prometheuscommunity/postgres-exporter:latest",
        default_port: 9187,
        route: None,
        depends_on: &[POSTGRES],
    },
];

/// Cache exporter, part of the bundle only when the cache is enabled.
pub const REDIS_EXPORTER: ServiceSpec = ServiceSpec {
    name: "redis-exporter",
    key: "REDIS_EXPORTER",
    image: "oliver006/redis_exporter:latest",
    default_port: 9121,
    route: None,
    depends_on: &[REDIS],
};

/// Service templates the scaffold generator knows.
pub const KNOWN_TEMPLATES: &[&str] = &[
    "express-js",
    "fastify-js",
    "nest-js",
    "hono-ts",
    "bullmq-js",
    "fastapi",
    "flask",
    "django",
    "celery",
    "go-gin",
    "go-fiber",
    "rust-axum",
    "grpc",
    "static",
];

pub fn is_known_template(template: &str) -> bool {
    KNOWN_TEMPLATES.contains(&template)
}

/// Look up any built-in service by name.
pub fn builtin(name: &str) -> Option<&'static ServiceSpec> {
    CORE_SERVICES
        .iter()
        .chain(OPTIONAL_SERVICES)
        .chain(MONITORING_SERVICES)
        .chain(std::iter::once(&REDIS_EXPORTER))
        .find(|spec| spec.name == name)
}

/// Ports custom services must not claim: the proxy's HTTP/HTTPS ports and
/// every core service port as configured.
pub fn reserved_ports(cfg: &EffectiveConfig) -> Vec<u16> {
    let mut ports = vec![80, 443];
    ports.extend(CORE_SERVICES.iter().map(|spec| spec.port(cfg)));
    ports.sort_unstable();
    ports.dedup();
    ports
}
