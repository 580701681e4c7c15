//! End-to-end build scenarios
//!
//! Each test drives the full pipeline (cascade, validation, detection,
//! planning and the built-in generators) against a temporary project.

use pretty_assertions::assert_eq;
use stack_core::{
    ArtifactFamily, BuildOrchestrator, BuildOutcome, BuildRequest, FamilyStatus, RunKind,
    ServiceTier, StaleReason,
};
use stack_generators::default_registry;
use stack_test_utils::TestProject;
use std::path::Path;

async fn build_in(root: &Path, environment: &str) -> BuildOutcome {
    let mut request = BuildRequest::new(root);
    request.environment = Some(environment.to_string());
    BuildOrchestrator::new(default_registry())
        .run(&request)
        .await
        .expect("Build should run")
}

async fn build(project: &TestProject) -> BuildOutcome {
    build_in(project.root(), "dev").await
}

fn compose(project: &TestProject) -> serde_yaml::Value {
    serde_yaml::from_str(&project.read("docker-compose.yml")).expect("Descriptor should be YAML")
}

fn status(outcome: &BuildOutcome, family: ArtifactFamily) -> &FamilyStatus {
    &outcome
        .summary
        .family(family)
        .expect("Every family is reported")
        .status
}

// =============================================================================
// Development builds
// =============================================================================

#[tokio::test]
async fn test_dev_build_produces_a_runnable_stack() {
    let project = TestProject::new()
        .with_base(&[
            ("PROJECT_NAME", "shop"),
            ("SSL_MODE", "none"),
            ("CS_1", "worker:bullmq-js"),
            ("APP_1_NAME", "web"),
        ])
        .with_template("bullmq-js", "index.js", "// {{SERVICE_NAME}} for {{PROJECT_NAME}}\n");

    let outcome = build(&project).await;

    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(outcome.summary.run_kind, RunKind::FirstBuild);
    assert!(matches!(
        status(&outcome, ArtifactFamily::TlsMaterial),
        FamilyStatus::Skipped { .. }
    ));

    for path in [
        ".env.runtime",
        "docker-compose.yml",
        "nginx/nginx.conf",
        "nginx/conf.d/api.conf",
        "nginx/conf.d/worker.conf",
        "nginx/conf.d/web.conf",
        "postgres/init/00-init.sql",
        "logs/.gitkeep",
    ] {
        project.assert_file_exists(path);
    }
    project.assert_file_contains("services/worker/index.js", "// worker for shop");

    let yaml = compose(&project);
    assert_eq!(yaml["services"]["worker"]["build"].as_str(), Some("./services/worker"));
    assert!(yaml["services"]["web"].is_null());
}

#[tokio::test]
async fn test_second_build_changes_nothing() {
    let project = TestProject::new().with_base(&[("PROJECT_NAME", "shop"), ("SSL_MODE", "none")]);
    build(&project).await;
    let before = project.read("docker-compose.yml");
    let modified = std::fs::metadata(project.path("docker-compose.yml"))
        .unwrap()
        .modified()
        .unwrap();

    let outcome = build(&project).await;

    assert_eq!(outcome.summary.run_kind, RunKind::NoOp);
    assert!(
        outcome
            .summary
            .families
            .iter()
            .all(|f| f.status == FamilyStatus::UpToDate)
    );
    assert_eq!(project.read("docker-compose.yml"), before);
    assert_eq!(
        std::fs::metadata(project.path("docker-compose.yml"))
            .unwrap()
            .modified()
            .unwrap(),
        modified
    );
}

#[tokio::test]
async fn test_empty_project_builds_from_directory_name() {
    let (_parent, root) = TestProject::named("Acme Store");

    let outcome = build_in(&root, "dev").await;

    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(outcome.summary.project, "acme-store");
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(&std::fs::read_to_string(root.join("docker-compose.yml")).unwrap())
            .unwrap();
    assert_eq!(yaml["name"].as_str(), Some("acme-store"));
    assert!(yaml["networks"]["acme-store_network"].is_mapping());
    assert!(
        std::fs::read_to_string(root.join("postgres/init/00-init.sql"))
            .unwrap()
            .contains("\"acme_store\"")
    );
}

// =============================================================================
// Incremental behavior
// =============================================================================

#[tokio::test]
async fn test_enabling_cache_touches_only_the_descriptor() {
    let project = TestProject::new().with_base(&[("PROJECT_NAME", "shop"), ("SSL_MODE", "none")]);
    build(&project).await;

    project.write_env(".env", &[("REDIS_ENABLED", "true")]);
    let outcome = build(&project).await;

    assert_eq!(outcome.summary.run_kind, RunKind::IncrementalChange);
    for family in ArtifactFamily::ALL {
        let expected_stale = family == ArtifactFamily::ContainerDescriptor;
        let is_generated = matches!(status(&outcome, family), FamilyStatus::Generated { .. });
        assert_eq!(is_generated, expected_stale, "{family}");
    }
    assert!(compose(&project)["services"]["redis"].is_mapping());
}

#[tokio::test]
async fn test_template_added_later_is_scaffolded() {
    let project = TestProject::new().with_base(&[
        ("PROJECT_NAME", "shop"),
        ("SSL_MODE", "none"),
        ("CS_1", "worker:bullmq-js"),
    ]);
    build(&project).await;
    project.assert_file_not_exists("services/worker/index.js");

    let project = project.with_template("bullmq-js", "index.js", "// {{SERVICE_NAME}}\n");
    let outcome = build(&project).await;

    assert_eq!(outcome.summary.run_kind, RunKind::IncrementalChange);
    assert!(matches!(
        status(&outcome, ArtifactFamily::ServiceScaffolds),
        FamilyStatus::Generated { reason: StaleReason::InputsChanged }
    ));
    assert_eq!(project.read("services/worker/index.js"), "// worker\n");
}

#[tokio::test]
async fn test_monitoring_with_cache_adds_exporter() {
    let project = TestProject::new().with_base(&[
        ("PROJECT_NAME", "shop"),
        ("SSL_MODE", "none"),
        ("MONITORING_ENABLED", "true"),
        ("REDIS_ENABLED", "true"),
    ]);

    let outcome = build(&project).await;

    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(outcome.summary.service_counts[&ServiceTier::Monitoring], 10);
    let yaml = compose(&project);
    assert_eq!(
        yaml["services"]["redis-exporter"]["depends_on"][0].as_str(),
        Some("redis")
    );
    project.assert_file_exists("nginx/conf.d/grafana.conf");
}

#[tokio::test]
async fn test_missing_openssl_is_retried_next_run() {
    let project = TestProject::new()
        .with_base(&[("PROJECT_NAME", "shop"), ("STACK_OPENSSL", "stack-no-such-openssl")]);

    let outcome = build(&project).await;
    assert_eq!(outcome.exit_code(), 0);
    assert!(matches!(
        status(&outcome, ArtifactFamily::TlsMaterial),
        FamilyStatus::Skipped { .. }
    ));

    let outcome = build(&project).await;
    assert_eq!(
        status(&outcome, ArtifactFamily::TlsMaterial),
        &FamilyStatus::Skipped {
            reason: "External tool unavailable: stack-no-such-openssl".to_string()
        }
    );
    assert_eq!(outcome.summary.run_kind, RunKind::IncrementalChange);
}

#[tokio::test]
async fn test_production_uses_runtime_certificates() {
    let project = TestProject::new()
        .with_base(&[("PROJECT_NAME", "shop")])
        .with_prod(&[("BASE_DOMAIN", "shop.example.com")]);

    let outcome = build_in(project.root(), "prod").await;

    assert_eq!(outcome.exit_code(), 0);
    assert!(matches!(
        status(&outcome, ArtifactFamily::TlsMaterial),
        FamilyStatus::Skipped { .. }
    ));
    project.assert_file_contains(
        "nginx/conf.d/api.conf",
        "ssl_certificate /etc/nginx/ssl/shop.example.com/fullchain.pem;",
    );
    project.assert_file_not_exists("postgres/init/20-demo.sql");

    let again = build_in(project.root(), "prod").await;
    assert_eq!(again.summary.run_kind, RunKind::NoOp);
}

// =============================================================================
// Route conflicts
// =============================================================================

#[tokio::test]
async fn test_route_conflict_is_fixed_before_proxy_generation() {
    let project = TestProject::new().with_base(&[
        ("PROJECT_NAME", "shop"),
        ("SSL_MODE", "none"),
        ("CS_1", "gql:express-js"),
        ("CS_1_ROUTE", "api"),
    ]);

    let outcome = build(&project).await;

    assert_eq!(outcome.exit_code(), 0);
    project.assert_file_contains(".env", "CS_1_ROUTE=api-2");
    project.assert_file_contains("nginx/conf.d/api.conf", "proxy_pass http://hasura:8080;");
    project.assert_file_contains("nginx/conf.d/api-2.conf", "proxy_pass http://gql:8001;");
    assert_eq!(
        status(&outcome, ArtifactFamily::ProxyConfig),
        &FamilyStatus::Generated {
            reason: StaleReason::FirstBuild
        }
    );
}
