//! Database bootstrap scripts

use async_trait::async_trait;
use stack_core::services::catalog::POSTGRES;
use stack_core::{ArtifactFamily, ArtifactGenerator, GenerationContext, GenerationOutcome};

use crate::Result;
use crate::output::{OutputWriter, with_header};

pub const INIT_SCRIPT: &str = "postgres/init/00-init.sql";
pub const SEED_SCRIPT: &str = "postgres/init/10-seed.sql";
pub const DEMO_SCRIPT: &str = "postgres/init/20-demo.sql";

/// Writes the scripts postgres runs on first start.
#[derive(Debug, Default, Clone, Copy)]
pub struct DatabaseBootstrapGenerator;

/// Quote a SQL identifier.
fn ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a SQL string literal.
fn literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn init_script(database: &str, user: &str) -> String {
    let mut sql = String::new();
    sql.push_str(&format!(
        "SELECT 'CREATE DATABASE {db} OWNER {owner}'\nWHERE NOT EXISTS (SELECT FROM pg_database WHERE datname = {name})\\gexec\n\n",
        db = ident(database),
        owner = ident(user),
        name = literal(database),
    ));
    sql.push_str(&format!("\\connect {}\n\n", ident(database)));
    for extension in ["pgcrypto", "citext", "uuid-ossp"] {
        sql.push_str(&format!("CREATE EXTENSION IF NOT EXISTS {};\n", ident(extension)));
    }
    sql.push('\n');
    for schema in ["auth", "storage"] {
        sql.push_str(&format!("CREATE SCHEMA IF NOT EXISTS {};\n", ident(schema)));
        sql.push_str(&format!(
            "GRANT ALL ON SCHEMA {} TO {};\n",
            ident(schema),
            ident(user)
        ));
    }
    with_header("--", &sql)
}

fn seed_script(database: &str, project: &str) -> String {
    let sql = format!(
        "\\connect {db}\n\n\
         CREATE TABLE IF NOT EXISTS public.app_settings (\n    \
             key text PRIMARY KEY,\n    \
             value text NOT NULL\n\
         );\n\n\
         INSERT INTO public.app_settings (key, value)\n\
         VALUES ('project_name', {project})\n\
         ON CONFLICT (key) DO NOTHING;\n",
        db = ident(database),
        project = literal(project),
    );
    with_header("--", &sql)
}

fn demo_script(database: &str) -> String {
    let sql = format!(
        "\\connect {db}\n\n\
         CREATE TABLE IF NOT EXISTS public.demo_items (\n    \
             id uuid PRIMARY KEY DEFAULT gen_random_uuid(),\n    \
             title text NOT NULL,\n    \
             created_at timestamptz NOT NULL DEFAULT now()\n\
         );\n\n\
         INSERT INTO public.demo_items (title)\n\
         SELECT title FROM (VALUES ('First item'), ('Second item'), ('Third item')) AS seed(title)\n\
         WHERE NOT EXISTS (SELECT 1 FROM public.demo_items);\n",
        db = ident(database),
    );
    with_header("--", &sql)
}

impl DatabaseBootstrapGenerator {
    fn render(&self, ctx: &GenerationContext<'_>) -> Result<GenerationOutcome> {
        if !ctx.services.is_enabled(POSTGRES) {
            return Ok(GenerationOutcome::skipped("postgres is disabled"));
        }

        let cfg = ctx.config;
        let project = cfg.get("PROJECT_NAME").unwrap_or_default();
        let database = cfg.non_empty("POSTGRES_DB").unwrap_or(project);
        let user = cfg.non_empty("POSTGRES_USER").unwrap_or("postgres");

        let mut writer = OutputWriter::new(ctx.root);
        writer.write(INIT_SCRIPT, &init_script(database, user))?;

        if cfg.is_enabled("SEED_DATABASE", false) {
            writer.write(SEED_SCRIPT, &seed_script(database, project))?;
        } else {
            writer.remove_generated(SEED_SCRIPT)?;
        }
        if cfg.is_enabled("LOAD_DEMO_DATA", false) {
            writer.write(DEMO_SCRIPT, &demo_script(database))?;
        } else {
            writer.remove_generated(DEMO_SCRIPT)?;
        }

        Ok(writer.finish())
    }
}

#[async_trait]
impl ArtifactGenerator for DatabaseBootstrapGenerator {
    fn family(&self) -> ArtifactFamily {
        ArtifactFamily::DatabaseBootstrap
    }

    async fn generate(&self, ctx: &GenerationContext<'_>) -> stack_core::Result<GenerationOutcome> {
        self.render(ctx).map_err(|e| e.into_core(self.family()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::prepare;
    use stack_test_utils::TestProject;

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(ident("my\"db"), "\"my\"\"db\"");
        assert_eq!(literal("it's"), "'it''s'");
    }

    #[tokio::test]
    async fn dev_writes_every_script() {
        let project = TestProject::new().with_base(&[("PROJECT_NAME", "shop")]);
        let (cfg, services) = prepare(&project);
        let ctx = GenerationContext::new(project.root(), &cfg, &services);

        let outcome = DatabaseBootstrapGenerator.generate(&ctx).await.unwrap();
        assert_eq!(outcome.created.len(), 3);
        project.assert_file_contains(INIT_SCRIPT, "CREATE DATABASE \"shop\" OWNER \"postgres\"");
        project.assert_file_contains(SEED_SCRIPT, "'project_name', 'shop'");
        project.assert_file_contains(DEMO_SCRIPT, "demo_items");
    }

    #[tokio::test]
    async fn disabling_demo_data_removes_its_script() {
        let project = TestProject::new().with_base(&[("PROJECT_NAME", "shop")]);
        let (cfg, services) = prepare(&project);
        DatabaseBootstrapGenerator
            .generate(&GenerationContext::new(project.root(), &cfg, &services))
            .await
            .unwrap();

        project.write_env(".env", &[("LOAD_DEMO_DATA", "false")]);
        let (cfg, services) = prepare(&project);
        let outcome = DatabaseBootstrapGenerator
            .generate(&GenerationContext::new(project.root(), &cfg, &services))
            .await
            .unwrap();

        project.assert_file_not_exists(DEMO_SCRIPT);
        project.assert_file_exists(SEED_SCRIPT);
        assert!(outcome.notes.iter().any(|n| n.contains("20-demo.sql")));
    }

    #[tokio::test]
    async fn disabled_postgres_is_skipped() {
        let project = TestProject::new().with_base(&[
            ("POSTGRES_ENABLED", "false"),
            ("HASURA_ENABLED", "false"),
            ("AUTH_ENABLED", "false"),
        ]);
        let (cfg, services) = prepare(&project);
        let ctx = GenerationContext::new(project.root(), &cfg, &services);

        let outcome = DatabaseBootstrapGenerator.generate(&ctx).await.unwrap();
        assert_eq!(outcome.skipped.as_deref(), Some("postgres is disabled"));
    }
}
