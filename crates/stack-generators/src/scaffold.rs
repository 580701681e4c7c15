//! Custom service scaffolds
//!
//! Each enabled custom service gets a copy of `templates/<kind>/` under
//! `services/<name>/`. Scaffolds are user code once written: files that
//! already exist are never overwritten, only missing ones are added.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::{Captures, Regex};
use stack_core::{
    ArtifactFamily, ArtifactGenerator, GenerationContext, GenerationOutcome, ServiceDescriptor,
    ServiceTier,
};

use crate::output::OutputWriter;
use crate::{Error, Result};

pub const SERVICES_DIR: &str = "services";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Z][A-Z0-9_]*)\s*\}\}").unwrap());

/// Values available to `{{KEY}}` placeholders in template files.
pub fn template_vars(ctx: &GenerationContext<'_>, service: &ServiceDescriptor) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();
    vars.insert("SERVICE_NAME".to_string(), service.name.clone());
    vars.insert("SERVICE_TEMPLATE".to_string(), service.kind.clone());
    vars.insert(
        "SERVICE_PORT".to_string(),
        service.port.map(|p| p.to_string()).unwrap_or_default(),
    );
    for key in ["PROJECT_NAME", "BASE_DOMAIN"] {
        vars.insert(key.to_string(), ctx.config.get(key).unwrap_or_default().to_string());
    }
    vars
}

/// Replace known `{{KEY}}` placeholders; unknown ones are left as written.
pub fn substitute(content: &str, vars: &BTreeMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(content, |caps: &Captures<'_>| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Every file below `dir`, relative to it, in sorted order.
fn template_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![PathBuf::new()];
    while let Some(relative) = pending.pop() {
        let current = dir.join(&relative);
        let entries = fs::read_dir(&current).map_err(|e| Error::io(&current, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&current, e))?;
            let child = relative.join(entry.file_name());
            if entry.path().is_dir() {
                pending.push(child);
            } else {
                files.push(child);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Copies templates into per-service directories.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScaffoldGenerator;

impl ScaffoldGenerator {
    fn scaffold(
        &self,
        ctx: &GenerationContext<'_>,
        service: &ServiceDescriptor,
        writer: &mut OutputWriter<'_>,
    ) -> Result<bool> {
        let template_dir = ctx.templates_dir().join(&service.kind);
        if !template_dir.is_dir() {
            tracing::warn!(
                service = %service.name,
                template = %service.kind,
                "Template not found; skipping scaffold"
            );
            writer.note(format!(
                "template '{}' not found; skipped {}",
                service.kind, service.name
            ));
            return Ok(false);
        }

        let vars = template_vars(ctx, service);
        let target = Path::new(SERVICES_DIR).join(&service.name);
        for file in template_files(&template_dir)? {
            let source = template_dir.join(&file);
            let bytes = fs::read(&source).map_err(|e| Error::io(&source, e))?;
            let content = match String::from_utf8(bytes) {
                Ok(text) => substitute(&text, &vars).into_bytes(),
                Err(binary) => binary.into_bytes(),
            };
            writer.write_new(target.join(&file), &content)?;
        }
        tracing::debug!(service = %service.name, "Scaffolded service");
        Ok(true)
    }

    fn render(&self, ctx: &GenerationContext<'_>) -> Result<GenerationOutcome> {
        let custom: Vec<&ServiceDescriptor> = ctx
            .services
            .by_tier(ServiceTier::Custom)
            .filter(|s| s.enabled)
            .collect();
        if custom.is_empty() {
            return Ok(GenerationOutcome::skipped("no custom services"));
        }

        let mut writer = OutputWriter::new(ctx.root);
        let mut scaffolded = 0;
        for service in custom {
            if self.scaffold(ctx, service, &mut writer)? {
                scaffolded += 1;
            }
        }
        tracing::info!(scaffolded, "Service scaffolds ready");
        Ok(writer.finish())
    }
}

#[async_trait]
impl ArtifactGenerator for ScaffoldGenerator {
    fn family(&self) -> ArtifactFamily {
        ArtifactFamily::ServiceScaffolds
    }

    async fn generate(&self, ctx: &GenerationContext<'_>) -> stack_core::Result<GenerationOutcome> {
        self.render(ctx).map_err(|e| e.into_core(self.family()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::prepare;
    use pretty_assertions::assert_eq;
    use stack_test_utils::TestProject;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn placeholders_are_substituted() {
        let vars = vars(&[("SERVICE_NAME", "worker"), ("SERVICE_PORT", "8001")]);
        assert_eq!(
            substitute("name={{SERVICE_NAME}} port={{ SERVICE_PORT }} x={{UNKNOWN}}", &vars),
            "name=worker port=8001 x={{UNKNOWN}}"
        );
    }

    #[tokio::test]
    async fn copies_template_tree_with_substitution() {
        let project = TestProject::new()
            .with_base(&[("PROJECT_NAME", "shop"), ("CS_1", "worker:express-js:8100")])
            .with_template("express-js", "package.json", "{\"name\": \"{{PROJECT_NAME}}-{{SERVICE_NAME}}\"}\n")
            .with_template("express-js", "src/index.js", "app.listen({{SERVICE_PORT}});\n");
        let (cfg, services) = prepare(&project);
        let ctx = GenerationContext::new(project.root(), &cfg, &services);

        let outcome = ScaffoldGenerator.generate(&ctx).await.unwrap();
        assert_eq!(outcome.created.len(), 2);
        project.assert_file_contains("services/worker/package.json", "\"shop-worker\"");
        project.assert_file_contains("services/worker/src/index.js", "app.listen(8100);");
    }

    #[tokio::test]
    async fn edited_scaffold_files_survive_regeneration() {
        let project = TestProject::new()
            .with_base(&[("CS_1", "api-svc:fastapi")])
            .with_template("fastapi", "main.py", "# {{SERVICE_NAME}}\n");
        let (cfg, services) = prepare(&project);
        let ctx = GenerationContext::new(project.root(), &cfg, &services);
        ScaffoldGenerator.generate(&ctx).await.unwrap();

        project.write_file("services/api-svc/main.py", "# my code\n");
        let outcome = ScaffoldGenerator.generate(&ctx).await.unwrap();

        assert!(outcome.created.is_empty());
        assert_eq!(outcome.outputs(), vec![PathBuf::from("services/api-svc/main.py")]);
        assert_eq!(project.read("services/api-svc/main.py"), "# my code\n");
    }

    #[tokio::test]
    async fn missing_template_skips_only_that_service() {
        let project = TestProject::new()
            .with_base(&[("CS_1", "one:go-gin"), ("CS_2", "two:flask")])
            .with_template("flask", "app.py", "print('{{SERVICE_NAME}}')\n");
        let (cfg, services) = prepare(&project);
        let ctx = GenerationContext::new(project.root(), &cfg, &services);

        let outcome = ScaffoldGenerator.generate(&ctx).await.unwrap();
        assert!(outcome.skipped.is_none());
        assert_eq!(outcome.notes, vec!["template 'go-gin' not found; skipped one".to_string()]);
        project.assert_file_contains("services/two/app.py", "print('two')");
        project.assert_file_not_exists("services/one");
    }

    #[tokio::test]
    async fn templates_dir_can_be_moved() {
        let project = TestProject::new()
            .with_base(&[("CS_1", "site:static"), ("STACK_TEMPLATES_DIR", "stack/templates")]);
        project.write_file("stack/templates/static/index.html", "<h1>{{SERVICE_NAME}}</h1>\n");
        let (cfg, services) = prepare(&project);
        let ctx = GenerationContext::new(project.root(), &cfg, &services);

        ScaffoldGenerator.generate(&ctx).await.unwrap();
        project.assert_file_contains("services/site/index.html", "<h1>site</h1>");
    }

    #[tokio::test]
    async fn no_custom_services_is_skipped() {
        let project = TestProject::new();
        let (cfg, services) = prepare(&project);
        let ctx = GenerationContext::new(project.root(), &cfg, &services);

        let outcome = ScaffoldGenerator.generate(&ctx).await.unwrap();
        assert_eq!(outcome.skipped.as_deref(), Some("no custom services"));
    }
}
