//! Project directory layout

use async_trait::async_trait;
use stack_core::{ArtifactFamily, ArtifactGenerator, GenerationContext, GenerationOutcome};

use crate::output::OutputWriter;
use crate::Result;

/// Directories every generated stack expects to exist.
pub const PROJECT_DIRS: &[&str] = &[
    "nginx/conf.d",
    "nginx/ssl",
    "postgres/init",
    "services",
    "ssl/certificates",
    "logs",
];

const KEEP_FILE: &str = ".gitkeep";

/// Creates [`PROJECT_DIRS`], each holding a `.gitkeep` so the layout can be
/// tracked and checked for drift.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectoryGenerator;

impl DirectoryGenerator {
    fn render(&self, ctx: &GenerationContext<'_>) -> Result<GenerationOutcome> {
        let mut writer = OutputWriter::new(ctx.root);
        for dir in PROJECT_DIRS {
            writer.write_new(format!("{dir}/{KEEP_FILE}"), b"")?;
        }
        Ok(writer.finish())
    }
}

#[async_trait]
impl ArtifactGenerator for DirectoryGenerator {
    fn family(&self) -> ArtifactFamily {
        ArtifactFamily::Directories
    }

    async fn generate(&self, ctx: &GenerationContext<'_>) -> stack_core::Result<GenerationOutcome> {
        self.render(ctx).map_err(|e| e.into_core(self.family()))
    }
}
