//! TLS material

use std::path::PathBuf;

use async_trait::async_trait;
use stack_core::{ArtifactFamily, ArtifactGenerator, GenerationContext, GenerationOutcome};
use stack_fs::WriteStatus;

use crate::command::run_command;
use crate::output::OutputWriter;
use crate::{Error, Result};

pub const SSL_MODE_KEY: &str = "SSL_MODE";
/// Overrides the `openssl` binary
pub const OPENSSL_KEY: &str = "STACK_OPENSSL";
pub const CERTIFICATES_DIR: &str = "ssl/certificates";
const CERT_DAYS: &str = "825";

/// How certificates are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    SelfSigned,
    /// Issued by the proxy at runtime
    LetsEncrypt,
    /// Placed by the operator
    Custom,
    Disabled,
}

impl TlsMode {
    pub fn from_config(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("letsencrypt") => TlsMode::LetsEncrypt,
            Some("custom") => TlsMode::Custom,
            Some("none" | "off" | "disabled" | "false") => TlsMode::Disabled,
            _ => TlsMode::SelfSigned,
        }
    }

    /// Whether the proxy should terminate TLS.
    pub fn serves_https(&self) -> bool {
        !matches!(self, TlsMode::Disabled)
    }
}

/// Relative directory holding the certificate pair for `domain`.
pub fn certificate_dir(domain: &str) -> PathBuf {
    PathBuf::from(CERTIFICATES_DIR).join(domain)
}

/// Self-signed certificates via `openssl req -x509`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TlsGenerator;

impl TlsGenerator {
    async fn render(&self, ctx: &GenerationContext<'_>) -> Result<GenerationOutcome> {
        let mode = TlsMode::from_config(ctx.config.get(SSL_MODE_KEY));
        match mode {
            TlsMode::LetsEncrypt => {
                return Ok(GenerationOutcome::skipped(
                    "letsencrypt certificates are issued at runtime",
                ));
            }
            TlsMode::Custom => {
                return Ok(GenerationOutcome::skipped("custom certificates are provided by the operator"));
            }
            TlsMode::Disabled => return Ok(GenerationOutcome::skipped("TLS is disabled")),
            TlsMode::SelfSigned => {}
        }

        let domain = ctx.config.non_empty("BASE_DOMAIN").unwrap_or("localhost");
        let relative = certificate_dir(domain);
        let dir = ctx.root.join(&relative);
        std::fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

        let cert = relative.join("cert.pem");
        let key = relative.join("key.pem");
        let status = |path: &PathBuf| {
            if ctx.root.join(path).is_file() {
                WriteStatus::Updated
            } else {
                WriteStatus::Created
            }
        };
        let (cert_status, key_status) = (status(&cert), status(&key));

        let program = ctx.config.non_empty(OPENSSL_KEY).unwrap_or("openssl");
        let args: Vec<String> = vec![
            "req".into(),
            "-x509".into(),
            "-nodes".into(),
            "-newkey".into(),
            "rsa:2048".into(),
            "-sha256".into(),
            "-days".into(),
            CERT_DAYS.into(),
            "-subj".into(),
            format!("/CN={domain}"),
            "-addext".into(),
            format!("subjectAltName=DNS:{domain},DNS:*.{domain}"),
            "-keyout".into(),
            ctx.root.join(&key).display().to_string(),
            "-out".into(),
            ctx.root.join(&cert).display().to_string(),
        ];
        run_command(program, &args, ctx.root, ctx.command_timeout).await?;
        tracing::info!(%domain, "Issued self-signed certificate");

        let mut writer = OutputWriter::new(ctx.root);
        writer.record(cert, cert_status);
        writer.record(key, key_status);
        if ctx.config.is_enabled("SSL_AUTO_TRUST", false) {
            writer.note(format!(
                "trust {} in your system store to avoid browser warnings",
                relative.join("cert.pem").display()
            ));
        }
        Ok(writer.finish())
    }
}

#[async_trait]
impl ArtifactGenerator for TlsGenerator {
    fn family(&self) -> ArtifactFamily {
        ArtifactFamily::TlsMaterial
    }

    async fn generate(&self, ctx: &GenerationContext<'_>) -> stack_core::Result<GenerationOutcome> {
        self.render(ctx).await.map_err(|e| e.into_core(self.family()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::prepare;
    use rstest::rstest;
    use stack_test_utils::TestProject;

    #[rstest]
    #[case(None, TlsMode::SelfSigned)]
    #[case(Some("self-signed"), TlsMode::SelfSigned)]
    #[case(Some("LetsEncrypt"), TlsMode::LetsEncrypt)]
    #[case(Some("custom"), TlsMode::Custom)]
    #[case(Some("none"), TlsMode::Disabled)]
    fn mode_parsing(#[case] value: Option<&str>, #[case] expected: TlsMode) {
        assert_eq!(TlsMode::from_config(value), expected);
    }

    #[tokio::test]
    async fn letsencrypt_is_skipped_without_output() {
        let project = TestProject::new().with_base(&[("SSL_MODE", "letsencrypt")]);
        let (cfg, services) = prepare(&project);
        let ctx = GenerationContext::new(project.root(), &cfg, &services);

        let outcome = TlsGenerator.generate(&ctx).await.unwrap();
        assert!(outcome.skipped.is_some());
        assert!(outcome.outputs().is_empty());
        project.assert_file_not_exists("ssl/certificates");
    }

    #[tokio::test]
    async fn missing_openssl_is_unavailable() {
        let project = TestProject::new().with_base(&[("STACK_OPENSSL", "stack-no-such-openssl")]);
        let (cfg, services) = prepare(&project);
        let ctx = GenerationContext::new(project.root(), &cfg, &services);

        let error = TlsGenerator.generate(&ctx).await.unwrap_err();
        assert!(error.is_unavailable());
    }
}
