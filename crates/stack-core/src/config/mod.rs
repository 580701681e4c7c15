//! Configuration cascade
//!
//! Configuration is read from plain `KEY=value` files merged in a fixed order
//! (later sources override earlier ones):
//!
//! 1. **Base shared** - `.env.dev`, team defaults for every environment
//! 2. **Staging shared** - `.env.staging` (staging and prod)
//! 3. **Prod shared** - `.env.prod` (prod only)
//! 4. **Secrets** - `.env.secrets` (prod only)
//! 5. **Local override** - `.env`, always last
//!
//! Missing files are skipped. After the merge, environment-derived defaults
//! and operational defaults fill whatever is still unset.
//!
//! # Example
//!
//! ```ignore
//! use stack_core::config::{CascadeResolver, EnvironmentHints};
//!
//! let resolver = CascadeResolver::new("/srv/shop");
//! let resolution = resolver.resolve(&EnvironmentHints::explicit("prod"));
//! println!("{}", resolution.config.get("DATABASE_URL").unwrap_or_default());
//! ```

pub mod defaults;
mod effective;
pub mod envfile;
mod environment;
mod local_override;
mod resolver;
mod runtime;
mod source;

pub use defaults::{apply_computed_defaults, apply_smart_defaults};
pub use effective::{EffectiveConfig, LoadedSource};
pub use envfile::EnvDocument;
pub use environment::{
    DetectedEnvironment, Environment, EnvironmentHints, EnvironmentOrigin, detect_environment,
};
pub use local_override::{OverrideUpdate, update_local_override};
pub use resolver::{CascadeResolver, Resolution, SourceWarning, merge};
pub use runtime::{emit_runtime_artifact, render_runtime_artifact};
pub use source::{ConfigSource, SourceKind, resolve_cascade};
