//! Core layer for Stack Builder
//!
//! This crate turns layered `.env` sources into a validated configuration, a
//! concrete service set, and an incremental build of deployment artifacts:
//!
//! - **Configuration cascade**: environment detection, ordered merge, defaults
//! - **Validation**: collected issues, auto-repair, fixes persisted with backups
//! - **Service detection**: core, optional, monitoring, custom and frontend services
//! - **Build orchestration**: staleness planning and per-family regeneration
//!
//! # Architecture
//!
//! ```text
//!          stack-cli
//!              |
//!     +--------+---------+
//!     |                  |
//! stack-core <---- stack-generators
//!     |
//! stack-fs
//! ```
//!
//! # Example
//!
//! ```ignore
//! use stack_core::{BuildOrchestrator, BuildRequest, GeneratorRegistry};
//!
//! async fn example() -> stack_core::Result<i32> {
//!     let orchestrator = BuildOrchestrator::new(GeneratorRegistry::new());
//!     let outcome = orchestrator.run(&BuildRequest::new("/srv/shop")).await?;
//!     Ok(outcome.exit_code())
//! }
//! ```

pub mod backup;
pub mod build;
pub mod config;
pub mod error;
pub mod services;
pub mod validate;

pub use backup::{BackupManager, BackupMetadata, SourceBackup};
pub use build::{
    ArtifactFamily, ArtifactGenerator, BuildOrchestrator, BuildOutcome, BuildPhase, BuildPlan,
    BuildRequest, BuildState, BuildSummary, FamilyStatus, GenerationContext, GenerationOutcome,
    GeneratorRegistry, RouteConflict, RunKind, StaleReason,
};
pub use config::{
    CascadeResolver, EffectiveConfig, Environment, EnvironmentHints, Resolution, SourceKind,
};
pub use error::{Error, Result};
pub use services::{ServiceDescriptor, ServiceDetector, ServiceSet, ServiceTier};
pub use validate::{
    ConfigValidator, IssueKind, Validated, ValidationIssue, ValidationReport, ValidationStatus,
};
