//! Incremental artifact builds
//!
//! Every generated output belongs to an [`ArtifactFamily`]. A family is
//! regenerated only when its tracked inputs changed, its outputs went
//! missing, or a rebuild was forced; [`BuildState`] remembers what the last
//! successful generation was based on.

mod family;
pub mod generator;
mod orchestrator;
mod plan;
mod routes;
mod state;
mod summary;

pub use family::ArtifactFamily;
pub use generator::{
    ArtifactGenerator, GenerationContext, GenerationOutcome, GeneratorRegistry, command_timeout,
};
pub use orchestrator::{
    AUTO_FIX_KEY, BuildOrchestrator, BuildPhase, BuildRequest, PreparedConfig, load_build_state,
};
pub use plan::{BuildPlan, FamilyPlan, StaleReason, plan};
pub use routes::{RouteConflict, RouteFix, find_route_conflicts, plan_route_fixes};
pub use state::{BuildState, BuildStore, FamilyRecord};
pub use summary::{BuildOutcome, BuildSummary, FamilyReport, FamilyStatus, RunKind};
