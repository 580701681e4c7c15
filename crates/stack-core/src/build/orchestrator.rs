//! Build orchestration
//!
//! A run moves through fixed phases:
//!
//! ```text
//! Init -> Detect -> Validate -> Plan -> Execute(family)... -> Summarize -> Done
//! ```
//!
//! A plan with nothing stale skips straight to Summarize. Families execute
//! in [`ArtifactFamily::ALL`] order; route conflicts are checked right
//! before the proxy configuration is generated.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Utc;
use stack_fs::{ProjectLock, ProjectPath};

use super::generator::{GenerationContext, GenerationOutcome, GeneratorRegistry};
use super::plan::{BuildPlan, StaleReason, plan};
use super::routes::{RouteConflict, RouteFix, find_route_conflicts, plan_route_fixes};
use super::state::{BuildState, BuildStore, FamilyRecord};
use super::summary::{BuildOutcome, BuildSummary, FamilyReport, FamilyStatus, RunKind};
use super::ArtifactFamily;
use crate::Result;
use crate::config::{
    CascadeResolver, DetectedEnvironment, EffectiveConfig, EnvironmentHints, OverrideUpdate,
    SourceWarning, emit_runtime_artifact, update_local_override,
};
use crate::services::{ServiceDetector, ServiceSet};
use crate::validate::{ConfigValidator, ValidationReport, persist_fixes};

/// Key that permits the build to rewrite conflicting routes.
pub const AUTO_FIX_KEY: &str = "AUTO_FIX";

/// Orchestrator state machine phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Init,
    Detect,
    Validate,
    Plan,
    Execute(ArtifactFamily),
    Summarize,
    Done,
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildPhase::Init => write!(f, "init"),
            BuildPhase::Detect => write!(f, "detect"),
            BuildPhase::Validate => write!(f, "validate"),
            BuildPhase::Plan => write!(f, "plan"),
            BuildPhase::Execute(family) => write!(f, "execute({family})"),
            BuildPhase::Summarize => write!(f, "summarize"),
            BuildPhase::Done => write!(f, "done"),
        }
    }
}

/// Parameters of one build.
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    pub project_root: PathBuf,
    /// Identity hint used when no source sets `PROJECT_NAME`
    pub project_name: Option<String>,
    /// Explicitly requested environment
    pub environment: Option<String>,
    /// Environment named by the process (`STACK_ENV`)
    pub process_environment: Option<String>,
    pub force: bool,
    pub verbose: bool,
    /// `Some(false)` disables route auto-fix regardless of `AUTO_FIX`
    pub auto_fix: Option<bool>,
}

impl BuildRequest {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Self::default()
        }
    }

    pub fn hints(&self) -> EnvironmentHints {
        EnvironmentHints {
            explicit: self.environment.clone(),
            process_override: self.process_environment.clone(),
        }
    }

    pub fn resolver(&self) -> CascadeResolver {
        let resolver = CascadeResolver::new(&self.project_root);
        match &self.project_name {
            Some(name) => resolver.with_project_name(name),
            None => resolver,
        }
    }
}

/// Validated configuration and the services detected from it.
#[derive(Debug, Clone)]
pub struct PreparedConfig {
    pub detected: DetectedEnvironment,
    pub config: EffectiveConfig,
    pub report: ValidationReport,
    pub services: ServiceSet,
    pub source_warnings: Vec<SourceWarning>,
    /// Local-override write made for validation fixes
    pub persisted: Option<OverrideUpdate>,
}

/// Drives a build from configuration to generated artifacts.
#[derive(Debug, Clone)]
pub struct BuildOrchestrator {
    registry: GeneratorRegistry,
    validator: ConfigValidator,
    detector: ServiceDetector,
}

impl BuildOrchestrator {
    pub fn new(registry: GeneratorRegistry) -> Self {
        Self {
            registry,
            validator: ConfigValidator::new(),
            detector: ServiceDetector::new(),
        }
    }

    pub fn registry(&self) -> &GeneratorRegistry {
        &self.registry
    }

    fn enter(&self, phase: BuildPhase) {
        tracing::info!(%phase, "Build phase");
    }

    /// Resolve the cascade, validate it, persist fixes and detect services.
    ///
    /// Holds the project lock while fixes may be written to the local
    /// override, so it fails with `ProjectLocked` during a build.
    pub fn prepare(&self, request: &BuildRequest) -> Result<PreparedConfig> {
        let _lock = ProjectLock::acquire(&request.project_root)?;
        self.prepare_unlocked(request)
    }

    /// Caller holds the project lock.
    fn prepare_unlocked(&self, request: &BuildRequest) -> Result<PreparedConfig> {
        self.enter(BuildPhase::Detect);
        let resolution = request.resolver().resolve(&request.hints());

        self.enter(BuildPhase::Validate);
        let validated = self.validator.validate(&resolution.config);
        let persisted = persist_fixes(&request.project_root, &validated.report)?;
        let services = self.detector.detect(&validated.config);

        Ok(PreparedConfig {
            detected: resolution.detected,
            config: validated.config,
            report: validated.report,
            services,
            source_warnings: resolution.warnings,
            persisted,
        })
    }

    /// Prepare and write the runtime artifact.
    fn prepare_and_emit(&self, request: &BuildRequest) -> Result<PreparedConfig> {
        let prepared = self.prepare_unlocked(request)?;
        let root = request.project_root.as_path();
        emit_runtime_artifact(&prepared.config, root, &ProjectPath::RuntimeArtifact.under(root))?;
        Ok(prepared)
    }

    /// Run a full build.
    ///
    /// Errors are returned only for conditions that stop the run before
    /// anything is generated (project locked, unwritable local override).
    /// Generator failures are reported on the outcome instead.
    pub async fn run(&self, request: &BuildRequest) -> Result<BuildOutcome> {
        let root = request.project_root.as_path();

        self.enter(BuildPhase::Init);
        let _lock = ProjectLock::acquire(root)?;
        let store = BuildStore::new(root);
        let prior = store.load();

        let mut prepared = self.prepare_and_emit(request)?;

        self.enter(BuildPhase::Plan);
        let initial_plan = plan(root, &prepared.config, &prepared.services, prior.as_ref(), request.force);
        let mut current_plan = initial_plan.clone();
        let auto_fix = request
            .auto_fix
            .unwrap_or_else(|| prepared.config.is_enabled(AUTO_FIX_KEY, true));

        let mut state = prior.clone().unwrap_or_default();
        let mut reports = Vec::new();
        let mut route_fixes: Vec<RouteFix> = Vec::new();
        let mut unresolved: Vec<RouteConflict> = Vec::new();

        if initial_plan.is_noop() {
            tracing::info!("All artifact families are up to date");
            reports.extend(
                ArtifactFamily::ALL
                    .into_iter()
                    .map(|family| FamilyReport::new(family, FamilyStatus::UpToDate)),
            );
        } else {
            for family in ArtifactFamily::ALL {
                if family.uses_routes() && unresolved.is_empty() {
                    let conflicts = find_route_conflicts(&prepared.services);
                    if !conflicts.is_empty() {
                        if auto_fix {
                            let fixes = self.fix_routes(root, &prepared.services, &conflicts)?;
                            prepared = self.prepare_and_emit(request)?;
                            current_plan = plan(
                                root,
                                &prepared.config,
                                &prepared.services,
                                prior.as_ref(),
                                request.force,
                            );
                            route_fixes.extend(fixes);
                            unresolved = find_route_conflicts(&prepared.services);
                        } else {
                            for conflict in &conflicts {
                                tracing::warn!(
                                    service = %conflict.service,
                                    route = %conflict.route,
                                    conflicts_with = %conflict.conflicts_with,
                                    "Route conflict; auto-fix is disabled"
                                );
                            }
                            unresolved = conflicts;
                        }
                    }
                }

                let Some(family_plan) = current_plan.get(family) else {
                    continue;
                };
                let Some(reason) = family_plan.stale else {
                    reports.push(FamilyReport::new(family, FamilyStatus::UpToDate));
                    continue;
                };
                if !unresolved.is_empty() {
                    reports.push(FamilyReport::new(family, FamilyStatus::NotRun));
                    continue;
                }

                self.enter(BuildPhase::Execute(family));
                let ctx = GenerationContext::new(root, &prepared.config, &prepared.services);
                let (report, outcome) = self.execute(family, reason, &ctx, request.verbose).await;
                if let Some(outcome) = outcome {
                    state.record(
                        family,
                        FamilyRecord {
                            fingerprint: family_plan.fingerprint.clone(),
                            outputs: outcome.outputs(),
                            updated: Utc::now(),
                        },
                    );
                }
                reports.push(report);
            }
        }

        self.enter(BuildPhase::Summarize);
        if prior.as_ref() != Some(&state) && !state.is_empty() {
            store.save(&state)?;
        }

        let summary = BuildSummary {
            run_kind: run_kind(&initial_plan),
            environment: prepared.config.environment(),
            project: prepared.config.get("PROJECT_NAME").unwrap_or_default().to_string(),
            service_counts: prepared.services.count_by_tier(),
            families: reports,
            route_fixes,
            unresolved_conflicts: unresolved,
        };
        tracing::info!(
            run = %summary.run_kind,
            created = summary.created_total(),
            updated = summary.updated_total(),
            "Build summary"
        );

        self.enter(BuildPhase::Done);
        Ok(BuildOutcome {
            summary,
            validation: prepared.report,
            config: prepared.config,
            services: prepared.services,
        })
    }

    /// Reassign conflicting routes and persist them to the local override.
    fn fix_routes(
        &self,
        root: &Path,
        services: &ServiceSet,
        conflicts: &[RouteConflict],
    ) -> Result<Vec<RouteFix>> {
        let fixes = plan_route_fixes(services, conflicts);
        let updates: Vec<(String, String)> = fixes
            .iter()
            .map(|fix| (fix.key.clone(), fix.to.clone()))
            .collect();
        for fix in &fixes {
            tracing::info!(service = %fix.service, from = %fix.from, to = %fix.to, "Reassigned route");
        }
        update_local_override(root, &updates, "route conflict")?;
        Ok(fixes)
    }

    /// Run one family's generator under the command timeout.
    ///
    /// Returns the outcome to record in build state, if any.
    async fn execute(
        &self,
        family: ArtifactFamily,
        reason: StaleReason,
        ctx: &GenerationContext<'_>,
        verbose: bool,
    ) -> (FamilyReport, Option<GenerationOutcome>) {
        let Some(generator) = self.registry.get(family) else {
            tracing::warn!(%family, "No generator registered");
            let status = FamilyStatus::Skipped {
                reason: "no generator registered".to_string(),
            };
            return (FamilyReport::new(family, status), None);
        };

        let result = tokio::time::timeout(ctx.command_timeout, generator.generate(ctx)).await;
        let outcome = match result {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) if e.is_unavailable() => {
                tracing::warn!(%family, error = %e, "Skipping family");
                let status = FamilyStatus::Skipped {
                    reason: e.to_string(),
                };
                return (FamilyReport::new(family, status), None);
            }
            Ok(Err(e)) => return (failed(family, e.to_string()), None),
            Err(_) => {
                let reason = format!("timed out after {}s", ctx.command_timeout.as_secs());
                return (failed(family, reason), None);
            }
        };

        for path in outcome.created.iter().chain(&outcome.updated) {
            if verbose {
                tracing::info!(%family, path = %path.display(), "Wrote");
            } else {
                tracing::debug!(%family, path = %path.display(), "Wrote");
            }
        }

        let status = match &outcome.skipped {
            Some(why) => FamilyStatus::Skipped { reason: why.clone() },
            None => FamilyStatus::Generated { reason },
        };
        let report = FamilyReport {
            family,
            status,
            created: outcome.created.len(),
            updated: outcome.updated.len(),
            notes: outcome.notes.clone(),
        };
        (report, Some(outcome))
    }
}

fn failed(family: ArtifactFamily, reason: String) -> FamilyReport {
    if family.is_required() {
        tracing::error!(%family, %reason, "Required artifact family failed");
    } else {
        tracing::warn!(%family, %reason, "Artifact family failed; continuing");
    }
    FamilyReport::new(family, FamilyStatus::Failed { reason })
}

fn run_kind(plan: &BuildPlan) -> RunKind {
    if plan.first_build {
        RunKind::FirstBuild
    } else if plan.forced {
        RunKind::ForcedRebuild
    } else if plan.is_noop() {
        RunKind::NoOp
    } else {
        RunKind::IncrementalChange
    }
}

/// The build state a project would start its next run from.
pub fn load_build_state(root: &Path) -> Option<BuildState> {
    BuildStore::new(root).load()
}
