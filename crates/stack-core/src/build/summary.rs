//! Build results

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::{ArtifactFamily, RouteConflict, RouteFix, StaleReason};
use crate::config::{EffectiveConfig, Environment};
use crate::services::{ServiceSet, ServiceTier};
use crate::validate::ValidationReport;

/// Overall character of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunKind {
    FirstBuild,
    ForcedRebuild,
    IncrementalChange,
    NoOp,
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RunKind::FirstBuild => "first build",
            RunKind::ForcedRebuild => "forced rebuild",
            RunKind::IncrementalChange => "incremental change",
            RunKind::NoOp => "no changes",
        };
        write!(f, "{text}")
    }
}

/// What happened to one family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum FamilyStatus {
    /// Not stale; nothing ran
    UpToDate,
    Generated { reason: StaleReason },
    /// Did not run or produced nothing on purpose
    Skipped { reason: String },
    Failed { reason: String },
    /// Stale but not reached because the build stopped early
    NotRun,
}

impl FamilyStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, FamilyStatus::Failed { .. })
    }
}

/// Result line for one family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilyReport {
    pub family: ArtifactFamily,
    pub status: FamilyStatus,
    pub created: usize,
    pub updated: usize,
    pub notes: Vec<String>,
}

impl FamilyReport {
    pub fn new(family: ArtifactFamily, status: FamilyStatus) -> Self {
        Self {
            family,
            status,
            created: 0,
            updated: 0,
            notes: Vec::new(),
        }
    }
}

/// Everything the summary phase reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildSummary {
    pub run_kind: RunKind,
    pub environment: Environment,
    pub project: String,
    pub service_counts: BTreeMap<ServiceTier, usize>,
    pub families: Vec<FamilyReport>,
    pub route_fixes: Vec<RouteFix>,
    /// Conflicts left in place because auto-fix was off
    pub unresolved_conflicts: Vec<RouteConflict>,
}

impl BuildSummary {
    pub fn created_total(&self) -> usize {
        self.families.iter().map(|f| f.created).sum()
    }

    pub fn updated_total(&self) -> usize {
        self.families.iter().map(|f| f.updated).sum()
    }

    pub fn family(&self, family: ArtifactFamily) -> Option<&FamilyReport> {
        self.families.iter().find(|f| f.family == family)
    }

    /// Required families that failed.
    pub fn required_failures(&self) -> impl Iterator<Item = &FamilyReport> {
        self.families
            .iter()
            .filter(|f| f.family.is_required() && f.status.is_failed())
    }

    pub fn succeeded(&self) -> bool {
        self.required_failures().next().is_none() && self.unresolved_conflicts.is_empty()
    }
}

/// Result of a build run.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub summary: BuildSummary,
    pub validation: ValidationReport,
    pub config: EffectiveConfig,
    pub services: ServiceSet,
}

impl BuildOutcome {
    /// 0 on success; 1 when a required family failed or a route conflict
    /// was left unresolved.
    pub fn exit_code(&self) -> i32 {
        if self.summary.succeeded() { 0 } else { 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(families: Vec<FamilyReport>) -> BuildSummary {
        BuildSummary {
            run_kind: RunKind::IncrementalChange,
            environment: Environment::Dev,
            project: "shop".into(),
            service_counts: BTreeMap::new(),
            families,
            route_fixes: Vec::new(),
            unresolved_conflicts: Vec::new(),
        }
    }

    #[test]
    fn optional_failure_still_succeeds() {
        let s = summary(vec![FamilyReport::new(
            ArtifactFamily::TlsMaterial,
            FamilyStatus::Failed { reason: "boom".into() },
        )]);
        assert!(s.succeeded());
    }

    #[test]
    fn required_failure_fails() {
        let s = summary(vec![FamilyReport::new(
            ArtifactFamily::ContainerDescriptor,
            FamilyStatus::Failed { reason: "boom".into() },
        )]);
        assert!(!s.succeeded());
    }

    #[test]
    fn unresolved_conflict_fails() {
        let mut s = summary(Vec::new());
        s.unresolved_conflicts.push(RouteConflict {
            service: "a".into(),
            route: "api".into(),
            conflicts_with: "hasura".into(),
            route_key: Some("CS_1_ROUTE".into()),
        });
        assert!(!s.succeeded());
    }

    #[test]
    fn totals_add_up() {
        let mut a = FamilyReport::new(
            ArtifactFamily::Directories,
            FamilyStatus::Generated { reason: StaleReason::FirstBuild },
        );
        a.created = 3;
        let mut b = FamilyReport::new(
            ArtifactFamily::ProxyConfig,
            FamilyStatus::Generated { reason: StaleReason::InputsChanged },
        );
        b.created = 1;
        b.updated = 2;
        let s = summary(vec![a, b]);
        assert_eq!(s.created_total(), 4);
        assert_eq!(s.updated_total(), 2);
    }
}
