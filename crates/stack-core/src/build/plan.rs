//! Staleness planning

use std::fmt;
use std::path::Path;

use serde::Serialize;
use stack_fs::ProjectPath;

use super::{ArtifactFamily, BuildState};
use crate::config::EffectiveConfig;
use crate::services::ServiceSet;

/// Why a family has to be regenerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StaleReason {
    /// Nothing was ever generated in this project
    FirstBuild,
    /// The caller asked for a full rebuild
    Forced,
    /// No record for the family, or a recorded output is gone
    Absent,
    /// The tracked inputs differ from the recorded fingerprint
    InputsChanged,
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StaleReason::FirstBuild => "first build",
            StaleReason::Forced => "forced",
            StaleReason::Absent => "outputs missing",
            StaleReason::InputsChanged => "inputs changed",
        };
        write!(f, "{text}")
    }
}

/// Planning decision for one family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilyPlan {
    pub family: ArtifactFamily,
    pub fingerprint: String,
    /// `None` when the family is up to date
    pub stale: Option<StaleReason>,
}

impl FamilyPlan {
    pub fn is_stale(&self) -> bool {
        self.stale.is_some()
    }
}

/// Per-family staleness for one run, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    pub families: Vec<FamilyPlan>,
    pub first_build: bool,
    pub forced: bool,
}

impl BuildPlan {
    pub fn get(&self, family: ArtifactFamily) -> Option<&FamilyPlan> {
        self.families.iter().find(|p| p.family == family)
    }

    pub fn stale(&self) -> impl Iterator<Item = &FamilyPlan> {
        self.families.iter().filter(|p| p.is_stale())
    }

    pub fn stale_count(&self) -> usize {
        self.stale().count()
    }

    pub fn is_noop(&self) -> bool {
        self.stale_count() == 0
    }
}

/// Decide which families need regeneration.
///
/// A project with no prior state and no container descriptor on disk is a
/// first build and every family is stale.
pub fn plan(
    root: &Path,
    cfg: &EffectiveConfig,
    services: &ServiceSet,
    prior: Option<&BuildState>,
    force: bool,
) -> BuildPlan {
    let first_build = prior.is_none_or(BuildState::is_empty)
        && !ProjectPath::ContainerDescriptor.under(root).exists();

    let families = ArtifactFamily::ALL
        .into_iter()
        .map(|family| {
            let fingerprint = family.fingerprint(root, cfg, services);
            let record = prior.and_then(|state| state.get(family));

            let stale = if first_build {
                Some(StaleReason::FirstBuild)
            } else if force {
                Some(StaleReason::Forced)
            } else {
                match record {
                    None => Some(StaleReason::Absent),
                    Some(rec) if !rec.missing_outputs(root).is_empty() => Some(StaleReason::Absent),
                    Some(rec) if rec.fingerprint != fingerprint => Some(StaleReason::InputsChanged),
                    Some(_) => None,
                }
            };

            if let Some(reason) = stale {
                tracing::debug!(family = %family, %reason, "Family is stale");
            }
            FamilyPlan {
                family,
                fingerprint,
                stale,
            }
        })
        .collect();

    BuildPlan {
        families,
        first_build,
        forced: force,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::FamilyRecord;
    use crate::config::Environment;
    use crate::services::ServiceDetector;
    use chrono::Utc;
    use std::fs;
    use tempfile::TempDir;

    fn inputs(pairs: &[(&str, &str)]) -> (EffectiveConfig, ServiceSet) {
        let cfg = EffectiveConfig::from_pairs(Environment::Dev, pairs.iter().copied());
        let services = ServiceDetector::new().detect(&cfg);
        (cfg, services)
    }

    fn state_for(root: &Path, cfg: &EffectiveConfig, services: &ServiceSet) -> BuildState {
        let mut state = BuildState::new();
        for family in ArtifactFamily::ALL {
            state.record(
                family,
                FamilyRecord {
                    fingerprint: family.fingerprint(root, cfg, services),
                    outputs: Vec::new(),
                    updated: Utc::now(),
                },
            );
        }
        state
    }

    #[test]
    fn empty_project_is_first_build() {
        let temp = TempDir::new().unwrap();
        let (cfg, services) = inputs(&[]);
        let plan = plan(temp.path(), &cfg, &services, None, false);

        assert!(plan.first_build);
        assert_eq!(plan.stale_count(), ArtifactFamily::ALL.len());
        assert!(plan.stale().all(|p| p.stale == Some(StaleReason::FirstBuild)));
    }

    #[test]
    fn unchanged_inputs_plan_nothing() {
        let temp = TempDir::new().unwrap();
        let (cfg, services) = inputs(&[("PROJECT_NAME", "shop")]);
        let state = state_for(temp.path(), &cfg, &services);

        let plan = plan(temp.path(), &cfg, &services, Some(&state), false);
        assert!(plan.is_noop());
        assert!(!plan.first_build);
    }

    #[test]
    fn force_marks_everything() {
        let temp = TempDir::new().unwrap();
        let (cfg, services) = inputs(&[]);
        let state = state_for(temp.path(), &cfg, &services);

        let plan = plan(temp.path(), &cfg, &services, Some(&state), true);
        assert!(plan.stale().all(|p| p.stale == Some(StaleReason::Forced)));
        assert_eq!(plan.stale_count(), 6);
    }

    #[test]
    fn changed_input_marks_only_dependents() {
        let temp = TempDir::new().unwrap();
        let (cfg, services) = inputs(&[("SSL_MODE", "self-signed")]);
        let state = state_for(temp.path(), &cfg, &services);

        let (cfg, services) = inputs(&[("SSL_MODE", "letsencrypt")]);
        let plan = plan(temp.path(), &cfg, &services, Some(&state), false);
        let stale: Vec<ArtifactFamily> = plan.stale().map(|p| p.family).collect();
        assert_eq!(stale, vec![ArtifactFamily::TlsMaterial, ArtifactFamily::ProxyConfig]);
        assert_eq!(
            plan.get(ArtifactFamily::TlsMaterial).unwrap().stale,
            Some(StaleReason::InputsChanged)
        );
    }

    #[test]
    fn deleted_output_is_absent() {
        let temp = TempDir::new().unwrap();
        let (cfg, services) = inputs(&[]);
        let mut state = state_for(temp.path(), &cfg, &services);
        state.record(
            ArtifactFamily::ContainerDescriptor,
            FamilyRecord {
                fingerprint: ArtifactFamily::ContainerDescriptor.fingerprint(temp.path(), &cfg, &services),
                outputs: vec!["docker-compose.yml".into()],
                updated: Utc::now(),
            },
        );

        let plan = plan(temp.path(), &cfg, &services, Some(&state), false);
        assert_eq!(
            plan.get(ArtifactFamily::ContainerDescriptor).unwrap().stale,
            Some(StaleReason::Absent)
        );
        assert_eq!(plan.stale_count(), 1);
    }

    #[test]
    fn existing_outputs_without_state_are_not_first_build() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("docker-compose.yml"), "services: {}\n").unwrap();
        let (cfg, services) = inputs(&[]);

        let plan = plan(temp.path(), &cfg, &services, None, false);
        assert!(!plan.first_build);
        assert!(plan.stale().all(|p| p.stale == Some(StaleReason::Absent)));
    }

    #[test]
    fn added_template_restales_scaffolds() {
        let temp = TempDir::new().unwrap();
        let (cfg, services) = inputs(&[("CS_1", "site:static")]);
        let state = state_for(temp.path(), &cfg, &services);
        fs::write(temp.path().join("docker-compose.yml"), "").unwrap();
        assert!(plan(temp.path(), &cfg, &services, Some(&state), false).is_noop());

        fs::create_dir_all(temp.path().join("templates/static")).unwrap();
        let plan = plan(temp.path(), &cfg, &services, Some(&state), false);
        let stale: Vec<ArtifactFamily> = plan.stale().map(|p| p.family).collect();
        assert_eq!(stale, vec![ArtifactFamily::ServiceScaffolds]);
    }
}
