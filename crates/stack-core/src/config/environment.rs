//! Target environment detection

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::envfile;
use crate::Error;

/// Deployment tier the configuration is resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    /// Canonical short name (`dev`, `staging`, `prod`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Staging => "staging",
            Self::Prod => "prod",
        }
    }

    /// Long name used by runtimes that expect `development`/`production`.
    pub fn long_name(&self) -> &'static str {
        match self {
            Self::Dev => "development",
            Self::Staging => "staging",
            Self::Prod => "production",
        }
    }

    /// Map a user-supplied name onto an environment, accepting synonyms.
    pub fn normalize(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dev" | "devel" | "develop" | "development" => Some(Self::Dev),
            "staging" | "stage" => Some(Self::Staging),
            "prod" | "production" => Some(Self::Prod),
            _ => None,
        }
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::normalize(s).ok_or_else(|| Error::InvalidEnvironment {
            value: s.to_string(),
        })
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Environment choices supplied from outside the project files.
///
/// The CLI fills these from its flag and from the `STACK_ENV` process
/// variable; nothing in this crate reads the process environment itself.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentHints {
    /// Value of an explicit `--env` flag
    pub explicit: Option<String>,
    /// Value of the process-level override variable
    pub process_override: Option<String>,
}

impl EnvironmentHints {
    pub fn explicit(value: impl Into<String>) -> Self {
        Self {
            explicit: Some(value.into()),
            process_override: None,
        }
    }
}

/// Where the detected environment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnvironmentOrigin {
    Flag,
    ProcessOverride,
    LocalOverride,
    Default,
}

/// Result of [`detect_environment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DetectedEnvironment {
    pub environment: Environment,
    pub origin: EnvironmentOrigin,
}

/// Determine the target environment.
///
/// Precedence: explicit flag, then the process override, then `ENV` in the
/// local-override file, then `dev`. A level holding an unrecognized name is
/// skipped with a warning.
pub fn detect_environment(hints: &EnvironmentHints, local_override: &Path) -> DetectedEnvironment {
    let candidates = [
        (hints.explicit.clone(), EnvironmentOrigin::Flag),
        (hints.process_override.clone(), EnvironmentOrigin::ProcessOverride),
        (local_override_env(local_override), EnvironmentOrigin::LocalOverride),
    ];

    for (value, origin) in candidates {
        let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        match Environment::normalize(&value) {
            Some(environment) => {
                tracing::debug!(%environment, ?origin, "Detected environment");
                return DetectedEnvironment { environment, origin };
            }
            None => {
                tracing::warn!(value = %value, ?origin, "Ignoring unrecognized environment name");
            }
        }
    }

    DetectedEnvironment {
        environment: Environment::Dev,
        origin: EnvironmentOrigin::Default,
    }
}

fn local_override_env(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    envfile::parse_entries(&content)
        .into_iter()
        .rev()
        .find(|entry| entry.key == "ENV")
        .map(|entry| entry.value)
}
