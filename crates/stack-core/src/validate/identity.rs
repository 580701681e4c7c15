//! Project identity and base domain checks

use super::ValidationReport;
use crate::config::EffectiveConfig;

pub const IDENTITY_KEY: &str = "PROJECT_NAME";
pub const DOMAIN_KEY: &str = "BASE_DOMAIN";

/// Identity used when a requested one cannot be repaired.
pub const FALLBACK_IDENTITY: &str = "myproject";

pub const MIN_IDENTITY_LEN: usize = 2;
pub const MAX_IDENTITY_LEN: usize = 30;

/// Lowercase alphanumerics and hyphens, 2..=30 chars, alphanumeric at both ends.
pub fn is_valid_identity(value: &str) -> bool {
    let len = value.len();
    if !(MIN_IDENTITY_LEN..=MAX_IDENTITY_LEN).contains(&len) {
        return false;
    }
    let allowed = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    value.chars().all(|c| allowed(c) || c == '-')
        && value.starts_with(allowed)
        && value.ends_with(allowed)
}

/// Repair `raw` into a valid identity.
///
/// Steps: lowercase, replace disallowed characters with `-`, collapse and
/// trim hyphens, pad when too short, truncate when too long. Returns `None`
/// when nothing usable is left. A valid identity is returned unchanged.
pub fn repair_identity(raw: &str) -> Option<String> {
    let lowered = raw.trim().to_lowercase();
    let replaced: String = lowered
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                '-'
            }
        })
        .collect();

    let mut collapsed = String::with_capacity(replaced.len());
    for c in replaced.chars() {
        if c == '-' && collapsed.ends_with('-') {
            continue;
        }
        collapsed.push(c);
    }
    let mut repaired = collapsed.trim_matches('-').to_string();

    if repaired.is_empty() {
        return None;
    }
    if repaired.len() < MIN_IDENTITY_LEN {
        repaired.push_str("-app");
    }
    if repaired.len() > MAX_IDENTITY_LEN {
        repaired.truncate(MAX_IDENTITY_LEN);
        repaired = repaired.trim_end_matches('-').to_string();
    }

    is_valid_identity(&repaired).then_some(repaired)
}

/// Check `PROJECT_NAME` and repair it when invalid.
pub fn validate_identity(cfg: &mut EffectiveConfig, report: &mut ValidationReport) {
    let current = cfg.get(IDENTITY_KEY).unwrap_or_default().to_string();
    if is_valid_identity(&current) {
        return;
    }

    match repair_identity(&current) {
        Some(repaired) => {
            report.fix(
                IDENTITY_KEY,
                repaired.clone(),
                format!("project name '{current}' repaired to '{repaired}'"),
            );
            cfg.set(IDENTITY_KEY, repaired);
        }
        None => {
            report.warning(
                IDENTITY_KEY,
                format!(
                    "project name '{current}' cannot be repaired; using '{FALLBACK_IDENTITY}' instead"
                ),
            );
            report.fix(
                IDENTITY_KEY,
                FALLBACK_IDENTITY,
                format!("project name replaced with '{FALLBACK_IDENTITY}'"),
            );
            cfg.set(IDENTITY_KEY, FALLBACK_IDENTITY);
        }
    }
}

/// Strip whitespace from `BASE_DOMAIN`.
pub fn validate_domain(cfg: &mut EffectiveConfig, report: &mut ValidationReport) {
    let Some(current) = cfg.get(DOMAIN_KEY).map(str::to_string) else {
        return;
    };
    let stripped: String = current.chars().filter(|c| !c.is_whitespace()).collect();
    let fixed = if stripped.is_empty() {
        "localhost".to_string()
    } else {
        stripped
    };

    if fixed != current {
        report.fix(
            DOMAIN_KEY,
            fixed.clone(),
            format!("base domain '{current}' normalized to '{fixed}'"),
        );
        cfg.set(DOMAIN_KEY, fixed);
    }
}
