//! Boolean flag normalization

use super::ValidationReport;
use crate::config::EffectiveConfig;

/// Flags checked in addition to every `*_ENABLED` key.
pub const BOOLEAN_KEYS: &[&str] = &[
    "DEBUG",
    "SEED_DATABASE",
    "LOAD_DEMO_DATA",
    "SSL_AUTO_TRUST",
    "AUTO_FIX",
    "MONITORING_ENABLED",
];

const TRUE_ALIASES: &[&str] = &["1", "yes", "y", "on", "enabled"];
const FALSE_ALIASES: &[&str] = &["0", "no", "n", "off", "disabled"];

/// Every boolean key present in `cfg`, sorted.
pub fn known_boolean_keys(cfg: &EffectiveConfig) -> Vec<String> {
    let mut keys: Vec<String> = cfg
        .iter()
        .map(|(key, _)| key)
        .filter(|key| key.ends_with("_ENABLED") || BOOLEAN_KEYS.contains(key))
        .map(str::to_string)
        .collect();
    keys.sort();
    keys.dedup();
    keys
}

/// Outcome of interpreting one raw flag value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagValue {
    /// `true` / `false` in any case
    Canonical(bool),
    /// A recognized alias such as `yes` or `0`
    Alias(bool),
    Unrecognized,
}

pub fn interpret_flag(raw: &str) -> FlagValue {
    let lowered = raw.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "true" => FlagValue::Canonical(true),
        "false" => FlagValue::Canonical(false),
        v if TRUE_ALIASES.contains(&v) => FlagValue::Alias(true),
        v if FALSE_ALIASES.contains(&v) => FlagValue::Alias(false),
        _ => FlagValue::Unrecognized,
    }
}

/// Normalize boolean keys to lowercase `true` / `false`.
///
/// Case variants are lowercased silently; aliases are recorded as fixes; any
/// other value becomes `false` with a warning.
pub fn validate_booleans(cfg: &mut EffectiveConfig, report: &mut ValidationReport) {
    for key in known_boolean_keys(cfg) {
        let Some(raw) = cfg.get(&key).map(str::to_string) else {
            continue;
        };

        match interpret_flag(&raw) {
            FlagValue::Canonical(value) => {
                let normalized = value.to_string();
                if raw != normalized {
                    cfg.set(key, normalized);
                }
            }
            FlagValue::Alias(value) => {
                report.fix(
                    key.clone(),
                    value.to_string(),
                    format!("'{raw}' normalized to '{value}'"),
                );
                cfg.set(key, value.to_string());
            }
            FlagValue::Unrecognized => {
                report.warning(
                    key.clone(),
                    format!("'{raw}' is not a boolean; treating as false"),
                );
                cfg.set(key, "false");
            }
        }
    }
}
