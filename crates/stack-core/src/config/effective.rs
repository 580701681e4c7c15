//! The merged configuration for one run

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use super::{Environment, SourceKind};

/// A source that contributed to an [`EffectiveConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedSource {
    pub kind: SourceKind,
    pub path: PathBuf,
    /// Number of assignments read from the file
    pub entries: usize,
}

/// Fully merged, precedence-resolved configuration.
///
/// Keys are unique and iterate in sorted order. Consumers outside this crate
/// only read it; the resolver and validator produce new values rather than
/// handing out mutable access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveConfig {
    environment: Environment,
    values: BTreeMap<String, String>,
    sources: Vec<LoadedSource>,
}

impl EffectiveConfig {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            values: BTreeMap::new(),
            sources: Vec::new(),
        }
    }

    /// Build a configuration directly from pairs, bypassing the cascade.
    pub fn from_pairs<K, V>(environment: Environment, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            environment,
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            sources: Vec::new(),
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn sources(&self) -> &[LoadedSource] {
        &self.sources
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Value of `key` if it is set to something other than whitespace.
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Interpret `key` as a boolean. Only `true`/`false` (any case) count;
    /// aliases are normalized by the validator before services read them.
    pub fn flag(&self, key: &str) -> Option<bool> {
        let value = self.get(key)?.trim();
        if value.eq_ignore_ascii_case("true") {
            Some(true)
        } else if value.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            None
        }
    }

    /// `true` when `key` is explicitly true, `default` when unset.
    pub fn is_enabled(&self, key: &str, default: bool) -> bool {
        self.flag(key).unwrap_or(default)
    }

    /// `true` only when `key` is present and explicitly false.
    pub fn is_explicitly_false(&self, key: &str) -> bool {
        self.flag(key) == Some(false)
    }

    pub fn port(&self, key: &str) -> Option<u16> {
        self.non_empty(key)?.parse().ok().filter(|p| *p != 0)
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Set `key` unless it already has a value. Returns `true` if set.
    pub(crate) fn set_if_absent(&mut self, key: &str, value: impl Into<String>) -> bool {
        if self.contains(key) {
            return false;
        }
        self.values.insert(key.to_string(), value.into());
        true
    }

    pub(crate) fn push_source(&mut self, source: LoadedSource) {
        self.sources.push(source);
    }
}
