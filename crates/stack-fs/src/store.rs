//! TOML document persistence

use std::path::Path;

use serde::{Serialize, de::DeserializeOwned};

use crate::{Error, Result, io};

/// Loads and saves serde types as TOML files.
///
/// Saves go through [`io::write_atomic`] so a reader never observes a
/// half-written document.
#[derive(Debug, Default, Clone, Copy)]
pub struct TomlStore;

impl TomlStore {
    pub fn new() -> Self {
        Self
    }

    /// Load a document, returning `None` when the file does not exist.
    pub fn load_optional<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        if !path.is_file() {
            return Ok(None);
        }
        self.load(path).map(Some)
    }

    /// Load a document from `path`.
    pub fn load<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = io::read_text(path)?;
        toml::from_str(&content).map_err(|e| Error::TomlParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Save `value` to `path` atomically.
    pub fn save<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let content = toml::to_string_pretty(value).map_err(|e| Error::TomlSerialize {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        io::write_atomic(path, content.as_bytes())
    }
}
