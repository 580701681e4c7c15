//! [`TestProject`] builder for Stack Builder test scenarios.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Base shared source, read for every environment.
pub const BASE_SHARED: &str = ".env.dev";
pub const STAGING_SHARED: &str = ".env.staging";
pub const PROD_SHARED: &str = ".env.prod";
pub const SECRETS: &str = ".env.secrets";
/// Local override, the only source the tool writes to.
pub const LOCAL_OVERRIDE: &str = ".env";

/// A temporary project directory with helpers for writing configuration
/// sources and asserting on generated files.
///
/// # Example
///
/// ```rust,no_run
/// use stack_test_utils::TestProject;
///
/// let project = TestProject::new()
///     .with_base(&[("PROJECT_NAME", "shop")])
///     .with_local(&[("REDIS_ENABLED", "true")]);
/// project.assert_file_exists(".env");
/// ```
pub struct TestProject {
    temp_dir: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    /// Create an empty project with no configuration sources.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Create an empty project inside a directory named `name`, so the
    /// directory name can act as the project identity hint.
    pub fn named(name: &str) -> (TempDir, PathBuf) {
        let parent = TempDir::new().unwrap();
        let root = parent.path().join(name);
        fs::create_dir_all(&root).unwrap();
        (parent, root)
    }

    /// Return the project root.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Return `relative` resolved against the project root.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Write `pairs` as `KEY=value` lines to the source file `name`,
    /// replacing any previous content.
    pub fn write_env(&self, name: &str, pairs: &[(&str, &str)]) {
        let content: String = pairs
            .iter()
            .map(|(key, value)| format!("{key}={value}\n"))
            .collect();
        self.write_file(name, &content);
    }

    /// Write raw text to `relative`, creating parent directories.
    pub fn write_file(&self, relative: &str, content: &str) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("Could not write {}: {e}", path.display()));
    }

    /// Read `relative` as text.
    ///
    /// # Panics
    /// Panics if the file cannot be read.
    pub fn read(&self, relative: &str) -> String {
        let path = self.path(relative);
        fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", path.display()))
    }

    pub fn with_base(self, pairs: &[(&str, &str)]) -> Self {
        self.write_env(BASE_SHARED, pairs);
        self
    }

    pub fn with_staging(self, pairs: &[(&str, &str)]) -> Self {
        self.write_env(STAGING_SHARED, pairs);
        self
    }

    pub fn with_prod(self, pairs: &[(&str, &str)]) -> Self {
        self.write_env(PROD_SHARED, pairs);
        self
    }

    pub fn with_secrets(self, pairs: &[(&str, &str)]) -> Self {
        self.write_env(SECRETS, pairs);
        self
    }

    pub fn with_local(self, pairs: &[(&str, &str)]) -> Self {
        self.write_env(LOCAL_OVERRIDE, pairs);
        self
    }

    /// Write a scaffold template file under `templates/<kind>/`.
    pub fn with_template(self, kind: &str, file: &str, content: &str) -> Self {
        self.write_file(&format!("templates/{kind}/{file}"), content);
        self
    }

    /// Assert that `path` (relative to the project root) exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.path(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `path` (relative to the project root) does **not** exist.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.path(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }

    /// Assert that the file at `path` (relative to root) contains `content`.
    ///
    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, path: &str, content: &str) {
        let file_content = self.read(path);
        assert!(
            file_content.contains(content),
            "File {path} does not contain expected content.\nExpected: {content}\nActual: {file_content}"
        );
    }

    /// Number of backup snapshots taken so far.
    pub fn backup_count(&self) -> usize {
        fs::read_dir(self.path(".stack/backups"))
            .map(|entries| entries.filter_map(Result::ok).filter(|e| e.path().is_dir()).count())
            .unwrap_or(0)
    }
}
