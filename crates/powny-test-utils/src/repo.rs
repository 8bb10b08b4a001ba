//! [`RulesRepo`] builder for rule checkout scenarios.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use crate::git;

/// A temporary git checkout holding rule files.
///
/// # Example
///
/// ```rust,no_run
/// use powny_test_utils::repo::RulesRepo;
///
/// let repo = RulesRepo::new();
/// repo.write_rule("a.rule", "v1");
/// repo.commit("add a");
/// ```
pub struct RulesRepo {
    temp_dir: TempDir,
}

impl Default for RulesRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl RulesRepo {
    /// Create a git-initialised temporary directory with no commits.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        git::real_git_repo_with_identity(temp_dir.path());
        Self { temp_dir }
    }

    /// Create a checkout with `rules` written and committed as
    /// "Initial rules".
    pub fn with_rules(rules: &[(&str, &str)]) -> Self {
        let repo = Self::new();
        for (name, content) in rules {
            repo.write_rule(name, content);
        }
        repo.commit("Initial rules");
        repo
    }

    /// Root of the working directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write `content` to `name` (relative, may contain `/`).
    pub fn write_rule(&self, name: &str, content: &str) {
        let path = self.root().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("write_rule: failed to write {}: {e}", path.display()));
    }

    /// Delete the rule file `name`.
    pub fn remove_rule(&self, name: &str) {
        fs::remove_file(self.root().join(name))
            .unwrap_or_else(|e| panic!("remove_rule: failed to remove {name}: {e}"));
    }

    /// Stage everything and commit.
    pub fn commit(&self, message: &str) {
        git::commit_all(self.root(), message);
    }

    /// Assert that `path` (relative to the root) does **not** exist.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }
}
