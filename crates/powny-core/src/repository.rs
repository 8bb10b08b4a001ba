//! The local, version-controlled rule checkout
//!
//! [`RuleRepository`] owns the on-disk rule files and their git history.
//! Synchronization and evaluation only ever borrow read-only views of it.

use std::path::Path;

use powny_fs::NormalizedPath;
use powny_git::{CommitInfo, GitRepository, History};
use walkdir::WalkDir;

use crate::model::{Rule, RuleSet};
use crate::{Error, Result};

/// Extension identifying rule files when none is configured
pub const DEFAULT_RULE_EXTENSION: &str = "rule";

/// Appended to the HEAD commit id when rule files differ from HEAD
pub const DIRTY_SUFFIX: &str = "-dirty";

/// A git working directory holding rule files.
pub struct RuleRepository {
    git: GitRepository,
    extension: String,
}

impl RuleRepository {
    /// Open the checkout at `path` using the default `.rule` extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotARepository`] when `path` is not a git working
    /// directory root. No other operation is attempted in that case.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_extension(path, DEFAULT_RULE_EXTENSION)
    }

    /// Open the checkout at `path`, treating files ending in `.{extension}`
    /// as rules.
    pub fn open_with_extension(path: impl AsRef<Path>, extension: &str) -> Result<Self> {
        let path = path.as_ref();
        let git = GitRepository::open(path).map_err(|e| match e {
            powny_git::Error::NotARepository { path } | powny_git::Error::Bare { path } => {
                Error::NotARepository { path }
            }
            other => Error::Git(other),
        })?;

        tracing::debug!(root = %git.root(), extension, "opened rule repository");
        Ok(Self {
            git,
            extension: extension.trim_start_matches('.').to_string(),
        })
    }

    /// Working directory root
    pub fn root(&self) -> &NormalizedPath {
        self.git.root()
    }

    /// The `.git` directory, where local sync bookkeeping lives
    pub fn git_dir(&self) -> NormalizedPath {
        self.git.git_dir()
    }

    fn is_rule_name(&self, name: &str) -> bool {
        NormalizedPath::new(name).extension() == Some(self.extension.as_str())
    }

    /// Materialize the rule set from the working directory's current files.
    ///
    /// Skips `.git` and anything ignored by `.gitignore`. The version token
    /// is the HEAD commit id, suffixed with [`DIRTY_SUFFIX`] when the files
    /// differ from what HEAD records.
    pub fn current_rule_set(&self) -> Result<RuleSet> {
        let root = self.root().clone();
        let mut rule_set = RuleSet::new(None);

        let walker = WalkDir::new(root.to_native())
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.file_name() != ".git");

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                let source = e
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
                powny_fs::Error::io(path, source)
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let name = NormalizedPath::new(entry.path()).relative_to(&root)?;
            if !self.is_rule_name(&name) || self.git.is_ignored(&name)? {
                continue;
            }

            let bytes =
                std::fs::read(entry.path()).map_err(|e| powny_fs::Error::io(entry.path(), e))?;
            rule_set.insert(Rule::from_bytes(name, bytes));
        }

        let version = match self.git.head()? {
            Some(head) => {
                let committed = self.rule_set_at(&head.id)?;
                if committed.same_rules(&rule_set) {
                    Some(head.id)
                } else {
                    Some(format!("{}{DIRTY_SUFFIX}", head.id))
                }
            }
            None => None,
        };

        tracing::debug!(rules = rule_set.len(), version = ?version, "materialized working rule set");
        Ok(rule_set.with_version(version))
    }

    /// The rule set recorded in `commit_id`.
    pub fn rule_set_at(&self, commit_id: &str) -> Result<RuleSet> {
        let files = self
            .git
            .snapshot_at(commit_id, |name| self.is_rule_name(name))?;

        let mut rule_set = RuleSet::new(Some(commit_id.to_string()));
        for (name, bytes) in files {
            rule_set.insert(Rule::from_bytes(name, bytes));
        }
        Ok(rule_set)
    }

    /// Past commits, most recent first. Lazy and finite.
    pub fn history(&self) -> Result<History<'_>> {
        Ok(self.git.history()?)
    }

    /// The latest commit, if the checkout has any.
    pub fn head(&self) -> Result<Option<CommitInfo>> {
        Ok(self.git.head()?)
    }
}

/// Whether `version` marks a working copy with uncommitted rule edits.
pub fn is_dirty_version(version: Option<&str>) -> bool {
    version.is_some_and(|v| v.ends_with(DIRTY_SUFFIX))
}
