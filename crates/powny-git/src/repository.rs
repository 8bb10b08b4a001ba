//! Read-only handle on a rule repository's git state

use std::collections::BTreeMap;
use std::path::Path;

use git2::{ObjectType, Oid, Repository, TreeWalkMode, TreeWalkResult};
use powny_fs::NormalizedPath;

use crate::commits::{CommitInfo, History};
use crate::{Error, Result};

/// A git working directory holding rule files.
///
/// Only the working directory root is accepted: the path must directly
/// contain `.git`, matching how operators point the tool at a rules checkout.
pub struct GitRepository {
    root: NormalizedPath,
    repo: Repository,
}

impl GitRepository {
    /// Open the working directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotARepository`] when `path` has no `.git` entry or
    /// git refuses to open it, and [`Error::Bare`] for bare repositories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.join(".git").exists() {
            return Err(Error::NotARepository {
                path: path.to_path_buf(),
            });
        }

        let repo = Repository::open(path).map_err(|e| {
            tracing::debug!(path = %path.display(), error = %e, "git refused to open repository");
            Error::NotARepository {
                path: path.to_path_buf(),
            }
        })?;

        let root = match repo.workdir() {
            Some(workdir) => NormalizedPath::canonicalize(workdir)?,
            None => {
                return Err(Error::Bare {
                    path: path.to_path_buf(),
                });
            }
        };

        Ok(Self { root, repo })
    }

    /// Working directory root
    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    /// The `.git` directory
    pub fn git_dir(&self) -> NormalizedPath {
        NormalizedPath::new(self.repo.path())
    }

    /// Commits reachable from HEAD, most recent first.
    pub fn history(&self) -> Result<History<'_>> {
        History::from_head(&self.repo)
    }

    /// The commit HEAD points to, if any.
    pub fn head(&self) -> Result<Option<CommitInfo>> {
        self.history()?.next().transpose()
    }

    /// Whether `relative` (a `/`-separated path under the root) is ignored
    /// by `.gitignore` rules.
    pub fn is_ignored(&self, relative: &str) -> Result<bool> {
        Ok(self.repo.is_path_ignored(Path::new(relative))?)
    }

    /// Contents of every file in the tree of `commit_id` whose
    /// repository-relative path satisfies `filter`.
    pub fn snapshot_at(
        &self,
        commit_id: &str,
        filter: impl Fn(&str) -> bool,
    ) -> Result<BTreeMap<String, Vec<u8>>> {
        let oid = Oid::from_str(commit_id).map_err(|_| Error::CommitNotFound {
            id: commit_id.to_string(),
        })?;
        let commit = self
            .repo
            .find_commit(oid)
            .map_err(|_| Error::CommitNotFound {
                id: commit_id.to_string(),
            })?;
        let tree = commit.tree()?;

        // Collect blob ids first: the walk callback cannot propagate errors
        let mut blobs = Vec::new();
        tree.walk(TreeWalkMode::PreOrder, |dir, entry| {
            if entry.kind() == Some(ObjectType::Blob)
                && let Some(name) = entry.name()
            {
                let path = format!("{dir}{name}");
                if filter(&path) {
                    blobs.push((path, entry.id()));
                }
            }
            TreeWalkResult::Ok
        })?;

        let mut files = BTreeMap::new();
        for (path, id) in blobs {
            let blob = self.repo.find_blob(id)?;
            files.insert(path, blob.content().to_vec());
        }

        tracing::debug!(commit = %commit_id, files = files.len(), "materialized tree snapshot");
        Ok(files)
    }
}
