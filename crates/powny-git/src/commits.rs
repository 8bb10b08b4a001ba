//! Commit history extraction from git repositories.

use chrono::{DateTime, TimeZone, Utc};
use git2::{Commit, ErrorCode, Repository, Revwalk};

use crate::Result;

/// Information about a single commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// Full commit id (40 hex characters)
    pub id: String,

    /// First line of the commit message
    pub message: String,

    /// Commit author name
    pub author: String,

    /// Commit timestamp
    pub timestamp: DateTime<Utc>,
}

impl CommitInfo {
    pub(crate) fn from_commit(commit: &Commit<'_>) -> Self {
        let timestamp = Utc
            .timestamp_opt(commit.time().seconds(), 0)
            .single()
            .unwrap_or_default();

        let message = commit
            .message()
            .unwrap_or("")
            .lines()
            .next()
            .unwrap_or("")
            .to_string();

        let author = commit.author().name().unwrap_or("Unknown").to_string();

        Self {
            id: commit.id().to_string(),
            message,
            author,
            timestamp,
        }
    }

    /// Short commit id (7 characters)
    pub fn short_id(&self) -> &str {
        &self.id[..self.id.len().min(7)]
    }
}

/// Lazy walk over the commits reachable from HEAD, most recent first.
///
/// Commits are only looked up as the iterator advances, so callers that stop
/// early never pay for the rest of the history. A repository without any
/// commit yields an empty history.
pub struct History<'repo> {
    repo: &'repo Repository,
    walk: Option<Revwalk<'repo>>,
}

impl<'repo> History<'repo> {
    pub(crate) fn from_head(repo: &'repo Repository) -> Result<Self> {
        match repo.head() {
            Ok(_) => {}
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                return Ok(Self { repo, walk: None });
            }
            Err(e) => return Err(e.into()),
        }

        let mut walk = repo.revwalk()?;
        walk.push_head()?;
        walk.set_sorting(git2::Sort::TIME | git2::Sort::TOPOLOGICAL)?;
        Ok(Self {
            repo,
            walk: Some(walk),
        })
    }
}

impl Iterator for History<'_> {
    type Item = Result<CommitInfo>;

    fn next(&mut self) -> Option<Self::Item> {
        let oid = match self.walk.as_mut()?.next()? {
            Ok(oid) => oid,
            Err(e) => return Some(Err(e.into())),
        };
        Some(
            self.repo
                .find_commit(oid)
                .map(|commit| CommitInfo::from_commit(&commit))
                .map_err(Into::into),
        )
    }
}
