//! Conflict-checked synchronization of a local rule set to the remote

use crate::model::RuleSet;
use crate::remote::{RemoteRuleStore, RemoteSnapshot};
use crate::repository::{RuleRepository, is_dirty_version};
use crate::sync::manifest::{UploadManifest, changed_names};
use crate::sync::state::SyncState;
use crate::{Error, Result};

const FALLBACK_MESSAGE: &str = "Rules update";

/// Options for a single upload.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Change message; defaults to the HEAD commit summary
    pub message: Option<String>,

    /// Overwrite remote changes made since the last sync
    pub force: bool,

    /// Compute the manifest without pushing or recording anything
    pub dry_run: bool,
}

/// Outcome of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadReport {
    pub manifest: UploadManifest,

    /// Remote version before the upload
    pub previous_version: String,

    /// Remote version after the upload (unchanged when nothing was pushed)
    pub version: String,

    /// Whether a push was performed
    pub pushed: bool,

    /// Whether a detected conflict was overridden
    pub forced: bool,
}

/// Where the conflict check found its base.
enum SyncBase {
    /// Recorded by a previous upload from this checkout
    Recorded(SyncState),
    /// A commit in history whose rules equal the remote's
    Commit(String),
    /// The remote is empty or already equal to the local rules
    Trivial,
    /// Nothing links this checkout to the remote's state
    Unknown,
}

/// Synchronizes a repository's rule set to a remote store.
///
/// Borrows the repository read-only; the only local write is the sync state
/// record under `.git`.
pub struct Uploader<'a, S: RemoteRuleStore> {
    repo: &'a RuleRepository,
    remote: S,
}

impl<'a, S: RemoteRuleStore> Uploader<'a, S> {
    pub fn new(repo: &'a RuleRepository, remote: S) -> Self {
        Self { repo, remote }
    }

    /// Push `local` to the remote.
    ///
    /// # Errors
    ///
    /// - [`Error::SyncConflict`] when the remote moved since the last sync
    ///   and `force` is not set
    /// - [`Error::VersionConflict`] when another writer pushed between the
    ///   fetch and the push; never retried
    /// - [`Error::InvalidRuleEncoding`] when a local rule file is not UTF-8
    /// - [`Error::Transport`] for network failures
    pub fn upload(&self, local: &RuleSet, options: &UploadOptions) -> Result<UploadReport> {
        if let Some(rule) = local.iter().find(|rule| !rule.is_text()) {
            return Err(Error::InvalidRuleEncoding {
                name: rule.name().to_string(),
            });
        }

        let target = self.remote.describe();
        let message = self.change_message(options)?;

        if is_dirty_version(local.version()) {
            tracing::warn!(
                "uploading uncommitted rule changes; the remote will not match any commit"
            );
        }

        let snapshot = self.remote.fetch()?;
        tracing::info!(remote = %target, version = %snapshot.version, rules = snapshot.rule_set.len(), "fetched remote rules");

        let base = self.find_base(&target, &snapshot, local)?;
        let conflict = self.conflict(&base, &snapshot, local);

        let forced = match conflict {
            Some(err) if !options.force => return Err(err),
            Some(err) => {
                tracing::warn!("{err}; overriding because --force was given");
                true
            }
            None => false,
        };

        let manifest = UploadManifest::diff(&snapshot.rule_set, local, message);
        let (added, changed, removed) = manifest.counts();
        tracing::info!(added, changed, removed, "computed upload manifest");

        if options.dry_run {
            return Ok(UploadReport {
                previous_version: snapshot.version.clone(),
                version: snapshot.version,
                manifest,
                pushed: false,
                forced,
            });
        }

        let pushed = !manifest.is_empty();
        let version = if pushed {
            let version = self.remote.push(&manifest, &snapshot.version)?;
            tracing::info!(from = %snapshot.version, to = %version, "pushed rules");
            version
        } else {
            tracing::info!(version = %snapshot.version, "remote already up to date");
            snapshot.version.clone()
        };

        let head = self.repo.head()?.map(|commit| commit.id);
        SyncState::new(&target, version.clone(), head, local).save(&self.repo.git_dir())?;

        Ok(UploadReport {
            manifest,
            previous_version: snapshot.version,
            version,
            pushed,
            forced,
        })
    }

    fn change_message(&self, options: &UploadOptions) -> Result<String> {
        if let Some(message) = &options.message {
            return Ok(message.clone());
        }
        Ok(self
            .repo
            .head()?
            .map(|commit| commit.message)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_MESSAGE.to_string()))
    }

    fn find_base(
        &self,
        target: &str,
        snapshot: &RemoteSnapshot,
        local: &RuleSet,
    ) -> Result<SyncBase> {
        if let Some(state) = SyncState::load_for(&self.repo.git_dir(), target)? {
            return Ok(SyncBase::Recorded(state));
        }

        if snapshot.rule_set.is_empty() || snapshot.rule_set.same_rules(local) {
            return Ok(SyncBase::Trivial);
        }

        for commit in self.repo.history()? {
            let commit = commit?;
            if self.repo.rule_set_at(&commit.id)?.same_rules(&snapshot.rule_set) {
                tracing::debug!(commit = %commit.short_id(), "remote matches a past commit");
                return Ok(SyncBase::Commit(commit.id));
            }
        }

        Ok(SyncBase::Unknown)
    }

    fn conflict(
        &self,
        base: &SyncBase,
        snapshot: &RemoteSnapshot,
        local: &RuleSet,
    ) -> Option<Error> {
        let remote_hashes = snapshot.rule_set.hashes();
        match base {
            SyncBase::Recorded(state) if state.version != snapshot.version => {
                Some(Error::SyncConflict {
                    local_version: Some(state.version.clone()),
                    remote_version: snapshot.version.clone(),
                    remote_changes: changed_names(&state.rules, &remote_hashes),
                })
            }
            SyncBase::Unknown => Some(Error::SyncConflict {
                local_version: None,
                remote_version: snapshot.version.clone(),
                remote_changes: changed_names(&local.hashes(), &remote_hashes),
            }),
            SyncBase::Commit(commit) => {
                tracing::debug!(%commit, "treating matching commit as last sync");
                None
            }
            SyncBase::Recorded(_) | SyncBase::Trivial => None,
        }
    }
}
