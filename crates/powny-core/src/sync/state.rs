//! Local record of the last successful synchronization

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use powny_fs::{ConfigStore, NormalizedPath};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::model::RuleSet;

const STATE_DIR: &str = "powny";
const STATE_FILE: &str = "sync-state.json";

/// What the remote looked like the last time this checkout synchronized.
///
/// Stored under the repository's `.git` directory so the working tree is
/// never touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    /// The remote this record belongs to, as given by
    /// [`RemoteRuleStore::describe`](crate::RemoteRuleStore::describe)
    #[serde(default)]
    pub remote: String,

    /// Remote version token after the last sync
    pub version: String,

    /// HEAD commit at the time of the sync, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,

    pub synced_at: DateTime<Utc>,

    /// Rule name → content hash as synchronized
    #[serde(default)]
    pub rules: BTreeMap<String, String>,
}

impl SyncState {
    pub fn new(
        remote: impl Into<String>,
        version: impl Into<String>,
        commit: Option<String>,
        rules: &RuleSet,
    ) -> Self {
        Self {
            remote: remote.into(),
            version: version.into(),
            commit,
            synced_at: Utc::now(),
            rules: rules.hashes(),
        }
    }

    /// Location of the state file inside `git_dir`
    pub fn path_in(git_dir: &NormalizedPath) -> NormalizedPath {
        git_dir.join(STATE_DIR).join(STATE_FILE)
    }

    /// Load the recorded state, or `None` if this checkout never synced.
    pub fn load(git_dir: &NormalizedPath) -> Result<Option<Self>> {
        let path = Self::path_in(git_dir);
        if !path.exists() {
            return Ok(None);
        }
        let state: Self = ConfigStore::new().load(&path)?;
        Ok(Some(state))
    }

    /// Load the recorded state if it was written for `remote`.
    ///
    /// A version token only means something to the remote that issued it, so
    /// a record made against another remote is treated as absent.
    pub fn load_for(git_dir: &NormalizedPath, remote: &str) -> Result<Option<Self>> {
        Ok(Self::load(git_dir)?.filter(|state| {
            let same = state.remote == remote;
            if !same {
                tracing::debug!(recorded = %state.remote, remote, "ignoring sync state of another remote");
            }
            same
        }))
    }

    /// Persist atomically.
    pub fn save(&self, git_dir: &NormalizedPath) -> Result<()> {
        let path = Self::path_in(git_dir);
        ConfigStore::new().save(&path, self)?;
        tracing::debug!(path = %path, version = %self.version, "recorded sync state");
        Ok(())
    }
}
