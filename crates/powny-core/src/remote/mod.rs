//! The seam between synchronization and the cluster's rule store
//!
//! The HTTP implementation lives in `powny-api`; [`MemoryRuleStore`] is an
//! in-process implementation for tests and offline rehearsals.

mod memory;

pub use memory::MemoryRuleStore;

use crate::Result;
use crate::model::RuleSet;
use crate::sync::UploadManifest;

/// The remote's current rule set together with its version token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSnapshot {
    pub rule_set: RuleSet,
    pub version: String,
}

/// The cluster's authoritative, optimistically-versioned rule store.
///
/// Implementations perform exactly one remote call per method and never
/// retry: a blind retry of a push is unsafe.
pub trait RemoteRuleStore {
    /// Fetch the current rule set and version token.
    fn fetch(&self) -> Result<RemoteSnapshot>;

    /// Apply `manifest` atomically on top of `base_version` and return the
    /// new version token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionConflict`](crate::Error::VersionConflict) when
    /// `base_version` is stale. Nothing is applied in that case.
    fn push(&self, manifest: &UploadManifest, base_version: &str) -> Result<String>;

    /// Human-readable target for log lines and error messages.
    fn describe(&self) -> String;
}

impl<T: RemoteRuleStore + ?Sized> RemoteRuleStore for &T {
    fn fetch(&self) -> Result<RemoteSnapshot> {
        (**self).fetch()
    }

    fn push(&self, manifest: &UploadManifest, base_version: &str) -> Result<String> {
        (**self).push(manifest, base_version)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
