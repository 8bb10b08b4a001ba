use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::model::{Rule, RuleSet};
use crate::remote::{RemoteRuleStore, RemoteSnapshot};
use crate::sync::UploadManifest;
use crate::{Error, Result};

#[derive(Debug, Default)]
struct StoreState {
    generation: u64,
    rules: RuleSet,
    messages: Vec<String>,
}

impl StoreState {
    fn version(&self) -> String {
        format!("v{}", self.generation)
    }
}

/// An in-process rule store with the same optimistic-concurrency contract
/// as the cluster: pushes name a base version and are applied all at once
/// or not at all.
#[derive(Debug)]
pub struct MemoryRuleStore {
    name: String,
    state: Mutex<StoreState>,
}

impl Default for MemoryRuleStore {
    fn default() -> Self {
        Self {
            name: "memory".to_string(),
            state: Mutex::default(),
        }
    }
}

impl MemoryRuleStore {
    /// An empty store at version `v0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store already holding `rules`, at version `v0`.
    pub fn with_rules<N, C>(rules: impl IntoIterator<Item = (N, C)>) -> Self
    where
        N: Into<String>,
        C: Into<String>,
    {
        Self {
            state: Mutex::new(StoreState {
                rules: RuleSet::from_contents(None, rules),
                ..StoreState::default()
            }),
            ..Self::default()
        }
    }

    /// Rename the store; the name is what [`describe`](RemoteRuleStore::describe)
    /// reports.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current version token
    pub fn version(&self) -> String {
        self.lock().version()
    }

    /// Number of pushes applied so far
    pub fn pushes(&self) -> usize {
        self.lock().messages.len()
    }

    /// Change messages of applied pushes, oldest first
    pub fn messages(&self) -> Vec<String> {
        self.lock().messages.clone()
    }

    /// Overwrite a rule as if another client had pushed it.
    pub fn put_rule(&self, name: &str, content: &str) -> String {
        let mut state = self.lock();
        state.rules.insert(Rule::new(name, content));
        state.generation += 1;
        state.messages.push(format!("external update of {name}"));
        state.version()
    }
}

impl RemoteRuleStore for MemoryRuleStore {
    fn fetch(&self) -> Result<RemoteSnapshot> {
        let state = self.lock();
        let version = state.version();
        Ok(RemoteSnapshot {
            rule_set: state.rules.clone().with_version(Some(version.clone())),
            version,
        })
    }

    fn push(&self, manifest: &UploadManifest, base_version: &str) -> Result<String> {
        let mut state = self.lock();
        let current = state.version();
        if current != base_version {
            return Err(Error::VersionConflict {
                expected: base_version.to_string(),
                actual: Some(current),
            });
        }

        let applied = manifest.apply(&state.rules).map_err(|reason| Error::Transport {
            operation: "push".into(),
            target: self.name.clone(),
            reason: format!("rejected: {reason}"),
        })?;

        state.rules = applied;
        state.generation += 1;
        state.messages.push(manifest.message().to_string());
        tracing::debug!(version = %state.version(), entries = manifest.len(), "memory store accepted push");
        Ok(state.version())
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn local(rules: &[(&str, &str)]) -> RuleSet {
        RuleSet::from_contents(None, rules.iter().copied())
    }

    #[test]
    fn empty_store_starts_at_v0() {
        let store = MemoryRuleStore::new();
        let snapshot = store.fetch().unwrap();

        assert_eq!(snapshot.version, "v0");
        assert!(snapshot.rule_set.is_empty());
        assert_eq!(snapshot.rule_set.version(), Some("v0"));
    }

    #[test]
    fn push_bumps_version_and_applies() {
        let store = MemoryRuleStore::with_rules([("a.rule", "v1")]);
        let snapshot = store.fetch().unwrap();
        let manifest =
            UploadManifest::diff(&snapshot.rule_set, &local(&[("a.rule", "v2")]), "bump");

        let version = store.push(&manifest, &snapshot.version).unwrap();

        assert_eq!(version, "v1");
        assert_eq!(store.fetch().unwrap().rule_set.get("a.rule").unwrap().content(), "v2");
        assert_eq!(store.messages(), vec!["bump"]);
    }

    #[test]
    fn stale_base_is_a_version_conflict() {
        let store = MemoryRuleStore::with_rules([("a.rule", "v1")]);
        let snapshot = store.fetch().unwrap();
        store.put_rule("b.rule", "other");

        let manifest =
            UploadManifest::diff(&snapshot.rule_set, &local(&[("a.rule", "v2")]), "late");
        let err = store.push(&manifest, &snapshot.version).unwrap_err();

        match err {
            Error::VersionConflict { expected, actual } => {
                assert_eq!(expected, "v0");
                assert_eq!(actual.as_deref(), Some("v1"));
            }
            other => panic!("expected VersionConflict, got {other:?}"),
        }
        assert_eq!(store.fetch().unwrap().rule_set.get("a.rule").unwrap().content(), "v1");
    }

    #[test]
    fn invalid_manifest_applies_nothing() {
        let store = MemoryRuleStore::with_rules([("a.rule", "v1")]);
        let bogus_base = local(&[("a.rule", "v1"), ("ghost.rule", "x")]);
        let manifest = UploadManifest::diff(&bogus_base, &local(&[("a.rule", "v9")]), "bad");

        let err = store.push(&manifest, "v0").unwrap_err();

        assert!(matches!(err, Error::Transport { .. }));
        assert_eq!(store.version(), "v0");
        assert_eq!(store.pushes(), 0);
        assert_eq!(store.fetch().unwrap().rule_set.get("a.rule").unwrap().content(), "v1");
    }
}
