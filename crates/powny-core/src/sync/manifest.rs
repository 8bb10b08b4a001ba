//! Upload manifests: the difference pushed during a synchronization

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::model::{Rule, RuleSet};

/// How a single rule differs between the remote and the local rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum Change {
    /// Present locally, absent remotely
    Added { content: String, hash: String },
    /// Present on both sides with different content
    Changed {
        previous_hash: String,
        previous_content: String,
        content: String,
        hash: String,
    },
    /// Present remotely, absent locally
    Removed { previous_hash: String },
}

/// One rule's entry in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    pub name: String,
    #[serde(flatten)]
    pub change: Change,
}

impl fmt::Display for ManifestEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.change {
            Change::Added { .. } => '+',
            Change::Changed { .. } => '~',
            Change::Removed { .. } => '-',
        };
        write!(f, "{marker} {}", self.name)
    }
}

/// The rules that differ between the remote and the local rule set, plus
/// the operator's change message. Built per upload attempt and discarded
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadManifest {
    message: String,
    entries: Vec<ManifestEntry>,
}

impl UploadManifest {
    /// Compute the changes that turn `remote` into `local`, in name order.
    pub fn diff(remote: &RuleSet, local: &RuleSet, message: impl Into<String>) -> Self {
        let names: BTreeSet<&str> = remote.names().chain(local.names()).collect();

        let entries = names
            .into_iter()
            .filter_map(|name| {
                let change = match (remote.get(name), local.get(name)) {
                    (None, Some(new)) => Change::Added {
                        content: new.content().to_string(),
                        hash: new.hash().to_string(),
                    },
                    (Some(old), Some(new)) if old.hash() != new.hash() => Change::Changed {
                        previous_hash: old.hash().to_string(),
                        previous_content: old.content().to_string(),
                        content: new.content().to_string(),
                        hash: new.hash().to_string(),
                    },
                    (Some(old), None) => Change::Removed {
                        previous_hash: old.hash().to_string(),
                    },
                    _ => return None,
                };
                Some(ManifestEntry {
                    name: name.to_string(),
                    change,
                })
            })
            .collect();

        Self {
            message: message.into(),
            entries,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Counts of (added, changed, removed) entries
    pub fn counts(&self) -> (usize, usize, usize) {
        self.entries
            .iter()
            .fold((0, 0, 0), |(a, c, r), entry| match entry.change {
                Change::Added { .. } => (a + 1, c, r),
                Change::Changed { .. } => (a, c + 1, r),
                Change::Removed { .. } => (a, c, r + 1),
            })
    }

    /// Apply every entry to `base`, or none of them.
    ///
    /// # Errors
    ///
    /// Returns a description of the first entry that does not fit `base`
    /// (adding an existing rule, changing or removing a rule whose hash
    /// differs). `base` is left untouched.
    pub fn apply(&self, base: &RuleSet) -> std::result::Result<RuleSet, String> {
        let mut rules: BTreeMap<String, Rule> =
            base.iter().map(|r| (r.name().to_string(), r.clone())).collect();

        for entry in &self.entries {
            let current = rules.get(&entry.name).map(|r| r.hash().to_string());
            match &entry.change {
                Change::Added { content, .. } => {
                    if current.is_some() {
                        return Err(format!("{} already exists", entry.name));
                    }
                    rules.insert(entry.name.clone(), Rule::new(&entry.name, content.as_str()));
                }
                Change::Changed {
                    previous_hash,
                    content,
                    ..
                } => {
                    if current.as_deref() != Some(previous_hash.as_str()) {
                        return Err(format!("{} does not match the expected base", entry.name));
                    }
                    rules.insert(entry.name.clone(), Rule::new(&entry.name, content.as_str()));
                }
                Change::Removed { previous_hash } => {
                    if current.as_deref() != Some(previous_hash.as_str()) {
                        return Err(format!("{} does not match the expected base", entry.name));
                    }
                    rules.remove(&entry.name);
                }
            }
        }

        let mut applied = RuleSet::new(None);
        for rule in rules.into_values() {
            applied.insert(rule);
        }
        Ok(applied)
    }
}

/// Names whose hash differs between two `name → hash` snapshots.
pub(crate) fn changed_names(
    before: &BTreeMap<String, String>,
    after: &BTreeMap<String, String>,
) -> Vec<String> {
    before
        .keys()
        .chain(after.keys())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|name| before.get(*name) != after.get(*name))
        .cloned()
        .collect()
}
