//! Rules and rule sets
//!
//! A [`Rule`] is identified by its repository-relative path and is immutable:
//! a new version of a rule is a new content hash at the same name. A
//! [`RuleSet`] is a complete snapshot of all rules, ordered by name.

use std::collections::BTreeMap;

use powny_fs::{compute_bytes_checksum, compute_content_checksum};
use serde::{Deserialize, Serialize};

/// A single rule definition file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    name: String,
    content: String,
    hash: String,

    /// Set when the file was not UTF-8; `content` is then a lossy decoding
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    binary: bool,
}

impl Rule {
    /// Create a rule, computing its `sha256:` content hash.
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let hash = compute_content_checksum(&content);
        Self {
            name: name.into(),
            content,
            hash,
            binary: false,
        }
    }

    /// Create a rule from raw file bytes.
    ///
    /// Bytes that are not UTF-8 still yield a rule so that a single bad
    /// file does not hide the rest of the set. Such a rule is hashed over
    /// its raw bytes and reports `false` from [`is_text`](Self::is_text).
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(content) => Self::new(name, content),
            Err(err) => {
                let bytes = err.into_bytes();
                Self {
                    name: name.into(),
                    content: String::from_utf8_lossy(&bytes).into_owned(),
                    hash: compute_bytes_checksum(&bytes),
                    binary: true,
                }
            }
        }
    }

    /// Repository-relative name, e.g. `alerts/disk.rule`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rule source text
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Content hash in `sha256:<hex>` form
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Whether the source file was valid UTF-8
    pub fn is_text(&self) -> bool {
        !self.binary
    }
}

/// A complete snapshot of rules at one point in time.
///
/// Iteration is always in rule-name order, which is what makes manifests
/// and evaluation results deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    version: Option<String>,
    rules: BTreeMap<String, Rule>,
}

impl RuleSet {
    /// An empty rule set with the given version token.
    pub fn new(version: Option<String>) -> Self {
        Self {
            version,
            rules: BTreeMap::new(),
        }
    }

    /// Build a rule set from `(name, content)` pairs.
    pub fn from_contents<N, C>(
        version: Option<String>,
        contents: impl IntoIterator<Item = (N, C)>,
    ) -> Self
    where
        N: Into<String>,
        C: Into<String>,
    {
        let mut set = Self::new(version);
        for (name, content) in contents {
            set.insert(Rule::new(name, content));
        }
        set
    }

    /// Add a rule, replacing any rule with the same name.
    pub fn insert(&mut self, rule: Rule) {
        self.rules.insert(rule.name.clone(), rule);
    }

    /// Version token this snapshot was taken at
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.get(name)
    }

    /// Rules in name order
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Name → content hash, the form used for diffing and sync state.
    pub fn hashes(&self) -> BTreeMap<String, String> {
        self.rules
            .iter()
            .map(|(name, rule)| (name.clone(), rule.hash.clone()))
            .collect()
    }

    /// Whether both sets hold exactly the same rules, ignoring versions.
    pub fn same_rules(&self, other: &RuleSet) -> bool {
        self.rules == other.rules
    }
}
