//! TOML schema of a rule file

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// A parsed rule file, before its conditions are compiled.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RuleDefinition {
    #[serde(default)]
    pub meta: RuleMeta,

    /// Field path → condition. Kept as raw TOML so each condition can be
    /// validated with a precise message.
    #[serde(default, rename = "match")]
    pub conditions: BTreeMap<String, toml::Value>,

    #[serde(default)]
    pub actions: Vec<ActionDefinition>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub(crate) struct RuleMeta {
    pub description: Option<String>,
    pub enabled: bool,
}

impl Default for RuleMeta {
    fn default() -> Self {
        Self {
            description: None,
            enabled: true,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActionDefinition {
    pub kind: String,
    #[serde(flatten)]
    pub params: BTreeMap<String, Value>,
}

/// The table form of a condition: `{ regex = "..." }`, `{ gte = 0.9 }`, ...
///
/// Several keys may be combined; all of them must hold.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct DetailedCondition {
    pub regex: Option<String>,
    pub exists: Option<bool>,
    pub equals: Option<Value>,
    pub gt: Option<f64>,
    pub gte: Option<f64>,
    pub lt: Option<f64>,
    pub lte: Option<f64>,
    pub eq: Option<f64>,
    pub neq: Option<f64>,
}

impl RuleDefinition {
    pub fn parse(source: &str) -> Result<Self, String> {
        toml::from_str(source).map_err(|e| e.message().to_string())
    }
}
