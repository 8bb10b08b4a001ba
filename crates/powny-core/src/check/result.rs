use serde::Serialize;

use crate::Result;
use crate::check::dispatch::Action;
use crate::model::Event;

/// A rule that could not be parsed or compiled.
///
/// Reported alongside the results of the rules that did load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("Rule {rule} failed to load: {reason}")]
pub struct RuleLoadError {
    pub rule: String,
    pub reason: String,
}

/// A rule whose conditions matched, and what it would emit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleMatch {
    pub rule: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub actions: Vec<Action>,
}

/// Outcome of evaluating one event against a rule set.
///
/// Every list is in rule-name order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub event: Event,
    pub matched: Vec<RuleMatch>,
    pub unmatched: Vec<String>,
    /// Disabled rules
    pub skipped: Vec<String>,
    pub errors: Vec<RuleLoadError>,
}

impl ExecutionResult {
    pub(crate) fn new(event: Event) -> Self {
        Self {
            event,
            matched: Vec::new(),
            unmatched: Vec::new(),
            skipped: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn matched_names(&self) -> impl Iterator<Item = &str> {
        self.matched.iter().map(|m| m.rule.as_str())
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
