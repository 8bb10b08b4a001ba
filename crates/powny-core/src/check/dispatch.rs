//! Where matched rules send their actions

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::Result;

/// An action a matching rule emits, with parameters already interpolated
/// from the event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Action {
    pub kind: String,
    pub params: BTreeMap<String, Value>,
}

/// Receives the actions of matching rules.
///
/// Local checks use [`RecordingDispatcher`]; forwarding to the cluster is a
/// separate implementation that local checks never use.
pub trait ActionDispatcher {
    fn dispatch(&mut self, rule: &str, action: &Action) -> Result<()>;
}

/// One dispatched action and the rule that emitted it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchRecord {
    pub rule: String,
    pub action: Action,
}

/// Records actions in memory instead of performing them.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    records: Vec<DispatchRecord>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[DispatchRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<DispatchRecord> {
        self.records
    }
}

impl ActionDispatcher for RecordingDispatcher {
    fn dispatch(&mut self, rule: &str, action: &Action) -> Result<()> {
        tracing::debug!(rule, kind = %action.kind, "recorded action");
        self.records.push(DispatchRecord {
            rule: rule.to_string(),
            action: action.clone(),
        });
        Ok(())
    }
}
