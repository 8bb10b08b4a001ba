//! Local rule evaluation

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::Result;
use crate::check::definition::{ActionDefinition, RuleDefinition};
use crate::check::dispatch::{Action, ActionDispatcher};
use crate::check::matcher::Condition;
use crate::check::result::{ExecutionResult, RuleLoadError, RuleMatch};
use crate::model::{Event, Rule, RuleSet};

/// `{{ path }}` placeholders in action parameters
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([^{}\s]+)\s*\}\}").unwrap());

#[derive(Debug)]
struct CompiledRule {
    name: String,
    description: Option<String>,
    enabled: bool,
    conditions: Vec<Condition>,
    actions: Vec<ActionDefinition>,
}

impl CompiledRule {
    fn compile(rule: &Rule) -> std::result::Result<Self, RuleLoadError> {
        let load_error = |reason: String| RuleLoadError {
            rule: rule.name().to_string(),
            reason,
        };

        if !rule.is_text() {
            return Err(load_error("rule file is not valid UTF-8".to_string()));
        }
        let definition = RuleDefinition::parse(rule.content()).map_err(load_error)?;
        let conditions = definition
            .conditions
            .iter()
            .map(|(path, raw)| Condition::compile(path, raw))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(load_error)?;

        Ok(Self {
            name: rule.name().to_string(),
            description: definition.meta.description,
            enabled: definition.meta.enabled,
            conditions,
            actions: definition.actions,
        })
    }

    fn matches(&self, event: &Event) -> bool {
        self.conditions.iter().all(|condition| condition.matches(event))
    }

    fn render_actions(&self, event: &Event) -> Vec<Action> {
        self.actions
            .iter()
            .map(|action| Action {
                kind: action.kind.clone(),
                params: action
                    .params
                    .iter()
                    .map(|(key, value)| (key.clone(), interpolate(value, event)))
                    .collect::<BTreeMap<_, _>>(),
            })
            .collect()
    }
}

/// A rule set compiled for evaluation.
///
/// Rules that fail to parse are kept as [`RuleLoadError`]s; the rest are
/// evaluated in name order.
#[derive(Debug)]
pub struct Evaluator {
    rules: Vec<CompiledRule>,
    errors: Vec<RuleLoadError>,
}

impl Evaluator {
    /// Parse and compile every rule in `rule_set`.
    pub fn load(rule_set: &RuleSet) -> Self {
        let mut rules = Vec::new();
        let mut errors = Vec::new();

        for rule in rule_set.iter() {
            match CompiledRule::compile(rule) {
                Ok(compiled) => rules.push(compiled),
                Err(err) => {
                    tracing::warn!(rule = %err.rule, reason = %err.reason, "rule failed to load");
                    errors.push(err);
                }
            }
        }

        tracing::debug!(loaded = rules.len(), failed = errors.len(), "compiled rule set");
        Self { rules, errors }
    }

    pub fn errors(&self) -> &[RuleLoadError] {
        &self.errors
    }

    /// Number of successfully loaded rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate `event` without dispatching anything.
    pub fn evaluate(&self, event: &Event) -> ExecutionResult {
        let mut result = ExecutionResult::new(event.clone());
        result.errors = self.errors.clone();

        for rule in &self.rules {
            if !rule.enabled {
                result.skipped.push(rule.name.clone());
            } else if rule.matches(event) {
                tracing::debug!(rule = %rule.name, "rule matched");
                result.matched.push(RuleMatch {
                    rule: rule.name.clone(),
                    description: rule.description.clone(),
                    actions: rule.render_actions(event),
                });
            } else {
                result.unmatched.push(rule.name.clone());
            }
        }
        result
    }

    /// Evaluate `event` and hand every emitted action to `dispatcher`, in
    /// rule-name order.
    pub fn run(
        &self,
        event: &Event,
        dispatcher: &mut dyn ActionDispatcher,
    ) -> Result<ExecutionResult> {
        let result = self.evaluate(event);
        for matched in &result.matched {
            for action in &matched.actions {
                dispatcher.dispatch(&matched.rule, action)?;
            }
        }
        Ok(result)
    }

    /// Evaluate `rule_set` against `event` locally. Pure: actions are only
    /// recorded in the result.
    pub fn check(rule_set: &RuleSet, event: &Event) -> ExecutionResult {
        Self::load(rule_set).evaluate(event)
    }

    /// Parse a raw JSON event, then [`check`](Self::check) it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EventFormat`](crate::Error::EventFormat) before any
    /// rule is evaluated if `raw` is not a JSON object.
    pub fn check_document(rule_set: &RuleSet, raw: &str) -> Result<ExecutionResult> {
        let event = Event::from_json_str(raw)?;
        Ok(Self::check(rule_set, &event))
    }
}

fn interpolate(value: &Value, event: &Event) -> Value {
    match value {
        Value::String(template) => Value::String(
            PLACEHOLDER
                .replace_all(template, |caps: &Captures<'_>| match event.lookup(&caps[1]) {
                    Some(Value::String(text)) => text.clone(),
                    Some(Value::Null) | None => String::new(),
                    Some(other) => other.to_string(),
                })
                .into_owned(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(|v| interpolate(v, event)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, v)| (key.clone(), interpolate(v, event)))
                .collect(),
        ),
        other => other.clone(),
    }
}
