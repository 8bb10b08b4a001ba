//! Events fed to rule evaluation and dispatch

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::{Error, Result};

/// An input notification: `{host, service, severity}` or any JSON object.
///
/// Always a JSON object; anything else is rejected at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Event {
    document: Map<String, Value>,
}

impl Event {
    /// The classic monitoring alert shape.
    pub fn from_triple(host: &str, service: &str, severity: &str) -> Self {
        let mut document = Map::new();
        document.insert("host".into(), json!(host));
        document.insert("service".into(), json!(service));
        document.insert("severity".into(), json!(severity));
        Self { document }
    }

    /// Wrap an already-parsed JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EventFormat`] if `value` is not an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(document) => Ok(Self { document }),
            other => Err(Error::EventFormat {
                reason: format!("expected a JSON object, got {}", kind_of(&other)),
            }),
        }
    }

    /// Parse a JSON event description.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EventFormat`] for malformed JSON or a non-object
    /// document.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw).map_err(|e| Error::EventFormat {
            reason: e.to_string(),
        })?;
        Self::from_value(value)
    }

    /// Look up a dotted field path such as `labels.env`.
    ///
    /// A literal key containing dots takes precedence over nested lookup.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.document.get(path) {
            return Some(value);
        }
        let mut segments = path.split('.');
        let mut current = self.document.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.document
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.document.clone())
    }
}

impl TryFrom<Value> for Event {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}

impl From<Event> for Value {
    fn from(event: Event) -> Self {
        Value::Object(event.document)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triple_has_three_fields() {
        let event = Event::from_triple("web01", "disk", "CRIT");
        assert_eq!(event.lookup("host"), Some(&json!("web01")));
        assert_eq!(event.lookup("service"), Some(&json!("disk")));
        assert_eq!(event.lookup("severity"), Some(&json!("CRIT")));
        assert_eq!(event.as_map().len(), 3);
    }

    #[test]
    fn nested_lookup() {
        let event =
            Event::from_json_str(r#"{"labels": {"env": "prod"}, "checks": [{"id": 7}]}"#).unwrap();
        assert_eq!(event.lookup("labels.env"), Some(&json!("prod")));
        assert_eq!(event.lookup("checks.0.id"), Some(&json!(7)));
        assert_eq!(event.lookup("labels.team"), None);
        assert_eq!(event.lookup("checks.x"), None);
    }

    #[test]
    fn dotted_key_wins_over_nesting() {
        let event = Event::from_json_str(r#"{"a.b": 1, "a": {"b": 2}}"#).unwrap();
        assert_eq!(event.lookup("a.b"), Some(&json!(1)));
    }

    #[test]
    fn rejects_non_objects() {
        for raw in ["[1, 2]", "\"alert\"", "42", "null"] {
            let err = Event::from_json_str(raw).unwrap_err();
            assert!(matches!(err, Error::EventFormat { .. }), "{raw}");
        }
    }

    #[test]
    fn rejects_malformed_json() {
        let err = Event::from_json_str("{\"host\": ").unwrap_err();
        assert!(err.to_string().starts_with("Malformed event"));
    }

    #[test]
    fn serde_goes_through_validation() {
        let ok: Event = serde_json::from_str(r#"{"host": "h"}"#).unwrap();
        assert_eq!(ok.lookup("host"), Some(&json!("h")));
        assert!(serde_json::from_str::<Event>("[]").is_err());
    }
}
