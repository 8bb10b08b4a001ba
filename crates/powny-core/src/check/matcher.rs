//! Compiled match conditions

use regex::Regex;
use serde_json::Value;

use crate::check::definition::DetailedCondition;
use crate::model::Event;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Comparison {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Neq,
}

impl Comparison {
    fn holds(self, actual: f64, expected: f64) -> bool {
        match self {
            Self::Gt => actual > expected,
            Self::Gte => actual >= expected,
            Self::Lt => actual < expected,
            Self::Lte => actual <= expected,
            Self::Eq => (actual - expected).abs() < f64::EPSILON,
            Self::Neq => (actual - expected).abs() >= f64::EPSILON,
        }
    }
}

#[derive(Debug)]
enum Matcher {
    /// Shell-style pattern, or several of them (any may match)
    Patterns(Vec<Regex>),
    Regex(Regex),
    Exists(bool),
    Equals(Value),
    Compare(Comparison, f64),
}

/// One `[match]` entry: a field path and what its value must satisfy.
#[derive(Debug)]
pub(crate) struct Condition {
    path: String,
    matchers: Vec<Matcher>,
}

impl Condition {
    /// Compile the TOML form of a condition.
    pub fn compile(path: &str, raw: &toml::Value) -> Result<Self, String> {
        let matchers = match raw {
            toml::Value::String(pattern) => vec![Matcher::Patterns(vec![glob_to_regex(pattern)?])],
            toml::Value::Array(items) => {
                let patterns = items
                    .iter()
                    .map(|item| match item {
                        toml::Value::String(pattern) => glob_to_regex(pattern),
                        other => Err(format!(
                            "condition on {path}: list entries must be strings, got {}",
                            other.type_str()
                        )),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                if patterns.is_empty() {
                    return Err(format!("condition on {path}: empty list never matches"));
                }
                vec![Matcher::Patterns(patterns)]
            }
            toml::Value::Table(_) => {
                let detailed: DetailedCondition = raw
                    .clone()
                    .try_into()
                    .map_err(|e: toml::de::Error| format!("condition on {path}: {}", e.message()))?;
                compile_detailed(path, detailed)?
            }
            other => {
                return Err(format!(
                    "condition on {path}: expected a pattern, list or table, got {}",
                    other.type_str()
                ));
            }
        };

        Ok(Self {
            path: path.to_string(),
            matchers,
        })
    }

    pub fn matches(&self, event: &Event) -> bool {
        let value = event.lookup(&self.path);
        self.matchers.iter().all(|matcher| matcher_holds(matcher, value))
    }
}

fn compile_detailed(path: &str, condition: DetailedCondition) -> Result<Vec<Matcher>, String> {
    let mut matchers = Vec::new();

    if let Some(pattern) = condition.regex {
        let regex = Regex::new(&pattern)
            .map_err(|e| format!("condition on {path}: invalid regex: {e}"))?;
        matchers.push(Matcher::Regex(regex));
    }
    if let Some(exists) = condition.exists {
        matchers.push(Matcher::Exists(exists));
    }
    if let Some(expected) = condition.equals {
        matchers.push(Matcher::Equals(expected));
    }

    let comparisons = [
        (Comparison::Gt, condition.gt),
        (Comparison::Gte, condition.gte),
        (Comparison::Lt, condition.lt),
        (Comparison::Lte, condition.lte),
        (Comparison::Eq, condition.eq),
        (Comparison::Neq, condition.neq),
    ];
    for (comparison, bound) in comparisons {
        if let Some(bound) = bound {
            matchers.push(Matcher::Compare(comparison, bound));
        }
    }

    if matchers.is_empty() {
        return Err(format!("condition on {path}: empty condition table"));
    }
    Ok(matchers)
}

fn matcher_holds(matcher: &Matcher, value: Option<&Value>) -> bool {
    match (matcher, value) {
        (Matcher::Exists(expected), value) => value.is_some() == *expected,
        (Matcher::Equals(expected), Some(actual)) => actual == expected,
        (Matcher::Patterns(patterns), Some(actual)) => {
            any_scalar(actual, &|text| patterns.iter().any(|re| re.is_match(text)))
        }
        (Matcher::Regex(regex), Some(actual)) => any_scalar(actual, &|text| regex.is_match(text)),
        (Matcher::Compare(comparison, bound), Some(actual)) => any_number(actual, &|number| {
            comparison.holds(number, *bound)
        }),
        (_, None) => false,
    }
}

/// Apply `test` to a scalar's text, or to each element of an array.
fn any_scalar(value: &Value, test: &dyn Fn(&str) -> bool) -> bool {
    match value {
        Value::String(text) => test(text),
        Value::Number(number) => test(&number.to_string()),
        Value::Bool(flag) => test(if *flag { "true" } else { "false" }),
        Value::Array(items) => items.iter().any(|item| any_scalar(item, test)),
        Value::Null | Value::Object(_) => false,
    }
}

fn any_number(value: &Value, test: &dyn Fn(f64) -> bool) -> bool {
    match value {
        Value::Number(number) => number.as_f64().is_some_and(test),
        Value::String(text) => text.trim().parse::<f64>().is_ok_and(test),
        Value::Array(items) => items.iter().any(|item| any_number(item, test)),
        _ => false,
    }
}

/// Translate a shell-style pattern (`*`, `?`) into an anchored regex.
fn glob_to_regex(pattern: &str) -> Result<Regex, String> {
    let mut source = String::with_capacity(pattern.len() + 2);
    source.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            other => source.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    source.push('$');
    Regex::new(&source).map_err(|e| format!("invalid pattern {pattern:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn condition(path: &str, toml_value: &str) -> Condition {
        let table: toml::Table = toml::from_str(&format!("v = {toml_value}")).unwrap();
        Condition::compile(path, &table["v"]).unwrap()
    }

    fn event(value: serde_json::Value) -> Event {
        Event::from_value(value).unwrap()
    }

    #[rstest]
    #[case::exact(r#""web01""#, json!({"host": "web01"}), true)]
    #[case::star(r#""web-*""#, json!({"host": "web-03"}), true)]
    #[case::question(r#""web0?""#, json!({"host": "web01"}), true)]
    #[case::anchored(r#""web""#, json!({"host": "web01"}), false)]
    #[case::dot_is_literal(r#""a.b""#, json!({"host": "axb"}), false)]
    #[case::missing(r#""*""#, json!({"service": "x"}), false)]
    #[case::any_of(r#"["CRIT", "WARN"]"#, json!({"host": "WARN"}), true)]
    #[case::any_of_miss(r#"["CRIT", "WARN"]"#, json!({"host": "OK"}), false)]
    #[case::array_value(r#""prod""#, json!({"host": ["dev", "prod"]}), true)]
    #[case::number_as_text(r#""5*""#, json!({"host": 503}), true)]
    fn patterns(#[case] raw: &str, #[case] doc: serde_json::Value, #[case] expected: bool) {
        assert_eq!(condition("host", raw).matches(&event(doc)), expected);
    }

    #[rstest]
    #[case::gt("{ gt = 0.5 }", json!(0.9), true)]
    #[case::gt_equal("{ gt = 0.9 }", json!(0.9), false)]
    #[case::gte("{ gte = 0.9 }", json!(0.9), true)]
    #[case::lt("{ lt = 10 }", json!(3), true)]
    #[case::lte("{ lte = 2 }", json!(3), false)]
    #[case::eq("{ eq = 3 }", json!(3), true)]
    #[case::neq("{ neq = 3 }", json!(4), true)]
    #[case::range("{ gte = 1, lt = 5 }", json!(5), false)]
    #[case::numeric_string("{ gt = 1 }", json!("2.5"), true)]
    #[case::non_numeric("{ gt = 1 }", json!("high"), false)]
    fn comparisons(#[case] raw: &str, #[case] load: serde_json::Value, #[case] expected: bool) {
        let doc = event(json!({ "load": load }));
        assert_eq!(condition("load", raw).matches(&doc), expected);
    }

    #[test]
    fn exists_checks_presence() {
        let present = event(json!({"labels": {"env": "prod"}}));
        let absent = event(json!({"labels": {}}));

        assert!(condition("labels.env", "{ exists = true }").matches(&present));
        assert!(!condition("labels.env", "{ exists = true }").matches(&absent));
        assert!(condition("labels.env", "{ exists = false }").matches(&absent));
    }

    #[test]
    fn regex_and_equals() {
        let doc = event(json!({"service": "disk_root", "labels": {"team": "ops"}}));

        assert!(condition("service", r#"{ regex = "^disk_" }"#).matches(&doc));
        assert!(!condition("service", r#"{ regex = "^net_" }"#).matches(&doc));
        assert!(condition("labels.team", r#"{ equals = "ops" }"#).matches(&doc));
        assert!(!condition("labels.team", r#"{ equals = "dev" }"#).matches(&doc));
    }

    #[rstest]
    #[case::bad_regex(r#"{ regex = "(" }"#, "invalid regex")]
    #[case::unknown_key(r#"{ regexp = "x" }"#, "regexp")]
    #[case::empty_table("{}", "empty condition")]
    #[case::empty_list("[]", "empty list")]
    #[case::bad_list("[1, 2]", "must be strings")]
    #[case::scalar("42", "expected a pattern")]
    fn invalid_conditions(#[case] raw: &str, #[case] fragment: &str) {
        let table: toml::Table = toml::from_str(&format!("v = {raw}")).unwrap();
        let err = Condition::compile("host", &table["v"]).unwrap_err();
        assert!(err.contains(fragment), "got: {err}");
    }
}
