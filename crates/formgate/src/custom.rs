//! Custom validation rules.
//!
//! A CUSTOM_FUNCTION rule selects one of a closed set of named built-in
//! validators instead of carrying executable script text. The selector text
//! is `name` or `name:arg`, e.g. `min_words:3` or `matches_field:password`.
//! Validators receive the field value and the full submission map; they
//! return an error message on failure, `None` on success. Execution is
//! bounded by construction, so no timeout is needed.
//!
//! An unknown validator name or malformed argument surfaces as a fixed
//! internal-error message on that field rather than a panic, so one broken
//! rule never aborts validation of the rest of the form.

use serde_json::{Map, Value as JsonValue};
use tracing::error;

pub const BUILTIN_NAMES: &[&str] = &[
    "non_empty",
    "numeric",
    "integer",
    "positive",
    "min_words",
    "one_of",
    "matches_field",
    "differs_from",
];

pub fn is_known_builtin(spec: &str) -> bool {
    let (name, _) = split_spec(spec);
    BUILTIN_NAMES.contains(&name)
}

fn split_spec(spec: &str) -> (&str, Option<&str>) {
    match spec.split_once(':') {
        Some((name, arg)) => (name.trim(), Some(arg.trim())),
        None => (spec.trim(), None),
    }
}

/// Runs one custom rule against a field value and the full submission.
/// Returns the error message on failure, `None` when the rule passes.
pub fn run_custom_rule(
    spec: &str,
    form_data: &Map<String, JsonValue>,
    field_name: &str,
    value: Option<&JsonValue>,
) -> Option<String> {
    if spec.trim().is_empty() {
        return None;
    }
    let (name, arg) = split_spec(spec);
    match name {
        "non_empty" => check_non_empty(value),
        "numeric" => check_numeric(value),
        "integer" => check_integer(value),
        "positive" => check_positive(value),
        "min_words" => match arg.and_then(|a| a.parse::<usize>().ok()) {
            Some(min) => check_min_words(value, min),
            None => internal(spec, field_name, "min_words requires a numeric argument"),
        },
        "one_of" => match arg {
            Some(list) if !list.is_empty() => check_one_of(value, list),
            _ => internal(spec, field_name, "one_of requires a |-separated list"),
        },
        "matches_field" => match arg {
            Some(other) if !other.is_empty() => check_matches_field(value, form_data, other, true),
            _ => internal(spec, field_name, "matches_field requires a field name"),
        },
        "differs_from" => match arg {
            Some(other) if !other.is_empty() => check_matches_field(value, form_data, other, false),
            _ => internal(spec, field_name, "differs_from requires a field name"),
        },
        _ => internal(spec, field_name, "unknown custom validator"),
    }
}

fn internal(spec: &str, field_name: &str, reason: &str) -> Option<String> {
    error!(rule = spec, field = field_name, "custom validation rule failed: {}", reason);
    Some(format!("Internal validation error: {} '{}'", reason, spec))
}

fn as_number(value: Option<&JsonValue>) -> Option<f64> {
    match value? {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn check_non_empty(value: Option<&JsonValue>) -> Option<String> {
    let empty = match value {
        None | Some(JsonValue::Null) => true,
        Some(JsonValue::String(s)) => s.trim().is_empty(),
        Some(JsonValue::Array(items)) => items.is_empty(),
        Some(JsonValue::Object(map)) => map.is_empty(),
        _ => false,
    };
    empty.then(|| "Value must not be empty".to_string())
}

fn check_numeric(value: Option<&JsonValue>) -> Option<String> {
    match as_number(value) {
        Some(_) => None,
        None => Some("Value must be numeric".to_string()),
    }
}

fn check_integer(value: Option<&JsonValue>) -> Option<String> {
    match as_number(value) {
        Some(n) if n.fract() == 0.0 => None,
        _ => Some("Value must be an integer".to_string()),
    }
}

fn check_positive(value: Option<&JsonValue>) -> Option<String> {
    match as_number(value) {
        Some(n) if n > 0.0 => None,
        _ => Some("Value must be a positive number".to_string()),
    }
}

fn check_min_words(value: Option<&JsonValue>, min: usize) -> Option<String> {
    let words = value
        .and_then(|v| v.as_str())
        .map(|s| s.split_whitespace().count())
        .unwrap_or(0);
    (words < min).then(|| format!("Value must contain at least {} words", min))
}

fn check_one_of(value: Option<&JsonValue>, list: &str) -> Option<String> {
    let allowed: Vec<&str> = list.split('|').map(str::trim).collect();
    let text = value.and_then(|v| v.as_str());
    match text {
        Some(s) if allowed.contains(&s) => None,
        _ => Some(format!("Value must be one of: {}", allowed.join(", "))),
    }
}

fn check_matches_field(
    value: Option<&JsonValue>,
    form_data: &Map<String, JsonValue>,
    other: &str,
    want_equal: bool,
) -> Option<String> {
    let actual = value.unwrap_or(&JsonValue::Null);
    let expected = form_data.get(other).unwrap_or(&JsonValue::Null);
    let equal = actual == expected;
    if equal == want_equal {
        None
    } else if want_equal {
        Some(format!("Value must match field '{}'", other))
    } else {
        Some(format!("Value must differ from field '{}'", other))
    }
}

#[cfg(test)]
mod custom_tests {
    use super::*;
    use serde_json::json;

    fn data(v: serde_json::Value) -> Map<String, JsonValue> {
        v.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn blank_spec_passes() {
        assert_eq!(run_custom_rule("", &Map::new(), "f", None), None);
        assert_eq!(run_custom_rule("  ", &Map::new(), "f", None), None);
    }

    #[test]
    fn unknown_builtin_reports_internal_error() {
        let err = run_custom_rule("frobnicate", &Map::new(), "f", Some(&json!("x"))).unwrap();
        assert!(err.starts_with("Internal validation error:"), "{err}");
    }

    #[test]
    fn malformed_argument_reports_internal_error() {
        let err = run_custom_rule("min_words:abc", &Map::new(), "f", Some(&json!("x"))).unwrap();
        assert!(err.contains("min_words"), "{err}");
    }

    #[test]
    fn matches_field_compares_against_full_submission() {
        let form_data = data(json!({ "password": "s3cret" }));
        assert_eq!(
            run_custom_rule("matches_field:password", &form_data, "confirm", Some(&json!("s3cret"))),
            None
        );
        assert!(
            run_custom_rule("matches_field:password", &form_data, "confirm", Some(&json!("nope")))
                .is_some()
        );
    }

    #[test]
    fn numeric_accepts_numeric_strings() {
        assert_eq!(run_custom_rule("numeric", &Map::new(), "f", Some(&json!("42.5"))), None);
        assert!(run_custom_rule("numeric", &Map::new(), "f", Some(&json!("abc"))).is_some());
        assert!(run_custom_rule("integer", &Map::new(), "f", Some(&json!(1.5))).is_some());
        assert!(run_custom_rule("positive", &Map::new(), "f", Some(&json!(-1))).is_some());
    }

    #[test]
    fn one_of_checks_membership() {
        assert_eq!(
            run_custom_rule("one_of:red|green|blue", &Map::new(), "f", Some(&json!("green"))),
            None
        );
        assert!(
            run_custom_rule("one_of:red|green|blue", &Map::new(), "f", Some(&json!("pink")))
                .is_some()
        );
    }
}
