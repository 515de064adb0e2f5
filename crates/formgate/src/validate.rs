//! Submission validation.
//!
//! `validate_form` walks a form definition against a submitted value map:
//! hidden sections and fields (per their visibility conditions) are skipped
//! entirely, every visible field runs through `validate_field`, and failures
//! are collected into a field-keyed error map. An empty map means the
//! submission is valid.
//!
//! The whole path is synchronous, stateless and side-effect-free apart from
//! logging; a malformed rule degrades to a field-level internal error
//! string, never a panic or an `Err` out of the validator.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value as JsonValue};
use tracing::{error, warn};

use crate::condition::is_visible;
use crate::custom::run_custom_rule;
use crate::error::ErrorMap;
use crate::model::{FieldDefinition, FieldType, FormDefinition, ValidationRuleType};

pub const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,6}$";
const URL_PATTERN: &str = r"^(https?|ftp)://\S+$";

const MSG_REQUIRED: &str = "This field is required";
const MSG_REGEX: &str = "Value does not match the required pattern";
const MSG_BAD_REGEX: &str = "Internal validation error: Invalid regex pattern";
const MSG_EMAIL: &str = "Invalid email format";
const MSG_URL: &str = "Invalid URL format";
const MSG_FILE_TYPE: &str = "File type is not allowed";

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern is a valid regex"))
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(URL_PATTERN).expect("url pattern is a valid regex"))
}

/// Validates an entire submission against a form definition. Sections and
/// fields whose visibility condition evaluates false are excluded from the
/// result regardless of their own rule violations. Returns field name to
/// error message; empty means valid.
pub fn validate_form(form: &FormDefinition, form_data: &Map<String, JsonValue>) -> ErrorMap {
    let mut errors = ErrorMap::new();

    for section in form.sections_ordered() {
        if !is_visible(section.condition.as_deref(), form_data) {
            continue;
        }
        for field in section.fields_ordered() {
            if !is_visible(field.condition.as_deref(), form_data) {
                continue;
            }
            let value = form_data.get(&field.name);
            if let Some(message) = validate_field_with_data(field, value, form_data) {
                errors.insert(field.name.clone(), message);
            }
        }
    }

    errors
}

/// Validates one submitted value against one field definition, without the
/// surrounding submission. Custom rules see an empty submission map here;
/// `validate_form` passes the real one.
pub fn validate_field(field: &FieldDefinition, value: Option<&JsonValue>) -> Option<String> {
    validate_field_with_data(field, value, &Map::new())
}

/// Field validation with the full submission available to custom rules.
/// Checks run in a fixed order and short-circuit on the first failure:
/// required, string rules, numeric rules, upload rules, custom rules.
pub fn validate_field_with_data(
    field: &FieldDefinition,
    value: Option<&JsonValue>,
    form_data: &Map<String, JsonValue>,
) -> Option<String> {
    if field.is_required() && is_empty_value(value) {
        return Some(rule_message(field, ValidationRuleType::Required, MSG_REQUIRED));
    }

    // Unset optional fields are always valid; skip every other rule.
    if matches!(value, None | Some(JsonValue::Null)) {
        return None;
    }
    if matches!(value, Some(JsonValue::String(s)) if s.is_empty()) {
        return None;
    }
    let value = value?;

    if let Some(text) = value.as_str() {
        if let Some(message) = validate_string(field, text) {
            return Some(message);
        }
    } else if value.is_number() {
        if let Some(message) = validate_number(field, value.as_f64().unwrap_or(0.0)) {
            return Some(message);
        }
    } else if let Some(upload) = value.as_object() {
        if let Some(message) = validate_upload(field, upload) {
            return Some(message);
        }
    }

    for rule in &field.validations {
        if rule.rule_type != ValidationRuleType::CustomFunction {
            continue;
        }
        let Some(spec) = rule.custom_function.as_deref().filter(|s| !s.is_empty()) else {
            continue;
        };
        if let Some(message) = run_custom_rule(spec, form_data, &field.name, Some(value)) {
            return Some(message);
        }
    }

    None
}

fn validate_string(field: &FieldDefinition, text: &str) -> Option<String> {
    let length = text.chars().count();

    if field.has_rule(ValidationRuleType::MinLength) {
        let min = rule_value_as_i64(field, ValidationRuleType::MinLength);
        if (length as i64) < min {
            return Some(rule_message(
                field,
                ValidationRuleType::MinLength,
                &format!("Minimum length is {} characters", min),
            ));
        }
    }

    if field.has_rule(ValidationRuleType::MaxLength) {
        let max = rule_value_as_i64(field, ValidationRuleType::MaxLength);
        if (length as i64) > max {
            return Some(rule_message(
                field,
                ValidationRuleType::MaxLength,
                &format!("Maximum length is {} characters", max),
            ));
        }
    }

    if let Some(pattern) = field.rule_value(ValidationRuleType::Regex) {
        if !pattern.is_empty() {
            // Full-string match, like the anchored semantics form authors expect.
            match Regex::new(&format!("^(?:{})$", pattern)) {
                Ok(re) => {
                    if !re.is_match(text) {
                        return Some(rule_message(field, ValidationRuleType::Regex, MSG_REGEX));
                    }
                }
                Err(err) => {
                    error!(pattern, error = %err, "invalid regex pattern in validation rule");
                    return Some(MSG_BAD_REGEX.to_string());
                }
            }
        }
    }

    if field.field_type == FieldType::Email || field.has_rule(ValidationRuleType::EmailFormat) {
        if !email_regex().is_match(text) {
            return Some(rule_message(field, ValidationRuleType::EmailFormat, MSG_EMAIL));
        }
    }

    if field.has_rule(ValidationRuleType::UrlFormat) && !url_regex().is_match(text) {
        return Some(rule_message(field, ValidationRuleType::UrlFormat, MSG_URL));
    }

    if let Some(allowed) = field.rule_value(ValidationRuleType::FileType) {
        if !allowed.is_empty() && !file_type_allowed(text, allowed) {
            return Some(rule_message(field, ValidationRuleType::FileType, MSG_FILE_TYPE));
        }
    }

    None
}

fn validate_number(field: &FieldDefinition, value: f64) -> Option<String> {
    if field.has_rule(ValidationRuleType::MinValue) {
        let min = rule_value_as_f64(field, ValidationRuleType::MinValue);
        if value < min {
            return Some(rule_message(
                field,
                ValidationRuleType::MinValue,
                &format!("Value must be at least {}", min),
            ));
        }
    }

    if field.has_rule(ValidationRuleType::MaxValue) {
        let max = rule_value_as_f64(field, ValidationRuleType::MaxValue);
        if value > max {
            return Some(rule_message(
                field,
                ValidationRuleType::MaxValue,
                &format!("Value must be at most {}", max),
            ));
        }
    }

    if let Some(range) = field.rule_value(ValidationRuleType::NumberRange) {
        let (min, max) = parse_number_range(range);
        if value < min || value > max {
            return Some(rule_message(
                field,
                ValidationRuleType::NumberRange,
                &format!("Value must be between {} and {}", min, max),
            ));
        }
    }

    // A bare numeric value under a MAX_FILE_SIZE rule is the size in bytes.
    if field.has_rule(ValidationRuleType::MaxFileSize) {
        let max = rule_value_as_f64(field, ValidationRuleType::MaxFileSize);
        if value > max {
            return Some(rule_message(
                field,
                ValidationRuleType::MaxFileSize,
                &format!("File exceeds the maximum size of {} bytes", max),
            ));
        }
    }

    None
}

/// FILE_UPLOAD values arrive as objects carrying at least a numeric `size`
/// in bytes and usually a `name`.
fn validate_upload(field: &FieldDefinition, upload: &Map<String, JsonValue>) -> Option<String> {
    if field.has_rule(ValidationRuleType::MaxFileSize) {
        let max = rule_value_as_f64(field, ValidationRuleType::MaxFileSize);
        if let Some(size) = upload.get("size").and_then(|v| v.as_f64()) {
            if size > max {
                return Some(rule_message(
                    field,
                    ValidationRuleType::MaxFileSize,
                    &format!("File exceeds the maximum size of {} bytes", max),
                ));
            }
        }
    }

    if let Some(allowed) = field.rule_value(ValidationRuleType::FileType) {
        if let Some(name) = upload.get("name").and_then(|v| v.as_str()) {
            if !allowed.is_empty() && !file_type_allowed(name, allowed) {
                return Some(rule_message(field, ValidationRuleType::FileType, MSG_FILE_TYPE));
            }
        }
    }

    None
}

/// `allowed` is a comma-separated extension list, e.g. "pdf,png,jpg".
fn file_type_allowed(file_name: &str, allowed: &str) -> bool {
    let extension = match file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext.to_ascii_lowercase(),
        _ => return false,
    };
    allowed
        .split(',')
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .any(|e| e == extension)
}

/// "min-max" with both bounds inclusive. Halves that fail to parse degrade
/// to 0.0, consistent with the other lenient numeric parses.
fn parse_number_range(range: &str) -> (f64, f64) {
    let (min_text, max_text) = range.split_once('-').unwrap_or((range, ""));
    (lenient_f64(min_text), lenient_f64(max_text))
}

/// Empty per the required-rule contract: missing, null, empty string,
/// empty array, empty object.
pub fn is_empty_value(value: Option<&JsonValue>) -> bool {
    match value {
        None | Some(JsonValue::Null) => true,
        Some(JsonValue::String(s)) => s.is_empty(),
        Some(JsonValue::Array(items)) => items.is_empty(),
        Some(JsonValue::Object(map)) => map.is_empty(),
        _ => false,
    }
}

/// The rule's configured message when non-blank, else the per-check default.
fn rule_message(field: &FieldDefinition, rule_type: ValidationRuleType, default: &str) -> String {
    field
        .rule(rule_type)
        .and_then(|r| r.error_message.as_deref())
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default.to_string())
}

/// Lenient parse: a missing or malformed rule value degrades to 0 with a
/// logged warning instead of aborting validation. Callers should know this
/// can make a bound trivially satisfied or trivially violated.
fn rule_value_as_i64(field: &FieldDefinition, rule_type: ValidationRuleType) -> i64 {
    let text = field.rule_value(rule_type).unwrap_or("");
    if text.is_empty() {
        return 0;
    }
    match text.parse::<i64>() {
        Ok(n) => n,
        Err(_) => {
            warn!(value = text, field = field.name, "invalid numeric value in validation rule");
            0
        }
    }
}

fn rule_value_as_f64(field: &FieldDefinition, rule_type: ValidationRuleType) -> f64 {
    lenient_f64(field.rule_value(rule_type).unwrap_or(""))
}

fn lenient_f64(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed.parse::<f64>() {
        Ok(n) => n,
        Err(_) => {
            warn!(value = trimmed, "invalid numeric value in validation rule");
            0.0
        }
    }
}
