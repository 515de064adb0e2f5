//! Authoring-time preflight of a form definition.
//!
//! Catches defects before a form is published: duplicate submission keys,
//! options sources without options, rule values that cannot be parsed for
//! their declared type, uncompilable regex patterns and unknown custom
//! validators. Runtime validation stays lenient about these; preflight is
//! where they are surfaced to authors.

use std::collections::HashSet;

use regex::Regex;

use crate::custom::is_known_builtin;
use crate::error::{DefinitionError, DefinitionResult, ErrorCode};
use crate::model::{
    FieldDefinition, FormDefinition, OptionsSourceType, ValidationRule, ValidationRuleType,
};

pub fn validate_form_definition(form: &FormDefinition) -> DefinitionResult {
    let mut ctx = PreflightCtx::default();

    if form.name.trim().is_empty() {
        ctx.push(ErrorCode::BlankFormName, "form name must not be blank", "name");
    }

    let mut seen_names: HashSet<&str> = HashSet::new();
    for (s_idx, section) in form.sections.iter().enumerate() {
        for (f_idx, field) in section.fields.iter().enumerate() {
            let base = format!("sections[{}].fields[{}]", s_idx, f_idx);
            validate_field_def(field, &base, &mut seen_names, &mut ctx);
        }
    }

    ctx.finish()
}

fn validate_field_def<'a>(
    field: &'a FieldDefinition,
    base: &str,
    seen_names: &mut HashSet<&'a str>,
    ctx: &mut PreflightCtx,
) {
    if field.name.trim().is_empty() {
        ctx.push(ErrorCode::BlankFieldName, "field name must not be blank", &format!("{}.name", base));
    } else if !seen_names.insert(field.name.as_str()) {
        ctx.push(
            ErrorCode::DuplicateFieldName,
            format!("field name '{}' is used more than once", field.name),
            &format!("{}.name", base),
        );
    }

    match field.options_source_type {
        Some(OptionsSourceType::Static) if field.static_options.is_empty() => {
            ctx.push(
                ErrorCode::MissingStaticOptions,
                "STATIC options source requires staticOptions",
                &format!("{}.staticOptions", base),
            );
        }
        Some(OptionsSourceType::DynamicApi)
            if field.api_endpoint.as_deref().unwrap_or("").trim().is_empty() =>
        {
            ctx.push(
                ErrorCode::MissingApiEndpoint,
                "DYNAMIC_API options source requires apiEndpoint",
                &format!("{}.apiEndpoint", base),
            );
        }
        _ => {}
    }

    for (r_idx, rule) in field.validations.iter().enumerate() {
        validate_rule_def(rule, &format!("{}.validations[{}]", base, r_idx), ctx);
    }
}

fn validate_rule_def(rule: &ValidationRule, path: &str, ctx: &mut PreflightCtx) {
    let value = rule.value.as_deref().unwrap_or("").trim();
    match rule.rule_type {
        ValidationRuleType::MinLength | ValidationRuleType::MaxLength => {
            if value.is_empty() {
                ctx.push(ErrorCode::MissingRuleValue, "length rule requires an integer value", path);
            } else if value.parse::<i64>().is_err() {
                ctx.push(
                    ErrorCode::InvalidRuleValue,
                    format!("'{}' is not a valid integer", value),
                    path,
                );
            }
        }
        ValidationRuleType::MinValue
        | ValidationRuleType::MaxValue
        | ValidationRuleType::MaxFileSize => {
            if value.is_empty() {
                ctx.push(ErrorCode::MissingRuleValue, "numeric rule requires a value", path);
            } else if value.parse::<f64>().is_err() {
                ctx.push(
                    ErrorCode::InvalidRuleValue,
                    format!("'{}' is not a valid number", value),
                    path,
                );
            }
        }
        ValidationRuleType::NumberRange => match value.split_once('-') {
            Some((min, max))
                if min.trim().parse::<f64>().is_ok() && max.trim().parse::<f64>().is_ok() => {}
            _ => {
                ctx.push(
                    ErrorCode::InvalidNumberRange,
                    format!("'{}' is not in 'min-max' form", value),
                    path,
                );
            }
        },
        ValidationRuleType::Regex => {
            if value.is_empty() {
                ctx.push(ErrorCode::MissingRuleValue, "regex rule requires a pattern", path);
            } else if let Err(err) = Regex::new(value) {
                ctx.push(
                    ErrorCode::InvalidRegexPattern,
                    format!("pattern does not compile: {}", err),
                    path,
                );
            }
        }
        ValidationRuleType::CustomFunction => {
            let spec = rule.custom_function.as_deref().unwrap_or("").trim();
            if spec.is_empty() {
                ctx.push(
                    ErrorCode::MissingRuleValue,
                    "custom rule requires a customFunction identifier",
                    path,
                );
            } else if !is_known_builtin(spec) {
                ctx.push(
                    ErrorCode::UnknownCustomFunction,
                    format!("'{}' is not a known custom validator", spec),
                    path,
                );
            }
        }
        ValidationRuleType::FileType => {
            if value.is_empty() {
                ctx.push(
                    ErrorCode::MissingRuleValue,
                    "file type rule requires a comma-separated extension list",
                    path,
                );
            }
        }
        ValidationRuleType::Required
        | ValidationRuleType::EmailFormat
        | ValidationRuleType::UrlFormat => {}
    }
}

#[derive(Default)]
struct PreflightCtx {
    errors: Vec<DefinitionError>,
}

impl PreflightCtx {
    fn push(&mut self, code: ErrorCode, message: impl Into<String>, path: &str) {
        self.errors
            .push(DefinitionError::new(code, message).with_path(path));
    }

    fn finish(self) -> DefinitionResult {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}
