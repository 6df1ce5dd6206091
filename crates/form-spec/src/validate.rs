use std::collections::BTreeSet;

use regex::Regex;
use serde_json::{Map, Value};

use crate::answers::{ValidationError, ValidationResult};
use crate::spec::field::{Constraint, FieldKind, FieldSpec};
use crate::visibility::resolve_visibility;

pub const REQUIRED_MESSAGE: &str = "This field is required";

/// True when the value counts as "no answer" for the required check.
///
/// The empty string is empty for every kind, numeric included: numeric
/// inputs arrive as text while the user is still typing. A numeric `0` is a
/// present value, never empty.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Per-field verdict used by a live session.
///
/// The required check is skipped in optional sessions; everything else still
/// runs so the host can surface advisory errors.
pub fn validate_field(field: &FieldSpec, value: &Value, optional_session: bool) -> Option<String> {
    if !optional_session && field.required && is_empty_value(value) {
        return Some(REQUIRED_MESSAGE.to_string());
    }

    if !is_empty_value(value)
        && let Some(error) = check_value(field, value)
    {
        return Some(error.message);
    }

    if let Some(validator) = &field.validator {
        return validator.check(value);
    }

    None
}

/// Batch validation of a full answer map, visibility-aware. Hidden fields
/// are skipped; their stale answers are not reported as unknown.
pub fn validate(fields: &[FieldSpec], answers: &Map<String, Value>) -> ValidationResult {
    let visibility = resolve_visibility(fields, answers);

    let mut errors = Vec::new();
    let mut missing_required = Vec::new();

    for field in fields {
        if !visibility.get(&field.id).copied().unwrap_or(true) {
            continue;
        }

        match answers.get(&field.id) {
            None => {
                if field.required {
                    missing_required.push(field.id.clone());
                }
            }
            Some(value) => {
                if field.required && is_empty_value(value) {
                    missing_required.push(field.id.clone());
                } else if !is_empty_value(value)
                    && let Some(error) = check_value(field, value)
                {
                    errors.push(error);
                } else if let Some(validator) = &field.validator
                    && let Some(message) = validator.check(value)
                {
                    errors.push(base_error(field, &message, "validator"));
                }
            }
        }
    }

    let all_ids: BTreeSet<_> = fields.iter().map(|field| field.id.as_str()).collect();
    let unknown_fields: Vec<String> = answers
        .keys()
        .filter(|key| !all_ids.contains(key.as_str()))
        .cloned()
        .collect();

    ValidationResult {
        valid: errors.is_empty() && missing_required.is_empty() && unknown_fields.is_empty(),
        errors,
        missing_required,
        unknown_fields,
    }
}

fn check_value(field: &FieldSpec, value: &Value) -> Option<ValidationError> {
    if !matches_kind(field, value) {
        return Some(base_error(field, "type mismatch", "type_mismatch"));
    }

    if field.kind.is_select()
        && let Some(options) = &field.options
        && !options_satisfied(field.kind, value, options)
    {
        return Some(base_error(
            field,
            "value is not one of the options",
            "option_mismatch",
        ));
    }

    if let Some(constraint) = &field.constraint
        && let Some(error) = enforce_constraint(field, value, constraint)
    {
        return Some(error);
    }

    None
}

fn matches_kind(field: &FieldSpec, value: &Value) -> bool {
    match field.kind {
        FieldKind::ShortText | FieldKind::LongText | FieldKind::SingleSelect => value.is_string(),
        FieldKind::MultiSelect => value
            .as_array()
            .is_some_and(|items| items.iter().all(Value::is_string)),
        FieldKind::Boolean => value.is_boolean(),
        FieldKind::Numeric => numeric_value(value).is_some(),
    }
}

fn options_satisfied(kind: FieldKind, value: &Value, options: &[String]) -> bool {
    match kind {
        FieldKind::SingleSelect => value
            .as_str()
            .is_some_and(|text| options.iter().any(|option| option == text)),
        FieldKind::MultiSelect => value.as_array().is_some_and(|items| {
            items.iter().all(|item| {
                item.as_str()
                    .is_some_and(|text| options.iter().any(|option| option == text))
            })
        }),
        _ => true,
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(num) => num.as_f64(),
        Value::String(text) => text.parse::<f64>().ok(),
        _ => None,
    }
}

fn enforce_constraint(
    field: &FieldSpec,
    value: &Value,
    constraint: &Constraint,
) -> Option<ValidationError> {
    if let Some(pattern) = &constraint.pattern
        && let Some(text) = value.as_str()
        && let Ok(regex) = Regex::new(pattern)
        && !regex.is_match(text)
    {
        return Some(base_error(
            field,
            "value does not match pattern",
            "pattern_mismatch",
        ));
    }

    if let Some(min_len) = constraint.min_len
        && let Some(text) = value.as_str()
        && text.len() < min_len
    {
        return Some(base_error(
            field,
            "value shorter than min length",
            "min_length",
        ));
    }

    if let Some(max_len) = constraint.max_len
        && let Some(text) = value.as_str()
        && text.len() > max_len
    {
        return Some(base_error(
            field,
            "value longer than max length",
            "max_length",
        ));
    }

    if let Some(min) = constraint.min
        && let Some(number) = numeric_value(value)
        && number < min
    {
        return Some(base_error(field, "value below minimum", "min"));
    }

    if let Some(max) = constraint.max
        && let Some(number) = numeric_value(value)
        && number > max
    {
        return Some(base_error(field, "value above maximum", "max"));
    }

    None
}

fn base_error(field: &FieldSpec, message: &str, code: &str) -> ValidationError {
    ValidationError {
        field_id: Some(field.id.clone()),
        path: Some(format!("/{}", field.id)),
        message: message.into(),
        code: Some(code.into()),
    }
}
