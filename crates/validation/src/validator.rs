//! Schema validation.
//!
//! All sections are checked in one pass and every failing field is reported,
//! body fields first, then query, then path parameters, each in declaration
//! order. A field with several violated constraints reports only the first,
//! checked in this order: presence, type, format, enum membership, length,
//! range.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Number, Value as JsonValue};
use uuid::Uuid;

use edgeguard_core::{AppError, AppResult, ValidationIssue};

use crate::request::{RawRequest, ValidatedRequest};
use crate::schema::{FieldRule, FieldType, Format, Schema, Section};

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    // Literal pattern; compilation cannot fail.
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

/// Validate `raw` against `schema`.
///
/// Returns the coerced view, or the full ordered list of issues (never empty
/// on failure).
pub fn validate(schema: &Schema, raw: &RawRequest) -> Result<ValidatedRequest, Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    let mut view = ValidatedRequest::default();

    let empty = Map::new();
    let body = match &raw.body {
        None | Some(JsonValue::Null) => Some(&empty),
        Some(JsonValue::Object(map)) => Some(map),
        Some(_) => {
            issues.push(
                ValidationIssue::new([Section::Body.as_str()], "request body must be a JSON object")
                    .with_code("invalid_type"),
            );
            None
        }
    };

    if let Some(body) = body {
        check_section(schema, Section::Body, body, &mut view.body, &mut issues);
    }
    check_section(schema, Section::Query, &raw.query, &mut view.query, &mut issues);
    check_section(schema, Section::Params, &raw.params, &mut view.params, &mut issues);

    if issues.is_empty() { Ok(view) } else { Err(issues) }
}

/// [`validate`], with failures turned into a VALIDATION [`AppError`].
pub fn validate_request(schema: &Schema, raw: &RawRequest) -> AppResult<ValidatedRequest> {
    validate(schema, raw).map_err(AppError::validation)
}

impl Schema {
    pub fn validate(&self, raw: &RawRequest) -> AppResult<ValidatedRequest> {
        validate_request(self, raw)
    }
}

fn check_section(
    schema: &Schema,
    section: Section,
    input: &Map<String, JsonValue>,
    out: &mut Map<String, JsonValue>,
    issues: &mut Vec<ValidationIssue>,
) {
    for (name, rule) in schema.fields(section) {
        match check_field(name, rule, input.get(name)) {
            Ok(Some(value)) => {
                out.insert(name.clone(), value);
            }
            Ok(None) => {}
            Err(failure) => issues.push(
                ValidationIssue::new([section.as_str(), name.as_str()], failure.message)
                    .with_code(failure.code),
            ),
        }
    }
}

pub(crate) struct Failure {
    pub(crate) code: &'static str,
    pub(crate) message: String,
}

impl Failure {
    fn new(code: &'static str, message: String) -> Self {
        Self { code, message }
    }
}

pub(crate) fn check_field(name: &str, rule: &FieldRule, value: Option<&JsonValue>) -> Result<Option<JsonValue>, Failure> {
    let value = match value {
        None | Some(JsonValue::Null) if rule.required => {
            return Err(Failure::new("required", format!("{name} is required")));
        }
        None | Some(JsonValue::Null) => return Ok(rule.default.clone()),
        Some(value) => value,
    };

    let coerced = coerce(name, &rule.ty, value)?;

    if let (Some(Format::Email), JsonValue::String(s)) = (rule.format, &coerced) {
        if !EMAIL.is_match(s) {
            return Err(Failure::new(
                "invalid_format",
                format!("{name} must be a valid email address"),
            ));
        }
    }

    if let (FieldType::Enum(allowed), JsonValue::String(s)) = (&rule.ty, &coerced) {
        if !allowed.iter().any(|a| a == s) {
            return Err(Failure::new(
                "invalid_enum",
                format!("{name} must be one of: {}", allowed.join(", ")),
            ));
        }
    }

    if let JsonValue::String(s) = &coerced {
        let len = s.chars().count();
        if let Some(min) = rule.min_length.filter(|min| len < *min) {
            return Err(Failure::new(
                "too_short",
                format!("{name} must be at least {min} characters"),
            ));
        }
        if let Some(max) = rule.max_length.filter(|max| len > *max) {
            return Err(Failure::new(
                "too_long",
                format!("{name} must be at most {max} characters"),
            ));
        }
    }

    if let Some(n) = coerced.as_f64() {
        if let Some(min) = rule.min.filter(|min| n < *min) {
            return Err(Failure::new("too_small", format!("{name} must be at least {min}")));
        }
        if let Some(max) = rule.max.filter(|max| n > *max) {
            return Err(Failure::new("too_big", format!("{name} must be at most {max}")));
        }
    }

    Ok(Some(coerced))
}

fn coerce(name: &str, ty: &FieldType, value: &JsonValue) -> Result<JsonValue, Failure> {
    let type_error = |expected: &str| Failure::new("invalid_type", format!("{name} must be {expected}"));

    match ty {
        FieldType::String | FieldType::Enum(_) => match value {
            JsonValue::String(_) => Ok(value.clone()),
            _ => Err(type_error("a string")),
        },
        FieldType::Uuid => match value {
            JsonValue::String(s) => Uuid::parse_str(s.trim())
                .map(|id| JsonValue::String(id.hyphenated().to_string()))
                .map_err(|_| Failure::new("invalid_format", format!("{name} must be a valid UUID"))),
            _ => Err(type_error("a string")),
        },
        FieldType::Integer => match value {
            JsonValue::Number(n) if n.is_i64() => Ok(value.clone()),
            JsonValue::String(s) => s
                .trim()
                .parse::<i64>()
                .map(JsonValue::from)
                .map_err(|_| type_error("an integer")),
            _ => Err(type_error("an integer")),
        },
        FieldType::Number => match value {
            JsonValue::Number(_) => Ok(value.clone()),
            JsonValue::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(JsonValue::Number)
                .ok_or_else(|| type_error("a number")),
            _ => Err(type_error("a number")),
        },
        FieldType::Boolean => match value {
            JsonValue::Bool(_) => Ok(value.clone()),
            JsonValue::String(s) if s == "true" => Ok(JsonValue::Bool(true)),
            JsonValue::String(s) if s == "false" => Ok(JsonValue::Bool(false)),
            _ => Err(type_error("a boolean")),
        },
    }
}
