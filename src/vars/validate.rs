//! Validation of runtime values against variable definitions.
//!
//! Errors are collected, never thrown: the caller gets the full list and
//! decides whether to abort. A required definition is satisfied by a
//! non-empty default, so documents with sensible defaults validate even
//! against an empty runtime map.

use std::collections::HashMap;
use std::fmt;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use super::definition::{VariableDefinition, VariableType};
use crate::expr::ExprValue;
use crate::template::format::parse_date;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationErrorKind {
    Required,
    Type,
    Pattern,
    MinItems,
    MaxItems,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationError {
    pub name: String,
    pub kind: ValidationErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

/// Check every definition against the provided runtime values.
pub fn validate(
    definitions: &[VariableDefinition],
    provided: &HashMap<String, Value>,
) -> ValidationReport {
    let mut errors = Vec::new();
    for def in definitions {
        check_definition(def, provided.get(&def.name), &mut errors);
    }
    ValidationReport { is_valid: errors.is_empty(), errors }
}

fn check_definition(
    def: &VariableDefinition,
    value: Option<&Value>,
    errors: &mut Vec<ValidationError>,
) {
    let usable = value.map(|v| !is_blank(v)).unwrap_or(false);

    if def.required && !usable && !has_default(def) {
        errors.push(ValidationError {
            name: def.name.clone(),
            kind: ValidationErrorKind::Required,
            message: format!("{} is required", def.display_name()),
        });
        return;
    }

    let Some(value) = value.filter(|_| usable) else {
        return;
    };

    if !type_matches(def.kind, value) {
        errors.push(ValidationError {
            name: def.name.clone(),
            kind: ValidationErrorKind::Type,
            message: format!(
                "{} must be a valid {}",
                def.display_name(),
                type_label(def.kind)
            ),
        });
        return;
    }

    if def.kind == VariableType::String {
        if let Some(pattern) = def.pattern.as_deref() {
            // an unparseable pattern in the definition is ignored, not an
            // error against the value
            if let Ok(re) = Regex::new(pattern) {
                if !re.is_match(&text_of(value)) {
                    errors.push(ValidationError {
                        name: def.name.clone(),
                        kind: ValidationErrorKind::Pattern,
                        message: format!(
                            "{} does not match the expected pattern",
                            def.display_name()
                        ),
                    });
                }
            }
        }
    }

    if def.kind == VariableType::Array {
        if let Some(items) = value.as_array() {
            if let Some(min) = def.min_items {
                if items.len() < min {
                    errors.push(ValidationError {
                        name: def.name.clone(),
                        kind: ValidationErrorKind::MinItems,
                        message: format!(
                            "{} must have at least {} item(s)",
                            def.display_name(),
                            min
                        ),
                    });
                }
            }
            if let Some(max) = def.max_items {
                if items.len() > max {
                    errors.push(ValidationError {
                        name: def.name.clone(),
                        kind: ValidationErrorKind::MaxItems,
                        message: format!(
                            "{} must have at most {} item(s)",
                            def.display_name(),
                            max
                        ),
                    });
                }
            }
        }
    }
}

pub(crate) fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn has_default(def: &VariableDefinition) -> bool {
    def.default_value.as_ref().map(|v| !is_blank(v)).unwrap_or(false)
}

fn type_matches(kind: VariableType, value: &Value) -> bool {
    match kind {
        VariableType::String | VariableType::Object => true,
        VariableType::Number => {
            value.is_number() || text_of(value).trim().parse::<f64>().is_ok()
        }
        VariableType::Date => parse_date(&text_of(value)).is_some(),
        VariableType::Boolean => {
            value.is_boolean()
                || matches!(
                    text_of(value).trim().to_lowercase().as_str(),
                    "true" | "false" | "1" | "0"
                )
        }
        VariableType::Currency => currency_matches(value),
        VariableType::Array => value.is_array(),
    }
}

/// A currency is a plain decimal or a `{value, currency}` object whose
/// value is non-zero.
fn currency_matches(value: &Value) -> bool {
    match value {
        Value::Object(map) => {
            map.contains_key("currency")
                && map
                    .get("value")
                    .map(ExprValue::from)
                    .and_then(|v| v.as_f64())
                    .map(|n| n != 0.0)
                    .unwrap_or(false)
        }
        _ => value.is_number() || text_of(value).trim().parse::<f64>().is_ok(),
    }
}

fn text_of(value: &Value) -> String {
    ExprValue::from(value).display_string()
}

fn type_label(kind: VariableType) -> &'static str {
    match kind {
        VariableType::String => "string",
        VariableType::Number => "number",
        VariableType::Boolean => "boolean",
        VariableType::Date => "date",
        VariableType::Currency => "currency amount",
        VariableType::Array => "array",
        VariableType::Object => "object",
    }
}

// ============================================================================
// TESTS
// ============================================================================
