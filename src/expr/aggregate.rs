//! Aggregate functions over complex arrays.
//!
//! Syntax: `arrayName | function[:property[:separator]]`. The array must be
//! a top-level complex variable; `property` optionally projects each element
//! before the function is applied. Numeric aggregates coerce element values
//! the way the rest of the language does — non-numeric elements contribute 0.

use serde_json::Value;

use super::value::ExprValue;
use super::{ExprError, Evaluator, find_outside_quotes};
use crate::vars::get_map_ci;

pub(crate) fn evaluate(ev: &Evaluator, expr: &str) -> Result<ExprValue, ExprError> {
    let pipe = find_outside_quotes(expr, "|")
        .ok_or_else(|| ExprError::Malformed(expr.to_string()))?;
    let name = expr[..pipe].trim();
    let spec = expr[pipe + 1..].trim();

    let items = match ev.pool().complex_array(name) {
        Some(items) => items,
        None if ev.pool().complex().contains_key(name) => {
            return Err(ExprError::NotAnArray(name.to_string()));
        }
        None => return Err(ExprError::UnknownVariable(name.to_string())),
    };

    // function[:property[:separator]]; the separator is not trimmed, so a
    // leading space survives. Trailing whitespace is clipped with the
    // expression's own trailing whitespace before we get here.
    let mut parts = spec.splitn(3, ':');
    let function = parts.next().unwrap_or("").trim().to_lowercase();
    let property = parts.next().map(str::trim).filter(|p| !p.is_empty());
    let separator = parts.next();

    match function.as_str() {
        "sum" => Ok(ExprValue::Number(numeric_sum(items, property))),
        "avg" | "average" => {
            if items.is_empty() {
                Ok(ExprValue::Number(0.0))
            } else {
                Ok(ExprValue::Number(
                    numeric_sum(items, property) / items.len() as f64,
                ))
            }
        }
        "min" => Ok(fold_extreme(items, property, f64::min)),
        "max" => Ok(fold_extreme(items, property, f64::max)),
        "count" => Ok(ExprValue::Number(items.len() as f64)),
        "first" => Ok(pick(items.first(), property)),
        "last" => Ok(pick(items.last(), property)),
        "join" => Ok(ExprValue::Text(join(items, property, separator.unwrap_or(", ")))),
        "concat" => Ok(ExprValue::Text(join(items, property, ""))),
        other => Err(ExprError::UnknownFunction(other.to_string())),
    }
}

/// Project an element through the optional property name
/// (case-insensitive fallback, like dot-path navigation).
fn project<'a>(item: &'a Value, property: Option<&str>) -> Option<&'a Value> {
    match property {
        None => Some(item),
        Some(p) => item.as_object().and_then(|o| get_map_ci(o, p)),
    }
}

fn numeric(item: &Value, property: Option<&str>) -> f64 {
    project(item, property)
        .map(ExprValue::from)
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0)
}

fn numeric_sum(items: &[Value], property: Option<&str>) -> f64 {
    items.iter().map(|item| numeric(item, property)).sum()
}

/// min/max over an empty array is null, not a fabricated 0.
fn fold_extreme(items: &[Value], property: Option<&str>, pick: fn(f64, f64) -> f64) -> ExprValue {
    let mut result: Option<f64> = None;
    for item in items {
        let n = numeric(item, property);
        result = Some(match result {
            Some(acc) => pick(acc, n),
            None => n,
        });
    }
    match result {
        Some(n) => ExprValue::Number(n),
        None => ExprValue::Null,
    }
}

fn pick(item: Option<&Value>, property: Option<&str>) -> ExprValue {
    item.and_then(|i| project(i, property))
        .map(ExprValue::from)
        .unwrap_or(ExprValue::Null)
}

fn join(items: &[Value], property: Option<&str>, separator: &str) -> String {
    items
        .iter()
        .map(|item| {
            project(item, property)
                .map(|v| ExprValue::from(v).display_string())
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join(separator)
}

// ============================================================================
// TESTS
// ============================================================================
