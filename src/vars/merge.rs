//! Precedence merge: defaults → document variables → runtime variables.
//!
//! Produces a fresh [`VariablePool`] snapshot; nothing upstream is mutated.
//! Scalars are formatted for display at write time using the matching
//! definition's type and format, so the simple map always holds final
//! display text. Arrays and objects keep their structure in the complex map;
//! money objects additionally get a flattened `$12.50`-style simple entry so
//! plain substitution works on them.

use std::collections::HashMap;

use serde_json::Value;

use super::definition::{VariableDefinition, VariableType};
use super::validate::is_blank;
use super::VariablePool;
use crate::expr::ExprValue;
use crate::expr::value::{format_money, format_number};
use crate::template::format::{
    DEFAULT_DATE_FORMAT, format_date, format_number_pattern, group_thousands, parse_date,
};

/// Build the variable pool for one generation request. Later sources win;
/// computed variables are layered on afterwards by the scheduler.
pub fn merge(
    definitions: &[VariableDefinition],
    document_vars: &HashMap<String, Value>,
    runtime: &HashMap<String, Value>,
) -> VariablePool {
    let by_name: HashMap<&str, &VariableDefinition> =
        definitions.iter().map(|d| (d.name.as_str(), d)).collect();

    let mut pool = VariablePool::new();
    for def in definitions {
        if let Some(default) = def.default_value.as_ref().filter(|v| !is_blank(v)) {
            write_value(&mut pool, &def.name, default, Some(def));
        }
    }
    for (name, value) in document_vars {
        write_value(&mut pool, name, value, by_name.get(name.as_str()).copied());
    }
    for (name, value) in runtime {
        write_value(&mut pool, name, value, by_name.get(name.as_str()).copied());
    }
    pool
}

fn write_value(
    pool: &mut VariablePool,
    name: &str,
    value: &Value,
    def: Option<&VariableDefinition>,
) {
    match value {
        Value::Array(_) => pool.insert_complex(name, value.clone()),
        Value::Object(map) => {
            if let Some(text) = format_money(map) {
                pool.insert_simple(name, text);
            }
            pool.insert_complex(name, value.clone());
        }
        _ => pool.insert_simple(name, format_scalar(value, def)),
    }
}

/// Display text for a scalar, shaped by the definition's type. Values that
/// fail to parse keep their raw rendering.
fn format_scalar(value: &Value, def: Option<&VariableDefinition>) -> String {
    let text = ExprValue::from(value).display_string();
    let Some(def) = def else {
        return text;
    };
    match def.kind {
        VariableType::Date => match parse_date(&text) {
            Some(dt) => format_date(
                &dt,
                def.format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT),
            ),
            None => text,
        },
        VariableType::Currency => match text.trim().parse::<f64>() {
            Ok(n) => format!("${:.2}", n),
            Err(_) => text,
        },
        VariableType::Number => match text.trim().parse::<f64>() {
            Ok(n) => def
                .format
                .as_deref()
                .and_then(|f| format_number_pattern(n, f))
                .unwrap_or_else(|| group_thousands(&format_number(n))),
            Err(_) => text,
        },
        VariableType::Boolean => {
            if matches!(text.trim().to_lowercase().as_str(), "true" | "1" | "yes") {
                "Yes".into()
            } else {
                "No".into()
            }
        }
        _ => text,
    }
}

// ============================================================================
// TESTS
// ============================================================================
