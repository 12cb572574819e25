//! Dynamic values produced by variable resolution and expression evaluation.
//!
//! Everything the expression language touches — pool lookups, literals,
//! aggregate results — flows through [`ExprValue`]. The variants mirror the
//! JSON data model: scalars stay typed, arrays and objects keep their
//! structured form for iteration and nested-property access.

use serde_json::Value;

/// A resolved value inside the expression/template language.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprValue {
    /// Absent-or-null. Renders as an empty string.
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    /// A structured JSON array (loop/aggregate source).
    Array(Vec<Value>),
    /// A structured JSON object (nested-property source).
    Object(serde_json::Map<String, Value>),
}

impl ExprValue {
    /// Truthiness rules for conditionals.
    ///
    /// Strings are trimmed and lowercased first: `""`, `"false"`, `"0"`,
    /// `"no"` and `"null"` are falsy, everything else is truthy. Arrays are
    /// truthy iff non-empty; objects are always truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            ExprValue::Null => false,
            ExprValue::Bool(b) => *b,
            ExprValue::Number(n) => *n != 0.0,
            ExprValue::Text(s) => {
                !matches!(
                    s.trim().to_lowercase().as_str(),
                    "" | "false" | "0" | "no" | "null"
                )
            }
            ExprValue::Array(items) => !items.is_empty(),
            ExprValue::Object(_) => true,
        }
    }

    /// Numeric coercion: numbers as-is, booleans as 1/0, strings parsed
    /// after trimming. Arrays, objects and null don't coerce.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ExprValue::Number(n) => Some(*n),
            ExprValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            ExprValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Render the value for output.
    ///
    /// Null renders empty, numbers drop a trailing `.0`, money objects
    /// (`{value, currency}`) render as `<symbol><amount to 2 decimals>`,
    /// and other arrays/objects render as compact JSON text.
    pub fn display_string(&self) -> String {
        match self {
            ExprValue::Null => String::new(),
            ExprValue::Bool(b) => b.to_string(),
            ExprValue::Number(n) => format_number(*n),
            ExprValue::Text(s) => s.clone(),
            ExprValue::Array(items) => {
                serde_json::to_string(&Value::Array(items.clone())).unwrap_or_default()
            }
            ExprValue::Object(map) => {
                if let Some(money) = format_money(map) {
                    money
                } else {
                    serde_json::to_string(&Value::Object(map.clone())).unwrap_or_default()
                }
            }
        }
    }
}

impl From<&Value> for ExprValue {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => ExprValue::Null,
            Value::Bool(b) => ExprValue::Bool(*b),
            Value::Number(n) => ExprValue::Number(n.as_f64().unwrap_or(0.0)),
            Value::String(s) => ExprValue::Text(s.clone()),
            Value::Array(items) => ExprValue::Array(items.clone()),
            Value::Object(map) => ExprValue::Object(map.clone()),
        }
    }
}

/// Format a float without a spurious `.0` on whole numbers.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

// ============================================================================
// MONEY CONVENTION
// ============================================================================

/// Symbol for an ISO currency code. Unknown codes fall back to `$`.
pub fn currency_symbol(code: &str) -> &'static str {
    match code.to_uppercase().as_str() {
        "USD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "JPY" => "¥",
        "CNY" => "¥",
        "CAD" => "CA$",
        "AUD" => "A$",
        "CHF" => "CHF ",
        "INR" => "₹",
        "KRW" => "₩",
        "BRL" => "R$",
        "MXN" => "MX$",
        _ => "$",
    }
}

/// True if `code` is one of the known currency codes (case-insensitive).
pub fn is_currency_code(code: &str) -> bool {
    matches!(
        code.to_uppercase().as_str(),
        "USD" | "EUR" | "GBP" | "JPY" | "CNY" | "CAD" | "AUD" | "CHF" | "INR" | "KRW" | "BRL"
            | "MXN"
    )
}

/// Render a money object (`{value, currency}`) as `<symbol><value:2dp>`.
/// Returns `None` if the map is not a money object.
pub fn format_money(map: &serde_json::Map<String, Value>) -> Option<String> {
    if !map.contains_key("value") || !map.contains_key("currency") {
        return None;
    }
    let amount = map
        .get("value")
        .map(ExprValue::from)
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);
    let symbol = map
        .get("currency")
        .and_then(Value::as_str)
        .map(currency_symbol)
        .unwrap_or("$");
    Some(format!("{}{:.2}", symbol, amount))
}

// ============================================================================
// TESTS
// ============================================================================
