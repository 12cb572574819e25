//! # Expression Evaluator
//!
//! A small interpreted expression language over the variable pool, used by
//! computed variables and inline template conditionals. One top-level form
//! per expression — the forms are mutually exclusive, dispatched in order:
//!
//! 1. contains `|` → aggregate over a complex array (`items | sum:amount`)
//! 2. contains `?` and `:` → ternary (`paid ? "Paid" : "Due"`)
//! 3. comparison operator or ` and `/` or ` → boolean comparison
//! 4. `- * / %` outside quotes → arithmetic (two-pass precedence)
//! 5. `+` only → arithmetic when every operand is numeric, else string
//!    concatenation
//! 6. otherwise → literal or variable lookup (dot-paths supported)
//!
//! The evaluator never panics on malformed input: unresolvable operands
//! default to `0` (arithmetic) or null, division by zero yields `0`, and
//! hard failures (missing aggregate source, unknown function) surface as
//! [`ExprError`] for the caller to absorb.

pub mod aggregate;
pub mod value;

pub use value::ExprValue;

use thiserror::Error;

use crate::vars::VariablePool;

/// Numeric equality tolerance for `==` / `!=`.
pub(crate) const EPSILON: f64 = 0.0001;

/// Evaluation failure. Callers (the computed-variable scheduler, template
/// placeholders) recover by substituting a default — these never abort a
/// document.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    #[error("not an array: {0}")]
    NotAnArray(String),

    #[error("unknown aggregate function: {0}")]
    UnknownFunction(String),

    #[error("malformed expression: {0}")]
    Malformed(String),
}

/// Expression evaluator bound to a variable pool snapshot.
pub struct Evaluator<'a> {
    pool: &'a VariablePool,
}

impl<'a> Evaluator<'a> {
    pub fn new(pool: &'a VariablePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &VariablePool {
        self.pool
    }

    /// Evaluate an expression to a typed value.
    pub fn evaluate(&self, expr: &str) -> Result<ExprValue, ExprError> {
        let t = expr.trim();
        if t.is_empty() {
            return Ok(ExprValue::Null);
        }
        if contains_outside_quotes(t, "|") {
            return aggregate::evaluate(self, t);
        }
        if contains_outside_quotes(t, "?") && contains_outside_quotes(t, ":") {
            return self.evaluate_ternary(t);
        }
        if has_keyword_ci(t, " and ") || has_keyword_ci(t, " or ") || find_comparison(t).is_some()
        {
            return Ok(ExprValue::Bool(self.evaluate_condition(t)));
        }
        if t.parse::<f64>().is_err()
            && ['-', '*', '/', '%']
                .iter()
                .any(|op| contains_outside_quotes(t, &op.to_string()))
        {
            return Ok(self.evaluate_arithmetic(t));
        }
        if contains_outside_quotes(t, "+") {
            return Ok(self.evaluate_plus_chain(t));
        }
        self.evaluate_operand(t)
    }

    /// Evaluate and render, optionally through a display format
    /// (date pattern, numeric pattern, currency code, case transform).
    pub fn evaluate_to_string(
        &self,
        expr: &str,
        format: Option<&str>,
    ) -> Result<String, ExprError> {
        let value = self.evaluate(expr)?;
        Ok(match format.map(str::trim).filter(|f| !f.is_empty()) {
            Some(f) => crate::template::format::apply(&value, f),
            None => value.display_string(),
        })
    }

    /// Evaluate an expression as a boolean condition.
    ///
    /// Compound conditions split on ` and ` / ` or ` (case-insensitive,
    /// naive sequential split, `and` checked first); single comparisons use
    /// the first operator found; anything else falls back to truthiness.
    pub fn evaluate_condition(&self, expr: &str) -> bool {
        let t = expr.trim();
        if has_keyword_ci(t, " and ") {
            return split_keyword_ci(t, " and ")
                .iter()
                .all(|p| self.evaluate_condition(p));
        }
        if has_keyword_ci(t, " or ") {
            return split_keyword_ci(t, " or ")
                .iter()
                .any(|p| self.evaluate_condition(p));
        }
        if let Some((op, pos)) = find_comparison(t) {
            let left = &t[..pos];
            let right = &t[pos + op.len()..];
            return self.compare(left, right, op);
        }
        self.evaluate(t)
            .map(|v| v.is_truthy())
            .unwrap_or(false)
    }

    // ------------------------------------------------------------------
    // dispatch targets
    // ------------------------------------------------------------------

    fn evaluate_ternary(&self, expr: &str) -> Result<ExprValue, ExprError> {
        let q = find_outside_quotes(expr, "?")
            .ok_or_else(|| ExprError::Malformed(expr.to_string()))?;
        let condition = &expr[..q];
        let rest = &expr[q + 1..];
        let c = find_outside_quotes(rest, ":")
            .ok_or_else(|| ExprError::Malformed(expr.to_string()))?;
        let branch = if self.evaluate_condition(condition) {
            &rest[..c]
        } else {
            &rest[c + 1..]
        };
        self.evaluate_branch(branch)
    }

    /// Ternary branch: quoted literal, bare variable, or nested expression.
    fn evaluate_branch(&self, s: &str) -> Result<ExprValue, ExprError> {
        let t = s.trim();
        if let Some(inner) = strip_quotes(t) {
            return Ok(ExprValue::Text(inner.to_string()));
        }
        self.evaluate(t)
    }

    fn compare(&self, left: &str, right: &str, op: &str) -> bool {
        let l = self.evaluate(left.trim()).unwrap_or(ExprValue::Null);
        let r = self.evaluate(right.trim()).unwrap_or(ExprValue::Null);
        match (l.as_f64(), r.as_f64()) {
            (Some(a), Some(b)) => match op {
                "==" => (a - b).abs() < EPSILON,
                "!=" => (a - b).abs() >= EPSILON,
                ">" => a > b,
                "<" => a < b,
                ">=" => a >= b,
                "<=" => a <= b,
                _ => false,
            },
            _ => {
                let a = l.display_string().to_lowercase();
                let b = r.display_string().to_lowercase();
                match op {
                    "==" => a == b,
                    "!=" => a != b,
                    ">" => a > b,
                    "<" => a < b,
                    ">=" => a >= b,
                    "<=" => a <= b,
                    _ => false,
                }
            }
        }
    }

    /// Two-pass operator precedence: `* / %` left-to-right, then `+ -`.
    /// Division and modulo by zero yield 0.
    fn evaluate_arithmetic(&self, expr: &str) -> ExprValue {
        let (operands, operators) = split_arithmetic(expr);
        let values: Vec<f64> = operands.iter().map(|o| self.numeric_operand(o)).collect();

        let mut reduced = vec![values[0]];
        let mut pending = Vec::new();
        for (i, op) in operators.iter().enumerate() {
            let rhs = values[i + 1];
            match op {
                '*' | '/' | '%' => {
                    let lhs = reduced.pop().unwrap_or(0.0);
                    let v = match op {
                        '*' => lhs * rhs,
                        '/' if rhs != 0.0 => lhs / rhs,
                        '%' if rhs != 0.0 => lhs % rhs,
                        _ => 0.0,
                    };
                    reduced.push(v);
                }
                _ => {
                    pending.push(*op);
                    reduced.push(rhs);
                }
            }
        }

        let mut acc = reduced[0];
        for (i, op) in pending.iter().enumerate() {
            match op {
                '+' => acc += reduced[i + 1],
                '-' => acc -= reduced[i + 1],
                _ => {}
            }
        }
        ExprValue::Number(acc)
    }

    /// A `+`-only chain: arithmetic unless some operand is clearly a string
    /// (a quoted literal, or a variable whose resolved value is a
    /// non-numeric string). Unresolvable operands are not string evidence —
    /// they sum as 0.
    fn evaluate_plus_chain(&self, expr: &str) -> ExprValue {
        let (operands, _) = split_arithmetic(expr);
        let any_quoted = operands.iter().any(|o| strip_quotes(o).is_some());
        let resolved: Vec<Option<ExprValue>> =
            operands.iter().map(|o| self.operand_value(o)).collect();

        let all_numeric = !any_quoted
            && resolved.iter().all(|r| match r {
                None | Some(ExprValue::Null) => true,
                Some(v) => v.as_f64().is_some(),
            });
        if all_numeric {
            let sum = resolved
                .iter()
                .map(|r| r.as_ref().and_then(|v| v.as_f64()).unwrap_or(0.0))
                .sum();
            return ExprValue::Number(sum);
        }

        let mut out = String::new();
        for (operand, value) in operands.iter().zip(&resolved) {
            if let Some(inner) = strip_quotes(operand) {
                out.push_str(inner);
            } else if let Some(v) = value {
                out.push_str(&v.display_string());
            }
        }
        ExprValue::Text(out)
    }

    /// Literal or variable (rule 6). Unresolved names yield null.
    fn evaluate_operand(&self, t: &str) -> Result<ExprValue, ExprError> {
        if let Some(inner) = strip_quotes(t) {
            return Ok(ExprValue::Text(inner.to_string()));
        }
        if let Ok(n) = t.parse::<f64>() {
            return Ok(ExprValue::Number(n));
        }
        match t.to_lowercase().as_str() {
            "true" => Ok(ExprValue::Bool(true)),
            "false" => Ok(ExprValue::Bool(false)),
            "null" => Ok(ExprValue::Null),
            _ => Ok(self.pool.resolve_value(t).unwrap_or(ExprValue::Null)),
        }
    }

    /// Operand lookup that reports resolution failure (`None`) instead of
    /// collapsing it to null — the `+`-chain uses the difference.
    fn operand_value(&self, raw: &str) -> Option<ExprValue> {
        let t = raw.trim();
        if t.is_empty() {
            return None;
        }
        if let Some(inner) = strip_quotes(t) {
            return Some(ExprValue::Text(inner.to_string()));
        }
        if let Ok(n) = t.parse::<f64>() {
            return Some(ExprValue::Number(n));
        }
        match t.to_lowercase().as_str() {
            "true" => Some(ExprValue::Bool(true)),
            "false" => Some(ExprValue::Bool(false)),
            "null" => Some(ExprValue::Null),
            _ => self.pool.resolve_value(t),
        }
    }

    /// Numeric operand for arithmetic: literals parse, variables resolve and
    /// coerce, anything unresolvable contributes 0.
    fn numeric_operand(&self, raw: &str) -> f64 {
        let t = raw.trim();
        if t.is_empty() {
            return 0.0;
        }
        if let Ok(n) = t.parse::<f64>() {
            return n;
        }
        if let Some(inner) = strip_quotes(t) {
            return inner.trim().parse().unwrap_or(0.0);
        }
        let (negate, body) = match t.strip_prefix('-') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, t),
        };
        let resolved = self
            .pool
            .resolve_value(body)
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        if negate { -resolved } else { resolved }
    }
}

// ============================================================================
// SCANNING HELPERS
// ============================================================================
//
// All patterns scanned here are ASCII, so byte-wise scanning is safe: UTF-8
// continuation bytes never collide with ASCII values, and every match
// position is a char boundary.

/// Strip matching single or double quotes from a trimmed token.
pub(crate) fn strip_quotes(t: &str) -> Option<&str> {
    let t = t.trim();
    let bytes = t.as_bytes();
    if bytes.len() >= 2
        && (bytes[0] == b'"' || bytes[0] == b'\'')
        && bytes[bytes.len() - 1] == bytes[0]
    {
        Some(&t[1..t.len() - 1])
    } else {
        None
    }
}

/// Byte position of the first occurrence of `needle` outside quotes.
pub(crate) fn find_outside_quotes(s: &str, needle: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let n = needle.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => {
                if b == b'"' || b == b'\'' {
                    quote = Some(b);
                } else if bytes[i..].starts_with(n) {
                    return Some(i);
                }
            }
        }
        i += 1;
    }
    None
}

pub(crate) fn contains_outside_quotes(s: &str, needle: &str) -> bool {
    find_outside_quotes(s, needle).is_some()
}

/// True if the ASCII keyword (e.g. `" and "`) occurs outside quotes,
/// case-insensitively.
pub(crate) fn has_keyword_ci(s: &str, word: &str) -> bool {
    split_keyword_ci(s, word).len() > 1
}

/// Split on every outside-quotes occurrence of an ASCII keyword,
/// case-insensitively. Returns the whole input as a single part when the
/// keyword is absent.
pub(crate) fn split_keyword_ci<'s>(s: &'s str, word: &str) -> Vec<&'s str> {
    let bytes = s.as_bytes();
    let w = word.as_bytes();
    let mut parts = Vec::new();
    let mut quote: Option<u8> = None;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
                i += 1;
            }
            None => {
                if b == b'"' || b == b'\'' {
                    quote = Some(b);
                    i += 1;
                } else if i + w.len() <= bytes.len()
                    && bytes[i..i + w.len()].eq_ignore_ascii_case(w)
                {
                    parts.push(&s[start..i]);
                    i += w.len();
                    start = i;
                } else {
                    i += 1;
                }
            }
        }
    }
    parts.push(&s[start..]);
    parts
}

/// First comparison operator outside quotes: two-char operators checked
/// before their one-char prefixes.
fn find_comparison(s: &str) -> Option<(&'static str, usize)> {
    let bytes = s.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => {
                if b == b'"' || b == b'\'' {
                    quote = Some(b);
                } else {
                    for op in ["==", "!=", ">=", "<="] {
                        if bytes[i..].starts_with(op.as_bytes()) {
                            return Some((op, i));
                        }
                    }
                    if b == b'>' {
                        return Some((">", i));
                    }
                    if b == b'<' {
                        return Some(("<", i));
                    }
                }
            }
        }
        i += 1;
    }
    None
}

/// Split an arithmetic chain into operands and operators, outside quotes.
/// A sign directly after an operator (or at the start) belongs to its
/// operand.
fn split_arithmetic(expr: &str) -> (Vec<String>, Vec<char>) {
    let mut operands = Vec::new();
    let mut operators = Vec::new();
    let mut buf = String::new();
    let mut quote: Option<char> = None;
    for ch in expr.chars() {
        match quote {
            Some(q) => {
                buf.push(ch);
                if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '"' | '\'' => {
                    quote = Some(ch);
                    buf.push(ch);
                }
                '+' | '-' | '*' | '/' | '%' => {
                    if buf.trim().is_empty() {
                        buf.push(ch);
                    } else {
                        operands.push(buf.trim().to_string());
                        operators.push(ch);
                        buf.clear();
                    }
                }
                _ => buf.push(ch),
            },
        }
    }
    operands.push(buf.trim().to_string());
    (operands, operators)
}

// ============================================================================
// TESTS
// ============================================================================
