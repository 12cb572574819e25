//! Computed-variable scheduler.
//!
//! Orders computed definitions by their `dependsOn` edges (depth-first
//! topological sort) and evaluates them in sequence against the pool
//! accumulated so far, so later computed variables can read earlier ones.
//! Cycles are surfaced as explicit [`ComputedIssue::CyclicDependency`]
//! entries — the flagged definition falls back to its default instead of
//! silently dropping out of the order. Evaluation failures likewise fall
//! back to the default (or empty string) and never abort the document.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use super::VariablePool;
use super::definition::VariableDefinition;
use crate::expr::{Evaluator, ExprValue};

/// Something the scheduler recovered from, reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ComputedIssue {
    /// The definition participates in a dependency cycle; its default was
    /// used instead of its expression.
    CyclicDependency { name: String },
    /// The expression failed to evaluate; the default was used.
    EvaluationFailed { name: String, error: String },
}

impl fmt::Display for ComputedIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputedIssue::CyclicDependency { name } => {
                write!(f, "{name}: cyclic dependency, default used")
            }
            ComputedIssue::EvaluationFailed { name, error } => write!(f, "{name}: {error}"),
        }
    }
}

/// Evaluated computed values plus whatever went wrong along the way.
#[derive(Debug, Clone, Default)]
pub struct ComputedOutcome {
    pub values: HashMap<String, String>,
    pub issues: Vec<ComputedIssue>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum VisitState {
    InProgress,
    Done,
}

/// Evaluate every effectively-computed definition against `pool`.
pub fn evaluate_computed(
    definitions: &[VariableDefinition],
    pool: &VariablePool,
) -> ComputedOutcome {
    let computed: Vec<&VariableDefinition> = definitions
        .iter()
        .filter(|d| d.is_effectively_computed())
        .collect();
    let by_name: HashMap<&str, &VariableDefinition> =
        computed.iter().map(|d| (d.name.as_str(), *d)).collect();

    let mut order = Vec::with_capacity(computed.len());
    let mut state: HashMap<String, VisitState> = HashMap::new();
    let mut cyclic: Vec<String> = Vec::new();
    for def in &computed {
        visit(&def.name, &by_name, &mut state, &mut cyclic, &mut order);
    }

    let mut working = pool.clone();
    let mut values = HashMap::new();
    let mut issues = Vec::new();
    for def in order {
        let text = if cyclic.contains(&def.name) {
            issues.push(ComputedIssue::CyclicDependency { name: def.name.clone() });
            fallback_text(def)
        } else {
            let expr = def.expression.as_deref().unwrap_or_default();
            match Evaluator::new(&working).evaluate_to_string(expr, def.format.as_deref()) {
                Ok(text) => text,
                Err(err) => {
                    issues.push(ComputedIssue::EvaluationFailed {
                        name: def.name.clone(),
                        error: err.to_string(),
                    });
                    fallback_text(def)
                }
            }
        };
        working.insert_simple(&def.name, text.clone());
        values.insert(def.name.clone(), text);
    }
    ComputedOutcome { values, issues }
}

/// Depth-first post-order walk. A dependency found in-progress is the target
/// of a back edge — that name is recorded as cyclic and not descended into.
fn visit<'d>(
    name: &str,
    by_name: &HashMap<&str, &'d VariableDefinition>,
    state: &mut HashMap<String, VisitState>,
    cyclic: &mut Vec<String>,
    order: &mut Vec<&'d VariableDefinition>,
) {
    let Some(def) = by_name.get(name).copied() else {
        // non-computed dependency: its value is already in the pool
        return;
    };
    if state.contains_key(name) {
        return;
    }
    state.insert(name.to_string(), VisitState::InProgress);
    for dep in &def.depends_on {
        if state.get(dep.as_str()) == Some(&VisitState::InProgress) {
            if by_name.contains_key(dep.as_str()) && !cyclic.contains(dep) {
                cyclic.push(dep.clone());
            }
            continue;
        }
        visit(dep, by_name, state, cyclic, order);
    }
    state.insert(name.to_string(), VisitState::Done);
    order.push(def);
}

/// Recovery value: the declared default, formatted the same way a computed
/// result would be.
fn fallback_text(def: &VariableDefinition) -> String {
    let Some(default) = def.default_value.as_ref() else {
        return String::new();
    };
    let value = ExprValue::from(default);
    match def.format.as_deref() {
        Some(f) => crate::template::format::apply(&value, f),
        None => value.display_string(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vars::definition::VariableType;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn computed(name: &str, expression: &str, depends_on: &[&str]) -> VariableDefinition {
        let mut d = VariableDefinition::new(name, VariableType::Number);
        d.is_computed = true;
        d.expression = Some(expression.to_string());
        d.depends_on = depends_on.iter().map(|s| s.to_string()).collect();
        d
    }

    #[test]
    fn test_chain_evaluates_in_dependency_order() {
        // supplied in reverse order on purpose
        let defs = vec![
            computed("c", "b * 2", &["b"]),
            computed("b", "a * 2", &["a"]),
            computed("a", "2", &[]),
        ];
        let outcome = evaluate_computed(&defs, &VariablePool::new());
        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.values.get("a").map(String::as_str), Some("2"));
        assert_eq!(outcome.values.get("b").map(String::as_str), Some("4"));
        assert_eq!(outcome.values.get("c").map(String::as_str), Some("8"));
    }

    #[test]
    fn test_reads_base_pool_values() {
        let mut pool = VariablePool::new();
        pool.insert_simple("quantity", "4");
        pool.insert_complex("items", json!([{"amount": 10}, {"amount": 5}]));

        let defs = vec![
            computed("subtotal", "items | sum:amount", &[]),
            computed("total", "subtotal + quantity", &["subtotal"]),
        ];
        let outcome = evaluate_computed(&defs, &pool);
        assert_eq!(outcome.values.get("subtotal").map(String::as_str), Some("15"));
        assert_eq!(outcome.values.get("total").map(String::as_str), Some("19"));
    }

    #[test]
    fn test_format_applied_to_result() {
        let mut d = computed("total", "2 + 3", &[]);
        d.format = Some("N2".to_string());
        let outcome = evaluate_computed(&[d], &VariablePool::new());
        assert_eq!(outcome.values.get("total").map(String::as_str), Some("5.00"));
    }

    #[test]
    fn test_cycle_is_flagged_and_default_used() {
        let mut a = computed("a", "b + 1", &["b"]);
        a.default_value = Some(json!("10"));
        let b = computed("b", "a + 1", &["a"]);

        let outcome = evaluate_computed(&[a, b], &VariablePool::new());
        assert_eq!(
            outcome.issues,
            vec![ComputedIssue::CyclicDependency { name: "a".into() }]
        );
        // a fell back to its default; b evaluated with a unresolved (0)
        assert_eq!(outcome.values.get("a").map(String::as_str), Some("10"));
        assert_eq!(outcome.values.get("b").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_self_cycle() {
        let mut d = computed("a", "a + 1", &["a"]);
        d.default_value = Some(json!("7"));
        let outcome = evaluate_computed(&[d], &VariablePool::new());
        assert_eq!(
            outcome.issues,
            vec![ComputedIssue::CyclicDependency { name: "a".into() }]
        );
        assert_eq!(outcome.values.get("a").map(String::as_str), Some("7"));
    }

    #[test]
    fn test_failure_falls_back_to_default() {
        let mut d = computed("total", "ghost | sum", &[]);
        d.default_value = Some(json!("0"));
        let outcome = evaluate_computed(&[d], &VariablePool::new());
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.values.get("total").map(String::as_str), Some("0"));
    }

    #[test]
    fn test_failure_without_default_is_empty_string() {
        let d = computed("total", "ghost | sum", &[]);
        let outcome = evaluate_computed(&[d], &VariablePool::new());
        assert_eq!(outcome.values.get("total").map(String::as_str), Some(""));
    }

    #[test]
    fn test_non_computed_definitions_are_ignored() {
        let plain = VariableDefinition::new("name", VariableType::String);
        let mut inert = VariableDefinition::new("x", VariableType::Number);
        inert.is_computed = true; // no expression
        let outcome = evaluate_computed(&[plain, inert], &VariablePool::new());
        assert!(outcome.values.is_empty());
        assert!(outcome.issues.is_empty());
    }
}
