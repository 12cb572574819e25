//! Value Resolver: name → value lookups against the pool.
//!
//! Resolution order for a plain name is `simple` first, then `complex`.
//! Dot-paths (`a.b.c`) navigate into complex objects segment by segment,
//! case-sensitive with a case-insensitive fallback at each step; when the
//! root is not a complex variable the whole dotted string is tried as a
//! literal flattened key instead.

use serde_json::Value;

use super::VariablePool;
use crate::expr::value::ExprValue;

/// Outcome of an existence-aware lookup.
///
/// Distinguishes "key absent" from "key present but null" — a complex value
/// of JSON null is `Defined(ExprValue::Null)`, not `Absent`. The
/// null-coalescing operator depends on this distinction.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Absent,
    Defined(ExprValue),
}

impl Lookup {
    pub fn is_defined(&self) -> bool {
        matches!(self, Lookup::Defined(_))
    }
}

impl VariablePool {
    /// Resolve a name (or dot-path) to its display string.
    pub fn resolve(&self, name: &str) -> Option<String> {
        self.resolve_value(name).map(|v| v.display_string())
    }

    /// Resolve a name (or dot-path) to a typed value.
    pub fn resolve_value(&self, name: &str) -> Option<ExprValue> {
        match self.lookup(name) {
            Lookup::Defined(v) => Some(v),
            Lookup::Absent => None,
        }
    }

    /// Existence-aware resolution: absent vs defined-with-null.
    pub fn lookup(&self, name: &str) -> Lookup {
        if let Some(s) = self.simple().get(name) {
            return Lookup::Defined(ExprValue::Text(s.clone()));
        }
        if let Some(v) = self.complex().get(name) {
            return Lookup::Defined(ExprValue::from(v));
        }
        if name.contains('.') {
            return self.lookup_path(name);
        }
        Lookup::Absent
    }

    /// The complex array behind `name`, if any. Loop and aggregate sources
    /// must be top-level complex arrays — no dot-paths.
    pub fn complex_array(&self, name: &str) -> Option<&Vec<Value>> {
        self.complex().get(name).and_then(Value::as_array)
    }

    fn lookup_path(&self, path: &str) -> Lookup {
        let (root, rest) = match path.split_once('.') {
            Some(parts) => parts,
            None => return Lookup::Absent,
        };

        let root_value = match get_ci(self.complex(), root) {
            Some(v) => v,
            // Root is not a complex variable: try the whole dotted string
            // as a literal flattened key.
            None => {
                return match self.simple().get(path) {
                    Some(s) => Lookup::Defined(ExprValue::Text(s.clone())),
                    None => Lookup::Absent,
                };
            }
        };

        let mut current = root_value;
        for segment in rest.split('.') {
            let obj = match current.as_object() {
                Some(obj) => obj,
                None => return Lookup::Absent,
            };
            current = match get_map_ci(obj, segment) {
                Some(v) => v,
                None => return Lookup::Absent,
            };
        }
        Lookup::Defined(ExprValue::from(current))
    }
}

/// Case-sensitive get with case-insensitive fallback.
fn get_ci<'a>(
    map: &'a std::collections::HashMap<String, Value>,
    key: &str,
) -> Option<&'a Value> {
    if let Some(v) = map.get(key) {
        return Some(v);
    }
    map.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

/// Same fallback for JSON object maps (used for nested navigation and
/// aggregate property projection).
pub(crate) fn get_map_ci<'a>(
    map: &'a serde_json::Map<String, Value>,
    key: &str,
) -> Option<&'a Value> {
    if let Some(v) = map.get(key) {
        return Some(v);
    }
    map.iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn pool() -> VariablePool {
        let simple = HashMap::from([
            ("name".to_string(), "Ann".to_string()),
            ("company.phone".to_string(), "555-0100".to_string()),
        ]);
        let complex = HashMap::from([
            (
                "user".to_string(),
                json!({"name": "Ann", "address": {"city": "X", "Zip": "10001"}}),
            ),
            ("middleName".to_string(), json!(null)),
            ("items".to_string(), json!([1, 2, 3])),
            (
                "total".to_string(),
                json!({"value": 99.9, "currency": "USD"}),
            ),
        ]);
        VariablePool::from_parts(simple, complex)
    }

    #[test]
    fn test_simple_wins_over_complex() {
        assert_eq!(pool().resolve("name").as_deref(), Some("Ann"));
    }

    #[test]
    fn test_dot_path_navigation() {
        assert_eq!(pool().resolve("user.address.city").as_deref(), Some("X"));
    }

    #[test]
    fn test_dot_path_missing_link_is_absent() {
        assert_eq!(pool().resolve("user.address.zip2"), None);
        assert_eq!(pool().resolve("user.name.deeper"), None);
    }

    #[test]
    fn test_dot_path_case_insensitive_fallback() {
        let p = pool();
        // exact "Zip" key reached via lowercase segment
        assert_eq!(p.resolve("user.address.zip").as_deref(), Some("10001"));
        assert_eq!(p.resolve("USER.name").as_deref(), Some("Ann"));
    }

    #[test]
    fn test_dotted_literal_falls_back_to_simple() {
        assert_eq!(pool().resolve("company.phone").as_deref(), Some("555-0100"));
    }

    #[test]
    fn test_defined_with_null_is_not_absent() {
        let p = pool();
        assert_eq!(p.lookup("middleName"), Lookup::Defined(ExprValue::Null));
        assert_eq!(p.lookup("nothing"), Lookup::Absent);
    }

    #[test]
    fn test_money_object_resolves_to_symbol_format() {
        assert_eq!(pool().resolve("total").as_deref(), Some("$99.90"));
    }

    #[test]
    fn test_complex_array_accessor() {
        let p = pool();
        assert_eq!(p.complex_array("items").map(Vec::len), Some(3));
        assert!(p.complex_array("user").is_none());
        assert!(p.complex_array("missing").is_none());
    }

    #[test]
    fn test_array_renders_as_json_text() {
        assert_eq!(pool().resolve("items").as_deref(), Some("[1,2,3]"));
    }
}
