//! Variable definition schema.
//!
//! Definitions are parsed fresh from a document's JSON content on every
//! operation — they are a view over the content blob, never persisted on
//! their own.

use serde::{Deserialize, Serialize};

/// Declared data type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    #[default]
    String,
    Number,
    Boolean,
    Date,
    Currency,
    Array,
    Object,
}

/// Schema entry for one named variable.
///
/// A definition declares what the document expects: the value's type, whether
/// it is required, how to format it for display, and — for computed
/// variables — the expression that derives it from other variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDefinition {
    /// Unique key within the definition set.
    #[serde(default)]
    pub name: String,
    /// Declared value type (default: string).
    #[serde(default, rename = "type")]
    pub kind: VariableType,
    /// Human-readable label shown in validation messages and the editor.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub required: bool,
    /// Fallback value when no runtime value is supplied.
    #[serde(default)]
    pub default_value: Option<serde_json::Value>,
    /// Regex the value must match (string type only). An invalid pattern is
    /// silently ignored, not a validation error.
    #[serde(default)]
    pub pattern: Option<String>,
    /// Display format: a date pattern (`MMMM dd, yyyy`), a numeric pattern
    /// (`N2`, `0.00`), or a currency code.
    #[serde(default)]
    pub format: Option<String>,
    /// Minimum array length (array type only).
    #[serde(default)]
    pub min_items: Option<usize>,
    /// Maximum array length (array type only).
    #[serde(default)]
    pub max_items: Option<usize>,
    /// Schema of each array element (array type only). Not validated
    /// recursively; carried for editor tooling.
    #[serde(default)]
    pub item_schema: Option<Box<VariableDefinition>>,
    /// Nested property definitions (object type only). Not validated
    /// recursively; carried for editor tooling.
    #[serde(default)]
    pub properties: Option<Vec<VariableDefinition>>,
    /// True when the value is derived from `expression` instead of supplied.
    #[serde(default)]
    pub is_computed: bool,
    /// Source text of the deriving expression (computed variables only).
    #[serde(default)]
    pub expression: Option<String>,
    /// Names of other definitions this expression reads.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl VariableDefinition {
    /// A plain definition with just a name and type.
    pub fn new(name: impl Into<String>, kind: VariableType) -> Self {
        Self {
            name: name.into(),
            kind,
            label: None,
            required: false,
            default_value: None,
            pattern: None,
            format: None,
            min_items: None,
            max_items: None,
            item_schema: None,
            properties: None,
            is_computed: false,
            expression: None,
            depends_on: Vec::new(),
        }
    }

    /// Label if set, otherwise the name. Used in validation messages.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// True only when the definition is computed *and* carries a non-blank
    /// expression — a computed flag without an expression is inert.
    pub fn is_effectively_computed(&self) -> bool {
        self.is_computed
            && self
                .expression
                .as_deref()
                .is_some_and(|e| !e.trim().is_empty())
    }
}
