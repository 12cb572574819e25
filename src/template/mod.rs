//! # Template Engine
//!
//! Resolves `{{...}}` placeholders in document text against the variable
//! pool. The token grammar, in dispatch order:
//!
//! 1. Built-in tokens: `{{pageNumber}}`, `{{totalPages}}`, `{{date}}`,
//!    `{{year}}`, `{{time}}`, `{{datetime}}`, `{{today}}` — these win over
//!    variables of the same name.
//! 2. Loop bindings inside `{{#each}}`: `{{@index}}`, `{{@number}}`,
//!    `{{@first}}`, `{{@last}}`, `{{this}}`, `{{this.prop}}`, and bare
//!    `{{prop}}` from the current element (checked before the global pool).
//! 3. Inline conditionals: `{{a ?? "d"}}` (defined wins, even when empty),
//!    `{{a ?: "d"}}` (value must be non-blank and truthy), and full ternary
//!    `{{cond ? "x" : "y"}}` via the expression evaluator.
//! 4. Formatted substitution: `{{name:format}}`.
//! 5. Plain substitution: `{{name}}` from the simple map only — complex
//!    values must come through loops or dot-paths, never flat substitution.
//!
//! Block tags `{{#if path}}`, `{{#unless path}}`, `{{#each array}}` nest
//! arbitrarily. Anything unresolvable keeps its literal `{{...}}` token in
//! the output; a template with no tokens comes back unchanged. Substituted
//! values are never re-scanned for placeholders.

pub(crate) mod format;
mod parser;

use chrono::{Local, NaiveDateTime};
use serde_json::Value;

use crate::expr::{
    Evaluator, ExprValue, contains_outside_quotes, find_outside_quotes, strip_quotes,
};
use crate::vars::{Lookup, VariablePool, get_map_ci};
use parser::{Block, BlockKind, Node};

/// One `{{#each}}` iteration: the element plus its position bindings.
struct ItemScope<'v> {
    item: &'v Value,
    index: usize,
    len: usize,
}

/// Placeholder processor for one page of one document.
pub struct TemplateEngine<'a> {
    pool: &'a VariablePool,
    page_number: u32,
    total_pages: u32,
    now: NaiveDateTime,
}

impl<'a> TemplateEngine<'a> {
    pub fn new(pool: &'a VariablePool, page_number: u32, total_pages: u32) -> Self {
        Self::with_clock(pool, page_number, total_pages, Local::now().naive_local())
    }

    /// Engine with an explicit clock, so every page of a document renders
    /// the same date/time tokens.
    pub fn with_clock(
        pool: &'a VariablePool,
        page_number: u32,
        total_pages: u32,
        now: NaiveDateTime,
    ) -> Self {
        Self { pool, page_number, total_pages, now }
    }

    /// Process a template string to its final text.
    pub fn process(&self, template: &str) -> String {
        if !template.contains("{{") {
            return template.to_string();
        }
        let nodes = parser::parse(template);
        let mut out = String::with_capacity(template.len());
        self.render_nodes(&nodes, &mut Vec::new(), &mut out);
        out
    }

    fn render_nodes(&self, nodes: &[Node], scopes: &mut Vec<ItemScope<'a>>, out: &mut String) {
        for node in nodes {
            match node {
                Node::Text(t) => out.push_str(t),
                Node::Placeholder { body, raw } => {
                    self.render_placeholder(body, raw, scopes, out);
                }
                Node::Block(block) => self.render_block(block, scopes, out),
            }
        }
    }

    fn render_block(&self, block: &Block, scopes: &mut Vec<ItemScope<'a>>, out: &mut String) {
        match block.kind {
            BlockKind::If => {
                if self.block_condition(&block.arg, scopes) {
                    self.render_nodes(&block.children, scopes, out);
                }
            }
            BlockKind::Unless => {
                if !self.block_condition(&block.arg, scopes) {
                    self.render_nodes(&block.children, scopes, out);
                }
            }
            BlockKind::Each => self.render_each(block, scopes, out),
        }
    }

    fn render_each(&self, block: &Block, scopes: &mut Vec<ItemScope<'a>>, out: &mut String) {
        // loop source must be a top-level complex array; anything else
        // re-emits the block verbatim
        let Some(items) = self.pool.complex_array(&block.arg) else {
            block.write_raw(out);
            return;
        };
        let len = items.len();
        for (index, item) in items.iter().enumerate() {
            scopes.push(ItemScope { item, index, len });
            self.render_nodes(&block.children, scopes, out);
            scopes.pop();
        }
    }

    /// Truthiness of a block argument. Inside a loop the current element's
    /// properties shadow the global pool.
    fn block_condition(&self, arg: &str, scopes: &[ItemScope]) -> bool {
        self.resolve_scoped(arg, scopes)
            .map(|v| v.is_truthy())
            .unwrap_or(false)
    }

    fn resolve_scoped(&self, path: &str, scopes: &[ItemScope]) -> Option<ExprValue> {
        if let Some(scope) = scopes.last() {
            if path == "this" {
                return Some(ExprValue::from(scope.item));
            }
            let item_path = path.strip_prefix("this.").unwrap_or(path);
            if let Some(v) = navigate(scope.item, item_path) {
                return Some(ExprValue::from(v));
            }
        }
        self.pool.resolve_value(path)
    }

    fn render_placeholder(&self, body: &str, raw: &str, scopes: &[ItemScope], out: &mut String) {
        if let Some(text) = self.builtin(body) {
            out.push_str(&text);
            return;
        }
        if let Some(scope) = scopes.last() {
            if let Some(text) = scope_binding(scope, body) {
                out.push_str(&text);
                return;
            }
            if let Some(v) = navigate(scope.item, body) {
                out.push_str(&ExprValue::from(v).display_string());
                return;
            }
        }
        if let Some(pos) = find_outside_quotes(body, "??") {
            let left = body[..pos].trim();
            match self.pool.lookup(left) {
                Lookup::Defined(v) => out.push_str(&v.display_string()),
                Lookup::Absent => out.push_str(&self.default_text(&body[pos + 2..])),
            }
            return;
        }
        if let Some(pos) = find_outside_quotes(body, "?:") {
            let left = body[..pos].trim();
            if let Lookup::Defined(v) = self.pool.lookup(left) {
                let text = v.display_string();
                if !text.trim().is_empty() && v.is_truthy() {
                    out.push_str(&text);
                    return;
                }
            }
            out.push_str(&self.default_text(&body[pos + 2..]));
            return;
        }
        if contains_outside_quotes(body, "?") && contains_outside_quotes(body, ":") {
            match Evaluator::new(self.pool).evaluate(body) {
                Ok(v) => out.push_str(&v.display_string()),
                Err(_) => out.push_str(raw),
            }
            return;
        }
        if let Some(pos) = find_outside_quotes(body, ":") {
            let name = body[..pos].trim();
            match self.pool.resolve_value(name) {
                Some(v) => out.push_str(&format::apply(&v, &body[pos + 1..])),
                None => out.push_str(raw),
            }
            return;
        }
        // plain substitution: simple map only, misses keep the token
        match self.pool.simple().get(body) {
            Some(text) => out.push_str(text),
            None => out.push_str(raw),
        }
    }

    fn builtin(&self, body: &str) -> Option<String> {
        match body {
            "pageNumber" => Some(self.page_number.to_string()),
            "totalPages" => Some(self.total_pages.to_string()),
            "date" => Some(self.now.format("%B %-d, %Y").to_string()),
            "year" => Some(self.now.format("%Y").to_string()),
            "time" => Some(self.now.format("%H:%M").to_string()),
            "datetime" => Some(self.now.format("%a, %b %-d %H:%M").to_string()),
            "today" => Some(self.now.format("%Y-%m-%d").to_string()),
            _ => None,
        }
    }

    /// Right-hand side of `??` / `?:`: a quoted literal or an expression.
    fn default_text(&self, s: &str) -> String {
        let t = s.trim();
        if let Some(inner) = strip_quotes(t) {
            return inner.to_string();
        }
        Evaluator::new(self.pool)
            .evaluate(t)
            .map(|v| v.display_string())
            .unwrap_or_default()
    }
}

fn scope_binding(scope: &ItemScope, body: &str) -> Option<String> {
    match body {
        "@index" => Some(scope.index.to_string()),
        "@number" => Some((scope.index + 1).to_string()),
        "@first" => Some((scope.index == 0).to_string()),
        "@last" => Some((scope.index + 1 == scope.len).to_string()),
        "this" => primitive_text(scope.item),
        _ => body.strip_prefix("this.").and_then(|path| {
            navigate(scope.item, path).map(|v| ExprValue::from(v).display_string())
        }),
    }
}

/// `{{this}}` substitutes string and number elements only; structured
/// elements must be accessed by property.
fn primitive_text(item: &Value) -> Option<String> {
    match item {
        Value::String(s) => Some(s.clone()),
        Value::Number(_) => Some(ExprValue::from(item).display_string()),
        _ => None,
    }
}

/// Walk a dot-path into a JSON element, case-insensitive per segment.
fn navigate<'v>(item: &'v Value, path: &str) -> Option<&'v Value> {
    let mut current = item;
    for segment in path.split('.') {
        current = current.as_object().and_then(|o| get_map_ci(o, segment))?;
    }
    Some(current)
}

// ============================================================================
// TESTS
// ============================================================================
