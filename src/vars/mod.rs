//! # Variable Services
//!
//! Everything that turns variable definitions plus caller input into the
//! resolved pool the template and expression layers read:
//!
//! | Stage | Entry point | Purpose |
//! |-------|-------------|---------|
//! | validate | [`validate`] | check runtime values against definitions |
//! | merge | [`merge`] | build the pool: defaults → stored → runtime |
//! | computed | [`evaluate_computed`] | derive expression-backed variables |
//!
//! The pool itself is an immutable snapshot: once built it is only read,
//! passed by shared reference through every resolver and evaluator call.
//! The computed stage returns a new, extended snapshot rather than mutating
//! the merged one.

mod computed;
mod definition;
mod merge;
mod resolve;
mod validate;

pub use computed::{ComputedIssue, ComputedOutcome, evaluate_computed};
pub use definition::{VariableDefinition, VariableType};
pub use merge::merge;
pub use resolve::Lookup;
pub(crate) use resolve::get_map_ci;
pub use validate::{ValidationError, ValidationErrorKind, ValidationReport, validate};

use serde::Serialize;
use std::collections::HashMap;

/// The resolved variable pool: two parallel maps consumed together.
///
/// `simple` holds flattened display strings; `complex` keeps arrays and
/// objects structured for loops and dot-path lookups. Lookup methods live in
/// [`resolve`](self::resolve).
#[derive(Debug, Clone, Default, Serialize)]
pub struct VariablePool {
    simple: HashMap<String, String>,
    complex: HashMap<String, serde_json::Value>,
}

impl VariablePool {
    /// An empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pool directly from its two maps.
    pub fn from_parts(
        simple: HashMap<String, String>,
        complex: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self { simple, complex }
    }

    /// Flattened string variables.
    pub fn simple(&self) -> &HashMap<String, String> {
        &self.simple
    }

    /// Structured array/object variables.
    pub fn complex(&self) -> &HashMap<String, serde_json::Value> {
        &self.complex
    }

    /// A new snapshot with additional simple entries layered on top.
    pub fn extended(&self, additional: HashMap<String, String>) -> Self {
        let mut next = self.clone();
        next.simple.extend(additional);
        next
    }

    /// Builder-stage insertion. Snapshots handed out to resolvers are never
    /// mutated; this is only called while a new pool is being assembled.
    pub(crate) fn insert_simple(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.simple.insert(name.into(), value.into());
    }

    pub(crate) fn insert_complex(&mut self, name: impl Into<String>, value: serde_json::Value) {
        self.complex.insert(name.into(), value);
    }
}
