//! # Plantilla - Document Template Compiler
//!
//! Plantilla is a Rust library for turning designed document templates into
//! print-ready layout plans. It provides:
//!
//! - **Unified document model**: one set of types for the editor JSON and
//!   the Rust API
//! - **Template processing**: `{{placeholder}}` substitution with built-in
//!   tokens, formatting, fallbacks, and loop scopes
//! - **Expression engine**: arithmetic, boolean, ternary, and aggregate
//!   evaluation for computed variables
//! - **Two-phase layout**: content measurement, then sibling push-down with
//!   dependency grouping into flow chains
//! - **Batch compilation**: one plan per data record across a thread pool
//!
//! ## Quick Start
//!
//! ```
//! use plantilla::{DocumentContent, TextEstimate};
//! use std::collections::HashMap;
//!
//! let content = DocumentContent::from_json(r#"{
//!     "pages": [{
//!         "id": "page-1",
//!         "components": [{
//!             "id": "title",
//!             "position": {"x": 12.7, "y": 12.7},
//!             "size": {"width": 120.0, "height": 10.0},
//!             "type": "text-label",
//!             "properties": {"text": "Invoice {{invoiceNumber}}"}
//!         }]
//!     }],
//!     "variableDefinitions": [
//!         {"name": "invoiceNumber", "type": "string", "defaultValue": "INV-001"}
//!     ]
//! }"#)?;
//!
//! // Runtime values override the definition defaults.
//! let runtime = HashMap::from([
//!     ("invoiceNumber".to_string(), serde_json::Value::from("INV-042")),
//! ]);
//!
//! let plan = content.compile(&runtime, &TextEstimate)?;
//! assert_eq!(plan.pages.len(), 1);
//! # Ok::<(), plantilla::PlantillaError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`document`] | Document model and the compile pipeline |
//! | [`layout`] | Measurement, push-down, and flow grouping |
//! | [`template`] | `{{placeholder}}` processing |
//! | [`expr`] | Expression evaluation for computed variables |
//! | [`vars`] | Variable definitions, validation, and the resolved pool |
//! | [`page`] | Page geometry presets |
//! | [`error`] | Error types |

pub mod document;
pub mod error;
pub mod expr;
pub mod layout;
pub mod page;
pub mod template;
pub mod vars;

// Re-exports for convenience
pub use document::{
    ComponentKind, DocumentContent, DocumentPlan, PageComponent, PagePlan, PlanItem,
    compile_batch, component_catalog,
};
pub use error::PlantillaError;
pub use layout::{ContentMeasurer, NoMeasurement, TextEstimate};
pub use page::{Margins, PageSettings};
pub use template::TemplateEngine;
pub use vars::{VariableDefinition, VariablePool};
