//! # Error Types
//!
//! This module defines error types used throughout the plantilla library.

use thiserror::Error;

use crate::vars::ValidationReport;

/// Main error type for plantilla operations
#[derive(Debug, Error)]
pub enum PlantillaError {
    /// Variable validation failed; carries the full structured report
    #[error("validation failed: {0}")]
    Validation(ValidationReport),

    /// Document content is structurally unusable
    #[error("invalid document content: {0}")]
    Content(String),

    /// JSON (de)serialization error wrapper
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
