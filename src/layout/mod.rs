//! # Layout Module
//!
//! Positioning, auto-expansion, and dependency-chain grouping for page
//! components.
//!
//! ## Modules
//!
//! - [`engine`]: the two-phase measure/layout pass and overlap helpers
//! - [`chain`]: grouping of push-linked components into render flows
//! - [`measure`]: the [`ContentMeasurer`] seam and the built-in estimator

pub mod chain;
pub mod engine;
pub mod measure;

pub use chain::build_page_plan;
pub use engine::{LayoutComponent, LayoutPass};
pub use measure::{ContentMeasurer, NoMeasurement, TextEstimate};
