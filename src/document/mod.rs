//! # Unified Document Model
//!
//! A single type hierarchy that is both the Rust API and the JSON API.
//! [`DocumentContent`] is constructible in Rust and deserializable from the
//! editor's JSON; [`DocumentContent::compile`] turns it, plus one set of
//! runtime variables, into a [`DocumentPlan`] for the drawing collaborator.
//!
//! Compilation runs these stages per call:
//!
//! 1. validate the supplied variables against the definitions — failures
//!    abort before any rendering
//! 2. merge defaults, document variables, and runtime values into an
//!    immutable [`VariablePool`]
//! 3. evaluate computed definitions and extend the pool with their results
//! 4. per page: drop components whose render condition fails, process
//!    template placeholders, measure expandable content, run the layout
//!    pass, and group push-linked components into plan flows
//!
//! Every stage after validation recovers locally; a malformed expression or
//! template never aborts the document.

pub mod component;
pub mod plan;

pub use component::{ComponentKind, ComponentMeta, PageComponent, RenderCondition, Templated};
pub use plan::{DocumentPlan, FlowItem, Frame, PagePlan, PlanItem};

use std::collections::HashMap;

use chrono::Local;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PlantillaError;
use crate::layout::chain::build_page_plan;
use crate::layout::engine::LayoutPass;
use crate::layout::measure::ContentMeasurer;
use crate::page::PageSettings;
use crate::template::TemplateEngine;
use crate::vars::{
    ComputedIssue, VariableDefinition, VariablePool, evaluate_computed, merge, validate,
};

// ============================================================================
// DOCUMENT CONTENT
// ============================================================================

/// One named header or footer block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Region {
    pub components: Vec<PageComponent>,
}

/// The document's named header and footer blocks. Pages opt in by name
/// through their `headerType` / `footerType` fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeaderFooter {
    pub headers: HashMap<String, Region>,
    pub footers: HashMap<String, Region>,
}

/// One designed page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Page {
    pub id: String,
    /// Display page number. `0` means "use the position in the page list".
    pub page_number: u32,
    /// Name of the header block to render, `"none"` to suppress.
    pub header_type: Option<String>,
    /// Name of the footer block to render, `"none"` to suppress.
    pub footer_type: Option<String>,
    pub components: Vec<PageComponent>,
    /// Per-page override of the document's page settings.
    pub page_settings: Option<PageSettings>,
}

/// Document-wide settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentSettings {
    pub title: String,
    pub page_settings: PageSettings,
}

/// A designed document: pages, header/footer blocks, variable declarations,
/// and author-supplied variable values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentContent {
    pub pages: Vec<Page>,
    pub header_footer: HeaderFooter,
    /// Author-supplied values, overridden by runtime values of the same name.
    pub variables: HashMap<String, Value>,
    pub variable_definitions: Vec<VariableDefinition>,
    pub settings: DocumentSettings,
}

impl DocumentContent {
    pub fn from_json(text: &str) -> Result<Self, PlantillaError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Validate, merge, and evaluate computed variables without touching
    /// the pages. This is the `validate` subcommand's workhorse and useful
    /// for editors that only need resolved values.
    pub fn resolve_variables(
        &self,
        runtime: &HashMap<String, Value>,
    ) -> Result<(VariablePool, Vec<ComputedIssue>), PlantillaError> {
        let report = validate(&self.variable_definitions, &self.supplied_variables(runtime));
        if !report.is_valid {
            return Err(PlantillaError::Validation(report));
        }
        let pool = merge(&self.variable_definitions, &self.variables, runtime);
        let outcome = evaluate_computed(&self.variable_definitions, &pool);
        Ok((pool.extended(outcome.values), outcome.issues))
    }

    /// Compile this document against one set of runtime variables.
    pub fn compile(
        &self,
        runtime: &HashMap<String, Value>,
        measurer: &dyn ContentMeasurer,
    ) -> Result<DocumentPlan, PlantillaError> {
        let (pool, issues) = self.resolve_variables(runtime)?;

        // One clock for the whole document, so every page renders the same
        // date and time tokens.
        let now = Local::now().naive_local();
        let total_pages = self.pages.len() as u32;

        let mut pages = Vec::with_capacity(self.pages.len());
        for (index, page) in self.pages.iter().enumerate() {
            let number = if page.page_number == 0 {
                index as u32 + 1
            } else {
                page.page_number
            };
            let settings = page.page_settings.unwrap_or(self.settings.page_settings);
            let engine = TemplateEngine::with_clock(&pool, number, total_pages, now);

            let header = select_region(&self.header_footer.headers, page.header_type.as_deref())
                .map(|region| compose_region(&region.components, &pool, &engine, measurer))
                .unwrap_or_default();
            let footer = select_region(&self.header_footer.footers, page.footer_type.as_deref())
                .map(|region| compose_region(&region.components, &pool, &engine, measurer))
                .unwrap_or_default();
            let body = compose_region(&page.components, &pool, &engine, measurer);

            pages.push(PagePlan {
                page_number: number,
                settings,
                header,
                body,
                footer,
            });
        }

        Ok(DocumentPlan {
            pages,
            variables: pool,
            issues,
        })
    }

    fn supplied_variables(&self, runtime: &HashMap<String, Value>) -> HashMap<String, Value> {
        let mut supplied = self.variables.clone();
        supplied.extend(runtime.iter().map(|(k, v)| (k.clone(), v.clone())));
        supplied
    }
}

/// Pick a header/footer block by the page's selector. `None`, `""`, a
/// `"none"` sentinel, and unknown names all mean "no region".
fn select_region<'a>(
    regions: &'a HashMap<String, Region>,
    selector: Option<&str>,
) -> Option<&'a Region> {
    let name = selector?;
    if name.is_empty() || name.eq_ignore_ascii_case("none") {
        return None;
    }
    regions.get(name)
}

/// Run one region's components through the render pipeline: condition
/// filtering, template processing, measurement, layout, chain grouping.
fn compose_region(
    components: &[PageComponent],
    pool: &VariablePool,
    engine: &TemplateEngine<'_>,
    measurer: &dyn ContentMeasurer,
) -> Vec<PlanItem> {
    let rendered: Vec<PageComponent> = components
        .iter()
        .filter(|c| c.should_render(pool))
        .cloned()
        .map(|mut c| {
            c.apply_templates(engine);
            c
        })
        .collect();

    let mut pass = LayoutPass::new(rendered);
    let measured: Vec<(String, f64)> = pass
        .components()
        .iter()
        .filter(|lc| lc.is_auto_expand())
        .filter_map(|lc| {
            measure_component(&lc.component, pool, measurer)
                .map(|height| (lc.component.id.clone(), height))
        })
        .collect();
    for (id, height) in measured {
        pass.apply_measurement(&id, height);
    }
    build_page_plan(pass.resolve())
}

/// Content height for one component, in mm. The measurer gets the first
/// word; tables fall back to their band estimate, everything else to the
/// designed height (`None`).
fn measure_component(
    component: &PageComponent,
    pool: &VariablePool,
    measurer: &dyn ContentMeasurer,
) -> Option<f64> {
    if let Some(height) = measurer.measure(&component.kind, component.size.width) {
        return Some(height);
    }
    if let ComponentKind::Table(props) = &component.kind {
        let data_rows = match &props.source {
            Some(name) => pool.complex_array(name).map_or(props.rows.len(), Vec::len),
            None => props.rows.len(),
        };
        return Some(props.estimated_height(data_rows));
    }
    None
}

// ============================================================================
// BATCH COMPILATION
// ============================================================================

/// Compile the same document once per runtime record, in parallel.
///
/// Results come back in input order. Each record compiles against fresh
/// local state, so the only shared value is the caller's `on_record`
/// callback — it runs once per finished record with that record's index,
/// and any cross-record aggregation inside it needs its own
/// synchronization (the CLI keeps an atomic progress counter).
pub fn compile_batch<F>(
    content: &DocumentContent,
    records: &[HashMap<String, Value>],
    measurer: &dyn ContentMeasurer,
    on_record: F,
) -> Vec<Result<DocumentPlan, PlantillaError>>
where
    F: Fn(usize) + Sync,
{
    records
        .par_iter()
        .enumerate()
        .map(|(index, record)| {
            let result = content.compile(record, measurer);
            on_record(index);
            result
        })
        .collect()
}

// ============================================================================
// COMPONENT CATALOG
// ============================================================================

/// Component type metadata for the editor frontend.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentTypeMeta {
    #[serde(rename = "type")]
    pub type_name: &'static str,
    pub label: &'static str,
    /// Starter value for newly placed components.
    pub default: ComponentKind,
}

/// Every component type with its label and editor default, in declaration
/// order. The `components` CLI subcommand serializes this for the editor.
pub fn component_catalog() -> Vec<ComponentTypeMeta> {
    ComponentKind::all_editor_defaults()
        .into_iter()
        .map(|kind| ComponentTypeMeta {
            type_name: kind.type_name(),
            label: kind.label(),
            default: kind,
        })
        .collect()
}
