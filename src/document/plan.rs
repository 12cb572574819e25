//! # Render Plan
//!
//! The plan is the compile output handed to the drawing collaborator: a
//! page-by-page list of placed components with layout fully resolved.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  Document   │ ──► │   Compile    │ ──► │ DocumentPlan │ ──► (drawing)
//! │   (JSON)    │     │ (this crate) │     │    (JSON)    │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! Two placements exist. `Absolute` items have a fixed frame and are drawn
//! exactly there. `Flow` items carry a dependency chain: a run of
//! components whose real heights are only known once the drawer measures
//! their content, stacked top to bottom with the designed whitespace
//! preserved as explicit gaps.

use serde::{Deserialize, Serialize};

use super::component::PageComponent;
use crate::page::PageSettings;
use crate::vars::{ComputedIssue, VariablePool};

/// Resolved rectangle, in millimetres from the page origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Frame {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// One entry of a dependency-chain flow.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowItem {
    /// Vertical whitespace between neighbouring members, carried over from
    /// the designed geometry.
    Gap(f64),
    /// A chain member. Horizontal placement comes from the component's own
    /// designed position; the vertical position is wherever the flow has
    /// reached. When `auto_expand` is set the drawn height may exceed the
    /// designed one.
    #[serde(rename_all = "camelCase")]
    Component {
        auto_expand: bool,
        /// The scaffold geometry from the measure/layout pass, for preview
        /// consumers. The drawer's natural flow supersedes it.
        estimated_frame: Frame,
        component: PageComponent,
    },
}

/// A placed unit of the page.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "placement", rename_all = "camelCase")]
pub enum PlanItem {
    /// Drawn exactly at `frame`, independent of every other component.
    Absolute {
        frame: Frame,
        component: PageComponent,
    },
    /// A chain of vertically dependent components starting at `start_y`.
    #[serde(rename_all = "camelCase")]
    Flow { start_y: f64, items: Vec<FlowItem> },
}

impl PlanItem {
    /// Every component in this item, in draw order.
    pub fn components(&self) -> Vec<&PageComponent> {
        match self {
            PlanItem::Absolute { component, .. } => vec![component],
            PlanItem::Flow { items, .. } => items
                .iter()
                .filter_map(|item| match item {
                    FlowItem::Component { component, .. } => Some(component),
                    FlowItem::Gap(_) => None,
                })
                .collect(),
        }
    }
}

/// One rendered page: resolved items for the header region, the page body,
/// and the footer region.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePlan {
    pub page_number: u32,
    pub settings: PageSettings,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub header: Vec<PlanItem>,
    pub body: Vec<PlanItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub footer: Vec<PlanItem>,
}

impl PagePlan {
    /// Every component on the page, header first, then body, then footer.
    pub fn components(&self) -> Vec<&PageComponent> {
        self.header
            .iter()
            .chain(&self.body)
            .chain(&self.footer)
            .flat_map(|item| item.components())
            .collect()
    }
}

/// The full compile output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPlan {
    pub pages: Vec<PagePlan>,
    /// The merged pool the pages were rendered against, for callers that
    /// log or display resolved values.
    pub variables: VariablePool,
    /// Computed-variable problems the compile recovered from.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<ComputedIssue>,
}
