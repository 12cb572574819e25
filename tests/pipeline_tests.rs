//! # Pipeline Tests
//!
//! End-to-end compilation through the public API: document JSON in, layout
//! plan out. Each test builds a realistic document and checks the plan a
//! drawing collaborator would receive.
//!
//! ## Test Coverage
//!
//! - **Invoice flow**: variables, computed totals, table expansion, and
//!   sibling push-down in one document
//! - **Validation**: required variables and array bounds abort compilation
//! - **Batch**: parallel per-record compilation with order and isolation
//! - **Wire format**: the serialized plan the frontend consumes

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use plantilla::document::{FlowItem, PlanItem};
use plantilla::vars::{ComputedIssue, ValidationErrorKind};
use plantilla::{
    ComponentKind, ContentMeasurer, DocumentContent, DocumentPlan, NoMeasurement, PageComponent,
    PlantillaError, compile_batch,
};

/// An invoice with a header block, a data-bound table that pushes the totals
/// line down, computed totals, and a conditional stamp.
const INVOICE: &str = r#"{
    "settings": {"title": "Invoice", "pageSettings": {"width": 210.0, "height": 297.0}},
    "variables": {"companyName": "Plantilla Press"},
    "variableDefinitions": [
        {"name": "invoiceNumber", "type": "string", "required": true},
        {"name": "customer", "type": "string", "defaultValue": "Walk-in customer"},
        {"name": "items", "type": "array", "required": true, "minItems": 1},
        {"name": "subtotal", "type": "number", "isComputed": true,
         "expression": "items | sum:amount"},
        {"name": "total", "type": "number", "isComputed": true,
         "expression": "subtotal * 1.19", "dependsOn": ["subtotal"], "format": "N2"}
    ],
    "headerFooter": {
        "headers": {
            "default": {"components": [
                {"id": "company", "position": {"x": 12.7, "y": 8.0},
                 "size": {"width": 120.0, "height": 8.0},
                 "type": "text-label",
                 "properties": {"text": "{{companyName}}", "bold": true}}
            ]}
        },
        "footers": {
            "default": {"components": [
                {"id": "page-marker", "position": {"x": 12.7, "y": 280.0},
                 "size": {"width": 60.0, "height": 6.0},
                 "type": "text-label",
                 "properties": {"text": "Page {{pageNumber}} of {{totalPages}}"}}
            ]}
        }
    },
    "pages": [{
        "id": "main",
        "headerType": "default",
        "footerType": "default",
        "components": [
            {"id": "title", "position": {"x": 12.7, "y": 20.0},
             "size": {"width": 120.0, "height": 10.0},
             "type": "text-label",
             "properties": {"text": "Invoice {{invoiceNumber}}", "fontSize": 16.0, "bold": true}},
            {"id": "bill-to", "position": {"x": 12.7, "y": 32.0},
             "size": {"width": 120.0, "height": 8.0},
             "type": "text-label",
             "properties": {"text": "Billed to: {{customer}}"}},
            {"id": "item-lines", "position": {"x": 12.7, "y": 44.0},
             "size": {"width": 184.6, "height": 12.0},
             "layout": {"autoExpand": true, "pushSiblings": true},
             "type": "table",
             "properties": {"source": "items", "rowHeight": 6.0,
                            "columns": [{"header": "Description", "field": "description"},
                                        {"header": "Amount", "field": "amount", "width": 30.0}]}},
            {"id": "totals", "position": {"x": 12.7, "y": 60.0},
             "size": {"width": 184.6, "height": 8.0},
             "type": "text-label",
             "properties": {"text": "Subtotal {{subtotal:N2}} / Total {{total}}", "align": "right"}},
            {"id": "paid-stamp", "position": {"x": 150.0, "y": 20.0},
             "size": {"width": 45.0, "height": 10.0},
             "condition": {"rules": [{"variable": "status", "operator": "equals", "value": "paid"}]},
             "type": "rectangle",
             "properties": {}}
        ]
    }]
}"#;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn invoice_runtime() -> Value {
    json!({
        "invoiceNumber": "INV-2024-007",
        "customer": "Acme GmbH",
        "status": "paid",
        "items": [
            {"description": "Design work", "amount": 400},
            {"description": "Printing", "amount": 100},
            {"description": "Delivery", "amount": 100}
        ]
    })
}

fn runtime_map(runtime: Value) -> HashMap<String, Value> {
    serde_json::from_value(runtime).unwrap()
}

fn try_compile(document: &str, runtime: Value) -> Result<DocumentPlan, PlantillaError> {
    DocumentContent::from_json(document)
        .unwrap()
        .compile(&runtime_map(runtime), &NoMeasurement)
}

fn compile_one(document: &str, runtime: Value) -> DocumentPlan {
    try_compile(document, runtime).unwrap()
}

fn label_text(component: &PageComponent) -> &str {
    match &component.kind {
        ComponentKind::TextLabel(props) => &props.text,
        ComponentKind::Paragraph(props) => &props.text,
        other => panic!("expected text, got {}", other.type_name()),
    }
}

// ============================================================================
// INVOICE FLOW
// ============================================================================

#[test]
fn test_invoice_end_to_end() {
    let plan = compile_one(INVOICE, invoice_runtime());
    assert!(plan.issues.is_empty());
    assert_eq!(plan.pages.len(), 1);

    let page = &plan.pages[0];
    assert_eq!(page.page_number, 1);

    // Header and footer rendered from the named blocks.
    let PlanItem::Absolute { component, .. } = &page.header[0] else {
        panic!("expected an absolute header item");
    };
    assert_eq!(label_text(component), "Plantilla Press");
    let PlanItem::Absolute { component, .. } = &page.footer[0] else {
        panic!("expected an absolute footer item");
    };
    assert_eq!(label_text(component), "Page 1 of 1");

    // Body: three absolutes in (y, x) order, then the table/totals flow.
    assert_eq!(page.body.len(), 4);

    let PlanItem::Absolute { frame, component } = &page.body[0] else {
        panic!("expected the title first");
    };
    assert_eq!(component.id, "title");
    assert_eq!(label_text(component), "Invoice INV-2024-007");
    assert_eq!(frame.y, 20.0);

    let PlanItem::Absolute { component, .. } = &page.body[1] else {
        panic!("expected the stamp second");
    };
    assert_eq!(component.id, "paid-stamp");

    let PlanItem::Absolute { component, .. } = &page.body[2] else {
        panic!("expected the address third");
    };
    assert_eq!(label_text(component), "Billed to: Acme GmbH");

    // The table pushes the totals line: three data rows plus the header at
    // 6mm each is 24mm against 12mm designed, so everything below moves 12mm.
    let PlanItem::Flow { start_y, items } = &page.body[3] else {
        panic!("expected the table flow last");
    };
    assert_eq!(*start_y, 44.0);
    assert_eq!(items.len(), 3);

    let FlowItem::Component {
        auto_expand,
        estimated_frame,
        component,
    } = &items[0]
    else {
        panic!("expected the table first in the flow");
    };
    assert!(*auto_expand);
    assert_eq!(component.id, "item-lines");
    assert_eq!(estimated_frame.height, 24.0);

    let FlowItem::Gap(gap) = &items[1] else {
        panic!("expected the designed gap");
    };
    assert_eq!(*gap, 4.0);

    let FlowItem::Component {
        estimated_frame,
        component,
        ..
    } = &items[2]
    else {
        panic!("expected the totals line last");
    };
    assert_eq!(component.id, "totals");
    assert_eq!(label_text(component), "Subtotal 600.00 / Total 714.00");
    assert_eq!(estimated_frame.y, 72.0);
}

#[test]
fn test_condition_drops_stamp_for_unpaid_invoice() {
    let mut runtime = invoice_runtime();
    runtime["status"] = json!("draft");

    let plan = compile_one(INVOICE, runtime);
    let ids: Vec<&str> = plan.pages[0]
        .components()
        .iter()
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(ids, vec!["title", "bill-to", "item-lines", "totals"]);
}

// ============================================================================
// VALIDATION
// ============================================================================

#[test]
fn test_missing_required_variables_abort_compilation() {
    let err = try_compile(INVOICE, json!({})).expect_err("expected validation to fail");
    let PlantillaError::Validation(report) = err else {
        panic!("expected a validation error, got {err}");
    };
    assert!(!report.is_valid);
    let names: Vec<&str> = report.errors.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["invoiceNumber", "items"]);
}

#[test]
fn test_empty_item_list_fails_min_items() {
    let err = try_compile(INVOICE, json!({"invoiceNumber": "INV-1", "items": []}))
        .expect_err("expected validation to fail");
    let PlantillaError::Validation(report) = err else {
        panic!("expected a validation error, got {err}");
    };
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].name, "items");
    assert_eq!(report.errors[0].kind, ValidationErrorKind::MinItems);
}

// ============================================================================
// BATCH COMPILATION
// ============================================================================

#[test]
fn test_batch_preserves_order_and_isolates_failures() {
    let content = DocumentContent::from_json(
        r#"{
            "pages": [{
                "id": "p1",
                "components": [{
                    "id": "greeting",
                    "position": {"x": 10.0, "y": 10.0},
                    "size": {"width": 100.0, "height": 8.0},
                    "type": "text-label",
                    "properties": {"text": "Dear {{customer}}"}
                }]
            }],
            "variableDefinitions": [
                {"name": "customer", "type": "string", "required": true}
            ]
        }"#,
    )
    .unwrap();

    let records: Vec<HashMap<String, Value>> = vec![
        runtime_map(json!({"customer": "Ada"})),
        runtime_map(json!({"customer": "Bob"})),
        runtime_map(json!({})),
        runtime_map(json!({"customer": "Eve"})),
    ];

    let finished = AtomicUsize::new(0);
    let seen = Mutex::new(Vec::new());
    let results = compile_batch(&content, &records, &NoMeasurement, |index| {
        finished.fetch_add(1, Ordering::Relaxed);
        seen.lock().unwrap().push(index);
    });

    // The callback fired once per record, whatever order the pool chose.
    assert_eq!(finished.load(Ordering::Relaxed), 4);
    let mut seen = seen.into_inner().unwrap();
    seen.sort_unstable();
    assert_eq!(seen, vec![0, 1, 2, 3]);

    // Results stay in input order; one bad record does not poison the rest.
    assert_eq!(results.len(), 4);
    for (index, expected) in [(0, "Dear Ada"), (1, "Dear Bob"), (3, "Dear Eve")] {
        let plan = results[index].as_ref().unwrap();
        let PlanItem::Absolute { component, .. } = &plan.pages[0].body[0] else {
            panic!("expected one absolute item");
        };
        assert_eq!(label_text(component), expected);
    }
    assert!(matches!(
        results[2],
        Err(PlantillaError::Validation(_))
    ));
}

// ============================================================================
// MEASUREMENT
// ============================================================================

/// Reports a fixed height for every paragraph, nothing for other kinds.
struct FixedParagraph(f64);

impl ContentMeasurer for FixedParagraph {
    fn measure(&self, kind: &ComponentKind, _available_width_mm: f64) -> Option<f64> {
        match kind {
            ComponentKind::Paragraph(_) => Some(self.0),
            _ => None,
        }
    }
}

const NOTE_AND_SIGNATURE: &str = r#"{
    "pages": [{
        "id": "p1",
        "components": [
            {"id": "note", "position": {"x": 10.0, "y": 10.0},
             "size": {"width": 100.0, "height": 10.0},
             "layout": {"autoExpand": true, "pushSiblings": true},
             "type": "paragraph",
             "properties": {"text": "Terms and conditions apply."}},
            {"id": "sig", "position": {"x": 10.0, "y": 24.0},
             "size": {"width": 60.0, "height": 6.0},
             "type": "text-label",
             "properties": {"text": "Signature"}}
        ]
    }]
}"#;

fn flow_frames(plan: &DocumentPlan) -> Vec<(String, f64, f64)> {
    let PlanItem::Flow { items, .. } = &plan.pages[0].body[0] else {
        panic!("expected a flow");
    };
    items
        .iter()
        .filter_map(|item| match item {
            FlowItem::Component {
                estimated_frame,
                component,
                ..
            } => Some((component.id.clone(), estimated_frame.y, estimated_frame.height)),
            FlowItem::Gap(_) => None,
        })
        .collect()
}

#[test]
fn test_measured_growth_pushes_siblings() {
    let content = DocumentContent::from_json(NOTE_AND_SIGNATURE).unwrap();
    let plan = content
        .compile(&HashMap::new(), &FixedParagraph(30.0))
        .unwrap();
    assert_eq!(
        flow_frames(&plan),
        vec![("note".to_string(), 10.0, 30.0), ("sig".to_string(), 44.0, 6.0)]
    );
}

#[test]
fn test_measurement_never_shrinks_below_design() {
    let content = DocumentContent::from_json(NOTE_AND_SIGNATURE).unwrap();
    let plan = content
        .compile(&HashMap::new(), &FixedParagraph(4.0))
        .unwrap();
    assert_eq!(
        flow_frames(&plan),
        vec![("note".to_string(), 10.0, 10.0), ("sig".to_string(), 24.0, 6.0)]
    );
}

// ============================================================================
// TEMPLATE AND COMPUTED INTEGRATION
// ============================================================================

#[test]
fn test_each_loop_renders_once_per_array_element() {
    let plan = compile_one(
        r#"{
            "pages": [{
                "id": "p1",
                "components": [{
                    "id": "lines",
                    "position": {"x": 10.0, "y": 10.0},
                    "size": {"width": 150.0, "height": 30.0},
                    "type": "paragraph",
                    "properties": {"text": "{{#each items}}{{@number}}. {{description}} ({{amount}}) {{/each}}"}
                }]
            }]
        }"#,
        json!({"items": [
            {"description": "Design work", "amount": 400},
            {"description": "Printing", "amount": 100},
            {"description": "Delivery", "amount": 100}
        ]}),
    );

    let components = plan.pages[0].components();
    assert_eq!(
        label_text(components[0]),
        "1. Design work (400) 2. Printing (100) 3. Delivery (100) "
    );
}

#[test]
fn test_computed_cycle_surfaces_issue_and_still_compiles() {
    let plan = compile_one(
        r#"{
            "pages": [{
                "id": "p1",
                "components": [{
                    "id": "out",
                    "position": {"x": 10.0, "y": 10.0},
                    "size": {"width": 60.0, "height": 8.0},
                    "type": "text-label",
                    "properties": {"text": "a={{a}}"}
                }]
            }],
            "variableDefinitions": [
                {"name": "a", "type": "number", "isComputed": true,
                 "expression": "b + 1", "dependsOn": ["b"], "defaultValue": "9"},
                {"name": "b", "type": "number", "isComputed": true,
                 "expression": "a + 1", "dependsOn": ["a"]}
            ]
        }"#,
        json!({}),
    );

    assert_eq!(
        plan.issues,
        vec![ComputedIssue::CyclicDependency { name: "a".into() }]
    );
    assert_eq!(label_text(plan.pages[0].components()[0]), "a=9");
}

#[test]
fn test_shared_header_renders_per_page_numbers() {
    let plan = compile_one(
        r#"{
            "pages": [
                {"id": "front", "headerType": "letterhead"},
                {"id": "back", "headerType": "letterhead"}
            ],
            "headerFooter": {
                "headers": {
                    "letterhead": {"components": [{
                        "id": "pg",
                        "position": {"x": 0.0, "y": 0.0},
                        "size": {"width": 60.0, "height": 6.0},
                        "type": "text-label",
                        "properties": {"text": "{{pageNumber}} of {{totalPages}}"}
                    }]}
                }
            }
        }"#,
        json!({}),
    );

    let PlanItem::Absolute { component, .. } = &plan.pages[0].header[0] else {
        panic!("expected an absolute header item");
    };
    assert_eq!(label_text(component), "1 of 2");
    let PlanItem::Absolute { component, .. } = &plan.pages[1].header[0] else {
        panic!("expected an absolute header item");
    };
    assert_eq!(label_text(component), "2 of 2");
}

// ============================================================================
// WIRE FORMAT
// ============================================================================

#[test]
fn test_plan_wire_format() {
    let plan = compile_one(INVOICE, invoice_runtime());
    let value = serde_json::to_value(&plan).unwrap();

    let page = &value["pages"][0];
    assert_eq!(page["pageNumber"], 1);
    assert_eq!(page["settings"]["width"], 210.0);
    assert_eq!(page["body"][0]["placement"], "absolute");
    assert_eq!(page["body"][0]["frame"]["y"], 20.0);

    let flow = &page["body"][3];
    assert_eq!(flow["placement"], "flow");
    assert_eq!(flow["startY"], 44.0);
    assert_eq!(flow["items"][0]["component"]["autoExpand"], true);
    assert_eq!(flow["items"][0]["component"]["estimatedFrame"]["height"], 24.0);
    assert_eq!(flow["items"][0]["component"]["component"]["type"], "table");
    assert_eq!(flow["items"][1]["gap"], 4.0);

    // The resolved pool rides along for the drawing collaborator; computed
    // values are already display strings.
    assert_eq!(value["variables"]["simple"]["subtotal"], "600");
    assert_eq!(value["variables"]["simple"]["total"], "714.00");

    // No issues key when nothing went wrong.
    assert!(value.get("issues").is_none());
}
