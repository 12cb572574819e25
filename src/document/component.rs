//! Component struct types for the page model.
//!
//! All types derive `Serialize + Deserialize` so the same types work for
//! both Rust API construction and JSON deserialization. The wire shape of
//! one component is `{"id", "position", "size", "layout", "condition",
//! "type", "properties"}` where `type` selects the [`ComponentKind`]
//! variant and `properties` carries its typed struct.
//!
//! Each property struct implements [`ComponentMeta`] to declare its display
//! label and editor default. This metadata is used by the web editor and
//! the `components` CLI subcommand.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::expr::EPSILON;
use crate::template::TemplateEngine;
use crate::vars::VariablePool;

/// Metadata that every component struct must provide.
///
/// The label and editor default live next to each struct definition,
/// so adding a new component type is self-contained — implement this
/// trait and the compiler will guide you to the remaining exhaustive
/// matches in `ComponentKind`.
pub trait ComponentMeta: Sized {
    /// Human-readable display label (e.g. "QR Code", "Text Label").
    fn label() -> &'static str;

    /// Sensible starter value for the web editor.
    ///
    /// Distinct from `Default` — editor defaults have example content
    /// so new components are immediately useful, not empty.
    fn editor_default() -> Self;
}

// ============================================================================
// GEOMETRY
// ============================================================================

/// Top-left corner of a component, in millimetres from the page origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Designed extent of a component, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Per-component layout behaviour flags.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutOptions {
    /// Grow beyond the designed height when the content needs more room.
    pub auto_expand: bool,
    /// When growing, push overlapping components below this one down.
    pub push_siblings: bool,
}

// ============================================================================
// RENDER CONDITIONS
// ============================================================================

/// How the rules of a [`RenderCondition`] combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionMode {
    #[default]
    All,
    Any,
}

/// A single render-condition comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
    IsEmpty,
    IsNotEmpty,
}

/// One rule of a render condition: a variable compared against a literal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionRule {
    pub variable: String,
    pub operator: ConditionOperator,
    /// Comparison operand. Accepts any JSON scalar; numbers compare
    /// numerically, everything else as its string rendering.
    #[serde(default)]
    pub value: Value,
}

impl ConditionRule {
    fn matches(&self, pool: &VariablePool) -> bool {
        let actual = pool.resolve(&self.variable).unwrap_or_default();
        let expected = self.value_text();
        match self.operator {
            ConditionOperator::Equals => text_equals(&actual, &expected),
            ConditionOperator::NotEquals => !text_equals(&actual, &expected),
            ConditionOperator::Contains => actual.contains(expected.as_str()),
            ConditionOperator::GreaterThan => {
                numeric_pair(&actual, &expected).is_some_and(|(a, b)| a > b)
            }
            ConditionOperator::LessThan => {
                numeric_pair(&actual, &expected).is_some_and(|(a, b)| a < b)
            }
            ConditionOperator::IsEmpty => actual.trim().is_empty(),
            ConditionOperator::IsNotEmpty => !actual.trim().is_empty(),
        }
    }

    fn value_text(&self) -> String {
        match &self.value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Gate controlling whether a component renders at all.
///
/// A component with a failing condition is dropped before layout, so it
/// neither occupies space nor pushes siblings. An empty rule list always
/// passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderCondition {
    #[serde(default)]
    pub mode: ConditionMode,
    #[serde(default)]
    pub rules: Vec<ConditionRule>,
}

impl RenderCondition {
    /// Evaluate every rule against the pool under this condition's mode.
    pub fn is_met(&self, pool: &VariablePool) -> bool {
        if self.rules.is_empty() {
            return true;
        }
        match self.mode {
            ConditionMode::All => self.rules.iter().all(|r| r.matches(pool)),
            ConditionMode::Any => self.rules.iter().any(|r| r.matches(pool)),
        }
    }
}

fn text_equals(a: &str, b: &str) -> bool {
    if let Some((x, y)) = numeric_pair(a, b) {
        return (x - y).abs() < EPSILON;
    }
    a == b
}

fn numeric_pair(a: &str, b: &str) -> Option<(f64, f64)> {
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}

// ============================================================================
// TEXT COMPONENTS
// ============================================================================

/// Horizontal text alignment inside a component box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Single-line text with basic styling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLabelProps {
    #[serde(default)]
    pub text: String,
    /// Font size in points.
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub align: TextAlign,
    /// Hex colour such as `#1a1a1a`.
    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for TextLabelProps {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: default_font_size(),
            bold: false,
            italic: false,
            align: TextAlign::Left,
            color: default_color(),
        }
    }
}

impl ComponentMeta for TextLabelProps {
    fn label() -> &'static str {
        "Text Label"
    }
    fn editor_default() -> Self {
        Self::new("Label")
    }
}

impl TextLabelProps {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Multi-line flowing text. The usual auto-expansion candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphProps {
    #[serde(default)]
    pub text: String,
    /// Font size in points.
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    /// Line height as a multiple of the font size.
    #[serde(default = "default_line_height")]
    pub line_height: f64,
    #[serde(default)]
    pub align: TextAlign,
    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for ParagraphProps {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: default_font_size(),
            line_height: default_line_height(),
            align: TextAlign::Left,
            color: default_color(),
        }
    }
}

impl ComponentMeta for ParagraphProps {
    fn label() -> &'static str {
        "Paragraph"
    }
    fn editor_default() -> Self {
        Self::new("Paragraph text")
    }
}

impl ParagraphProps {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

// ============================================================================
// TABLE
// ============================================================================

/// One column of a [`TableProps`] table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableColumn {
    pub header: String,
    /// Property name read from each element of the bound array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Fixed column width in millimetres; unset columns share the rest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

impl TableColumn {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            field: None,
            width: None,
        }
    }
}

/// Tabular data, either bound to an array variable or carrying static rows.
///
/// When `source` names a complex array variable, the drawing collaborator
/// emits one row per element using each column's `field`. The static `rows`
/// are used otherwise; their cells may carry placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableProps {
    /// Name of the array variable feeding the rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub columns: Vec<TableColumn>,
    /// Static cell values, one inner `Vec` per row.
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
    /// Height of one row band in millimetres.
    #[serde(default = "default_row_height")]
    pub row_height: f64,
    /// Font size in points.
    #[serde(default = "default_table_font_size")]
    pub font_size: f64,
    /// Render the header band above the data rows.
    #[serde(default = "default_true")]
    pub show_header: bool,
}

impl Default for TableProps {
    fn default() -> Self {
        Self {
            source: None,
            columns: Vec::new(),
            rows: Vec::new(),
            row_height: default_row_height(),
            font_size: default_table_font_size(),
            show_header: true,
        }
    }
}

impl ComponentMeta for TableProps {
    fn label() -> &'static str {
        "Table"
    }
    fn editor_default() -> Self {
        Self {
            columns: vec![TableColumn::new("Col 1"), TableColumn::new("Col 2")],
            rows: vec![vec!["A".into(), "B".into()]],
            ..Default::default()
        }
    }
}

impl TableProps {
    /// Geometric height estimate: one band per data row plus the optional
    /// header band.
    pub fn estimated_height(&self, data_rows: usize) -> f64 {
        let bands = data_rows + usize::from(self.show_header);
        bands as f64 * self.row_height
    }
}

// ============================================================================
// MEDIA AND CODES
// ============================================================================

/// How an image scales inside its component box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFit {
    #[default]
    Contain,
    Cover,
    Stretch,
}

/// Raster image referenced by URL or data URI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageProps {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub fit: ImageFit,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

impl Default for ImageProps {
    fn default() -> Self {
        Self {
            source: String::new(),
            fit: ImageFit::Contain,
            opacity: default_opacity(),
        }
    }
}

impl ComponentMeta for ImageProps {
    fn label() -> &'static str {
        "Image"
    }
    fn editor_default() -> Self {
        Self {
            source: "https://example.com/logo.png".into(),
            ..Default::default()
        }
    }
}

/// One-dimensional barcode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarcodeProps {
    #[serde(default)]
    pub data: String,
    /// Symbology name understood by the drawing collaborator, e.g.
    /// `code128` or `ean13`.
    #[serde(default = "default_symbology")]
    pub symbology: String,
    /// Print the encoded data below the bars.
    #[serde(default = "default_true")]
    pub show_text: bool,
}

impl Default for BarcodeProps {
    fn default() -> Self {
        Self {
            data: String::new(),
            symbology: default_symbology(),
            show_text: true,
        }
    }
}

impl ComponentMeta for BarcodeProps {
    fn label() -> &'static str {
        "Barcode"
    }
    fn editor_default() -> Self {
        Self {
            data: "123456789012".into(),
            ..Default::default()
        }
    }
}

/// QR error-correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EcLevel {
    L,
    #[default]
    M,
    Q,
    H,
}

/// QR code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeProps {
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub error_correction: EcLevel,
}

impl ComponentMeta for QrCodeProps {
    fn label() -> &'static str {
        "QR Code"
    }
    fn editor_default() -> Self {
        Self {
            data: "https://example.com".into(),
            ..Default::default()
        }
    }
}

// ============================================================================
// DECORATION
// ============================================================================

/// Stroke pattern for dividers and rectangle outlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

/// Horizontal rule spanning the component box.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DividerProps {
    /// Stroke thickness in millimetres.
    #[serde(default = "default_stroke_width")]
    pub thickness: f64,
    #[serde(default)]
    pub style: LineStyle,
    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for DividerProps {
    fn default() -> Self {
        Self {
            thickness: default_stroke_width(),
            style: LineStyle::Solid,
            color: default_color(),
        }
    }
}

impl ComponentMeta for DividerProps {
    fn label() -> &'static str {
        "Divider"
    }
    fn editor_default() -> Self {
        Self::default()
    }
}

/// Filled and/or stroked box.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RectangleProps {
    /// Fill colour; `null` leaves the interior transparent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    /// Stroke colour; `null` draws no outline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f64,
    #[serde(default)]
    pub corner_radius: f64,
}

impl Default for RectangleProps {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: None,
            stroke_width: default_stroke_width(),
            corner_radius: 0.0,
        }
    }
}

impl ComponentMeta for RectangleProps {
    fn label() -> &'static str {
        "Rectangle"
    }
    fn editor_default() -> Self {
        Self {
            stroke: Some(default_color()),
            ..Default::default()
        }
    }
}

fn default_font_size() -> f64 {
    10.0
}

fn default_table_font_size() -> f64 {
    9.0
}

fn default_line_height() -> f64 {
    1.4
}

fn default_row_height() -> f64 {
    8.0
}

fn default_color() -> String {
    "#000000".into()
}

fn default_opacity() -> f64 {
    1.0
}

fn default_stroke_width() -> f64 {
    0.5
}

fn default_symbology() -> String {
    "code128".into()
}

fn default_true() -> bool {
    true
}

// ============================================================================
// TEMPLATE PROCESSING
// ============================================================================

/// Fields that carry template placeholders.
pub trait Templated {
    /// Process `{{...}}` placeholders in this component's text fields.
    fn apply_templates(&mut self, engine: &TemplateEngine<'_>);
}

fn process_field(s: &mut String, engine: &TemplateEngine<'_>) {
    if s.contains("{{") {
        *s = engine.process(s);
    }
}

impl Templated for TextLabelProps {
    fn apply_templates(&mut self, engine: &TemplateEngine<'_>) {
        process_field(&mut self.text, engine);
    }
}

impl Templated for ParagraphProps {
    fn apply_templates(&mut self, engine: &TemplateEngine<'_>) {
        process_field(&mut self.text, engine);
    }
}

impl Templated for TableProps {
    fn apply_templates(&mut self, engine: &TemplateEngine<'_>) {
        for column in &mut self.columns {
            process_field(&mut column.header, engine);
        }
        for row in &mut self.rows {
            for cell in row.iter_mut() {
                process_field(cell, engine);
            }
        }
    }
}

impl Templated for ImageProps {
    fn apply_templates(&mut self, engine: &TemplateEngine<'_>) {
        process_field(&mut self.source, engine);
    }
}

impl Templated for BarcodeProps {
    fn apply_templates(&mut self, engine: &TemplateEngine<'_>) {
        process_field(&mut self.data, engine);
    }
}

impl Templated for QrCodeProps {
    fn apply_templates(&mut self, engine: &TemplateEngine<'_>) {
        process_field(&mut self.data, engine);
    }
}

impl Templated for DividerProps {
    fn apply_templates(&mut self, _engine: &TemplateEngine<'_>) {}
}

impl Templated for RectangleProps {
    fn apply_templates(&mut self, _engine: &TemplateEngine<'_>) {}
}

// ============================================================================
// THE COMPONENT KIND ENUM
// ============================================================================

/// Define the ComponentKind enum and all dispatch methods from a single list.
///
/// Adding a new component: add one line here, then define the struct above
/// with `impl ComponentMeta` and `impl Templated`. That's it.
macro_rules! define_components {
    ($($name:literal => $variant:ident($inner:ty)),+ $(,)?) => {
        /// The unified component enum.
        ///
        /// The `#[serde(tag = "type", content = "properties")]` attribute
        /// matches the wire shape `{"type": "table", "properties": {...}}`.
        #[derive(Debug, Clone, Serialize, Deserialize)]
        #[serde(tag = "type", content = "properties")]
        pub enum ComponentKind {
            $(#[serde(rename = $name)] $variant($inner),)+
        }

        impl ComponentKind {
            /// Process template placeholders in this component's text fields.
            pub fn apply_templates(&mut self, engine: &TemplateEngine<'_>) {
                match self { $(ComponentKind::$variant(p) => p.apply_templates(engine),)+ }
            }

            /// The serde type tag (the wire `"type"` value).
            pub fn type_name(&self) -> &'static str {
                match self { $(ComponentKind::$variant(_) => $name,)+ }
            }

            /// Human-readable display label (from [`ComponentMeta::label`]).
            pub fn label(&self) -> &'static str {
                match self { $(ComponentKind::$variant(_) => <$inner>::label(),)+ }
            }

            /// Editor defaults for every component type (from
            /// [`ComponentMeta::editor_default`]).
            pub fn all_editor_defaults() -> Vec<Self> {
                vec![$(ComponentKind::$variant(<$inner>::editor_default()),)+]
            }
        }
    };
}

define_components! {
    "text-label" => TextLabel(TextLabelProps),
    "paragraph" => Paragraph(ParagraphProps),
    "table" => Table(TableProps),
    "image" => Image(ImageProps),
    "barcode" => Barcode(BarcodeProps),
    "qr-code" => QrCode(QrCodeProps),
    "divider" => Divider(DividerProps),
    "rectangle" => Rectangle(RectangleProps),
}

impl ComponentKind {
    /// Whether this kind of component may grow with its content. Only text
    /// flows and tables have a content-driven height; every other kind keeps
    /// its designed box no matter what `layout.autoExpand` says.
    pub fn supports_auto_expand(&self) -> bool {
        matches!(
            self,
            ComponentKind::TextLabel(_) | ComponentKind::Paragraph(_) | ComponentKind::Table(_)
        )
    }
}

// ============================================================================
// PAGE COMPONENT
// ============================================================================

/// A renderable unit on a page or in a header/footer region.
///
/// `id` is unique among siblings in the same region, not globally. The
/// persisted source document is never rewritten by layout; adjusted
/// positions live in the output plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageComponent {
    pub id: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub size: Size,
    #[serde(default)]
    pub layout: LayoutOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<RenderCondition>,
    #[serde(flatten)]
    pub kind: ComponentKind,
}

impl PageComponent {
    /// Whether this component actually auto-expands: the flag must be set
    /// and the kind must support it.
    pub fn is_auto_expand(&self) -> bool {
        self.layout.auto_expand && self.kind.supports_auto_expand()
    }

    pub fn pushes_siblings(&self) -> bool {
        self.layout.push_siblings
    }

    /// Evaluate the render condition, if any. Unconditional components
    /// always render.
    pub fn should_render(&self, pool: &VariablePool) -> bool {
        match &self.condition {
            Some(condition) => condition.is_met(pool),
            None => true,
        }
    }

    /// Process template placeholders in the component's text fields.
    pub fn apply_templates(&mut self, engine: &TemplateEngine<'_>) {
        self.kind.apply_templates(engine);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pool_with(entries: &[(&str, &str)]) -> VariablePool {
        let mut pool = VariablePool::new();
        for (name, value) in entries {
            pool.insert_simple(*name, *value);
        }
        pool
    }

    #[test]
    fn test_text_label_wire_format() {
        let json = r#"{
            "id": "title",
            "position": {"x": 10.0, "y": 20.0},
            "size": {"width": 80.0, "height": 12.0},
            "type": "text-label",
            "properties": {"text": "Invoice", "bold": true}
        }"#;
        let comp: PageComponent = serde_json::from_str(json).unwrap();
        assert_eq!(comp.id, "title");
        assert_eq!(comp.position, Position { x: 10.0, y: 20.0 });
        assert_eq!(
            comp.size,
            Size {
                width: 80.0,
                height: 12.0
            }
        );
        assert!(!comp.layout.auto_expand);
        let ComponentKind::TextLabel(props) = &comp.kind else {
            panic!("expected text-label, got {}", comp.kind.type_name());
        };
        assert_eq!(props.text, "Invoice");
        assert!(props.bold);
        assert_eq!(props.font_size, 10.0);
        assert_eq!(props.align, TextAlign::Left);
    }

    #[test]
    fn test_kind_tag_round_trip() {
        let comp = PageComponent {
            id: "qr".into(),
            position: Position { x: 1.0, y: 2.0 },
            size: Size {
                width: 30.0,
                height: 30.0,
            },
            layout: LayoutOptions::default(),
            condition: None,
            kind: ComponentKind::QrCode(QrCodeProps {
                data: "https://example.com".into(),
                error_correction: EcLevel::H,
            }),
        };
        let value = serde_json::to_value(&comp).unwrap();
        assert_eq!(value["type"], "qr-code");
        assert_eq!(value["properties"]["data"], "https://example.com");
        assert_eq!(value["properties"]["errorCorrection"], "h");

        let back: PageComponent = serde_json::from_value(value).unwrap();
        let ComponentKind::QrCode(props) = &back.kind else {
            panic!("expected qr-code");
        };
        assert_eq!(props.error_correction, EcLevel::H);
    }

    #[test]
    fn test_empty_properties_object_uses_defaults() {
        let json = r#"{"id": "d1", "type": "divider", "properties": {}}"#;
        let comp: PageComponent = serde_json::from_str(json).unwrap();
        let ComponentKind::Divider(props) = &comp.kind else {
            panic!("expected divider");
        };
        assert_eq!(props.thickness, 0.5);
        assert_eq!(props.style, LineStyle::Solid);
        assert_eq!(comp.position, Position::default());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let json = r#"{"id": "x", "type": "circle", "properties": {}}"#;
        assert!(serde_json::from_str::<PageComponent>(json).is_err());
    }

    #[test]
    fn test_auto_expand_allow_list() {
        let table = ComponentKind::Table(TableProps::default());
        let divider = ComponentKind::Divider(DividerProps::default());
        assert!(table.supports_auto_expand());
        assert!(!divider.supports_auto_expand());

        // The flag alone is not enough for kinds outside the allow-list.
        let comp = PageComponent {
            id: "d".into(),
            position: Position::default(),
            size: Size::default(),
            layout: LayoutOptions {
                auto_expand: true,
                push_siblings: true,
            },
            condition: None,
            kind: divider,
        };
        assert!(!comp.is_auto_expand());
        assert!(comp.pushes_siblings());
    }

    #[test]
    fn test_render_condition_all_and_any() {
        let pool = pool_with(&[("status", "paid"), ("total", "150")]);

        let json = r#"{
            "mode": "all",
            "rules": [
                {"variable": "status", "operator": "equals", "value": "paid"},
                {"variable": "total", "operator": "greater-than", "value": 100}
            ]
        }"#;
        let all: RenderCondition = serde_json::from_str(json).unwrap();
        assert!(all.is_met(&pool));

        let json = r#"{
            "mode": "any",
            "rules": [
                {"variable": "status", "operator": "equals", "value": "void"},
                {"variable": "total", "operator": "less-than", "value": 100}
            ]
        }"#;
        let any: RenderCondition = serde_json::from_str(json).unwrap();
        assert!(!any.is_met(&pool));
    }

    #[test]
    fn test_condition_numeric_equality() {
        let pool = pool_with(&[("qty", "5.0")]);
        let json = r#"{"rules": [{"variable": "qty", "operator": "equals", "value": 5}]}"#;
        let cond: RenderCondition = serde_json::from_str(json).unwrap();
        assert!(cond.is_met(&pool));
    }

    #[test]
    fn test_condition_empty_checks_treat_absent_as_empty() {
        let pool = pool_with(&[("note", "  ")]);
        let json = r#"{"rules": [{"variable": "note", "operator": "is-empty"}]}"#;
        let cond: RenderCondition = serde_json::from_str(json).unwrap();
        assert!(cond.is_met(&pool));

        let json = r#"{"rules": [{"variable": "missing", "operator": "is-not-empty"}]}"#;
        let cond: RenderCondition = serde_json::from_str(json).unwrap();
        assert!(!cond.is_met(&pool));
    }

    #[test]
    fn test_condition_without_rules_passes() {
        let cond = RenderCondition {
            mode: ConditionMode::All,
            rules: Vec::new(),
        };
        assert!(cond.is_met(&VariablePool::new()));
    }

    #[test]
    fn test_templated_text_fields() {
        let pool = pool_with(&[("name", "Ada")]);
        let engine = TemplateEngine::new(&pool, 1, 1);

        let mut label = ComponentKind::TextLabel(TextLabelProps::new("Hello {{name}}"));
        label.apply_templates(&engine);
        let ComponentKind::TextLabel(props) = &label else {
            panic!("expected text-label");
        };
        assert_eq!(props.text, "Hello Ada");

        let mut table = ComponentKind::Table(TableProps {
            columns: vec![TableColumn::new("{{name}}'s items")],
            rows: vec![vec!["{{name}}".into(), "static".into()]],
            ..Default::default()
        });
        table.apply_templates(&engine);
        let ComponentKind::Table(props) = &table else {
            panic!("expected table");
        };
        assert_eq!(props.columns[0].header, "Ada's items");
        assert_eq!(props.rows[0], vec!["Ada".to_string(), "static".to_string()]);
    }

    #[test]
    fn test_table_estimated_height() {
        let table = TableProps::default();
        assert_eq!(table.estimated_height(3), 32.0);

        let headerless = TableProps {
            show_header: false,
            ..Default::default()
        };
        assert_eq!(headerless.estimated_height(3), 24.0);
    }

    #[test]
    fn test_editor_defaults_cover_every_kind() {
        let defaults = ComponentKind::all_editor_defaults();
        assert_eq!(defaults.len(), 8);

        let names: Vec<&str> = defaults.iter().map(|k| k.type_name()).collect();
        assert_eq!(
            names,
            vec![
                "text-label",
                "paragraph",
                "table",
                "image",
                "barcode",
                "qr-code",
                "divider",
                "rectangle"
            ]
        );
        for kind in &defaults {
            assert!(!kind.label().is_empty());
        }
    }
}
