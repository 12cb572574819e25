//! Content measurement capability.
//!
//! Real text metrics belong to the drawing collaborator; the core only
//! needs *some* height to run the two-pass layout protocol against. The
//! [`ContentMeasurer`] trait is that seam, and [`TextEstimate`] is the
//! built-in heuristic impl: average glyph width as a fraction of the font
//! size, explicitly not font metrics.

use crate::document::component::ComponentKind;

/// Points to millimetres (1pt = 1/72in).
pub const PT_TO_MM: f64 = 0.3528;

/// Average glyph advance as a fraction of the font size. Roughly right for
/// common proportional faces at body sizes.
const AVG_GLYPH_WIDTH: f64 = 0.55;

/// Line spacing used for single-style labels, which have no lineHeight
/// property of their own.
const LABEL_LINE_SPACING: f64 = 1.2;

/// Reports content heights to the layout pass.
///
/// Returning `None` means "no opinion": the caller falls back to geometric
/// estimates (the table band formula, or the designed height).
pub trait ContentMeasurer: Sync {
    fn measure(&self, kind: &ComponentKind, available_width_mm: f64) -> Option<f64>;
}

/// Character-count text estimator.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextEstimate;

impl ContentMeasurer for TextEstimate {
    fn measure(&self, kind: &ComponentKind, available_width_mm: f64) -> Option<f64> {
        match kind {
            ComponentKind::TextLabel(props) => {
                let lines = wrapped_line_count(&props.text, props.font_size, available_width_mm);
                Some(lines as f64 * props.font_size * PT_TO_MM * LABEL_LINE_SPACING)
            }
            ComponentKind::Paragraph(props) => {
                let lines = wrapped_line_count(&props.text, props.font_size, available_width_mm);
                Some(lines as f64 * props.font_size * PT_TO_MM * props.line_height)
            }
            _ => None,
        }
    }
}

/// Measurer that never has an opinion, for pure-geometry layouts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMeasurement;

impl ContentMeasurer for NoMeasurement {
    fn measure(&self, _kind: &ComponentKind, _available_width_mm: f64) -> Option<f64> {
        None
    }
}

fn wrapped_line_count(text: &str, font_size: f64, available_width_mm: f64) -> usize {
    let glyph_width = font_size * PT_TO_MM * AVG_GLYPH_WIDTH;
    let per_line = if glyph_width > 0.0 {
        ((available_width_mm / glyph_width).floor() as usize).max(1)
    } else {
        1
    };
    text.split('\n')
        .map(|line| line.chars().count().div_ceil(per_line).max(1))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::component::{DividerProps, ParagraphProps, TextLabelProps};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_wrapping_by_character_budget() {
        // 10pt glyphs are ~1.94mm wide, so 80mm fits 41 of them.
        assert_eq!(wrapped_line_count(&"a".repeat(41), 10.0, 80.0), 1);
        assert_eq!(wrapped_line_count(&"a".repeat(42), 10.0, 80.0), 2);
        assert_eq!(wrapped_line_count(&"a".repeat(100), 10.0, 80.0), 3);
    }

    #[test]
    fn test_explicit_newlines_count_as_lines() {
        assert_eq!(wrapped_line_count("a\n\nb", 10.0, 80.0), 3);
        assert_eq!(wrapped_line_count("", 10.0, 80.0), 1);
    }

    #[test]
    fn test_degenerate_width_stays_finite() {
        assert_eq!(wrapped_line_count("abc", 10.0, 0.0), 3);
    }

    #[test]
    fn test_paragraph_height_uses_line_height() {
        let kind = ComponentKind::Paragraph(ParagraphProps::new("a".repeat(100)));
        let height = TextEstimate.measure(&kind, 80.0).unwrap();
        // 3 lines at 10pt and 1.4 line height.
        assert!((height - 3.0 * 10.0 * PT_TO_MM * 1.4).abs() < 1e-9);
    }

    #[test]
    fn test_label_height_uses_fixed_spacing() {
        let kind = ComponentKind::TextLabel(TextLabelProps::new("short"));
        let height = TextEstimate.measure(&kind, 100.0).unwrap();
        assert!((height - 10.0 * PT_TO_MM * 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_non_text_kinds_have_no_estimate() {
        let kind = ComponentKind::Divider(DividerProps::default());
        assert_eq!(TextEstimate.measure(&kind, 100.0), None);
        assert_eq!(NoMeasurement.measure(&kind, 100.0), None);
    }
}
