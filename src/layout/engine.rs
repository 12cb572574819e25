//! Auto-expansion and sibling pushing.
//!
//! Layout is a two-phase protocol. Phase 1 ([`LayoutPass::new`]) sorts the
//! page's components into reading order and wraps each in a
//! [`LayoutComponent`] whose height is provisional: the designed box.
//! Between the phases an external measuring step (the drawing collaborator,
//! or [`crate::layout::measure::TextEstimate`]) reports real content
//! heights through [`LayoutPass::apply_measurement`]. Phase 2
//! ([`LayoutPass::resolve`]) walks the sorted components and, for every one
//! that expanded beyond its designed height, shifts the components below it
//! down by the same delta.
//!
//! A component is shifted only when its top sits at or below the expander's
//! *original* bottom and its horizontal span overlaps the expander's.
//! Overlap is open-interval: boxes that merely touch edges do not push
//! each other.

use crate::document::component::PageComponent;

/// A component wrapped with the mutable state of one layout pass.
///
/// Created, mutated, and discarded within a single pass; the source
/// [`PageComponent`] keeps its designed geometry untouched.
#[derive(Debug, Clone)]
pub struct LayoutComponent {
    pub component: PageComponent,
    /// Top edge after earlier expanders pushed this component down.
    pub adjusted_y: f64,
    /// Measured content height. Starts at the designed height and never
    /// shrinks below it.
    pub actual_height: f64,
}

impl LayoutComponent {
    fn new(component: PageComponent) -> Self {
        Self {
            adjusted_y: component.position.y,
            actual_height: component.size.height,
            component,
        }
    }

    /// Bottom edge of the designed box.
    #[inline]
    pub fn original_bottom(&self) -> f64 {
        self.component.position.y + self.component.size.height
    }

    /// Bottom edge after adjustment and measurement.
    #[inline]
    pub fn adjusted_bottom(&self) -> f64 {
        self.adjusted_y + self.actual_height
    }

    pub fn is_auto_expand(&self) -> bool {
        self.component.is_auto_expand()
    }

    pub fn pushes_siblings(&self) -> bool {
        self.component.pushes_siblings()
    }
}

/// The two-phase layout protocol for one region's components.
#[derive(Debug)]
pub struct LayoutPass {
    components: Vec<LayoutComponent>,
}

impl LayoutPass {
    /// Phase 1: sort by `(y, x)` and take provisional (designed) heights.
    pub fn new(mut components: Vec<PageComponent>) -> Self {
        components.sort_by(|a, b| {
            a.position
                .y
                .total_cmp(&b.position.y)
                .then(a.position.x.total_cmp(&b.position.x))
        });
        Self {
            components: components.into_iter().map(LayoutComponent::new).collect(),
        }
    }

    /// Record one measured content height, by component id.
    ///
    /// Unknown ids and components that cannot expand are ignored, and a
    /// measurement below the designed height never shrinks the box.
    pub fn apply_measurement(&mut self, id: &str, height: f64) {
        if let Some(lc) = self.components.iter_mut().find(|lc| lc.component.id == id) {
            if lc.is_auto_expand() {
                lc.actual_height = height.max(lc.component.size.height);
            }
        }
    }

    /// Phase 2: propagate expansion deltas downward and return the
    /// components in layout order.
    pub fn resolve(mut self) -> Vec<LayoutComponent> {
        for i in 0..self.components.len() {
            let expander = &self.components[i];
            if !expander.is_auto_expand() || !expander.pushes_siblings() {
                continue;
            }
            let delta = expander.actual_height - expander.component.size.height;
            if delta <= 0.0 {
                continue;
            }
            let bottom = expander.original_bottom();
            let (left, right) = span(&expander.component);
            for sibling in &mut self.components[i + 1..] {
                let (s_left, s_right) = span(&sibling.component);
                if sibling.component.position.y >= bottom && left < s_right && right > s_left {
                    sibling.adjusted_y += delta;
                }
            }
        }
        self.components
    }

    pub fn components(&self) -> &[LayoutComponent] {
        &self.components
    }
}

#[inline]
fn span(c: &PageComponent) -> (f64, f64) {
    (c.position.x, c.position.x + c.size.width)
}

fn spans_overlap(a: &PageComponent, b: &PageComponent) -> bool {
    let (a_left, a_right) = span(a);
    let (b_left, b_right) = span(b);
    a_left < b_right && a_right > b_left
}

/// True iff `b` sits at or below `a`'s designed bottom with overlapping
/// horizontal spans, i.e. `a` growing would displace `b`.
pub fn should_push_down(a: &PageComponent, b: &PageComponent) -> bool {
    b.position.y >= a.position.y + a.size.height && spans_overlap(a, b)
}

/// Full 2D rectangle intersection, open-interval on both axes.
pub fn has_overlap(a: &PageComponent, b: &PageComponent) -> bool {
    spans_overlap(a, b)
        && a.position.y < b.position.y + b.size.height
        && a.position.y + a.size.height > b.position.y
}

/// All components `expander` would displace, sorted by top edge.
pub fn affected_components<'a>(
    expander: &PageComponent,
    all: &'a [PageComponent],
) -> Vec<&'a PageComponent> {
    let mut affected: Vec<&PageComponent> = all
        .iter()
        .filter(|c| c.id != expander.id && should_push_down(expander, c))
        .collect();
    affected.sort_by(|a, b| a.position.y.total_cmp(&b.position.y));
    affected
}
