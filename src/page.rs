//! # Page Geometry
//!
//! Physical page dimensions and margins, in millimetres.
//!
//! ## Built-in page sizes
//!
//! | Preset | Width (mm) | Height (mm) |
//! |--------|------------|-------------|
//! | A4     | 210.0      | 297.0       |
//! | LETTER | 215.9      | 279.4       |
//! | LEGAL  | 215.9      | 355.6       |
//!
//! Every preset carries a 12.7mm (half-inch) margin on all sides. Documents
//! may override any field through their `pageSettings` block; missing fields
//! fall back to A4.

use serde::{Deserialize, Serialize};

/// Page margins in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margins {
    /// Uniform margin on all four sides.
    pub const fn uniform(mm: f64) -> Self {
        Self { top: mm, right: mm, bottom: mm, left: mm }
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(12.7)
    }
}

/// Physical dimensions of one page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageSettings {
    /// Page width in millimetres.
    pub width: f64,
    /// Page height in millimetres.
    pub height: f64,
    pub margins: Margins,
}

impl PageSettings {
    /// ISO A4, 210×297mm.
    pub const A4: Self = Self {
        width: 210.0,
        height: 297.0,
        margins: Margins::uniform(12.7),
    };

    /// US Letter, 8.5×11in.
    pub const LETTER: Self = Self {
        width: 215.9,
        height: 279.4,
        margins: Margins::uniform(12.7),
    };

    /// US Legal, 8.5×14in.
    pub const LEGAL: Self = Self {
        width: 215.9,
        height: 355.6,
        margins: Margins::uniform(12.7),
    };

    /// Look up a preset by name (case-insensitive), or parse an explicit
    /// `WIDTHxHEIGHT` pair such as `210x297`. Suitable as a CLI value parser.
    pub fn parse(name: &str) -> Result<Self, String> {
        match name.trim().to_lowercase().as_str() {
            "a4" => Ok(Self::A4),
            "letter" => Ok(Self::LETTER),
            "legal" => Ok(Self::LEGAL),
            other => {
                if let Some((w, h)) = other.split_once('x') {
                    let width: f64 = w.trim().parse().map_err(|_| bad_size(other))?;
                    let height: f64 = h.trim().parse().map_err(|_| bad_size(other))?;
                    if width > 0.0 && height > 0.0 {
                        return Ok(Self {
                            width,
                            height,
                            margins: Margins::default(),
                        });
                    }
                }
                Err(bad_size(other))
            }
        }
    }

    /// Horizontal space between the left and right margins.
    #[inline]
    pub fn content_width(&self) -> f64 {
        self.width - self.margins.left - self.margins.right
    }

    /// Vertical space between the top and bottom margins.
    #[inline]
    pub fn content_height(&self) -> f64 {
        self.height - self.margins.top - self.margins.bottom
    }
}

fn bad_size(input: &str) -> String {
    format!("unknown page size '{input}' (expected a4, letter, legal, or WIDTHxHEIGHT in mm)")
}

impl Default for PageSettings {
    fn default() -> Self {
        Self::A4
    }
}

// ============================================================================
// TESTS
// ============================================================================
