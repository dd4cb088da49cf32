//! Page geometry and decoration switches for the layout engine.
//!
//! All values are PDF points with the origin at the bottom-left corner of the page.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("invalid layout config: {0}")]
    InvalidConfig(String),
}

/// Optional decorations. One layout path, switched per document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decorations {
    /// Signature/QR band on the final page.
    pub signature_block: bool,
    /// Barcode centered in the page-1 footer band.
    pub footer_barcode: bool,
    /// Diagonal watermark on every page.
    pub watermark: bool,
    /// Title/owner strip at the top of pages 2..N.
    pub continuation_header: bool,
}

impl Default for Decorations {
    fn default() -> Self {
        Self {
            signature_block: true,
            footer_barcode: true,
            watermark: true,
            continuation_header: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    /// Name/photo band at the top of page 1.
    pub header_band_height: f32,
    /// Title/owner strip at the top of later pages.
    pub continuation_header_height: f32,
    /// Reserved above the bottom margin for page number and barcode.
    pub footer_band_height: f32,
    pub signature_band_height: f32,

    pub section_header_size: f32,
    pub section_header_height: f32,
    pub subheading_size: f32,
    pub subheading_height: f32,
    pub body_size: f32,
    pub body_height: f32,
    /// Left indent for wrapped description lines.
    pub detail_indent: f32,

    /// Estimated average glyph width in em, used by the wrap heuristic.
    pub avg_glyph_em: f32,
    /// Hard per-line character cap, independent of the heuristic.
    pub max_line_chars: usize,

    pub decorations: Decorations,
}

/// A4 portrait in points.
pub const A4: (f32, f32) = (595.0, 842.0);

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_width: A4.0,
            page_height: A4.1,
            margin_left: 50.0,
            margin_right: 50.0,
            margin_top: 40.0,
            margin_bottom: 36.0,
            header_band_height: 150.0,
            continuation_header_height: 30.0,
            footer_band_height: 56.0,
            signature_band_height: 140.0,
            section_header_size: 13.0,
            section_header_height: 24.0,
            subheading_size: 11.0,
            subheading_height: 16.0,
            body_size: 10.0,
            body_height: 14.0,
            detail_indent: 12.0,
            avg_glyph_em: 0.5,
            max_line_chars: 120,
            decorations: Decorations::default(),
        }
    }
}

impl LayoutConfig {
    pub fn content_width(&self) -> f32 {
        self.page_width - self.margin_left - self.margin_right
    }

    /// Lowest Y a body line may reach.
    pub fn body_bottom(&self) -> f32 {
        self.margin_bottom + self.footer_band_height
    }

    /// Y where the first body line starts on a page.
    pub fn body_top(&self, page_index: usize) -> f32 {
        let top = self.page_height - self.margin_top;
        if page_index == 0 {
            top - self.header_band_height
        } else if self.decorations.continuation_header {
            top - self.continuation_header_height
        } else {
            top
        }
    }

    /// How many lines of `line_height` fit in the body area of a page.
    #[cfg(test)]
    pub fn body_capacity(&self, page_index: usize, line_height: f32) -> usize {
        ((self.body_top(page_index) - self.body_bottom()) / line_height).floor() as usize
    }

    /// Rejects geometry in which a single line, or the signature band, could never fit.
    /// Pagination relies on this to terminate.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let tallest = self
            .section_header_height
            .max(self.subheading_height)
            .max(self.body_height);
        if tallest <= 0.0 || self.body_height <= 0.0 || self.subheading_height <= 0.0 {
            return Err(LayoutError::InvalidConfig(
                "line heights must be positive".to_string(),
            ));
        }
        if self.content_width() <= self.detail_indent {
            return Err(LayoutError::InvalidConfig(
                "margins leave no content width".to_string(),
            ));
        }
        let min_body = (0..2)
            .map(|i| self.body_top(i) - self.body_bottom())
            .fold(f32::INFINITY, f32::min);
        // Header items are kept with the next line, so two lines must fit.
        if min_body < tallest * 2.0 {
            return Err(LayoutError::InvalidConfig(format!(
                "body area of {min_body}pt cannot hold two lines of {tallest}pt"
            )));
        }
        if self.decorations.signature_block
            && self.body_top(1) - self.body_bottom() < self.signature_band_height
        {
            return Err(LayoutError::InvalidConfig(
                "signature band taller than a page body".to_string(),
            ));
        }
        if self.max_line_chars == 0 || self.avg_glyph_em <= 0.0 {
            return Err(LayoutError::InvalidConfig(
                "wrap parameters must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
