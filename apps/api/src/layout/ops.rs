//! Positioned draw operations produced by the layout engine and consumed by the assembler.
//! Coordinates are PDF points, origin bottom-left; text `y` is the baseline.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(v: f32) -> Self {
        Self { r: v, g: v, b: v }
    }
}

pub const TEXT_DARK: Color = Color::gray(0.13);
pub const TEXT_MUTED: Color = Color::gray(0.45);
pub const ACCENT: Color = Color::rgb(0.12, 0.29, 0.49);
pub const DIVIDER: Color = Color::gray(0.75);
pub const PLACEHOLDER: Color = Color::rgb(0.55, 0.62, 0.70);
pub const WHITE: Color = Color::gray(1.0);
/// Light enough that body text over it stays legible.
pub const WATERMARK: Color = Color::gray(0.88);

/// Image roles. The assembler embeds each slot at most once per document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ImageSlot {
    Profile,
    Signature,
    Barcode,
    Qr,
}

impl ImageSlot {
    pub const ALL: [ImageSlot; 4] = [
        ImageSlot::Profile,
        ImageSlot::Signature,
        ImageSlot::Barcode,
        ImageSlot::Qr,
    ];

    /// XObject resource name.
    pub fn resource_name(&self) -> &'static str {
        match self {
            ImageSlot::Profile => "ImProfile",
            ImageSlot::Signature => "ImSignature",
            ImageSlot::Barcode => "ImBarcode",
            ImageSlot::Qr => "ImQr",
        }
    }
}

/// Pixel dimensions of a decoded image, used to keep aspect ratios when fitting boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDims {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawOp {
    Text {
        content: String,
        x: f32,
        y: f32,
        font_size: f32,
        color: Color,
        bold: bool,
        /// Counter-clockwise rotation around (x, y).
        rotation_deg: f32,
    },
    Image {
        slot: ImageSlot,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
}

impl DrawOp {
    pub fn text(content: impl Into<String>, x: f32, y: f32, font_size: f32, color: Color, bold: bool) -> Self {
        DrawOp::Text {
            content: content.into(),
            x,
            y,
            font_size,
            color,
            bold,
            rotation_deg: 0.0,
        }
    }

    #[cfg(test)]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DrawOp::Text { content, .. } => Some(content),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderPage {
    pub width: f32,
    pub height: f32,
    pub ops: Vec<DrawOp>,
}

impl RenderPage {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(DrawOp::as_text)
    }

    pub fn images(&self) -> impl Iterator<Item = ImageSlot> + '_ {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Image { slot, .. } => Some(*slot),
            _ => None,
        })
    }
}
