//! Raster encoders for the QR and barcode payloads. Both return PNG bytes.
//!
//! Plain blocking functions: callers on the async runtime run them inside
//! `spawn_blocking` together with the rest of PDF generation.

use std::io::Cursor;

use barcoders::sym::code128::Code128;
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};

use crate::security::ArtifactError;

/// Code 128 character-set B selector expected by `barcoders`.
const CODE128_SET_B: char = '\u{0181}';

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

#[derive(Debug, Clone)]
pub struct QrRasterOptions {
    /// Pixels per module.
    pub module_px: u32,
    /// Quiet zone in modules (ISO 18004 requires 4).
    pub quiet_zone: u32,
}

impl Default for QrRasterOptions {
    fn default() -> Self {
        Self {
            module_px: 8,
            quiet_zone: 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BarcodeRasterOptions {
    /// Pixels per bar module.
    pub xdim: u32,
    pub height_px: u32,
    /// Quiet zone in modules on each side.
    pub quiet_zone: u32,
}

impl Default for BarcodeRasterOptions {
    fn default() -> Self {
        Self {
            xdim: 2,
            height_px: 80,
            quiet_zone: 10,
        }
    }
}

/// Encodes `payload` as a QR code at error-correction level H (~30% recovery),
/// so it still scans after the PDF is printed or rasterised.
pub fn render_qr_image(payload: &str, options: &QrRasterOptions) -> Result<Vec<u8>, ArtifactError> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::H)
        .map_err(|e| ArtifactError::Qr(e.to_string()))?;

    let width = code.width() as u32;
    let module = options.module_px.max(1);
    let side = (width + options.quiet_zone * 2) * module;
    let quiet_px = options.quiet_zone * module;

    let mut img = GrayImage::from_pixel(side, side, LIGHT);
    for (i, color) in code.to_colors().iter().enumerate() {
        if *color != qrcode::Color::Dark {
            continue;
        }
        let mx = i as u32 % width;
        let my = i as u32 / width;
        fill_block(&mut img, quiet_px + mx * module, quiet_px + my * module, module, module);
    }

    encode_png(img)
}

/// Encodes `payload` as a Code 128 (set B) barcode.
pub fn render_barcode_image(
    payload: &str,
    options: &BarcodeRasterOptions,
) -> Result<Vec<u8>, ArtifactError> {
    let data = format!("{CODE128_SET_B}{payload}");
    let bars = Code128::new(&data)
        .map_err(|e| ArtifactError::Barcode(e.to_string()))?
        .encode();

    let xdim = options.xdim.max(1);
    let quiet_px = options.quiet_zone * xdim;
    let width = bars.len() as u32 * xdim + quiet_px * 2;
    let height = options.height_px.max(1);

    let mut img = GrayImage::from_pixel(width, height, LIGHT);
    for (i, bar) in bars.iter().enumerate() {
        if *bar == 1 {
            fill_block(&mut img, quiet_px + i as u32 * xdim, 0, xdim, height);
        }
    }

    encode_png(img)
}

fn fill_block(img: &mut GrayImage, x0: u32, y0: u32, w: u32, h: u32) {
    for y in y0..(y0 + h).min(img.height()) {
        for x in x0..(x0 + w).min(img.width()) {
            img.put_pixel(x, y, DARK);
        }
    }
}

fn encode_png(img: GrayImage) -> Result<Vec<u8>, ArtifactError> {
    let mut buf = Vec::new();
    DynamicImage::ImageLuma8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| ArtifactError::Encode(e.to_string()))?;
    Ok(buf)
}
