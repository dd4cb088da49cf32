//! Pass two: decorations that depend on the final page count.

use crate::layout::config::LayoutConfig;
use crate::layout::engine::{centered_text, fit_within};
use crate::layout::ops::{DrawOp, ImageSlot, RenderPage, DIVIDER, TEXT_DARK, TEXT_MUTED, WATERMARK};
use crate::layout::{LayoutInput, SigningBlock};

const FOOTER_SIZE: f32 = 9.0;
const BARCODE_BOX: (f32, f32) = (180.0, 36.0);
const SIGNATURE_BOX: (f32, f32) = (150.0, 45.0);
const QR_BOX: f32 = 90.0;
const SIGN_TEXT_SIZE: f32 = 9.0;
const WATERMARK_SIZE: f32 = 40.0;
const WATERMARK_ANGLE: f32 = 45.0;

/// Draws footers on every page, the barcode on page 1, the signature block on the
/// last page and the watermark (as the first op, beneath everything else) on every page.
pub(crate) fn decorate(pages: &mut [RenderPage], input: &LayoutInput<'_>, cfg: &LayoutConfig) {
    let total = pages.len();

    for (index, page) in pages.iter_mut().enumerate() {
        page.ops.push(centered_text(
            &format!("Page {} of {}", index + 1, total),
            cfg.page_width,
            cfg.margin_bottom,
            FOOTER_SIZE,
            TEXT_MUTED,
            false,
        ));

        if index == 0 && cfg.decorations.footer_barcode && input.images.contains_key(&ImageSlot::Barcode) {
            // Bars scale freely, so the barcode fills its box.
            page.ops.push(DrawOp::Image {
                slot: ImageSlot::Barcode,
                x: (cfg.page_width - BARCODE_BOX.0) / 2.0,
                y: cfg.margin_bottom + 12.0,
                width: BARCODE_BOX.0,
                height: BARCODE_BOX.1,
            });
        }

        if index + 1 == total && cfg.decorations.signature_block {
            draw_signature_block(page, input, cfg);
        }

        if cfg.decorations.watermark {
            if let Some(text) = input.watermark.filter(|t| !t.trim().is_empty()) {
                page.ops.insert(0, watermark_op(text, cfg));
            }
        }
    }
}

fn draw_signature_block(page: &mut RenderPage, input: &LayoutInput<'_>, cfg: &LayoutConfig) {
    let bottom = cfg.body_bottom();
    let top = bottom + cfg.signature_band_height;

    page.ops.push(DrawOp::Rect {
        x: cfg.margin_left,
        y: top - 2.0,
        width: cfg.content_width(),
        height: 0.5,
        color: DIVIDER,
    });

    if let Some(dims) = input.images.get(&ImageSlot::Signature) {
        let (w, h) = fit_within(*dims, SIGNATURE_BOX.0, SIGNATURE_BOX.1);
        page.ops.push(DrawOp::Image {
            slot: ImageSlot::Signature,
            x: cfg.margin_left,
            y: top - 10.0 - h,
            width: w,
            height: h,
        });
    }

    if let Some(dims) = input.images.get(&ImageSlot::Qr) {
        let (w, h) = fit_within(*dims, QR_BOX, QR_BOX);
        page.ops.push(DrawOp::Image {
            slot: ImageSlot::Qr,
            x: cfg.page_width - cfg.margin_right - w,
            y: top - 10.0 - h,
            width: w,
            height: h,
        });
    }

    let mut y = top - 10.0 - SIGNATURE_BOX.1 - 14.0;
    for line in signing_lines(input.signing) {
        page.ops.push(DrawOp::text(line, cfg.margin_left, y, SIGN_TEXT_SIZE, TEXT_DARK, false));
        y -= 12.0;
    }

    let closing = match input.signing {
        Some(s) => format!("{} | {}", input.display_name, s.signed_at.format("%Y-%m-%d")),
        None => input.display_name.to_string(),
    };
    page.ops.push(centered_text(&closing, cfg.page_width, bottom + 10.0, 10.0, TEXT_DARK, true));
}

fn signing_lines(signing: Option<&SigningBlock>) -> Vec<String> {
    match signing {
        Some(s) => vec![
            format!("Signed by: {}", s.signer_name),
            format!("Institution: {}", s.institution),
            format!("Signed at: {}", s.signed_at.format("%Y-%m-%d %H:%M UTC")),
        ],
        None => vec!["Not signed".to_string()],
    }
}

/// Rotated text centered on the page. The anchor is shifted back along the rotation
/// so the middle of the string lands on the page center.
fn watermark_op(text: &str, cfg: &LayoutConfig) -> DrawOp {
    use crate::layout::font_metrics::{get_metrics, BaseFont};

    let width = get_metrics(BaseFont::HelveticaBold).text_width_pt(text, WATERMARK_SIZE);
    let angle = WATERMARK_ANGLE.to_radians();
    let (cx, cy) = (cfg.page_width / 2.0, cfg.page_height / 2.0);
    DrawOp::Text {
        content: text.to_string(),
        x: cx - angle.cos() * width / 2.0,
        y: cy - angle.sin() * width / 2.0,
        font_size: WATERMARK_SIZE,
        color: WATERMARK,
        bold: true,
        rotation_deg: WATERMARK_ANGLE,
    }
}
