//! Pass one: section expansion into line items and pagination.
//!
//! The cursor is the Y of the top of the free body area and moves down the page.
//! Page 1 gets the header band here; later pages get the continuation header as they
//! are opened. Footers, watermark and the signature block need the final page count
//! and are drawn afterwards by `decorate`.

use crate::content::{expand_sections, Paragraph, StructuredContent};
use crate::layout::config::LayoutConfig;
use crate::layout::font_metrics::{get_metrics, BaseFont};
use crate::layout::ops::{
    Color, DrawOp, ImageDims, ImageSlot, RenderPage, ACCENT, DIVIDER, PLACEHOLDER, TEXT_DARK,
    TEXT_MUTED, WHITE,
};
use crate::layout::wrap::{max_chars_per_line, wrap_text};
use crate::layout::LayoutInput;

pub const EMPTY_PLACEHOLDER: &str = "No content available";

// ────────────────────────────────────────────────────────────────────────────
// Line items
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    SectionHeader,
    Subheading,
    Body,
    /// Indented body line (entry descriptions).
    Detail,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub kind: LineKind,
    pub text: String,
}

impl LineKind {
    pub fn height(&self, cfg: &LayoutConfig) -> f32 {
        match self {
            LineKind::SectionHeader => cfg.section_header_height,
            LineKind::Subheading => cfg.subheading_height,
            LineKind::Body | LineKind::Detail => cfg.body_height,
        }
    }

    pub fn font_size(&self, cfg: &LayoutConfig) -> f32 {
        match self {
            LineKind::SectionHeader => cfg.section_header_size,
            LineKind::Subheading => cfg.subheading_size,
            LineKind::Body | LineKind::Detail => cfg.body_size,
        }
    }

    fn indent(&self, cfg: &LayoutConfig) -> f32 {
        match self {
            LineKind::Detail => cfg.detail_indent,
            _ => 0.0,
        }
    }

    fn is_bold(&self) -> bool {
        matches!(self, LineKind::SectionHeader | LineKind::Subheading)
    }

    fn color(&self) -> Color {
        match self {
            LineKind::SectionHeader => ACCENT,
            _ => TEXT_DARK,
        }
    }

    /// Headers are never left as the last line of a page.
    fn keeps_with_next(&self) -> bool {
        matches!(self, LineKind::SectionHeader | LineKind::Subheading)
    }
}

/// Expands content into wrapped line items in print order.
///
/// Empty content yields the single placeholder line.
pub fn expand_line_items(content: &StructuredContent, cfg: &LayoutConfig) -> Vec<LineItem> {
    let mut items = Vec::new();

    for section in expand_sections(content) {
        if let Some(label) = section.kind.label() {
            items.push(LineItem {
                kind: LineKind::SectionHeader,
                text: label.to_string(),
            });
        }
        for paragraph in &section.paragraphs {
            let (kind, text) = match paragraph {
                Paragraph::Heading(t) => (LineKind::Subheading, t),
                Paragraph::Plain(t) => (LineKind::Body, t),
                Paragraph::Detail(t) => (LineKind::Detail, t),
            };
            let width = cfg.content_width() - kind.indent(cfg);
            let max_chars =
                max_chars_per_line(width, kind.font_size(cfg), cfg.avg_glyph_em, cfg.max_line_chars);
            items.extend(
                wrap_text(text, max_chars)
                    .into_iter()
                    .map(|text| LineItem { kind, text }),
            );
        }
    }

    if items.is_empty() {
        items.push(LineItem {
            kind: LineKind::Body,
            text: EMPTY_PLACEHOLDER.to_string(),
        });
    }
    items
}

// ────────────────────────────────────────────────────────────────────────────
// Pagination
// ────────────────────────────────────────────────────────────────────────────

struct PageFlow<'a> {
    cfg: &'a LayoutConfig,
    input: &'a LayoutInput<'a>,
    pages: Vec<RenderPage>,
    cursor: f32,
}

impl<'a> PageFlow<'a> {
    fn new(cfg: &'a LayoutConfig, input: &'a LayoutInput<'a>) -> Self {
        let mut first = RenderPage::new(cfg.page_width, cfg.page_height);
        draw_header_band(&mut first, input, cfg);
        Self {
            cfg,
            input,
            pages: vec![first],
            cursor: cfg.body_top(0),
        }
    }

    fn open_page(&mut self) {
        let index = self.pages.len();
        let mut page = RenderPage::new(self.cfg.page_width, self.cfg.page_height);
        if self.cfg.decorations.continuation_header {
            draw_continuation_header(&mut page, self.input, self.cfg);
        }
        self.pages.push(page);
        self.cursor = self.cfg.body_top(index);
    }

    fn fits(&self, height: f32) -> bool {
        self.cursor - height >= self.cfg.body_bottom()
    }

    fn place(&mut self, item: &LineItem) {
        let cfg = self.cfg;
        let h = item.kind.height(cfg);
        let size = item.kind.font_size(cfg);
        let baseline = self.cursor - h + size * 0.25;
        let x = cfg.margin_left + item.kind.indent(cfg);

        let Some(page) = self.pages.last_mut() else {
            return;
        };
        page.ops.push(DrawOp::text(
            item.text.clone(),
            x,
            baseline,
            size,
            item.kind.color(),
            item.kind.is_bold(),
        ));
        if item.kind == LineKind::SectionHeader {
            page.ops.push(DrawOp::Rect {
                x: cfg.margin_left,
                y: baseline - 3.0,
                width: cfg.content_width(),
                height: 0.5,
                color: DIVIDER,
            });
        }
        self.cursor -= h;
    }
}

/// Lays out line items over as many pages as needed. Opens one more page when the
/// signature band does not fit under the last line.
pub(crate) fn paginate(items: &[LineItem], input: &LayoutInput<'_>, cfg: &LayoutConfig) -> Vec<RenderPage> {
    let mut flow = PageFlow::new(cfg, input);

    for (i, item) in items.iter().enumerate() {
        let mut needed = item.kind.height(cfg);
        if item.kind.keeps_with_next() {
            if let Some(next) = items.get(i + 1) {
                needed += next.kind.height(cfg);
            }
        }
        if !flow.fits(needed) {
            flow.open_page();
        }
        flow.place(item);
    }

    if cfg.decorations.signature_block && !flow.fits(cfg.signature_band_height) {
        flow.open_page();
    }

    flow.pages
}

// ────────────────────────────────────────────────────────────────────────────
// Page headers
// ────────────────────────────────────────────────────────────────────────────

const PROFILE_BOX: f32 = 64.0;
const NAME_SIZE: f32 = 18.0;
const HEADLINE_SIZE: f32 = 11.0;
const INITIALS_SIZE: f32 = 22.0;
const CONTINUATION_SIZE: f32 = 9.0;

fn draw_header_band(page: &mut RenderPage, input: &LayoutInput<'_>, cfg: &LayoutConfig) {
    let top = cfg.page_height - cfg.margin_top;
    let box_y = top - PROFILE_BOX;

    match input.images.get(&ImageSlot::Profile) {
        Some(dims) => {
            let (w, h) = fit_within(*dims, PROFILE_BOX, PROFILE_BOX);
            page.ops.push(DrawOp::Image {
                slot: ImageSlot::Profile,
                x: (cfg.page_width - w) / 2.0,
                y: box_y + (PROFILE_BOX - h) / 2.0,
                width: w,
                height: h,
            });
        }
        None => {
            page.ops.push(DrawOp::Rect {
                x: (cfg.page_width - PROFILE_BOX) / 2.0,
                y: box_y,
                width: PROFILE_BOX,
                height: PROFILE_BOX,
                color: PLACEHOLDER,
            });
            let initials = initials(input.display_name);
            page.ops.push(centered_text(
                &initials,
                cfg.page_width,
                box_y + PROFILE_BOX / 2.0 - INITIALS_SIZE * 0.35,
                INITIALS_SIZE,
                WHITE,
                true,
            ));
        }
    }

    let name_y = box_y - 24.0;
    page.ops.push(centered_text(
        input.display_name,
        cfg.page_width,
        name_y,
        NAME_SIZE,
        TEXT_DARK,
        true,
    ));

    let headline = input.content.headline.trim();
    if !headline.is_empty() {
        page.ops.push(centered_text(
            headline,
            cfg.page_width,
            name_y - 18.0,
            HEADLINE_SIZE,
            TEXT_MUTED,
            false,
        ));
    }

    page.ops.push(DrawOp::Rect {
        x: cfg.margin_left,
        y: cfg.body_top(0) + 10.0,
        width: cfg.content_width(),
        height: 1.0,
        color: DIVIDER,
    });
}

fn draw_continuation_header(page: &mut RenderPage, input: &LayoutInput<'_>, cfg: &LayoutConfig) {
    let top = cfg.page_height - cfg.margin_top;
    let baseline = top - 14.0;

    page.ops.push(DrawOp::text(
        input.title,
        cfg.margin_left,
        baseline,
        CONTINUATION_SIZE,
        TEXT_MUTED,
        false,
    ));
    let owner_width = get_metrics(BaseFont::Helvetica).text_width_pt(input.display_name, CONTINUATION_SIZE);
    page.ops.push(DrawOp::text(
        input.display_name,
        cfg.page_width - cfg.margin_right - owner_width,
        baseline,
        CONTINUATION_SIZE,
        TEXT_MUTED,
        false,
    ));
    page.ops.push(DrawOp::Rect {
        x: cfg.margin_left,
        y: top - cfg.continuation_header_height + 6.0,
        width: cfg.content_width(),
        height: 0.5,
        color: DIVIDER,
    });
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers shared with the decoration pass
// ────────────────────────────────────────────────────────────────────────────

/// Text op horizontally centered on the page, using the static width tables.
pub(crate) fn centered_text(
    content: &str,
    page_width: f32,
    y: f32,
    font_size: f32,
    color: Color,
    bold: bool,
) -> DrawOp {
    let width = get_metrics(BaseFont::for_weight(bold)).text_width_pt(content, font_size);
    DrawOp::text(content, (page_width - width) / 2.0, y, font_size, color, bold)
}

/// Largest (w, h) with the image's aspect ratio inside a `max_w` x `max_h` box.
pub(crate) fn fit_within(dims: ImageDims, max_w: f32, max_h: f32) -> (f32, f32) {
    if dims.width == 0 || dims.height == 0 {
        return (max_w, max_h);
    }
    let scale = (max_w / dims.width as f32).min(max_h / dims.height as f32);
    (dims.width as f32 * scale, dims.height as f32 * scale)
}

fn initials(name: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .filter_map(|w| w.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect();
    if letters.is_empty() {
        "CV".to_string()
    } else {
        letters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::model::{ExperienceEntry, PersonalInfo};
    use crate::content::normalize_content;
    use serde_json::json;

    #[test]
    fn test_empty_content_expands_to_placeholder() {
        let items = expand_line_items(&StructuredContent::default(), &LayoutConfig::default());
        assert_eq!(
            items,
            vec![LineItem {
                kind: LineKind::Body,
                text: EMPTY_PLACEHOLDER.to_string()
            }]
        );
    }

    #[test]
    fn test_legacy_text_expands_to_plain_body_lines() {
        let normalized = normalize_content(&json!("Line one\nLine two"), "Jane", "CV");
        let items = expand_line_items(&normalized.content, &LayoutConfig::default());
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.kind == LineKind::Body));
        assert_eq!(items[0].text, "Line one");
        assert_eq!(items[1].text, "Line two");
    }

    #[test]
    fn test_sections_emit_header_then_body() {
        let content = StructuredContent {
            personal: PersonalInfo {
                full_name: "Jane Doe".into(),
                ..Default::default()
            },
            experience: vec![ExperienceEntry {
                company: "Acme".into(),
                position: "Engineer".into(),
                description: "Built things.".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let kinds: Vec<LineKind> = expand_line_items(&content, &LayoutConfig::default())
            .into_iter()
            .map(|i| i.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                LineKind::SectionHeader,
                LineKind::Body,
                LineKind::SectionHeader,
                LineKind::Subheading,
                LineKind::Detail,
            ]
        );
    }

    #[test]
    fn test_detail_lines_respect_indented_width() {
        let cfg = LayoutConfig::default();
        let content = StructuredContent {
            experience: vec![ExperienceEntry {
                description: "word ".repeat(200),
                ..Default::default()
            }],
            ..Default::default()
        };
        let max = max_chars_per_line(
            cfg.content_width() - cfg.detail_indent,
            cfg.body_size,
            cfg.avg_glyph_em,
            cfg.max_line_chars,
        );
        let details: Vec<_> = expand_line_items(&content, &cfg)
            .into_iter()
            .filter(|i| i.kind == LineKind::Detail)
            .collect();
        assert!(details.len() > 1);
        assert!(details.iter().all(|i| i.text.chars().count() <= max));
    }

    #[test]
    fn test_fit_within_keeps_aspect_ratio() {
        let (w, h) = fit_within(ImageDims { width: 200, height: 100 }, 64.0, 64.0);
        assert_eq!((w, h), (64.0, 32.0));
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("jane van doe"), "JV");
        assert_eq!(initials("  "), "CV");
    }
}
