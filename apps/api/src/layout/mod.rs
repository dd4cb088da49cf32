// Page layout: StructuredContent + decoration assets -> positioned draw ops per page.
// Pure and synchronous. Callers on the async runtime run it inside spawn_blocking
// together with assembly.

pub mod config;
mod decorate;
pub mod engine;
pub mod font_metrics;
pub mod ops;
pub mod wrap;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::content::StructuredContent;

pub use config::{LayoutConfig, LayoutError};
pub use ops::{Color, DrawOp, ImageDims, ImageSlot, RenderPage};

/// Which images are available, with their pixel sizes. Slots absent here are not drawn.
pub type ImageCatalog = BTreeMap<ImageSlot, ImageDims>;

/// Text for the signature block on the final page.
#[derive(Debug, Clone)]
pub struct SigningBlock {
    pub signer_name: String,
    pub institution: String,
    pub signed_at: DateTime<Utc>,
}

pub struct LayoutInput<'a> {
    pub content: &'a StructuredContent,
    pub display_name: &'a str,
    /// Document title, printed in the continuation header.
    pub title: &'a str,
    pub images: &'a ImageCatalog,
    pub watermark: Option<&'a str>,
    pub signing: Option<&'a SigningBlock>,
}

/// Lays out a whole document. Always returns at least one page.
pub fn layout_document(input: &LayoutInput<'_>, cfg: &LayoutConfig) -> Result<Vec<RenderPage>, LayoutError> {
    cfg.validate()?;

    let items = engine::expand_line_items(input.content, cfg);
    let mut pages = engine::paginate(&items, input, cfg);
    decorate::decorate(&mut pages, input, cfg);

    debug!(
        line_items = items.len(),
        pages = pages.len(),
        "document laid out"
    );
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::model::{ExperienceEntry, PersonalInfo};
    use crate::layout::config::Decorations;
    use crate::layout::engine::EMPTY_PLACEHOLDER;
    use chrono::TimeZone;

    fn input<'a>(
        content: &'a StructuredContent,
        images: &'a ImageCatalog,
        signing: Option<&'a SigningBlock>,
        watermark: Option<&'a str>,
    ) -> LayoutInput<'a> {
        LayoutInput {
            content,
            display_name: "Jane Doe",
            title: "Jane's CV",
            images,
            watermark,
            signing,
        }
    }

    fn all_images() -> ImageCatalog {
        ImageSlot::ALL
            .iter()
            .map(|s| (*s, ImageDims { width: 100, height: 100 }))
            .collect()
    }

    fn signing() -> SigningBlock {
        SigningBlock {
            signer_name: "Jane Doe".into(),
            institution: "CV Builder".into(),
            signed_at: Utc.with_ymd_and_hms(2025, 1, 15, 9, 30, 0).unwrap(),
        }
    }

    fn free_text(lines: usize) -> StructuredContent {
        StructuredContent {
            free_text: (1..=lines).map(|i| format!("Line {i}")).collect(),
            ..Default::default()
        }
    }

    fn footers(pages: &[RenderPage]) -> Vec<Vec<String>> {
        pages
            .iter()
            .map(|p| {
                p.texts()
                    .filter(|t| t.starts_with("Page "))
                    .map(String::from)
                    .collect()
            })
            .collect()
    }

    fn scenario_content() -> StructuredContent {
        StructuredContent {
            personal: PersonalInfo {
                full_name: "Jane Doe".into(),
                ..Default::default()
            },
            experience: vec![ExperienceEntry {
                company: "Acme".into(),
                position: "Engineer".into(),
                duration: "2020-2022".into(),
                description: format!("Built things. {}", "x".repeat(500)),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_content_yields_single_page_with_header_and_placeholder() {
        let content = StructuredContent::default();
        let images = ImageCatalog::new();
        let pages = layout_document(&input(&content, &images, None, None), &LayoutConfig::default()).unwrap();

        assert_eq!(pages.len(), 1);
        let texts: Vec<&str> = pages[0].texts().collect();
        assert!(texts.contains(&"Jane Doe"));
        assert!(texts.contains(&"JD"), "initials placeholder expected");
        assert!(texts.contains(&EMPTY_PLACEHOLDER));
        assert_eq!(footers(&pages), vec![vec!["Page 1 of 1".to_string()]]);
    }

    #[test]
    fn test_page_count_matches_capacity_formula() {
        let mut cfg = LayoutConfig::default();
        cfg.decorations.signature_block = false;
        let first = cfg.body_capacity(0, cfg.body_height);
        let rest = cfg.body_capacity(1, cfg.body_height);
        let images = ImageCatalog::new();

        for n in [1, first, first + 1, 100, 250] {
            let content = free_text(n);
            let pages = layout_document(&input(&content, &images, None, None), &cfg).unwrap();
            let expected = if n <= first {
                1
            } else {
                1 + (n - first).div_ceil(rest)
            };
            assert_eq!(pages.len(), expected, "{n} lines");
        }
    }

    #[test]
    fn test_every_page_has_exactly_one_final_footer() {
        let content = free_text(200);
        let images = all_images();
        let pages = layout_document(&input(&content, &images, None, None), &LayoutConfig::default()).unwrap();
        let n = pages.len();
        assert!(n > 1);
        for (i, f) in footers(&pages).into_iter().enumerate() {
            assert_eq!(f, vec![format!("Page {} of {}", i + 1, n)]);
        }
    }

    #[test]
    fn test_long_description_wraps_and_fits_one_a4_page() {
        let content = scenario_content();
        let images = ImageCatalog::new();
        let sign = signing();
        let pages = layout_document(
            &input(&content, &images, Some(&sign), None),
            &LayoutConfig::default(),
        )
        .unwrap();

        let wrapped = pages[0].texts().filter(|t| t.contains("xxxx")).count();
        assert!(wrapped > 1, "description should wrap, got {wrapped} lines");
        assert_eq!(pages.len(), 1);
        assert_eq!(footers(&pages), vec![vec!["Page 1 of 1".to_string()]]);
    }

    #[test]
    fn test_overflow_opens_second_page_with_final_total() {
        let cfg = LayoutConfig {
            page_height: 500.0,
            ..LayoutConfig::default()
        };
        let content = scenario_content();
        let images = all_images();
        let sign = signing();
        let pages = layout_document(&input(&content, &images, Some(&sign), None), &cfg).unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(
            footers(&pages),
            vec![
                vec!["Page 1 of 2".to_string()],
                vec!["Page 2 of 2".to_string()]
            ]
        );
        // Continuation header on page 2.
        assert!(pages[1].texts().any(|t| t == "Jane's CV"));
    }

    #[test]
    fn test_decorations_land_on_the_right_pages() {
        let content = free_text(150);
        let images = all_images();
        let sign = signing();
        let pages = layout_document(
            &input(&content, &images, Some(&sign), Some("Signed by Jane Doe on 2025-01-15")),
            &LayoutConfig::default(),
        )
        .unwrap();
        let last = pages.len() - 1;

        for (i, page) in pages.iter().enumerate() {
            let slots: Vec<ImageSlot> = page.images().collect();
            assert_eq!(slots.contains(&ImageSlot::Barcode), i == 0, "barcode on page {i}");
            assert_eq!(slots.contains(&ImageSlot::Qr), i == last, "qr on page {i}");
            assert_eq!(slots.contains(&ImageSlot::Signature), i == last);
            assert_eq!(slots.contains(&ImageSlot::Profile), i == 0);

            match &page.ops[0] {
                DrawOp::Text { content, rotation_deg, .. } => {
                    assert_eq!(content, "Signed by Jane Doe on 2025-01-15");
                    assert_eq!(*rotation_deg, 45.0);
                }
                other => panic!("watermark should be drawn first, got {other:?}"),
            }
        }
        let last_texts: Vec<&str> = pages[last].texts().collect();
        assert!(last_texts.contains(&"Signed by: Jane Doe"));
        assert!(last_texts.contains(&"Institution: CV Builder"));
        assert!(last_texts.contains(&"Jane Doe | 2025-01-15"));
    }

    #[test]
    fn test_body_never_enters_signature_band_on_last_page() {
        let cfg = LayoutConfig::default();
        let band_top = cfg.body_bottom() + cfg.signature_band_height;
        let images = ImageCatalog::new();
        let sign = signing();
        for n in [10, 35, 40, 60] {
            let content = free_text(n);
            let pages = layout_document(&input(&content, &images, Some(&sign), None), &cfg).unwrap();
            let last = pages.last().unwrap();
            for op in &last.ops {
                if let DrawOp::Text { content, y, .. } = op {
                    if content.starts_with("Line ") {
                        assert!(*y >= band_top, "{content} at {y} overlaps signature band");
                    }
                }
            }
        }
    }

    #[test]
    fn test_pathological_token_terminates() {
        let content = StructuredContent {
            free_text: vec!["y".repeat(20_000)],
            ..Default::default()
        };
        let images = ImageCatalog::new();
        let pages = layout_document(&input(&content, &images, None, None), &LayoutConfig::default()).unwrap();
        assert!(pages.len() >= 2);
        for page in &pages {
            for t in page.texts() {
                assert!(t.chars().count() <= 120);
            }
        }
    }

    #[test]
    fn test_disabled_decorations_are_not_drawn() {
        let cfg = LayoutConfig {
            decorations: Decorations {
                signature_block: false,
                footer_barcode: false,
                watermark: false,
                continuation_header: false,
            },
            ..LayoutConfig::default()
        };
        let content = free_text(5);
        let images = all_images();
        let sign = signing();
        let pages = layout_document(&input(&content, &images, Some(&sign), Some("wm")), &cfg).unwrap();
        let slots: Vec<ImageSlot> = pages[0].images().collect();
        assert_eq!(slots, vec![ImageSlot::Profile]);
        assert!(!pages[0].texts().any(|t| t == "wm" || t.starts_with("Signed by")));
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let cfg = LayoutConfig {
            page_height: 200.0,
            ..LayoutConfig::default()
        };
        let content = StructuredContent::default();
        let images = ImageCatalog::new();
        assert!(layout_document(&input(&content, &images, None, None), &cfg).is_err());
    }
}
