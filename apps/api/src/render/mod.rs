//! PDF assembly: positioned draw ops -> document bytes.
//!
//! Built on the `lopdf` object model. Content and image streams are Flate-compressed
//! here; `Document::compress` is never called, so nothing is compressed twice.
//! Images are embedded once per slot and shared by every page that draws them.

pub mod fonts;
pub mod images;
pub mod winansi;

use std::collections::BTreeMap;
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use thiserror::Error;
use tracing::debug;

use crate::layout::{Color, DrawOp, ImageSlot, RenderPage};

pub use fonts::{load_font, FontChoice};
pub use images::{ImageAssets, PreparedImages};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image {slot:?} could not be decoded: {message}")]
    Image { slot: ImageSlot, message: String },

    #[error("page draws image {0:?} but none was supplied")]
    MissingImage(ImageSlot),

    #[error("no pages to assemble")]
    NoPages,
}

/// Document information dictionary entries.
#[derive(Debug, Clone, Default)]
pub struct PdfMetadata {
    pub title: String,
    pub author: String,
}

const PRODUCER: &str = concat!("cvsign-api ", env!("CARGO_PKG_VERSION"));

/// Writes `pages` in order into a single PDF.
pub fn assemble(
    pages: &[RenderPage],
    font: &FontChoice,
    images: &PreparedImages,
    metadata: &PdfMetadata,
) -> Result<Vec<u8>, RenderError> {
    if pages.is_empty() {
        return Err(RenderError::NoPages);
    }

    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_resources = fonts::write_fonts(&mut doc, font)?;
    let mut embedded: BTreeMap<ImageSlot, ObjectId> = BTreeMap::new();
    let mut kids = Vec::with_capacity(pages.len());

    for page in pages {
        let mut xobjects = Dictionary::new();
        for slot in page.images() {
            let id = match embedded.get(&slot) {
                Some(id) => *id,
                None => {
                    let img = images.get(slot).ok_or(RenderError::MissingImage(slot))?;
                    let id = images::write_image(&mut doc, img)?;
                    embedded.insert(slot, id);
                    id
                }
            };
            xobjects.set(slot.resource_name(), Object::Reference(id));
        }

        let mut content_dict = Dictionary::new();
        content_dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
        let content_id = doc.add_object(Stream::new(content_dict, deflate(&content_stream(page)?)?));

        let mut resources = Dictionary::new();
        resources.set("Font", Object::Dictionary(font_resources.clone()));
        if !xobjects.is_empty() {
            resources.set("XObject", Object::Dictionary(xobjects));
        }

        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(page.width),
                    Object::Real(page.height),
                ]),
            ),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Dictionary(resources)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
        ])),
    );
    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", catalog_id);

    let info_id = doc.add_object(Dictionary::from_iter(vec![
        ("Title", text_string(&metadata.title)),
        ("Author", text_string(&metadata.author)),
        ("Producer", text_string(PRODUCER)),
    ]));
    doc.trailer.set("Info", info_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    debug!(
        pages = count,
        images = embedded.len(),
        bytes = bytes.len(),
        embedded_font = font.is_embedded(),
        "PDF assembled"
    );
    Ok(bytes)
}

pub(crate) fn deflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

fn text_string(s: &str) -> Object {
    Object::String(winansi::encode(s), StringFormat::Literal)
}

// ────────────────────────────────────────────────────────────────────────────
// Content stream
// ────────────────────────────────────────────────────────────────────────────

fn content_stream(page: &RenderPage) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    for op in &page.ops {
        match op {
            DrawOp::Text {
                content,
                x,
                y,
                font_size,
                color,
                bold,
                rotation_deg,
            } => {
                let (sin, cos) = rotation_deg.to_radians().sin_cos();
                write!(
                    out,
                    "BT /{} {} Tf {} rg {} {} {} {} {} {} Tm ",
                    fonts::resource_name(*bold),
                    num(*font_size),
                    rgb(*color),
                    num(cos),
                    num(sin),
                    num(-sin),
                    num(cos),
                    num(*x),
                    num(*y),
                )?;
                out.push(b'(');
                out.extend(escape_literal(&winansi::encode(content)));
                out.extend_from_slice(b") Tj ET\n");
            }
            DrawOp::Image {
                slot,
                x,
                y,
                width,
                height,
            } => {
                writeln!(
                    out,
                    "q {} 0 0 {} {} {} cm /{} Do Q",
                    num(*width),
                    num(*height),
                    num(*x),
                    num(*y),
                    slot.resource_name()
                )?;
            }
            DrawOp::Rect {
                x,
                y,
                width,
                height,
                color,
            } => {
                writeln!(
                    out,
                    "q {} rg {} {} {} {} re f Q",
                    rgb(*color),
                    num(*x),
                    num(*y),
                    num(*width),
                    num(*height)
                )?;
            }
        }
    }
    Ok(out)
}

/// Fixed three-decimal precision, trimmed.
fn num(v: f32) -> String {
    let s = format!("{:.3}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "" | "-0" => "0".to_string(),
        s => s.to_string(),
    }
}

fn rgb(c: Color) -> String {
    format!("{} {} {}", num(c.r), num(c.g), num(c.b))
}

fn escape_literal(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    for &b in bytes {
        if matches!(b, b'(' | b')' | b'\\') {
            out.push(b'\\');
        }
        out.push(b);
    }
    out
}
