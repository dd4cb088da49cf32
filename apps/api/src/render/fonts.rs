//! Font selection for the assembler: an embedded TrueType asset when one is configured
//! and parses, otherwise the built-in Helvetica pair.

use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use thiserror::Error;
use tracing::{info, warn};
use ttf_parser::Face;

use crate::layout::font_metrics::BaseFont;
use crate::render::{deflate, winansi};

const FIRST_CHAR: u8 = 32;
const LAST_CHAR: u8 = 255;
/// Nonsymbolic font flag (PDF font descriptor bit 6).
const FLAG_NONSYMBOLIC: i64 = 32;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to read font file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse font: {0}")]
    Parse(String),
}

/// A parsed TrueType face reduced to what a simple WinAnsi font dictionary needs.
#[derive(Debug, Clone)]
pub struct EmbeddedFont {
    pub postscript_name: String,
    data: Vec<u8>,
    /// Advance widths in 1/1000 em for codes FIRST_CHAR..=LAST_CHAR.
    widths: Vec<i64>,
    ascent: i64,
    descent: i64,
    cap_height: i64,
    bbox: [i64; 4],
}

#[derive(Debug, Clone)]
pub enum FontChoice {
    Builtin,
    TrueType(Box<EmbeddedFont>),
}

impl FontChoice {
    pub fn is_embedded(&self) -> bool {
        matches!(self, FontChoice::TrueType(_))
    }
}

/// Loads the configured font asset, falling back to built-in Helvetica on any failure.
pub fn load_font(path: Option<&Path>) -> FontChoice {
    let Some(path) = path else {
        return FontChoice::Builtin;
    };
    let loaded = std::fs::read(path)
        .map_err(FontError::from)
        .and_then(EmbeddedFont::parse);
    match loaded {
        Ok(font) => {
            info!(font = %font.postscript_name, path = %path.display(), "Using embedded TrueType font");
            FontChoice::TrueType(Box::new(font))
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Font asset unusable, falling back to Helvetica");
            FontChoice::Builtin
        }
    }
}

impl EmbeddedFont {
    pub fn parse(data: Vec<u8>) -> Result<Self, FontError> {
        let face = Face::parse(&data, 0).map_err(|e| FontError::Parse(e.to_string()))?;
        let upem = face.units_per_em().max(1) as i64;
        let scale = |v: i64| v * 1000 / upem;

        let missing_width = face
            .glyph_index(' ')
            .and_then(|g| face.glyph_hor_advance(g))
            .map(|w| scale(w as i64))
            .unwrap_or(500);
        let widths = (FIRST_CHAR..=LAST_CHAR)
            .map(|b| {
                winansi::decode_byte(b)
                    .and_then(|c| face.glyph_index(c))
                    .and_then(|g| face.glyph_hor_advance(g))
                    .map(|w| scale(w as i64))
                    .unwrap_or(missing_width)
            })
            .collect();

        let bb = face.global_bounding_box();
        let postscript_name = face
            .names()
            .into_iter()
            .find(|n| n.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
            .and_then(|n| n.to_string())
            .map(|n| n.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '-').collect::<String>())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "EmbeddedFont".to_string());

        Ok(EmbeddedFont {
            postscript_name,
            widths,
            ascent: scale(face.ascender() as i64),
            descent: scale(face.descender() as i64),
            cap_height: scale(face.capital_height().unwrap_or(face.ascender()) as i64),
            bbox: [
                scale(bb.x_min as i64),
                scale(bb.y_min as i64),
                scale(bb.x_max as i64),
                scale(bb.y_max as i64),
            ],
            data,
        })
    }
}

/// Font resource names used in content streams.
pub fn resource_name(bold: bool) -> &'static str {
    if bold {
        "F2"
    } else {
        "F1"
    }
}

/// Adds font objects to `doc` and returns the `/Font` resource dictionary.
/// An embedded face serves both the regular and bold resource names.
pub(crate) fn write_fonts(doc: &mut Document, font: &FontChoice) -> Result<Dictionary, std::io::Error> {
    let mut resources = Dictionary::new();
    match font {
        FontChoice::Builtin => {
            for bold in [false, true] {
                let id = doc.add_object(Dictionary::from_iter(vec![
                    ("Type", Object::Name(b"Font".to_vec())),
                    ("Subtype", Object::Name(b"Type1".to_vec())),
                    (
                        "BaseFont",
                        Object::Name(BaseFont::for_weight(bold).postscript_name().as_bytes().to_vec()),
                    ),
                    ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
                ]));
                resources.set(resource_name(bold), Object::Reference(id));
            }
        }
        FontChoice::TrueType(face) => {
            let id = write_truetype(doc, face)?;
            resources.set(resource_name(false), Object::Reference(id));
            resources.set(resource_name(true), Object::Reference(id));
        }
    }
    Ok(resources)
}

fn write_truetype(doc: &mut Document, font: &EmbeddedFont) -> Result<ObjectId, std::io::Error> {
    let mut file_dict = Dictionary::new();
    file_dict.set("Length1", Object::Integer(font.data.len() as i64));
    file_dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
    let file_id = doc.add_object(Stream::new(file_dict, deflate(&font.data)?));

    let name = font.postscript_name.as_bytes().to_vec();
    let descriptor_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"FontDescriptor".to_vec())),
        ("FontName", Object::Name(name.clone())),
        ("Flags", Object::Integer(FLAG_NONSYMBOLIC)),
        (
            "FontBBox",
            Object::Array(font.bbox.iter().map(|v| Object::Integer(*v)).collect()),
        ),
        ("ItalicAngle", Object::Integer(0)),
        ("Ascent", Object::Integer(font.ascent)),
        ("Descent", Object::Integer(font.descent)),
        ("CapHeight", Object::Integer(font.cap_height)),
        ("StemV", Object::Integer(80)),
        ("FontFile2", Object::Reference(file_id)),
    ]));

    Ok(doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"TrueType".to_vec())),
        ("BaseFont", Object::Name(name)),
        ("FirstChar", Object::Integer(FIRST_CHAR as i64)),
        ("LastChar", Object::Integer(LAST_CHAR as i64)),
        (
            "Widths",
            Object::Array(font.widths.iter().map(|w| Object::Integer(*w)).collect()),
        ),
        ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ("FontDescriptor", Object::Reference(descriptor_id)),
    ])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_no_path_means_builtin() {
        assert!(!load_font(None).is_embedded());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let choice = load_font(Some(Path::new("/nonexistent/fonts/Inter.ttf")));
        assert!(matches!(choice, FontChoice::Builtin));
    }

    #[test]
    fn test_corrupt_file_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"definitely not a truetype font").unwrap();
        let choice = load_font(Some(file.path()));
        assert!(matches!(choice, FontChoice::Builtin));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            EmbeddedFont::parse(vec![0u8; 64]),
            Err(FontError::Parse(_))
        ));
    }

    #[test]
    fn test_builtin_resources_register_both_weights() {
        let mut doc = Document::with_version("1.7");
        let resources = write_fonts(&mut doc, &FontChoice::Builtin).unwrap();
        assert!(resources.has(b"F1"));
        assert!(resources.has(b"F2"));
        assert_eq!(doc.objects.len(), 2);
    }
}
