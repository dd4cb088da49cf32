//! Decoding of raster assets into flattened RGB buffers ready for embedding.

use std::collections::BTreeMap;

use image::RgbaImage;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::warn;

use crate::layout::{ImageCatalog, ImageDims, ImageSlot};
use crate::render::{deflate, RenderError};

/// Encoded image bytes (PNG/JPEG) per slot, as supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct ImageAssets {
    pub profile: Option<Vec<u8>>,
    pub signature: Option<Vec<u8>>,
    pub barcode: Option<Vec<u8>>,
    pub qr: Option<Vec<u8>>,
}

impl ImageAssets {
    fn take(&mut self, slot: ImageSlot) -> Option<Vec<u8>> {
        match slot {
            ImageSlot::Profile => self.profile.take(),
            ImageSlot::Signature => self.signature.take(),
            ImageSlot::Barcode => self.barcode.take(),
            ImageSlot::Qr => self.qr.take(),
        }
    }
}

/// 8-bit RGB pixels with any transparency composited onto white.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl DecodedImage {
    pub fn decode(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        Ok(Self::flatten(&rgba))
    }

    fn flatten(rgba: &RgbaImage) -> Self {
        let mut rgb = Vec::with_capacity(rgba.width() as usize * rgba.height() as usize * 3);
        for px in rgba.pixels() {
            let [r, g, b, a] = px.0;
            let a = a as u32;
            for c in [r, g, b] {
                rgb.push(((c as u32 * a + 255 * (255 - a)) / 255) as u8);
            }
        }
        Self {
            width: rgba.width(),
            height: rgba.height(),
            rgb,
        }
    }

    pub fn dims(&self) -> ImageDims {
        ImageDims {
            width: self.width,
            height: self.height,
        }
    }
}

/// Decoded images keyed by slot.
#[derive(Debug, Clone, Default)]
pub struct PreparedImages {
    images: BTreeMap<ImageSlot, DecodedImage>,
}

impl PreparedImages {
    /// Decodes every supplied asset. Profile and signature images are decorative:
    /// a bad one is logged and dropped. A bad QR or barcode image is an error.
    pub fn prepare(mut assets: ImageAssets) -> Result<Self, RenderError> {
        let mut images = BTreeMap::new();
        for slot in ImageSlot::ALL {
            let Some(bytes) = assets.take(slot) else {
                continue;
            };
            match DecodedImage::decode(&bytes) {
                Ok(img) => {
                    images.insert(slot, img);
                }
                Err(e) if is_decorative(slot) => {
                    warn!(?slot, error = %e, "Skipping undecodable image");
                }
                Err(e) => {
                    return Err(RenderError::Image {
                        slot,
                        message: e.to_string(),
                    })
                }
            }
        }
        Ok(Self { images })
    }

    pub fn get(&self, slot: ImageSlot) -> Option<&DecodedImage> {
        self.images.get(&slot)
    }

    /// Slots and sizes for the layout engine.
    pub fn catalog(&self) -> ImageCatalog {
        self.images.iter().map(|(s, img)| (*s, img.dims())).collect()
    }
}

fn is_decorative(slot: ImageSlot) -> bool {
    matches!(slot, ImageSlot::Profile | ImageSlot::Signature)
}

/// Adds one Image XObject to the document.
pub(crate) fn write_image(doc: &mut Document, img: &DecodedImage) -> Result<ObjectId, RenderError> {
    let dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(img.width as i64)),
        ("Height", Object::Integer(img.height as i64)),
        ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
        ("Filter", Object::Name(b"FlateDecode".to_vec())),
    ]);
    Ok(doc.add_object(Stream::new(dict, deflate(&img.rgb)?)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgba};
    use std::io::Cursor;

    pub(crate) fn png(width: u32, height: u32, color: Rgba<u8>) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, color);
        let mut buf = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_transparent_pixels_flatten_to_white() {
        let img = DecodedImage::decode(&png(2, 2, Rgba([0, 0, 0, 0]))).unwrap();
        assert_eq!(img.rgb, vec![255; 12]);
    }

    #[test]
    fn test_opaque_pixels_keep_color() {
        let img = DecodedImage::decode(&png(1, 1, Rgba([10, 20, 30, 255]))).unwrap();
        assert_eq!(img.rgb, vec![10, 20, 30]);
        assert_eq!(img.dims(), ImageDims { width: 1, height: 1 });
    }

    #[test]
    fn test_bad_profile_is_skipped() {
        let prepared = PreparedImages::prepare(ImageAssets {
            profile: Some(b"not an image".to_vec()),
            qr: Some(png(4, 4, Rgba([0, 0, 0, 255]))),
            ..Default::default()
        })
        .unwrap();
        assert!(prepared.get(ImageSlot::Profile).is_none());
        let catalog = prepared.catalog();
        assert_eq!(catalog.keys().copied().collect::<Vec<_>>(), vec![ImageSlot::Qr]);
    }

    #[test]
    fn test_bad_barcode_is_an_error() {
        let err = PreparedImages::prepare(ImageAssets {
            barcode: Some(b"garbage".to_vec()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(
            err,
            RenderError::Image {
                slot: ImageSlot::Barcode,
                ..
            }
        ));
    }
}
