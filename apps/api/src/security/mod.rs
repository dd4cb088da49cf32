//! Authenticity artifacts attached to a signed résumé: QR claim, barcode reference,
//! watermark text, and their raster images.
//!
//! Everything here is a pure function of its inputs, except the QR payload which also
//! folds in the signing time and a process-wide sequence. Persisting the result is the
//! caller's job (the sign action in `documents::service`).

pub mod payload;
pub mod raster;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use payload::{build_watermark_text, generate_barcode_payload};
use raster::{render_barcode_image, render_qr_image, BarcodeRasterOptions, QrRasterOptions};

pub use payload::{generate_qr_payload, BarcodeRef, QrClaim};

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("QR encoding failed: {0}")]
    Qr(String),

    #[error("barcode encoding failed: {0}")]
    Barcode(String),

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

/// The three payload strings stored on a signed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityArtifacts {
    pub qr_payload: String,
    pub barcode_payload: String,
    pub watermark_text: String,
}

impl SecurityArtifacts {
    /// Derives a fresh artifact set for one `(document, version)` signed by `signer_id`.
    pub fn generate(
        document_id: Uuid,
        owner_id: Uuid,
        version: i32,
        signer_id: Uuid,
        signer_name: &str,
        now: DateTime<Utc>,
    ) -> Self {
        SecurityArtifacts {
            qr_payload: generate_qr_payload(document_id, signer_id, now),
            barcode_payload: generate_barcode_payload(document_id, owner_id, version),
            watermark_text: build_watermark_text(signer_name, now.date_naive()),
        }
    }

    /// Renders the QR and barcode payloads to PNG bytes.
    pub fn render_images(&self) -> Result<ArtifactImages, ArtifactError> {
        Ok(ArtifactImages {
            qr_png: render_qr_image(&self.qr_payload, &QrRasterOptions::default())?,
            barcode_png: render_barcode_image(&self.barcode_payload, &BarcodeRasterOptions::default())?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactImages {
    pub qr_png: Vec<u8>,
    pub barcode_png: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_generate_ties_payloads_to_document() {
        let doc = Uuid::new_v4();
        let owner = Uuid::new_v4();
        let now = Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap();
        let a = SecurityArtifacts::generate(doc, owner, 2, owner, "Jane Doe", now);

        let claim = QrClaim::parse(&a.qr_payload).unwrap();
        assert_eq!(claim.document_id, doc);
        assert_eq!(claim.signer_id, owner);

        let r = BarcodeRef::parse(&a.barcode_payload).unwrap();
        assert_eq!((r.document_id, r.owner_id, r.version), (doc, owner, 2));

        assert_eq!(a.watermark_text, "Signed by Jane Doe on 2025-01-15");
    }

    #[test]
    fn test_render_images_produces_pngs() {
        let a = SecurityArtifacts::generate(
            Uuid::new_v4(),
            Uuid::new_v4(),
            1,
            Uuid::new_v4(),
            "X",
            Utc::now(),
        );
        let images = a.render_images().unwrap();
        assert!(image::load_from_memory(&images.qr_png).is_ok());
        assert!(image::load_from_memory(&images.barcode_png).is_ok());
    }
}
