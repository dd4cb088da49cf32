//! QR, barcode and watermark payloads.
//!
//! Both payloads are delimiter-separated and versioned by their prefix (`CVQR1`, `CV1`).
//! Older documents are verified by comparing stored strings, so a new shape needs a new
//! prefix rather than an in-place change.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

const QR_PREFIX: &str = "CVQR1";
const BARCODE_PREFIX: &str = "CV1";
const QR_SEP: char = ':';
const BARCODE_SEP: char = '-';
/// Hex characters of SHA-256 kept as the QR checksum.
const CHECK_LEN: usize = 8;

/// Process-wide sequence so two signs in the same millisecond still differ.
static QR_SEQUENCE: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Error, PartialEq)]
pub enum PayloadError {
    #[error("unknown payload prefix: {0}")]
    Prefix(String),

    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("invalid field '{field}': {value}")]
    Field { field: &'static str, value: String },

    #[error("checksum mismatch")]
    Checksum,
}

// ────────────────────────────────────────────────────────────────────────────
// QR payload
// ────────────────────────────────────────────────────────────────────────────

/// Decoded QR claim: who signed which document, and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrClaim {
    pub document_id: Uuid,
    pub signer_id: Uuid,
    pub signed_at: DateTime<Utc>,
    pub sequence: u64,
}

/// Generates a QR payload unique per call.
///
/// Format: `CVQR1:{document}:{signer}:{unix_millis}:{sequence}:{check}` where `check`
/// is the first 8 hex chars of SHA-256 over everything before it.
pub fn generate_qr_payload(document_id: Uuid, signer_id: Uuid, timestamp: DateTime<Utc>) -> String {
    let sequence = QR_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let body = format!(
        "{QR_PREFIX}{QR_SEP}{}{QR_SEP}{}{QR_SEP}{}{QR_SEP}{sequence}",
        document_id.simple(),
        signer_id.simple(),
        timestamp.timestamp_millis(),
    );
    let check = checksum(&body);
    format!("{body}{QR_SEP}{check}")
}

impl QrClaim {
    pub fn parse(payload: &str) -> Result<Self, PayloadError> {
        let fields: Vec<&str> = payload.split(QR_SEP).collect();
        if fields[0] != QR_PREFIX {
            return Err(PayloadError::Prefix(fields[0].to_string()));
        }
        if fields.len() != 6 {
            return Err(PayloadError::FieldCount {
                expected: 6,
                found: fields.len(),
            });
        }

        let (body, check) = payload
            .rsplit_once(QR_SEP)
            .ok_or(PayloadError::Checksum)?;
        if checksum(body) != check {
            return Err(PayloadError::Checksum);
        }

        let millis: i64 = parse_field("timestamp", fields[3])?;
        let signed_at = Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| PayloadError::Field {
                field: "timestamp",
                value: fields[3].to_string(),
            })?;

        Ok(QrClaim {
            document_id: parse_uuid("document_id", fields[1])?,
            signer_id: parse_uuid("signer_id", fields[2])?,
            signed_at,
            sequence: parse_field("sequence", fields[4])?,
        })
    }
}

fn checksum(body: &str) -> String {
    let digest = Sha256::digest(body.as_bytes());
    hex::encode(digest)[..CHECK_LEN].to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// Barcode payload
// ────────────────────────────────────────────────────────────────────────────

/// Decoded barcode reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarcodeRef {
    pub document_id: Uuid,
    pub owner_id: Uuid,
    pub version: i32,
}

/// Deterministic document reference: `CV1-{DOCUMENT}-{OWNER}-{version}`.
///
/// UUIDs are printed in upper-case simple form (no inner dashes), which keeps the
/// dash delimiter unambiguous and stays inside Code 128 set B.
pub fn generate_barcode_payload(document_id: Uuid, owner_id: Uuid, version: i32) -> String {
    format!(
        "{BARCODE_PREFIX}{BARCODE_SEP}{}{BARCODE_SEP}{}{BARCODE_SEP}{version}",
        document_id.simple().to_string().to_uppercase(),
        owner_id.simple().to_string().to_uppercase(),
    )
}

impl BarcodeRef {
    pub fn parse(payload: &str) -> Result<Self, PayloadError> {
        let fields: Vec<&str> = payload.split(BARCODE_SEP).collect();
        if fields[0] != BARCODE_PREFIX {
            return Err(PayloadError::Prefix(fields[0].to_string()));
        }
        if fields.len() != 4 {
            return Err(PayloadError::FieldCount {
                expected: 4,
                found: fields.len(),
            });
        }
        Ok(BarcodeRef {
            document_id: parse_uuid("document_id", fields[1])?,
            owner_id: parse_uuid("owner_id", fields[2])?,
            version: parse_field("version", fields[3])?,
        })
    }

    pub fn to_payload(&self) -> String {
        generate_barcode_payload(self.document_id, self.owner_id, self.version)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Watermark
// ────────────────────────────────────────────────────────────────────────────

pub fn build_watermark_text(signer_name: &str, sign_date: NaiveDate) -> String {
    format!("Signed by {} on {}", signer_name.trim(), sign_date.format("%Y-%m-%d"))
}

fn parse_uuid(field: &'static str, value: &str) -> Result<Uuid, PayloadError> {
    Uuid::parse_str(value).map_err(|_| PayloadError::Field {
        field,
        value: value.to_string(),
    })
}

fn parse_field<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, PayloadError> {
    value.parse::<T>().map_err(|_| PayloadError::Field {
        field,
        value: value.to_string(),
    })
}
