//! Authenticity checks against a document's stored artifacts.
//!
//! `evaluate` is pure. A mismatch is an ordinary outcome reported as data; only an
//! authentic result leads to a state change, applied by `mark_verified`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{DocumentStatus, ResumeDocument};
use crate::security::{BarcodeRef, QrClaim};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationChecks {
    pub has_qr_payload: bool,
    pub has_barcode_payload: bool,
    /// Artifacts were generated for the document's current version.
    pub artifacts_current: bool,
    /// `None` when no payload was presented.
    pub qr_matches: Option<bool>,
    /// Whether the presented payload parses with a valid checksum. `None` when
    /// nothing was presented.
    pub qr_well_formed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationReport {
    pub document_id: Uuid,
    pub is_authentic: bool,
    pub checks: VerificationChecks,
    /// Whether the stored barcode refers to the document's current version.
    pub barcode_current: bool,
    pub reasons: Vec<String>,
    pub status: DocumentStatus,
    pub verified_at: Option<DateTime<Utc>>,
}

/// Compares the stored artifacts with an optional presented QR payload.
///
/// Artifacts left over from an earlier version never verify: an edit after signing
/// needs a fresh sign first.
pub fn evaluate(doc: &ResumeDocument, presented_qr: Option<&str>) -> VerificationReport {
    let artifacts = doc.security.as_ref().map(|s| &s.artifacts);
    let stored_qr = artifacts.map(|a| a.qr_payload.as_str()).filter(|p| !p.is_empty());
    let stored_barcode = artifacts
        .map(|a| a.barcode_payload.as_str())
        .filter(|p| !p.is_empty());

    let claim = presented_qr.map(QrClaim::parse);
    let qr_matches = presented_qr.map(|p| stored_qr == Some(p));
    let checks = VerificationChecks {
        has_qr_payload: stored_qr.is_some(),
        has_barcode_payload: stored_barcode.is_some(),
        artifacts_current: doc.current_artifacts().is_some(),
        qr_matches,
        qr_well_formed: claim.as_ref().map(|c| c.is_ok()),
    };
    let is_authentic = checks.has_qr_payload
        && checks.has_barcode_payload
        && checks.artifacts_current
        && qr_matches.unwrap_or(true);

    let barcode_current = stored_barcode
        .and_then(|p| BarcodeRef::parse(p).ok())
        .map(|r| r.document_id == doc.id && r.version == doc.version)
        .unwrap_or(false);

    let mut reasons = Vec::new();
    if !checks.has_qr_payload {
        reasons.push("document has no stored QR payload".to_string());
    }
    if !checks.has_barcode_payload {
        reasons.push("document has no stored barcode payload".to_string());
    }
    if let Some(state) = doc.security.as_ref().filter(|_| !checks.artifacts_current) {
        reasons.push(format!(
            "artifacts were issued for version {} but the document is at version {}",
            state.signed_version, doc.version
        ));
    }
    match &claim {
        Some(Err(e)) => reasons.push(format!("presented QR payload is malformed: {e}")),
        Some(Ok(c)) if c.document_id != doc.id => {
            reasons.push(format!("presented QR payload names document {}", c.document_id))
        }
        _ => {}
    }
    if qr_matches == Some(false) {
        reasons.push("presented QR payload does not match the stored payload".to_string());
    }
    if checks.has_barcode_payload && !barcode_current {
        reasons.push("stored barcode does not reference the current version".to_string());
    }

    VerificationReport {
        document_id: doc.id,
        is_authentic,
        checks,
        barcode_current,
        reasons,
        status: doc.status(),
        verified_at: doc.security.as_ref().and_then(|s| s.verified_at),
    }
}

/// Moves a document with current artifacts to `verified` and stamps the time.
/// Returns false (and leaves the document untouched) when there is nothing current
/// to verify.
pub fn mark_verified(doc: &mut ResumeDocument, now: DateTime<Utc>) -> bool {
    let version = doc.version;
    match doc.security.as_mut().filter(|s| s.signed_version == version) {
        Some(state) => {
            state.status = DocumentStatus::Verified;
            state.verified_at = Some(now);
            doc.updated_at = now;
            true
        }
        None => false,
    }
}
