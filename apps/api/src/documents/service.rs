//! Résumé orchestration: ownership, versioning, signing, PDF generation and
//! verification on top of the store traits.
//!
//! Layout, raster encoding and assembly are synchronous and CPU-bound; `generate_pdf`
//! runs them through `tokio::task::spawn_blocking` with owned inputs.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::content::normalize_content;
use crate::errors::AppError;
use crate::layout::{layout_document, LayoutConfig, LayoutInput, SigningBlock};
use crate::models::{DocumentStatus, ResumeDocument, SecurityState, VersionHistoryRow};
use crate::render::{assemble, FontChoice, ImageAssets, PdfMetadata, PreparedImages};
use crate::security::SecurityArtifacts;
use crate::store::{BlobStore, DocumentStore, Identity, IdentityProvider};
use crate::verification::{self, VerificationReport};

pub const DEFAULT_LIST_LIMIT: i64 = 20;
pub const MAX_LIST_LIMIT: i64 = 100;
const UNNAMED_SIGNER: &str = "Unnamed signer";

/// Rendering settings fixed at startup.
pub struct PdfSettings {
    pub layout: LayoutConfig,
    pub font: FontChoice,
    /// Signature-block institution for signers without their own.
    pub institution: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedPdf {
    pub document_id: Uuid,
    pub version: i32,
    pub storage_path: String,
    pub page_count: usize,
    pub byte_len: usize,
    /// False when the document had no artifacts for this version and the PDF
    /// carries throwaway ones.
    pub artifacts_persisted: bool,
}

pub struct ResumeService {
    docs: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    identity: Arc<dyn IdentityProvider>,
    settings: Arc<PdfSettings>,
}

impl ResumeService {
    pub fn new(
        docs: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        identity: Arc<dyn IdentityProvider>,
        settings: PdfSettings,
    ) -> Self {
        Self {
            docs,
            blobs,
            identity,
            settings: Arc::new(settings),
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Documents
    // ────────────────────────────────────────────────────────────────────────

    pub async fn create(&self, owner_id: Uuid, title: &str) -> Result<ResumeDocument, AppError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("title must not be empty".to_string()));
        }
        let doc = ResumeDocument::new(owner_id, title, Utc::now());
        self.docs.insert(&doc).await?;
        Ok(doc)
    }

    pub async fn get(&self, id: Uuid) -> Result<ResumeDocument, AppError> {
        Ok(self.docs.load(id).await?)
    }

    pub async fn list_recent(&self, limit: Option<i64>) -> Result<Vec<ResumeDocument>, AppError> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        Ok(self.docs.list_recent(limit).await?)
    }

    /// Replaces the content, preserving the prior (content, version) in history.
    pub async fn update_content(
        &self,
        id: Uuid,
        user_id: Uuid,
        content: Value,
        expected_version: i32,
        title: Option<String>,
    ) -> Result<ResumeDocument, AppError> {
        let current = self.docs.load(id).await?;
        ensure_owner(&current, user_id)?;
        if current.version != expected_version {
            return Err(AppError::Conflict(format!(
                "expected version {expected_version} but resume {id} is at version {}",
                current.version
            )));
        }

        self.docs
            .append_version_history(id, &current.content, current.version)
            .await?;

        let mut updated = current;
        updated.content = content;
        if let Some(title) = title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
            updated.title = title;
        }
        updated.version = expected_version + 1;
        updated.updated_at = Utc::now();
        updated.revision = self.docs.save(&updated).await?;

        info!("Resume {id} updated to v{}", updated.version);
        Ok(updated)
    }

    pub async fn history(&self, id: Uuid) -> Result<Vec<VersionHistoryRow>, AppError> {
        self.docs.load(id).await?;
        Ok(self.docs.version_history(id).await?)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Signing
    // ────────────────────────────────────────────────────────────────────────

    /// Attaches artifacts for the current version. Artifacts already generated for
    /// this version are kept as they are, including a `verified` status. Two signs
    /// racing on the same snapshot cannot both win: the later save conflicts.
    pub async fn sign(&self, id: Uuid, user_id: Uuid) -> Result<ResumeDocument, AppError> {
        let mut doc = self.docs.load(id).await?;
        ensure_owner(&doc, user_id)?;

        if doc.current_artifacts().is_some() {
            info!("Resume {id} already signed for v{}; reusing artifacts", doc.version);
            return Ok(doc);
        }

        let signer = self.identity.resolve(user_id).await?;
        let signer_name = display_name_for(&signer, &doc);
        let now = Utc::now();
        let artifacts = SecurityArtifacts::generate(
            doc.id,
            doc.owner_id,
            doc.version,
            user_id,
            &signer_name,
            now,
        );
        doc.security = Some(SecurityState {
            artifacts,
            signed_version: doc.version,
            signed_by: user_id,
            signed_by_owner: user_id == doc.owner_id,
            signed_at: now,
            status: DocumentStatus::Signed,
            verified_at: None,
        });
        doc.updated_at = now;
        doc.revision = self.docs.save(&doc).await?;

        info!("Resume {id} signed at v{}", doc.version);
        Ok(doc)
    }

    // ────────────────────────────────────────────────────────────────────────
    // PDF
    // ────────────────────────────────────────────────────────────────────────

    /// Renders the current version, stores the bytes and records the path.
    /// Nothing is written unless assembly succeeded.
    pub async fn generate_pdf(&self, id: Uuid, user_id: Uuid) -> Result<GeneratedPdf, AppError> {
        let mut doc = self.docs.load(id).await?;
        ensure_owner(&doc, user_id)?;
        let identity = self.identity.resolve(doc.owner_id).await?;
        let owner_name = display_name_for(&identity, &doc);
        let now = Utc::now();

        let (artifacts, signed_at, persisted) = match (doc.current_artifacts(), &doc.security) {
            (Some(a), Some(state)) => (a.clone(), state.signed_at, true),
            _ => {
                info!(
                    "Resume {id} has no artifacts for v{}; using ephemeral artifacts for this PDF",
                    doc.version
                );
                let a = SecurityArtifacts::generate(
                    doc.id,
                    doc.owner_id,
                    doc.version,
                    doc.owner_id,
                    &owner_name,
                    now,
                );
                (a, now, false)
            }
        };

        let job = RenderJob {
            content: doc.content.clone(),
            title: doc.title.clone(),
            owner_name,
            institution: identity
                .institution
                .unwrap_or_else(|| self.settings.institution.clone()),
            artifacts,
            signed_at,
            profile_image: identity.profile_image,
            signature_image: identity.signature_image,
        };
        let settings = Arc::clone(&self.settings);
        let rendered = tokio::task::spawn_blocking(move || render_pdf(job, &settings))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("render task failed: {e}")))??;

        let byte_len = rendered.bytes.len();
        let path = self.blobs.write_pdf(doc.id, doc.version, rendered.bytes).await?;

        doc.pdf_path = Some(path.clone());
        doc.updated_at = Utc::now();
        if let Err(e) = self.docs.save(&doc).await {
            warn!("Resume {id} changed while its PDF was rendered; removing {path}: {e}");
            if let Err(cleanup) = self.blobs.delete_pdf(&path).await {
                warn!("Orphaned PDF {path} could not be removed: {cleanup}");
            }
            return Err(e.into());
        }

        info!(
            "Generated PDF for resume {id} v{}: {} pages, {byte_len} bytes",
            doc.version, rendered.page_count
        );
        Ok(GeneratedPdf {
            document_id: doc.id,
            version: doc.version,
            storage_path: path,
            page_count: rendered.page_count,
            byte_len,
            artifacts_persisted: persisted,
        })
    }

    pub async fn download_pdf(&self, id: Uuid) -> Result<Vec<u8>, AppError> {
        let doc = self.docs.load(id).await?;
        let path = doc
            .pdf_path
            .ok_or_else(|| AppError::NotFound(format!("Resume {id} has no generated PDF")))?;
        Ok(self.blobs.read_pdf(&path).await?)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Verification
    // ────────────────────────────────────────────────────────────────────────

    /// Checks stored artifacts against an optional presented QR payload. Only an
    /// authentic result is persisted (status `verified`, timestamp).
    pub async fn verify(&self, id: Uuid, presented_qr: Option<&str>) -> Result<VerificationReport, AppError> {
        let mut doc = self.docs.load(id).await?;
        let mut report = verification::evaluate(&doc, presented_qr);

        if !report.is_authentic {
            info!("Verification of resume {id} failed: {}", report.reasons.join("; "));
            return Ok(report);
        }

        let now = Utc::now();
        if verification::mark_verified(&mut doc, now) {
            self.docs.save(&doc).await?;
            report.status = doc.status();
            report.verified_at = Some(now);
            info!("Resume {id} verified");
        }
        Ok(report)
    }
}

/// Name printed on artifacts and the signature block: the user's full name, else
/// the name in the résumé content, else the account email.
fn display_name_for(identity: &Identity, doc: &ResumeDocument) -> String {
    let full_name = identity.display_name.trim();
    if !full_name.is_empty() {
        return full_name.to_string();
    }
    let from_content = normalize_content(&doc.content, "", &doc.title).display_name;
    if !from_content.is_empty() {
        return from_content;
    }
    match identity.email.trim() {
        "" => UNNAMED_SIGNER.to_string(),
        email => email.to_string(),
    }
}

fn ensure_owner(doc: &ResumeDocument, user_id: Uuid) -> Result<(), AppError> {
    if doc.owner_id == user_id {
        Ok(())
    } else {
        warn!("User {user_id} denied write access to resume {}", doc.id);
        Err(AppError::Forbidden)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Blocking render pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Everything one PDF render needs, owned so it can cross into `spawn_blocking`.
pub struct RenderJob {
    pub content: Value,
    pub title: String,
    pub owner_name: String,
    pub institution: String,
    pub artifacts: SecurityArtifacts,
    pub signed_at: DateTime<Utc>,
    pub profile_image: Option<Vec<u8>>,
    pub signature_image: Option<Vec<u8>>,
}

pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// normalize -> rasterize artifacts -> decode images -> layout -> assemble.
pub fn render_pdf(job: RenderJob, settings: &PdfSettings) -> Result<RenderedPdf, AppError> {
    let normalized = normalize_content(&job.content, &job.owner_name, &job.title);
    let codes = job.artifacts.render_images()?;
    let images = PreparedImages::prepare(ImageAssets {
        profile: job.profile_image,
        signature: job.signature_image,
        barcode: Some(codes.barcode_png),
        qr: Some(codes.qr_png),
    })?;
    let catalog = images.catalog();

    let signing = SigningBlock {
        signer_name: normalized.display_name.clone(),
        institution: job.institution,
        signed_at: job.signed_at,
    };
    let input = LayoutInput {
        content: &normalized.content,
        display_name: &normalized.display_name,
        title: &job.title,
        images: &catalog,
        watermark: Some(&job.artifacts.watermark_text),
        signing: Some(&signing),
    };
    let pages = layout_document(&input, &settings.layout)?;

    let metadata = PdfMetadata {
        title: job.title.clone(),
        author: normalized.display_name.clone(),
    };
    let bytes = assemble(&pages, &settings.font, &images, &metadata)?;
    Ok(RenderedPdf {
        bytes,
        page_count: pages.len(),
    })
}
