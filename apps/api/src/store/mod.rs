// Persistence seams: documents, PDF blobs and owner identity.
// Services receive these as trait objects so tests can swap in the in-memory versions.

#[cfg(test)]
pub mod memory;
pub mod postgres;
pub mod s3;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ResumeDocument, VersionHistoryRow};

pub use postgres::{PgDocumentStore, PgIdentityProvider};
pub use s3::S3BlobStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document {0} not found")]
    NotFound(Uuid),

    /// The stored revision moved on since the document was loaded.
    #[error("concurrent modification of {id}: loaded revision {expected}, stored revision {found}")]
    Conflict { id: Uuid, expected: i64, found: i64 },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("malformed stored document: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn load(&self, id: Uuid) -> Result<ResumeDocument, StoreError>;

    async fn insert(&self, doc: &ResumeDocument) -> Result<(), StoreError>;

    /// Writes `doc` only if the stored revision still equals `doc.revision`, and
    /// returns the new revision. On a mismatch fails with `StoreError::Conflict`
    /// and changes nothing.
    async fn save(&self, doc: &ResumeDocument) -> Result<i64, StoreError>;

    /// Records a prior (content, version) pair. Idempotent per (document, version).
    async fn append_version_history(
        &self,
        id: Uuid,
        content: &Value,
        version: i32,
    ) -> Result<(), StoreError>;

    /// History entries in ascending version order.
    async fn version_history(&self, id: Uuid) -> Result<Vec<VersionHistoryRow>, StoreError>;

    /// Most recently updated documents first.
    async fn list_recent(&self, limit: i64) -> Result<Vec<ResumeDocument>, StoreError>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores a generated PDF and returns its storage path.
    async fn write_pdf(&self, document_id: Uuid, version: i32, bytes: Vec<u8>) -> Result<String, BlobError>;

    async fn read_pdf(&self, path: &str) -> Result<Vec<u8>, BlobError>;

    /// Removes a PDF that was written but never recorded on its document.
    async fn delete_pdf(&self, path: &str) -> Result<(), BlobError>;
}

/// What the renderer needs to know about a document owner.
#[derive(Debug, Clone, Default)]
pub struct Identity {
    pub display_name: String,
    pub email: String,
    pub institution: Option<String>,
    pub profile_image: Option<Vec<u8>>,
    pub signature_image: Option<Vec<u8>>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves a user. Missing images are `None`, never an error.
    async fn resolve(&self, user_id: Uuid) -> Result<Identity, StoreError>;
}

/// Blob key for a generated PDF. The timestamp keeps regenerations of the same
/// version from overwriting each other.
pub fn pdf_key(document_id: Uuid, version: i32, at: DateTime<Utc>) -> String {
    format!("resumes/{document_id}/v{version}-{}.pdf", at.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_pdf_key_layout() {
        let id = Uuid::nil();
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(
            pdf_key(id, 3, at),
            "resumes/00000000-0000-0000-0000-000000000000/v3-1700000000123.pdf"
        );
    }
}
