use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{ResumeDocument, ResumeRow, User, VersionHistoryRow};
use crate::store::s3::S3BlobStore;
use crate::store::{DocumentStore, Identity, IdentityProvider, StoreError};

const RESUME_COLUMNS: &str =
    "id, owner_id, title, content, version, revision, pdf_path, security, created_at, updated_at";

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn current_revision(&self, id: Uuid) -> Result<Option<i64>, StoreError> {
        Ok(
            sqlx::query_scalar::<_, i64>("SELECT revision FROM resumes WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }
}

fn security_json(doc: &ResumeDocument) -> Result<Option<Value>, StoreError> {
    Ok(doc.security.as_ref().map(serde_json::to_value).transpose()?)
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn load(&self, id: Uuid) -> Result<ResumeDocument, StoreError> {
        let row: Option<ResumeRow> =
            sqlx::query_as(&format!("SELECT {RESUME_COLUMNS} FROM resumes WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        let row = row.ok_or(StoreError::NotFound(id))?;
        Ok(ResumeDocument::try_from(row)?)
    }

    async fn insert(&self, doc: &ResumeDocument) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO resumes
                (id, owner_id, title, content, version, revision, pdf_path, status, security, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(doc.id)
        .bind(doc.owner_id)
        .bind(&doc.title)
        .bind(&doc.content)
        .bind(doc.version)
        .bind(doc.revision)
        .bind(&doc.pdf_path)
        .bind(doc.status().as_str())
        .bind(security_json(doc)?)
        .bind(doc.created_at)
        .bind(doc.updated_at)
        .execute(&self.pool)
        .await?;

        info!("Inserted resume {} for owner {}", doc.id, doc.owner_id);
        Ok(())
    }

    async fn save(&self, doc: &ResumeDocument) -> Result<i64, StoreError> {
        // Compare-and-set on the revision column; `status` is denormalized for queries.
        let next = doc.revision + 1;
        let result = sqlx::query(
            r#"
            UPDATE resumes
            SET title = $2, content = $3, version = $4, pdf_path = $5,
                status = $6, security = $7, updated_at = $8, revision = $9
            WHERE id = $1 AND revision = $10
            "#,
        )
        .bind(doc.id)
        .bind(&doc.title)
        .bind(&doc.content)
        .bind(doc.version)
        .bind(&doc.pdf_path)
        .bind(doc.status().as_str())
        .bind(security_json(doc)?)
        .bind(doc.updated_at)
        .bind(next)
        .bind(doc.revision)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(next);
        }
        match self.current_revision(doc.id).await? {
            None => Err(StoreError::NotFound(doc.id)),
            Some(found) => {
                warn!(
                    "Stale write on resume {}: loaded revision {}, stored revision {found}",
                    doc.id, doc.revision
                );
                Err(StoreError::Conflict {
                    id: doc.id,
                    expected: doc.revision,
                    found,
                })
            }
        }
    }

    async fn append_version_history(
        &self,
        id: Uuid,
        content: &Value,
        version: i32,
    ) -> Result<(), StoreError> {
        // Append-only; a retried update re-records the same version as a no-op.
        sqlx::query(
            r#"
            INSERT INTO resume_versions (resume_id, version, content)
            VALUES ($1, $2, $3)
            ON CONFLICT (resume_id, version) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(version)
        .bind(content)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn version_history(&self, id: Uuid) -> Result<Vec<VersionHistoryRow>, StoreError> {
        Ok(sqlx::query_as::<_, VersionHistoryRow>(
            "SELECT resume_id, version, content, recorded_at FROM resume_versions WHERE resume_id = $1 ORDER BY version ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<ResumeDocument>, StoreError> {
        let rows: Vec<ResumeRow> = sqlx::query_as(&format!(
            "SELECT {RESUME_COLUMNS} FROM resumes ORDER BY updated_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|r| ResumeDocument::try_from(r).map_err(StoreError::from))
            .collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Identity
// ────────────────────────────────────────────────────────────────────────────

/// Reads users from Postgres and their uploaded images from the blob bucket.
pub struct PgIdentityProvider {
    pool: PgPool,
    blobs: Arc<S3BlobStore>,
}

impl PgIdentityProvider {
    pub fn new(pool: PgPool, blobs: Arc<S3BlobStore>) -> Self {
        Self { pool, blobs }
    }

    async fn fetch_image(&self, key: Option<&str>, user_id: Uuid) -> Option<Vec<u8>> {
        let key = key?;
        match self.blobs.read_object(key).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Image {key} for user {user_id} unavailable: {e}");
                None
            }
        }
    }
}

#[async_trait]
impl IdentityProvider for PgIdentityProvider {
    async fn resolve(&self, user_id: Uuid) -> Result<Identity, StoreError> {
        let user: Option<User> = sqlx::query_as(
            "SELECT id, email, full_name, institution, profile_image_key, signature_image_key, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(user) = user else {
            warn!("No user row for {user_id}; rendering without identity assets");
            return Ok(Identity::default());
        };

        Ok(Identity {
            profile_image: self
                .fetch_image(user.profile_image_key.as_deref(), user_id)
                .await,
            signature_image: self
                .fetch_image(user.signature_image_key.as_deref(), user_id)
                .await,
            display_name: user.full_name,
            email: user.email,
            institution: user.institution,
        })
    }
}
