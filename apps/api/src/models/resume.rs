use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::security::SecurityArtifacts;

/// Signing lifecycle. Moves draft -> signed -> verified and never back on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Draft,
    Signed,
    Verified,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Signed => "signed",
            DocumentStatus::Verified => "verified",
        }
    }
}

/// Artifacts and signing metadata attached by the sign action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityState {
    pub artifacts: SecurityArtifacts,
    /// Document version the artifacts were generated for.
    pub signed_version: i32,
    pub signed_by: Uuid,
    pub signed_by_owner: bool,
    pub signed_at: DateTime<Utc>,
    pub status: DocumentStatus,
    pub verified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeDocument {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    /// Stored as the client sent it; normalized only when rendering.
    pub content: Value,
    pub version: i32,
    /// Write counter bumped by every save, including sign and PDF-path writes that
    /// leave `version` alone. Saves compare-and-set on it.
    #[serde(default)]
    pub revision: i64,
    pub pdf_path: Option<String>,
    pub security: Option<SecurityState>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ResumeDocument {
    /// Fresh empty draft at version 1.
    pub fn new(owner_id: Uuid, title: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            title: title.into(),
            content: Value::Object(Default::default()),
            version: 1,
            revision: 0,
            pdf_path: None,
            security: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> DocumentStatus {
        self.security
            .as_ref()
            .map(|s| s.status)
            .unwrap_or(DocumentStatus::Draft)
    }

    /// Stored artifacts, but only when they were generated for the current version.
    pub fn current_artifacts(&self) -> Option<&SecurityArtifacts> {
        self.security
            .as_ref()
            .filter(|s| s.signed_version == self.version)
            .map(|s| &s.artifacts)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rows
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub content: Value,
    pub version: i32,
    pub revision: i64,
    pub pdf_path: Option<String>,
    pub security: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ResumeRow> for ResumeDocument {
    type Error = serde_json::Error;

    fn try_from(row: ResumeRow) -> Result<Self, Self::Error> {
        let security = row.security.map(serde_json::from_value).transpose()?;
        Ok(ResumeDocument {
            id: row.id,
            owner_id: row.owner_id,
            title: row.title,
            content: row.content,
            version: row.version,
            revision: row.revision,
            pdf_path: row.pdf_path,
            security,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// One immutable (content, version) pair preserved before a content change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct VersionHistoryRow {
    pub resume_id: Uuid,
    pub version: i32,
    pub content: Value,
    pub recorded_at: DateTime<Utc>,
}
