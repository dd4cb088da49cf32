//! In-memory stores for service tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::models::{ResumeDocument, VersionHistoryRow};
use crate::store::{
    pdf_key, BlobError, BlobStore, DocumentStore, Identity, IdentityProvider, StoreError,
};

#[derive(Default)]
pub struct MemoryDocumentStore {
    docs: Mutex<HashMap<Uuid, ResumeDocument>>,
    history: Mutex<Vec<VersionHistoryRow>>,
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn load(&self, id: Uuid) -> Result<ResumeDocument, StoreError> {
        self.docs
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn insert(&self, doc: &ResumeDocument) -> Result<(), StoreError> {
        self.docs.lock().await.insert(doc.id, doc.clone());
        Ok(())
    }

    async fn save(&self, doc: &ResumeDocument) -> Result<i64, StoreError> {
        let mut docs = self.docs.lock().await;
        let stored = docs.get_mut(&doc.id).ok_or(StoreError::NotFound(doc.id))?;
        if stored.revision != doc.revision {
            return Err(StoreError::Conflict {
                id: doc.id,
                expected: doc.revision,
                found: stored.revision,
            });
        }
        *stored = doc.clone();
        stored.revision += 1;
        Ok(stored.revision)
    }

    async fn append_version_history(
        &self,
        id: Uuid,
        content: &Value,
        version: i32,
    ) -> Result<(), StoreError> {
        let mut history = self.history.lock().await;
        if !history.iter().any(|h| h.resume_id == id && h.version == version) {
            history.push(VersionHistoryRow {
                resume_id: id,
                version,
                content: content.clone(),
                recorded_at: Utc::now(),
            });
        }
        Ok(())
    }

    async fn version_history(&self, id: Uuid) -> Result<Vec<VersionHistoryRow>, StoreError> {
        let mut rows: Vec<_> = self
            .history
            .lock()
            .await
            .iter()
            .filter(|h| h.resume_id == id)
            .cloned()
            .collect();
        rows.sort_by_key(|h| h.version);
        Ok(rows)
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<ResumeDocument>, StoreError> {
        let mut docs: Vec<_> = self.docs.lock().await.values().cloned().collect();
        docs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        docs.truncate(limit.max(0) as usize);
        Ok(docs)
    }
}

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub async fn len(&self) -> usize {
        self.blobs.lock().await.len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn write_pdf(&self, document_id: Uuid, version: i32, bytes: Vec<u8>) -> Result<String, BlobError> {
        let key = pdf_key(document_id, version, Utc::now());
        self.blobs.lock().await.insert(key.clone(), bytes);
        Ok(key)
    }

    async fn read_pdf(&self, path: &str) -> Result<Vec<u8>, BlobError> {
        self.blobs
            .lock()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| BlobError::NotFound(path.to_string()))
    }

    async fn delete_pdf(&self, path: &str) -> Result<(), BlobError> {
        self.blobs
            .lock()
            .await
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| BlobError::NotFound(path.to_string()))
    }
}

/// Returns the same identity for every user.
#[derive(Default)]
pub struct StaticIdentityProvider {
    pub identity: Identity,
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn resolve(&self, _user_id: Uuid) -> Result<Identity, StoreError> {
        Ok(self.identity.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_rejects_stale_revision() {
        let store = MemoryDocumentStore::default();
        let doc = ResumeDocument::new(Uuid::new_v4(), "CV", Utc::now());
        store.insert(&doc).await.unwrap();

        let mut first = doc.clone();
        first.pdf_path = Some("a.pdf".into());
        assert_eq!(store.save(&first).await.unwrap(), 1);

        // Same version, but loaded before the first write.
        let err = store.save(&doc).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { expected: 0, found: 1, .. }));
        assert_eq!(store.load(doc.id).await.unwrap().pdf_path.as_deref(), Some("a.pdf"));
    }

    #[tokio::test]
    async fn test_delete_pdf_removes_blob() {
        let blobs = MemoryBlobStore::default();
        let key = blobs.write_pdf(Uuid::new_v4(), 1, b"%PDF".to_vec()).await.unwrap();
        blobs.delete_pdf(&key).await.unwrap();
        assert_eq!(blobs.len().await, 0);
        assert!(matches!(blobs.read_pdf(&key).await, Err(BlobError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_history_is_idempotent_and_ordered() {
        let store = MemoryDocumentStore::default();
        let id = Uuid::new_v4();
        store.append_version_history(id, &serde_json::json!({"v": 2}), 2).await.unwrap();
        store.append_version_history(id, &serde_json::json!({"v": 1}), 1).await.unwrap();
        store.append_version_history(id, &serde_json::json!({"v": 1}), 1).await.unwrap();

        let versions: Vec<i32> = store.version_history(id).await.unwrap().iter().map(|h| h.version).collect();
        assert_eq!(versions, vec![1, 2]);
    }
}
