use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::store::{pdf_key, BlobError, BlobStore};

/// S3 / MinIO bucket holding generated PDFs and uploaded user images.
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub async fn read_object(&self, key: &str) -> Result<Vec<u8>, BlobError> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_err = e.into_service_error();
                if service_err.is_no_such_key() {
                    BlobError::NotFound(key.to_string())
                } else {
                    BlobError::Backend(format!("S3 download failed: {service_err}"))
                }
            })?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| BlobError::Backend(format!("S3 body read failed: {e}")))?;
        Ok(data.into_bytes().to_vec())
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn write_pdf(&self, document_id: Uuid, version: i32, bytes: Vec<u8>) -> Result<String, BlobError> {
        let key = pdf_key(document_id, version, Utc::now());
        let len = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type("application/pdf")
            .send()
            .await
            .map_err(|e| BlobError::Backend(format!("S3 upload failed: {e}")))?;

        info!("Uploaded {len} byte PDF to s3://{}/{}", self.bucket, key);
        Ok(key)
    }

    async fn read_pdf(&self, path: &str) -> Result<Vec<u8>, BlobError> {
        self.read_object(path).await
    }

    async fn delete_pdf(&self, path: &str) -> Result<(), BlobError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| BlobError::Backend(format!("S3 delete failed: {e}")))?;

        info!("Deleted orphaned PDF s3://{}/{}", self.bucket, path);
        Ok(())
    }
}
