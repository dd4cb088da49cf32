use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    /// Overrides the configured signing institution when set.
    pub institution: Option<String>,
    /// Blob keys of uploaded images.
    pub profile_image_key: Option<String>,
    pub signature_image_key: Option<String>,
    pub created_at: DateTime<Utc>,
}
