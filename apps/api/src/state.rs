use std::sync::Arc;

use crate::documents::ResumeService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Owns the document, blob and identity stores plus PDF settings.
    pub resumes: Arc<ResumeService>,
}
