pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::documents::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Résumés
        .route(
            "/api/v1/resumes",
            post(handlers::handle_create).get(handlers::handle_list),
        )
        .route("/api/v1/resumes/:id", get(handlers::handle_get))
        .route(
            "/api/v1/resumes/:id/content",
            put(handlers::handle_update_content),
        )
        .route("/api/v1/resumes/:id/history", get(handlers::handle_history))
        // Signing, PDF and verification
        .route("/api/v1/resumes/:id/sign", post(handlers::handle_sign))
        .route(
            "/api/v1/resumes/:id/pdf",
            post(handlers::handle_generate_pdf).get(handlers::handle_download_pdf),
        )
        .route("/api/v1/resumes/:id/verify", post(handlers::handle_verify))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::documents::{PdfSettings, ResumeService};
    use crate::layout::LayoutConfig;
    use crate::render::FontChoice;
    use crate::store::memory::{MemoryBlobStore, MemoryDocumentStore, StaticIdentityProvider};

    fn app() -> Router {
        let service = ResumeService::new(
            Arc::new(MemoryDocumentStore::default()),
            Arc::new(MemoryBlobStore::default()),
            Arc::new(StaticIdentityProvider::default()),
            PdfSettings {
                layout: LayoutConfig::default(),
                font: FontChoice::Builtin,
                institution: "CV Builder".to_string(),
            },
        );
        build_router(AppState {
            resumes: Arc::new(service),
        })
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["service"], "cvsign-api");
    }

    #[tokio::test]
    async fn test_sign_pdf_verify_flow() {
        let app = app();
        let owner = Uuid::new_v4();

        let created = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/resumes",
                json!({"user_id": owner, "title": "My CV"}),
            ))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
        let created = body_json(created).await;
        assert_eq!(created["status"], "draft");
        let id = created["id"].as_str().unwrap().to_string();

        let signed = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/v1/resumes/{id}/sign"),
                json!({"user_id": owner}),
            ))
            .await
            .unwrap();
        assert_eq!(signed.status(), StatusCode::OK);
        let signed = body_json(signed).await;
        assert_eq!(signed["status"], "signed");
        let qr = signed["security"]["artifacts"]["qr_payload"].clone();

        let pdf = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/v1/resumes/{id}/pdf"),
                json!({"user_id": owner}),
            ))
            .await
            .unwrap();
        assert_eq!(pdf.status(), StatusCode::OK);
        assert_eq!(body_json(pdf).await["page_count"], 1);

        let download = app
            .clone()
            .oneshot(
                Request::get(format!("/api/v1/resumes/{id}/pdf"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(download.status(), StatusCode::OK);
        assert_eq!(download.headers()[header::CONTENT_TYPE], "application/pdf");

        let verified = app
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/v1/resumes/{id}/verify"),
                json!({"qr_payload": qr}),
            ))
            .await
            .unwrap();
        let verified = body_json(verified).await;
        assert_eq!(verified["is_authentic"], true);
        assert_eq!(verified["status"], "verified");
    }

    #[tokio::test]
    async fn test_stale_update_returns_version_conflict() {
        let app = app();
        let owner = Uuid::new_v4();
        let created = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/resumes",
                json!({"user_id": owner, "title": "CV"}),
            ))
            .await
            .unwrap();
        let id = body_json(created).await["id"].as_str().unwrap().to_string();
        let uri = format!("/api/v1/resumes/{id}/content");

        let first = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &uri,
                json!({"user_id": owner, "content": {"summary": "a"}, "expected_version": 1}),
            ))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let stale = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &uri,
                json!({"user_id": owner, "content": {"summary": "b"}, "expected_version": 1}),
            ))
            .await
            .unwrap();
        assert_eq!(stale.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(stale).await["error"]["code"], "VERSION_CONFLICT");
    }

    #[tokio::test]
    async fn test_unknown_resume_is_404() {
        let response = app()
            .oneshot(
                Request::get(format!("/api/v1/resumes/{}", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["code"], "NOT_FOUND");
    }
}
