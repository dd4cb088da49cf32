use axum::Json;
use serde_json::{json, Value};

/// GET /health
/// Liveness only; does not touch PostgreSQL or S3.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "cvsign-api"
    }))
}
