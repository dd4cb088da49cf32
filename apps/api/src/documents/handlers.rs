use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::documents::GeneratedPdf;
use crate::errors::AppError;
use crate::models::{DocumentStatus, ResumeDocument, VersionHistoryRow};
use crate::state::AppState;
use crate::verification::VerificationReport;

#[derive(Deserialize)]
pub struct CreateResumeRequest {
    pub user_id: Uuid,
    pub title: String,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct UpdateContentRequest {
    pub user_id: Uuid,
    pub content: Value,
    pub expected_version: i32,
    pub title: Option<String>,
}

#[derive(Deserialize)]
pub struct UserIdBody {
    pub user_id: Uuid,
}

#[derive(Deserialize, Default)]
pub struct VerifyRequest {
    pub qr_payload: Option<String>,
}

/// A résumé with its derived status surfaced at the top level.
#[derive(Serialize)]
pub struct ResumeView {
    #[serde(flatten)]
    pub document: ResumeDocument,
    pub status: DocumentStatus,
}

impl From<ResumeDocument> for ResumeView {
    fn from(document: ResumeDocument) -> Self {
        let status = document.status();
        ResumeView { document, status }
    }
}

#[derive(Serialize)]
pub struct ResumeListResponse {
    pub resumes: Vec<ResumeView>,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub resume_id: Uuid,
    pub entries: Vec<VersionHistoryRow>,
}

/// POST /api/v1/resumes
pub async fn handle_create(
    State(state): State<AppState>,
    Json(req): Json<CreateResumeRequest>,
) -> Result<(StatusCode, Json<ResumeView>), AppError> {
    let doc = state.resumes.create(req.user_id, &req.title).await?;
    Ok((StatusCode::CREATED, Json(doc.into())))
}

/// GET /api/v1/resumes
pub async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<ResumeListResponse>, AppError> {
    let docs = state.resumes.list_recent(params.limit).await?;
    Ok(Json(ResumeListResponse {
        resumes: docs.into_iter().map(ResumeView::from).collect(),
    }))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeView>, AppError> {
    Ok(Json(state.resumes.get(id).await?.into()))
}

/// PUT /api/v1/resumes/:id/content
pub async fn handle_update_content(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateContentRequest>,
) -> Result<Json<ResumeView>, AppError> {
    let doc = state
        .resumes
        .update_content(id, req.user_id, req.content, req.expected_version, req.title)
        .await?;
    Ok(Json(doc.into()))
}

/// GET /api/v1/resumes/:id/history
pub async fn handle_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryResponse>, AppError> {
    let entries = state.resumes.history(id).await?;
    Ok(Json(HistoryResponse {
        resume_id: id,
        entries,
    }))
}

/// POST /api/v1/resumes/:id/sign
pub async fn handle_sign(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UserIdBody>,
) -> Result<Json<ResumeView>, AppError> {
    Ok(Json(state.resumes.sign(id, req.user_id).await?.into()))
}

/// POST /api/v1/resumes/:id/pdf
pub async fn handle_generate_pdf(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UserIdBody>,
) -> Result<Json<GeneratedPdf>, AppError> {
    Ok(Json(state.resumes.generate_pdf(id, req.user_id).await?))
}

/// GET /api/v1/resumes/:id/pdf
pub async fn handle_download_pdf(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let bytes = state.resumes.download_pdf(id).await?;
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"resume-{id}.pdf\""),
        ),
    ];
    Ok((headers, Bytes::from(bytes)))
}

/// POST /api/v1/resumes/:id/verify
pub async fn handle_verify(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<VerifyRequest>>,
) -> Result<Json<VerificationReport>, AppError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let report = state.resumes.verify(id, req.qr_payload.as_deref()).await?;
    Ok(Json(report))
}
