//! Catalog API endpoints
//!
//! - GET /api/v1/process-types
//! - GET /api/v1/statuses
//! - GET /api/v1/documents

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};
use crate::models::{Document, ProcessType, Status};

#[derive(Debug, Serialize)]
pub struct ProcessTypeListResponse {
    pub process_types: Vec<ProcessType>,
}

#[derive(Debug, Serialize)]
pub struct StatusListResponse {
    pub statuses: Vec<Status>,
}

#[derive(Debug, Serialize)]
pub struct DocumentListResponse {
    pub documents: Vec<Document>,
}

/// Build the catalog router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/process-types", get(list_process_types))
        .route("/statuses", get(list_statuses))
        .route("/documents", get(list_documents))
}

async fn list_process_types(
    State(state): State<AppState>,
) -> Result<Json<ProcessTypeListResponse>, ApiError> {
    let process_types = state.catalog_service.list_process_types().await?;
    Ok(Json(ProcessTypeListResponse { process_types }))
}

async fn list_statuses(State(state): State<AppState>) -> Result<Json<StatusListResponse>, ApiError> {
    let statuses = state.catalog_service.list_statuses().await?;
    Ok(Json(StatusListResponse { statuses }))
}

async fn list_documents(
    State(state): State<AppState>,
) -> Result<Json<DocumentListResponse>, ApiError> {
    let documents = state.catalog_service.list_documents().await?;
    Ok(Json(DocumentListResponse { documents }))
}
