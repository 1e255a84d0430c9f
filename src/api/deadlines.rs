//! Deadline API endpoints
//!
//! - GET /api/v1/deadlines/overdue - Open deadlines past due
//! - POST /api/v1/deadlines/overdue/notify - Flag every overdue deadline as notified
//! - GET /api/v1/deadlines/upcoming?days=7 - Open deadlines due within the window
//! - POST /api/v1/deadlines/{id}/close - Close a deadline
//! - POST /api/v1/deadlines/{id}/notify - Flag one deadline as notified

use axum::{
    body::Bytes,
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::api::processes::parse_optional_body;
use crate::models::{OverdueDeadline, ProcessDeadline, UpcomingDeadline};
use crate::services::DEFAULT_UPCOMING_DAYS;

/// Query parameters for the upcoming listing
#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    #[serde(default = "default_days")]
    pub days: u32,
}

fn default_days() -> u32 {
    DEFAULT_UPCOMING_DAYS
}

/// Optional body for closing a deadline
#[derive(Debug, Default, Deserialize)]
pub struct CloseDeadlineRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OverdueListResponse {
    pub deadlines: Vec<OverdueDeadline>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct UpcomingListResponse {
    pub days: u32,
    pub deadlines: Vec<UpcomingDeadline>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct NotifyResponse {
    pub marked: u64,
}

/// Build the deadlines router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/overdue", get(list_overdue))
        .route("/overdue/notify", post(notify_overdue))
        .route("/upcoming", get(list_upcoming))
        .route("/{id}/close", post(close_deadline))
        .route("/{id}/notify", post(mark_notified))
}

/// GET /api/v1/deadlines/overdue
async fn list_overdue(
    State(state): State<AppState>,
) -> Result<Json<OverdueListResponse>, ApiError> {
    let deadlines = state.deadline_service.list_overdue().await?;

    Ok(Json(OverdueListResponse {
        total: deadlines.len(),
        deadlines,
    }))
}

/// POST /api/v1/deadlines/overdue/notify
async fn notify_overdue(State(state): State<AppState>) -> Result<Json<NotifyResponse>, ApiError> {
    let marked = state.deadline_service.notify_overdue().await?;
    Ok(Json(NotifyResponse { marked }))
}

/// GET /api/v1/deadlines/upcoming?days=N
async fn list_upcoming(
    State(state): State<AppState>,
    query: Result<Query<UpcomingQuery>, QueryRejection>,
) -> Result<Json<UpcomingListResponse>, ApiError> {
    let Query(query) = query?;
    let deadlines = state.deadline_service.list_upcoming(query.days).await?;

    Ok(Json(UpcomingListResponse {
        days: query.days,
        total: deadlines.len(),
        deadlines,
    }))
}

/// POST /api/v1/deadlines/{id}/close
async fn close_deadline(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Bytes,
) -> Result<Json<ProcessDeadline>, ApiError> {
    let Path(id) = id?;
    let request: CloseDeadlineRequest = parse_optional_body(&body)?;
    let deadline = state
        .deadline_service
        .close_deadline(id, request.notes.as_deref())
        .await?;

    Ok(Json(deadline))
}

/// POST /api/v1/deadlines/{id}/notify
async fn mark_notified(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ProcessDeadline>, ApiError> {
    let Path(id) = id?;
    let deadline = state.deadline_service.mark_notified(id).await?;
    Ok(Json(deadline))
}
