//! Statistics API endpoints
//!
//! - GET /api/v1/statistics/summary

use axum::{extract::State, routing::get, Json, Router};

use crate::api::middleware::{ApiError, AppState};
use crate::models::StatisticsSummary;

/// Build the statistics router
pub fn router() -> Router<AppState> {
    Router::new().route("/summary", get(summary))
}

async fn summary(State(state): State<AppState>) -> Result<Json<StatisticsSummary>, ApiError> {
    let summary = state.statistics_service.summary().await?;
    Ok(Json(summary))
}
