//! Process API endpoints
//!
//! - GET /api/v1/processes - List processes, optionally filtered
//! - POST /api/v1/processes - Register a process
//! - GET /api/v1/processes/{protocol} - Process detail with checklist and deadlines
//! - PATCH /api/v1/processes/{protocol} - Partial update
//! - POST /api/v1/processes/{protocol}/documents/{code}/provide - Submit a document

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};
use crate::models::{
    CreateProcessInput, ProcessDetail, ProcessFilter, ProcessSummary, ProvideDocumentInput,
    ProvideOutcome, UpdateProcessInput,
};

/// Response for process list
#[derive(Debug, Serialize)]
pub struct ProcessListResponse {
    pub processes: Vec<ProcessSummary>,
    pub total: usize,
}

/// Build the processes router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_processes).post(create_process))
        .route("/{protocol}", get(get_process).patch(update_process))
        .route("/{protocol}/documents/{code}/provide", post(provide_document))
}

/// GET /api/v1/processes?type_code=&status_code=
async fn list_processes(
    State(state): State<AppState>,
    query: Result<Query<ProcessFilter>, QueryRejection>,
) -> Result<Json<ProcessListResponse>, ApiError> {
    let Query(filter) = query?;
    let processes = state.process_service.list_processes(&filter).await?;

    Ok(Json(ProcessListResponse {
        total: processes.len(),
        processes,
    }))
}

/// POST /api/v1/processes
async fn create_process(
    State(state): State<AppState>,
    body: Result<Json<CreateProcessInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ProcessSummary>), ApiError> {
    let Json(input) = body?;
    let process = state.process_service.create_process(input).await?;

    Ok((StatusCode::CREATED, Json(process)))
}

/// GET /api/v1/processes/{protocol}
async fn get_process(
    State(state): State<AppState>,
    Path(protocol): Path<String>,
) -> Result<Json<ProcessDetail>, ApiError> {
    let detail = state.process_service.get_process_detail(&protocol).await?;
    Ok(Json(detail))
}

/// PATCH /api/v1/processes/{protocol}
async fn update_process(
    State(state): State<AppState>,
    Path(protocol): Path<String>,
    body: Result<Json<UpdateProcessInput>, JsonRejection>,
) -> Result<Json<ProcessDetail>, ApiError> {
    let Json(input) = body?;
    let detail = state.process_service.update_process(&protocol, input).await?;
    Ok(Json(detail))
}

/// POST /api/v1/processes/{protocol}/documents/{code}/provide
///
/// The body is optional; without one the document is recorded as provided today.
async fn provide_document(
    State(state): State<AppState>,
    Path((protocol, code)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<ProvideOutcome>, ApiError> {
    let input: ProvideDocumentInput = parse_optional_body(&body)?;
    let outcome = state
        .process_service
        .provide_document(&protocol, &code, input)
        .await?;

    Ok(Json(outcome))
}

/// Decode a JSON body that may be left empty
pub(crate) fn parse_optional_body<T>(body: &[u8]) -> Result<T, ApiError>
where
    T: serde::de::DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        ApiError::with_details(
            "VALIDATION_ERROR",
            "Invalid request body",
            serde_json::json!({ "reason": e.to_string() }),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_optional_body() {
        let input: ProvideDocumentInput = parse_optional_body(b"").unwrap();
        assert!(input.provided_date.is_none());

        let input: ProvideDocumentInput = parse_optional_body(b"  \n").unwrap();
        assert!(input.observations.is_none());

        let input: ProvideDocumentInput =
            parse_optional_body(br#"{"provided_date": "2025-12-10", "observations": "certified copy"}"#)
                .unwrap();
        assert_eq!(input.provided_date.as_deref(), Some("2025-12-10"));
        assert_eq!(input.observations.as_deref(), Some("certified copy"));

        let err = parse_optional_body::<ProvideDocumentInput>(b"{not json").unwrap_err();
        assert_eq!(err.error.code, "VALIDATION_ERROR");
        assert!(err.error.details.is_some());
    }
}
