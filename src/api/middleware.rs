//! API state and error envelope
//!
//! Every handler returns `ApiError` on failure, rendered as
//! `{"error": {"code", "message", "details"?}}` with the HTTP status derived
//! from the code.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::DynDatabasePool;
use crate::services::{
    CatalogService, DeadlineService, DeadlineServiceError, ProcessService, ProcessServiceError,
    Services, StatisticsService,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub process_service: Arc<ProcessService>,
    pub deadline_service: Arc<DeadlineService>,
    pub statistics_service: Arc<StatisticsService>,
    pub catalog_service: Arc<CatalogService>,
}

impl AppState {
    /// Build every service on top of `pool`
    pub fn new(pool: DynDatabasePool) -> Self {
        let services = Services::new(pool.clone());
        Self {
            pool,
            process_service: services.process,
            deadline_service: services.deadline,
            statistics_service: services.statistics,
            catalog_service: services.catalog,
        }
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<ProcessServiceError> for ApiError {
    fn from(err: ProcessServiceError) -> Self {
        match err {
            ProcessServiceError::ValidationError(msg) => Self::validation_error(msg),
            ProcessServiceError::Conflict(msg) => Self::conflict(msg),
            ProcessServiceError::NotFound(msg) => Self::not_found(msg),
            ProcessServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<DeadlineServiceError> for ApiError {
    fn from(err: DeadlineServiceError) -> Self {
        match err {
            DeadlineServiceError::ValidationError(msg) => Self::validation_error(msg),
            DeadlineServiceError::NotFound(id) => {
                Self::not_found(format!("Deadline not found: {}", id))
            }
            DeadlineServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        internal(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::with_details(
            "VALIDATION_ERROR",
            "Invalid request body",
            serde_json::json!({ "reason": rejection.body_text() }),
        )
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::with_details(
            "VALIDATION_ERROR",
            "Invalid query string",
            serde_json::json!({ "reason": rejection.body_text() }),
        )
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::with_details(
            "VALIDATION_ERROR",
            "Invalid path parameter",
            serde_json::json!({ "reason": rejection.body_text() }),
        )
    }
}

/// Log the full chain, return only the outer message
fn internal(err: anyhow::Error) -> ApiError {
    tracing::error!("Request failed: {:#}", err);
    ApiError::internal_error(err.to_string())
}
