//! API layer - HTTP handlers and routing
//!
//! JSON endpoints nested under `/api/v1`:
//! - Catalog endpoints (process types, statuses, documents)
//! - Process endpoints (registration, detail, updates, document submission)
//! - Deadline endpoints (overdue and upcoming reports, close, notify)
//! - Statistics endpoint
//!
//! plus an unversioned `/health` probe.

pub mod catalog;
pub mod deadlines;
pub mod middleware;
pub mod processes;
pub mod statistics;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, ApiErrorDetail, AppState};

/// Build the versioned API router
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .merge(catalog::router())
        .nest("/processes", processes::router())
        .nest("/deadlines", deadlines::router())
        .nest("/statistics", statistics::router())
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", build_api_router())
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the configured origin; `*` or an unparsable value allows any origin
fn cors_layer(cors_origin: &str) -> CorsLayer {
    let origin = match cors_origin.trim() {
        "*" => AllowOrigin::any(),
        value => match value.parse::<HeaderValue>() {
            Ok(origin) => AllowOrigin::exact(origin),
            Err(_) => {
                tracing::warn!("Invalid CORS origin '{}', allowing any origin", value);
                AllowOrigin::any()
            }
        },
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([header::CONTENT_TYPE])
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: String,
    pub version: &'static str,
}

/// GET /health
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, code, database) = match state.pool.ping().await {
        Ok(()) => ("ok", StatusCode::OK, "connected".to_string()),
        Err(e) => {
            tracing::warn!("Health check failed: {:#}", e);
            ("unavailable", StatusCode::SERVICE_UNAVAILABLE, format!("error: {}", e))
        }
    };

    (
        code,
        Json(HealthResponse {
            status,
            database,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
