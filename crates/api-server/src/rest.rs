//! Operational endpoints and the error shape shared by every handler.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use funnel_source::{DatasetLoader, LoaderStatus, Snapshot};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub loader: Arc<DatasetLoader>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(loader: Arc<DatasetLoader>) -> Self {
        Self {
            loader,
            start_time: Instant::now(),
        }
    }

    /// The current snapshot, or 503 while nothing has loaded or the last
    /// fetch failed.
    pub fn snapshot(&self) -> Result<Arc<Snapshot>, ApiError> {
        self.loader.snapshot().ok_or_else(|| {
            let status = self.loader.status();
            let message = match status.error {
                Some(error) => format!("dataset unavailable: {error}; POST /v1/refresh to retry"),
                None => "dataset is still loading".to_string(),
            };
            ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "dataset_unavailable", message)
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Error returned by handlers: a status code with a JSON body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: error.to_string(),
                message: message.into(),
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// GET /health — Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        dataset: state.loader.status().state.to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /ready — 200 only once a dataset snapshot is available.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.loader.snapshot().is_some() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /live — Liveness probe.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /v1/status — Loader state, last refresh time and snapshot size.
pub async fn handle_status(State(state): State<AppState>) -> Json<LoaderStatus> {
    Json(state.loader.status())
}

/// POST /v1/refresh — Re-fetch sessions and campaigns from the source.
pub async fn handle_refresh(
    State(state): State<AppState>,
) -> Result<Json<LoaderStatus>, ApiError> {
    metrics::counter!("api.refresh").increment(1);
    match state.loader.refresh().await {
        Ok(_) => Ok(Json(state.loader.status())),
        Err(e) => {
            warn!(error = %e, "Refresh request failed");
            Err(ApiError::new(
                StatusCode::BAD_GATEWAY,
                "refresh_failed",
                e.to_string(),
            ))
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub dataset: String,
    pub uptime_secs: u64,
}
