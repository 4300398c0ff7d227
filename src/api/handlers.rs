use axum::{http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub type AppState<S> = Arc<S>;

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub const PERMISSION_DENIED: &str = "You do not have permission to perform this action.";
pub const MALFORMED_REQUEST: &str = "Malformed request.";
pub const NOT_FOUND: &str = "Not found.";

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            detail: message.to_string(),
        }
    }
}

pub fn error(status: StatusCode, message: &str) -> ApiError {
    (status, Json(ErrorResponse::new(message)))
}

pub fn forbidden() -> ApiError {
    error(StatusCode::FORBIDDEN, PERMISSION_DENIED)
}

pub fn not_found() -> ApiError {
    error(StatusCode::NOT_FOUND, NOT_FOUND)
}

pub fn internal(err: anyhow::Error) -> ApiError {
    log::error!("Store failure: {:#}", err);
    error(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
}
