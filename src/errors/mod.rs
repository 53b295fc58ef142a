/// Unified error handling module
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Unified error response format
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Upstream timed out: {0}")]
    Timeout(String),

    #[error("All upstream endpoints failed: {0}")]
    ExhaustedFallback(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Analysis failed: {0}")]
    Analysis(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Transport(_) => "UPSTREAM_ERROR",
            ApiError::Timeout(_) => "UPSTREAM_TIMEOUT",
            ApiError::ExhaustedFallback(_) => "UPSTREAM_EXHAUSTED",
            ApiError::Validation(_) => "INVALID_INPUT",
            ApiError::Analysis(_) => "ANALYSIS_FAILED",
            ApiError::Export(_) => "EXPORT_FAILED",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ApiError::Transport(format!("upstream returned {}", status)),
            None if err.is_timeout() => ApiError::Timeout(err.to_string()),
            None => ApiError::Transport(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Export(err.to_string())
    }
}

impl From<csv::Error> for ApiError {
    fn from(err: csv::Error) -> Self {
        ApiError::Export(err.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_response = ErrorResponse {
            ok: false,
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        };

        // Failures travel in the envelope, not the status line
        (StatusCode::OK, Json(error_response)).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
