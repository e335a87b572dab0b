// HTTP error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for HTTP handlers
pub type AppResult<T> = Result<T, AppError>;

/// Application error with HTTP status code
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for AppError {}

/// Error response JSON structure
#[derive(Debug, Serialize, Deserialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            success: false,
            error: self.message,
        });

        (self.status, body).into_response()
    }
}

/// Convert matchtv_core errors to HTTP errors
impl From<matchtv_core::Error> for AppError {
    fn from(err: matchtv_core::Error) -> Self {
        use matchtv_core::Error;

        match err {
            Error::Validation(msg) => {
                tracing::warn!("Rejected request: {}", msg);
                Self::bad_request(msg)
            }
            Error::LocalAsset(ref msg) => {
                tracing::error!("Local asset error: {}", msg);
                Self::internal_server_error(err.to_string())
            }
            Error::UpstreamHttp { .. } | Error::UpstreamNetwork(_) => {
                tracing::error!("Upstream error: {}", err);
                Self::internal_server_error(err.to_string())
            }
            Error::SourceUnavailable(_) => {
                tracing::error!("Schedule source error: {}", err);
                Self::internal_server_error(err.to_string())
            }
            Error::Config(_) | Error::Internal(_) => {
                tracing::error!("Internal error: {}", err);
                Self::internal_server_error(err.to_string())
            }
        }
    }
}
