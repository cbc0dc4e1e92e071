//! API error handling module
//!
//! Every error leaves the server as `{"success": false, "error", "code"}`.
//! Clients show `error` to the visitor verbatim.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("{0}")]
    BadRequest(String),

    /// Forbidden - the visitor does not own the resource
    #[error("{0}")]
    Forbidden(String),

    /// Not found - requested resource does not exist
    #[error("{0}")]
    NotFound(String),

    /// Payload too large - upload exceeds the configured limit
    #[error("{0}")]
    PayloadTooLarge(String),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create a forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a payload too large error
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::PayloadTooLarge(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    /// Get the error code for programmatic error handling
    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();
        let message = self.to_string();

        match &self {
            Self::BadRequest(_) | Self::NotFound(_) | Self::PayloadTooLarge(_) => {
                tracing::warn!(status = %status, code, error = %message, "Client error");
            }
            Self::Forbidden(_) => {
                tracing::warn!(status = %status, code, error = %message, "Ownership check failed");
            }
        }

        let body = serde_json::json!({
            "success": false,
            "error": message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}
