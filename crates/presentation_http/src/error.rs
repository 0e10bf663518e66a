//! API error handling
//!
//! Upstream failures never surface here: once a chat turn starts they are
//! delivered inside the SSE stream. Only requests rejected before that point
//! produce an `ApiError`.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body could not be read as a chat request
    #[error("Invalid request body: {message}")]
    InvalidBody {
        /// Status chosen by the extractor (400, 415 or 422)
        status: StatusCode,
        /// Extractor's explanation
        message: String,
    },
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::InvalidBody { status, .. } => (*status, "invalid_body"),
        };

        tracing::debug!(status = %status, error = %self, "Rejected request");

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
