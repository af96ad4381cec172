//! Axum-specific error types and mappings.
//!
//! Maps control-plane errors to HTTP status codes and a JSON error
//! body. Every load-path and synthesis-path error is recovered here;
//! the only process-fatal condition in the server is the liveness
//! watchdog.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use vitsd_core::TtsError;

/// HTTP-facing error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Bad request (invalid input).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request forbidden by server policy.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = ErrorBody { error: message, status: status.as_u16() };
        (status, axum::Json(body)).into_response()
    }
}

impl From<TtsError> for HttpError {
    fn from(err: TtsError) -> Self {
        match err {
            // Policy rejection: reported, never fatal, model untouched.
            TtsError::ReloadDisabled => Self::Forbidden(err.to_string()),
            // Precondition violation (no model) and engine/tool failures
            // are all server-side conditions with a descriptive message.
            TtsError::ModelAbsent
            | TtsError::Phonemizer(_)
            | TtsError::Synthesis(_)
            | TtsError::Config(_)
            | TtsError::Io(_) => Self::Internal(err.to_string()),
        }
    }
}
