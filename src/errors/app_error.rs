use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::core::realtime::RealtimeError;

/// Errors surfaced by the HTTP front door.
#[derive(Debug, Error)]
pub enum AppError {
    /// No usable input text in the request
    #[error("{0}")]
    InvalidRequest(String),

    /// The bridge was not initialized at startup
    #[error("Bridge not initialized: {0}")]
    Configuration(String),

    /// Transport or protocol failure while bridging the turn
    #[error("{0}")]
    UpstreamSession(#[from] RealtimeError),

    /// The session completed without producing audio
    #[error("No audio received from upstream")]
    UpstreamEmptyResponse,
}

pub type AppResult<T> = Result<T, AppError>;

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
    pub code: &'static str,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::UpstreamSession(RealtimeError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            AppError::UpstreamSession(_) => StatusCode::BAD_GATEWAY,
            AppError::UpstreamEmptyResponse => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::Configuration(_) => "configuration_error",
            AppError::UpstreamSession(RealtimeError::Timeout(_)) => "upstream_timeout",
            AppError::UpstreamSession(_) => "upstream_session_error",
            AppError::UpstreamEmptyResponse => "upstream_empty_response",
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            detail: self.to_string(),
            code: self.code(),
        }
    }
}

/// Bodies that are not valid JSON for the endpoint are invalid requests.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::warn!(status = status.as_u16(), code = self.code(), "Request failed: {}", self);

        (status, Json(self.body())).into_response()
    }
}
