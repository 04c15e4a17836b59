//! HTTP handlers for the server.

pub mod editor;
pub mod export;
pub mod uploads;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::FieldpressError;

/// Error reply: `{"success": false, "error": msg}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }
}

impl From<FieldpressError> for ApiError {
    fn from(err: FieldpressError) -> Self {
        let status = match err {
            FieldpressError::MissingInput(_)
            | FieldpressError::InvalidField(_)
            | FieldpressError::Image(_)
            | FieldpressError::Data(_)
            | FieldpressError::Config(_) => StatusCode::BAD_REQUEST,
            FieldpressError::Cancelled => StatusCode::CONFLICT,
            FieldpressError::Font(_)
            | FieldpressError::Archive(_)
            | FieldpressError::Server(_)
            | FieldpressError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({"success": false, "error": self.message})),
        )
            .into_response()
    }
}
