use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors surfaced to HTTP callers by the API handlers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Invalid input format")]
    InvalidInput,

    #[error("Text input cannot be empty")]
    EmptyText,

    #[error("Internal Server Error")]
    ForcedFailure,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput | ApiError::EmptyText => StatusCode::BAD_REQUEST,
            ApiError::ForcedFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        plain_text_error(self.status_code(), &self.to_string())
    }
}

/// Plain-text error response with a trailing newline.
pub fn plain_text_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            ),
            (
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ),
        ],
        format!("{}\n", message),
    )
        .into_response()
}

/// Result type alias for handler operations
pub type ApiResult<T> = Result<T, ApiError>;
