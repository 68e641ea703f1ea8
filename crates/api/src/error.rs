//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::ErrorKind;
use marketplace::AppError;
use thiserror::Error;

/// API-level error type that maps to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed path or header value.
    #[error("{0}")]
    BadRequest(String),

    /// Missing or malformed bearer token on a route that needs one.
    #[error("{0}")]
    Unauthenticated(String),

    /// Authenticated, but the role is not allowed on this route.
    #[error("{0}")]
    Forbidden(String),

    /// Failure reported by an application service.
    #[error(transparent)]
    App(#[from] AppError),
}

/// HTTP status for each caller-visible error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Conflict | ErrorKind::InsufficientStock => StatusCode::CONFLICT,
        ErrorKind::ExpiredPromotion => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            ApiError::App(err) => match err.kind() {
                Some(kind) => (status_for(kind), kind.as_str(), err.to_string()),
                None => {
                    tracing::error!(error = %err, "internal server error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "internal_error",
                        "internal server error".to_string(),
                    )
                }
            },
        };

        let body = serde_json::json!({ "error": kind, "message": message });
        (status, axum::Json(body)).into_response()
    }
}
