//! API error types

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use passport_auth::{AuthError, ErrorKind};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// A required request field is missing or zero
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The body is not valid JSON for the request type
    #[error("Malformed request: {0}")]
    Malformed(#[from] JsonRejection),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::InvalidArgument(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", msg.to_string())
            }
            ApiError::Malformed(rejection) => (
                StatusCode::BAD_REQUEST,
                "INVALID_ARGUMENT",
                rejection.body_text(),
            ),
            ApiError::Auth(e) => match e.kind() {
                ErrorKind::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    "INVALID_CREDENTIALS",
                    "invalid email or password".to_string(),
                ),
                ErrorKind::InvalidApplication => (
                    StatusCode::BAD_REQUEST,
                    "INVALID_APPLICATION",
                    "invalid application id".to_string(),
                ),
                ErrorKind::UserExists => {
                    (StatusCode::CONFLICT, "ALREADY_EXISTS", "user already exists".to_string())
                }
                ErrorKind::Cancelled => {
                    (StatusCode::REQUEST_TIMEOUT, "CANCELLED", "request cancelled".to_string())
                }
                ErrorKind::DeadlineExceeded => (
                    StatusCode::GATEWAY_TIMEOUT,
                    "DEADLINE_EXCEEDED",
                    "deadline exceeded".to_string(),
                ),
                ErrorKind::Internal => {
                    // Cause stays in the logs, never in the response
                    error!(error = %e, "Request failed");
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", "internal error".to_string())
                }
            },
        };

        let body = axum::Json(json!({
            "code": code,
            "message": message,
        }));

        (status, body).into_response()
    }
}
