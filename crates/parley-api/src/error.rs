use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use parley_types::api::ErrorResponse;

/// Errors surfaced to REST callers. Push dispatch failures never appear
/// here; they stay inside the delivery router.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or empty required input; the message is the exact
    /// caller-facing body.
    #[error("{0}")]
    Validation(&'static str),

    #[error("invalid credentials")]
    Auth,

    /// A referenced username does not exist.
    #[error("{0}")]
    NotFound(&'static str),

    /// Persistence failure: logged with detail, generic message to the
    /// caller.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.to_owned()),
            ApiError::Auth => (
                StatusCode::UNAUTHORIZED,
                "Invalid username or password.".to_owned(),
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.to_owned()),
            ApiError::Store(e) => {
                error!("store error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_owned(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Absent and empty-string inputs are both rejected as missing.
pub(crate) fn required(
    value: Option<String>,
    msg: &'static str,
) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ApiError::Validation(msg)),
    }
}
