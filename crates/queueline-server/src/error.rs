//! Error types for the request boundary.
//!
//! [`ApiError`] unifies all failure modes into a single enum that can be
//! converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. Storage
//! failures are logged in full and answered with an opaque message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use queueline_db::DbError;

/// Errors that can occur in the request boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request was malformed: blank name, bad status, non-numeric number.
    #[error("{0}")]
    Validation(String),

    /// The entry or ticket number does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The change is refused by an enabled queue policy.
    #[error("{0}")]
    Conflict(String),

    /// The store failed while performing the operation.
    #[error("storage error: {0}")]
    Storage(DbError),

    /// The store could not be reached by the health check.
    #[error("storage unavailable: {0}")]
    Unavailable(DbError),
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        if err.is_validation() {
            Self::Validation(err.to_string())
        } else {
            Self::Storage(err)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::Storage(e) => {
                tracing::error!(error = %e, "Storage operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    String::from("internal server error"),
                )
            }
            Self::Unavailable(e) => {
                tracing::warn!(error = %e, "Storage unreachable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    String::from("storage unavailable"),
                )
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
