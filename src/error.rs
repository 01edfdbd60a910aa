//! Service error type and its HTTP mapping.
//!
//! Every fallible operation in the crate funnels into [`ApiError`]; handlers
//! return it directly and the `IntoResponse` impl renders the uniform
//! `{"error": "..."}` body the frontend displays verbatim.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Domain and transport failures, ordered roughly by HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request fields (400).
    #[error("{0}")]
    InvalidInput(String),

    /// Missing or invalid bearer token (401).
    #[error("{0}")]
    Unauthenticated(String),

    /// Valid identity whose registration an admin has not accepted yet (403).
    /// Kept distinct from `Forbidden` so the frontend can show its own copy.
    #[error("Account pending approval")]
    PendingApproval,

    /// Authenticated but the wrong role for this route (403).
    #[error("Forbidden")]
    Forbidden,

    /// Entity absent (404).
    #[error("{0}")]
    NotFound(String),

    /// State precondition violated, e.g. issuing a book that is not
    /// Available (400, matching the original surface).
    #[error("{0}")]
    Conflict(String),

    /// Unexpected failure (500). Details go to the log, not the client.
    #[error("Server error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::PendingApproval | ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(ref source) = self {
            tracing::error!(error = %source, "request failed");
        }

        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Internal(e.into())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e)
    }
}

/// True when a sqlx error is a UNIQUE constraint violation, so stores can
/// surface duplicate keys as `Conflict` instead of a 500.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.message().contains("UNIQUE constraint failed"))
}
