//! Health check handler.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::api::ApiState;
use crate::error::ApiError;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub ok: bool,

    /// Catalog size.
    pub books: i64,

    /// Registered accounts (any approval state).
    pub members: i64,
}

/// Health check endpoint.
pub async fn health(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<HealthResponse>, ApiError> {
    Ok(Json(HealthResponse {
        ok: true,
        books: state.store.count_books().await?,
        members: state.store.count_members().await?,
    }))
}
