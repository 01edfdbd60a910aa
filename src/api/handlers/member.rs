//! Member-facing borrowing handlers. Every route here requires an approved
//! account.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::{ApiState, Caller};
use crate::error::ApiError;
use crate::lending;
use crate::models::{Book, BorrowRequest};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IsbnRequest {
    pub book_isbn: String,
}

/// Books the caller currently holds, soonest due first.
pub async fn my_books(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
) -> Result<Json<Vec<Book>>, ApiError> {
    caller.require_approved()?;
    Ok(Json(state.store.borrowed_by_member(caller.member_id).await?))
}

/// Borrow an Available book directly (self-issue).
pub async fn borrow(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Json(req): Json<IsbnRequest>,
) -> Result<Json<Value>, ApiError> {
    caller.require_approved()?;

    if req.book_isbn.trim().is_empty() {
        return Err(ApiError::InvalidInput("Missing bookIsbn".into()));
    }

    let due = lending::issue(&state.store, req.book_isbn.trim(), caller.member_id).await?;
    Ok(Json(json!({ "ok": true, "dueDate": due })))
}

/// Return the caller's own borrowed copy. Reports whether it came back
/// late.
pub async fn return_book(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Json(req): Json<IsbnRequest>,
) -> Result<Json<Value>, ApiError> {
    caller.require_approved()?;

    if req.book_isbn.trim().is_empty() {
        return Err(ApiError::InvalidInput("Missing bookIsbn".into()));
    }

    let late = lending::return_book(
        &state.store,
        req.book_isbn.trim(),
        Some(caller.member_id),
    )
    .await?;
    Ok(Json(json!({ "ok": true, "late": late })))
}

/// Up to three Available books in the caller's last borrowed genre.
pub async fn recommendations(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
) -> Result<Json<Vec<Book>>, ApiError> {
    caller.require_approved()?;
    Ok(Json(lending::recommend(&state.store, caller.member_id).await?))
}

/// The caller's pending borrow requests.
pub async fn my_requests(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
) -> Result<Json<Vec<BorrowRequest>>, ApiError> {
    caller.require_approved()?;
    Ok(Json(
        state.store.pending_requests_for(caller.member_id).await?,
    ))
}

/// Ask an admin to issue a book. At most one pending request per book per
/// member.
pub async fn request_borrow(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Json(req): Json<IsbnRequest>,
) -> Result<Json<Value>, ApiError> {
    caller.require_approved()?;

    if req.book_isbn.trim().is_empty() {
        return Err(ApiError::InvalidInput("Missing bookIsbn".into()));
    }

    let request_id = state
        .store
        .insert_request(caller.member_id, req.book_isbn.trim())
        .await?;
    Ok(Json(json!({ "ok": true, "requestId": request_id })))
}
