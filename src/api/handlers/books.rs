//! Catalog handlers: public reads, admin CRUD.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::api::{ApiState, Caller};
use crate::error::ApiError;
use crate::models::{Book, NewBook};

/// Full catalog, newest first. Public.
pub async fn list(State(state): State<Arc<ApiState>>) -> Result<Json<Vec<Book>>, ApiError> {
    Ok(Json(state.store.list_books().await?))
}

/// Single book by ISBN. Public.
pub async fn get_by_isbn(
    State(state): State<Arc<ApiState>>,
    Path(isbn): Path<String>,
) -> Result<Json<Book>, ApiError> {
    let book = state
        .store
        .book_by_isbn(&isbn)
        .await?
        .ok_or_else(|| ApiError::NotFound("Not found".into()))?;
    Ok(Json(book))
}

/// Add a book to the catalog. Admin only.
pub async fn add(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Json(new): Json<NewBook>,
) -> Result<Json<Book>, ApiError> {
    caller.require_admin()?;

    if new.title.trim().is_empty() || new.author.trim().is_empty() || new.isbn.trim().is_empty() {
        return Err(ApiError::InvalidInput("Missing fields".into()));
    }

    Ok(Json(state.store.insert_book(&new).await?))
}

/// Replace a book's descriptive fields, addressed by row id. Admin only.
pub async fn update(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Path(key): Path<String>,
    Json(new): Json<NewBook>,
) -> Result<Json<Book>, ApiError> {
    caller.require_admin()?;

    let id: i64 = key
        .parse()
        .map_err(|_| ApiError::InvalidInput("Invalid book id".into()))?;

    let book = state
        .store
        .update_book(id, &new)
        .await?
        .ok_or_else(|| ApiError::NotFound("Not found".into()))?;
    Ok(Json(book))
}

/// Delete a book, addressed by row id. Admin only.
pub async fn delete(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Path(key): Path<String>,
) -> Result<Json<Value>, ApiError> {
    caller.require_admin()?;

    let id: i64 = key
        .parse()
        .map_err(|_| ApiError::InvalidInput("Invalid book id".into()))?;

    if !state.store.delete_book(id).await? {
        return Err(ApiError::NotFound("Not found".into()));
    }
    Ok(Json(json!({ "ok": true })))
}
