//! Record types for the catalog, membership, and request stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Catalog availability state. `Borrowed` always carries a borrower and a
/// due date on the owning [`Book`] row; `Available` carries neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum BookStatus {
    Available,
    Borrowed,
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Member,
    Admin,
}

/// Borrow request resolution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// A catalog entry. `isbn` is the unique lookup key for all lifecycle
/// operations; `id` exists for CRUD routes only.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub genre: Option<String>,
    pub description: String,
    pub cover_image: String,
    pub status: BookStatus,
    pub borrowed_by: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A registered account. The password hash never serializes.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub approved: bool,
    pub last_genre: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A member's ask to borrow a specific book, awaiting admin review.
/// Requests are resolved in place and never deleted.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRequest {
    pub id: i64,
    pub member_id: i64,
    pub book_isbn: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

/// A pending request joined with the requester's identity, as shown on the
/// admin review screen.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequest {
    pub id: i64,
    pub member_id: i64,
    pub username: String,
    pub email: String,
    pub book_isbn: String,
    pub created_at: DateTime<Utc>,
}

/// A borrowed book joined with its borrower, for the admin borrowed list
/// and the due-soon sweep.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BorrowedBook {
    pub id: i64,
    pub title: String,
    pub isbn: String,
    pub due_date: Option<DateTime<Utc>>,
    pub borrowed_by: i64,
    pub username: String,
    pub email: String,
}

/// Fields for creating a catalog entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub genre: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover_image: String,
}

/// Fields for creating an account row.
#[derive(Debug, Clone)]
pub struct NewMember {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub approved: bool,
}
