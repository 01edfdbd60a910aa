//! Borrow-request store operations.

use chrono::Utc;

use crate::error::{is_unique_violation, ApiError};
use crate::models::{BorrowRequest, PendingRequest, RequestStatus};

use super::Store;

impl Store {
    /// Create a pending request. At most one pending request may exist per
    /// (member, isbn); the partial unique index backs up the pre-check.
    pub async fn insert_request(&self, member_id: i64, isbn: &str) -> Result<i64, ApiError> {
        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM borrow_requests
             WHERE member_id = ? AND book_isbn = ? AND status = 'pending'",
        )
        .bind(member_id)
        .bind(isbn)
        .fetch_one(&self.pool)
        .await?;

        if existing > 0 {
            return Err(ApiError::Conflict("Already requested".into()));
        }

        let result = sqlx::query(
            "INSERT INTO borrow_requests (member_id, book_isbn, status, created_at)
             VALUES (?, ?, 'pending', ?)",
        )
        .bind(member_id)
        .bind(isbn)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.last_insert_rowid()),
            Err(e) if is_unique_violation(&e) => {
                Err(ApiError::Conflict("Already requested".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn request_by_id(&self, id: i64) -> Result<Option<BorrowRequest>, ApiError> {
        let request =
            sqlx::query_as::<_, BorrowRequest>("SELECT * FROM borrow_requests WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(request)
    }

    /// All pending requests with requester identity, newest first, for the
    /// admin review list.
    pub async fn pending_requests(&self) -> Result<Vec<PendingRequest>, ApiError> {
        let rows = sqlx::query_as::<_, PendingRequest>(
            "SELECT r.id, r.member_id, m.username, m.email, r.book_isbn, r.created_at
             FROM borrow_requests r
             JOIN members m ON m.id = r.member_id
             WHERE r.status = 'pending'
             ORDER BY r.created_at DESC, r.id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// A member's own pending requests, newest first.
    pub async fn pending_requests_for(
        &self,
        member_id: i64,
    ) -> Result<Vec<BorrowRequest>, ApiError> {
        let rows = sqlx::query_as::<_, BorrowRequest>(
            "SELECT * FROM borrow_requests
             WHERE member_id = ? AND status = 'pending'
             ORDER BY created_at DESC, id DESC",
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Resolve a request. Requests are never deleted, only marked.
    pub async fn set_request_status(
        &self,
        id: i64,
        status: RequestStatus,
    ) -> Result<(), ApiError> {
        sqlx::query("UPDATE borrow_requests SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
