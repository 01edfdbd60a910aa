//! Catalog store operations, including the conditional status transitions
//! the borrow lifecycle depends on.

use chrono::{DateTime, Utc};

use crate::error::{is_unique_violation, ApiError};
use crate::models::{Book, BorrowedBook, NewBook};

use super::Store;

impl Store {
    /// Add a book to the catalog. Duplicate ISBNs are a conflict.
    pub async fn insert_book(&self, new: &NewBook) -> Result<Book, ApiError> {
        let result = sqlx::query(
            "INSERT INTO books (title, author, isbn, genre, description, cover_image, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new.title)
        .bind(&new.author)
        .bind(&new.isbn)
        .bind(&new.genre)
        .bind(&new.description)
        .bind(&new.cover_image)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => {
                let book = self
                    .book_by_id(done.last_insert_rowid())
                    .await?
                    .ok_or_else(|| ApiError::NotFound("Book not found".into()))?;
                Ok(book)
            }
            Err(e) if is_unique_violation(&e) => {
                Err(ApiError::Conflict("ISBN already exists".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All books, newest first.
    pub async fn list_books(&self) -> Result<Vec<Book>, ApiError> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT * FROM books ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    pub async fn book_by_isbn(&self, isbn: &str) -> Result<Option<Book>, ApiError> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE isbn = ?")
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    pub async fn book_by_id(&self, id: i64) -> Result<Option<Book>, ApiError> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    /// Look up a book only if the given member currently holds it.
    pub async fn book_held_by(
        &self,
        isbn: &str,
        member_id: i64,
    ) -> Result<Option<Book>, ApiError> {
        let book = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE isbn = ? AND borrowed_by = ?",
        )
        .bind(isbn)
        .bind(member_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(book)
    }

    /// Replace a book's descriptive fields. Returns the updated row, or
    /// None if the id does not exist.
    pub async fn update_book(&self, id: i64, new: &NewBook) -> Result<Option<Book>, ApiError> {
        let result = sqlx::query(
            "UPDATE books
             SET title = ?, author = ?, isbn = ?, genre = ?, description = ?, cover_image = ?
             WHERE id = ?",
        )
        .bind(&new.title)
        .bind(&new.author)
        .bind(&new.isbn)
        .bind(&new.genre)
        .bind(&new.description)
        .bind(&new.cover_image)
        .bind(id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Ok(None),
            Ok(_) => self.book_by_id(id).await,
            Err(e) if is_unique_violation(&e) => {
                Err(ApiError::Conflict("ISBN already exists".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Hard-delete a book. Returns false if the id does not exist.
    pub async fn delete_book(&self, id: i64) -> Result<bool, ApiError> {
        let done = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    /// Atomically transition Available -> Borrowed. Returns false when the
    /// book was not Available (or vanished), so two concurrent issues can
    /// never both succeed on the same copy.
    pub async fn try_borrow(
        &self,
        isbn: &str,
        member_id: i64,
        due: DateTime<Utc>,
    ) -> Result<bool, ApiError> {
        let done = sqlx::query(
            "UPDATE books
             SET status = 'Borrowed', borrowed_by = ?, due_date = ?
             WHERE isbn = ? AND status = 'Available'",
        )
        .bind(member_id)
        .bind(due)
        .bind(isbn)
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected() > 0)
    }

    /// Atomically transition Borrowed -> Available, clearing borrower and
    /// due date. When `holder` is given the release is additionally scoped
    /// to that borrower. Returns false when the precondition no longer held.
    pub async fn try_release(&self, isbn: &str, holder: Option<i64>) -> Result<bool, ApiError> {
        let done = match holder {
            Some(member_id) => {
                sqlx::query(
                    "UPDATE books
                     SET status = 'Available', borrowed_by = NULL, due_date = NULL
                     WHERE isbn = ? AND status = 'Borrowed' AND borrowed_by = ?",
                )
                .bind(isbn)
                .bind(member_id)
                .execute(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "UPDATE books
                     SET status = 'Available', borrowed_by = NULL, due_date = NULL
                     WHERE isbn = ? AND status = 'Borrowed'",
                )
                .bind(isbn)
                .execute(&self.pool)
                .await?
            }
        };
        Ok(done.rows_affected() > 0)
    }

    /// Move the due date of a Borrowed book. Returns false when the book is
    /// not Borrowed.
    pub async fn set_due_date(&self, isbn: &str, due: DateTime<Utc>) -> Result<bool, ApiError> {
        let done = sqlx::query(
            "UPDATE books SET due_date = ? WHERE isbn = ? AND status = 'Borrowed'",
        )
        .bind(due)
        .bind(isbn)
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected() > 0)
    }

    /// Test utility behind the admin force-due-soon endpoint: mark the book
    /// Borrowed (if it is not already) and pin its due date.
    pub async fn force_borrowed_due(
        &self,
        isbn: &str,
        due: DateTime<Utc>,
    ) -> Result<bool, ApiError> {
        let done = sqlx::query(
            "UPDATE books SET status = 'Borrowed', due_date = ? WHERE isbn = ?",
        )
        .bind(due)
        .bind(isbn)
        .execute(&self.pool)
        .await?;
        Ok(done.rows_affected() > 0)
    }

    /// Borrowed books joined with their borrowers, for the admin list.
    pub async fn borrowed_with_members(&self) -> Result<Vec<BorrowedBook>, ApiError> {
        let rows = sqlx::query_as::<_, BorrowedBook>(
            "SELECT b.id, b.title, b.isbn, b.due_date, b.borrowed_by, m.username, m.email
             FROM books b
             JOIN members m ON m.id = b.borrowed_by
             WHERE b.status = 'Borrowed'
             ORDER BY b.due_date ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Borrowed books whose due date falls inside [from, to], with their
    /// borrowers. Drives the due-soon sweep.
    pub async fn due_within(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BorrowedBook>, ApiError> {
        let rows = sqlx::query_as::<_, BorrowedBook>(
            "SELECT b.id, b.title, b.isbn, b.due_date, b.borrowed_by, m.username, m.email
             FROM books b
             JOIN members m ON m.id = b.borrowed_by
             WHERE b.status = 'Borrowed' AND b.due_date >= ? AND b.due_date <= ?",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Available books in a genre, capped, for recommendations.
    pub async fn available_by_genre(
        &self,
        genre: &str,
        limit: i64,
    ) -> Result<Vec<Book>, ApiError> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE genre = ? AND status = 'Available' LIMIT ?",
        )
        .bind(genre)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    /// Books currently held by a member, soonest due first.
    pub async fn borrowed_by_member(&self, member_id: i64) -> Result<Vec<Book>, ApiError> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE borrowed_by = ? ORDER BY due_date ASC",
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    pub async fn count_books(&self) -> Result<i64, ApiError> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}
