//! Membership store operations.

use chrono::Utc;

use crate::error::{is_unique_violation, ApiError};
use crate::models::{Member, NewMember};

use super::Store;

impl Store {
    /// Create an account row. Duplicate emails are a conflict (the email is
    /// the unique identity key).
    pub async fn insert_member(&self, new: &NewMember) -> Result<i64, ApiError> {
        let result = sqlx::query(
            "INSERT INTO members (username, email, password_hash, role, approved, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.role)
        .bind(new.approved)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.last_insert_rowid()),
            Err(e) if is_unique_violation(&e) => {
                Err(ApiError::Conflict("Email already in use".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn member_by_email(&self, email: &str) -> Result<Option<Member>, ApiError> {
        let member = sqlx::query_as::<_, Member>("SELECT * FROM members WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(member)
    }

    pub async fn member_by_id(&self, id: i64) -> Result<Option<Member>, ApiError> {
        let member = sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(member)
    }

    /// Registrations awaiting review, newest first.
    pub async fn pending_members(&self) -> Result<Vec<Member>, ApiError> {
        let members = sqlx::query_as::<_, Member>(
            "SELECT * FROM members
             WHERE approved = 0 AND role = 'member'
             ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    pub async fn set_approved(&self, id: i64) -> Result<(), ApiError> {
        sqlx::query("UPDATE members SET approved = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Hard-delete a member row (registration rejection). The email becomes
    /// available for re-registration.
    pub async fn delete_member(&self, id: i64) -> Result<(), ApiError> {
        sqlx::query("DELETE FROM members WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Remember the genre of the member's latest borrow, for
    /// recommendations.
    pub async fn set_last_genre(&self, id: i64, genre: &str) -> Result<(), ApiError> {
        sqlx::query("UPDATE members SET last_genre = ? WHERE id = ?")
            .bind(genre)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn count_members(&self) -> Result<i64, ApiError> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM members")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}
