//! SQLite-backed persistence for books, members, and borrow requests.
//!
//! One [`Store`] wraps the connection pool; the per-entity operations live
//! in the submodules. Single-record conditional updates (compare-and-set on
//! book status) are the only concurrency control the domain needs.

mod books;
mod members;
mod requests;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};

use crate::auth;
use crate::config::AdminSeed;
use crate::error::ApiError;
use crate::models::Role;

/// Handle to the document store. Cheap to clone; all clones share the pool.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if missing) the database at `path` and ensure the
    /// schema exists.
    pub async fn connect(path: &str) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(ApiError::from)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "
            CREATE TABLE IF NOT EXISTS members (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'member',
                approved INTEGER NOT NULL DEFAULT 0,
                last_genre TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "
            CREATE TABLE IF NOT EXISTS books (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                author TEXT NOT NULL,
                isbn TEXT NOT NULL UNIQUE,
                genre TEXT,
                description TEXT NOT NULL DEFAULT '',
                cover_image TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'Available',
                borrowed_by INTEGER REFERENCES members(id),
                due_date TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "
            CREATE TABLE IF NOT EXISTS borrow_requests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                member_id INTEGER NOT NULL REFERENCES members(id),
                book_isbn TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // At most one pending request per (member, isbn). The application
        // checks first for a friendly error; this index closes the race.
        sqlx::query(
            "
            CREATE UNIQUE INDEX IF NOT EXISTS pending_request_once
                ON borrow_requests (member_id, book_isbn)
                WHERE status = 'pending'
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Seed (or refresh) the admin account from configuration. An existing
    /// row under the same email is promoted and its credentials reset.
    pub async fn seed_admin(&self, seed: &AdminSeed) -> Result<(), ApiError> {
        let hash = auth::hash_password(&seed.password)
            .map_err(|e| ApiError::Internal(e.into()))?;

        match self.member_by_email(&seed.email).await? {
            Some(existing) => {
                sqlx::query(
                    "UPDATE members
                     SET username = ?, password_hash = ?, role = ?, approved = 1
                     WHERE id = ?",
                )
                .bind(&seed.username)
                .bind(&hash)
                .bind(Role::Admin)
                .bind(existing.id)
                .execute(&self.pool)
                .await?;
                tracing::info!(email = %seed.email, "refreshed seeded admin account");
            }
            None => {
                sqlx::query(
                    "INSERT INTO members
                        (username, email, password_hash, role, approved, created_at)
                     VALUES (?, ?, ?, ?, 1, ?)",
                )
                .bind(&seed.username)
                .bind(&seed.email)
                .bind(&hash)
                .bind(Role::Admin)
                .bind(chrono::Utc::now())
                .execute(&self.pool)
                .await?;
                tracing::info!(email = %seed.email, "seeded admin account");
            }
        }

        Ok(())
    }
}
