//! Bibliotheca - library management service.
//!
//! Members browse and request books; admins approve registrations and
//! borrow requests, issue and return books, manage due dates, and trigger
//! email reminders.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        API (axum)                        │
//! │  auth / books / member / admin handlers, Caller policy   │
//! └──────────────┬─────────────────────────┬─────────────────┘
//!                │                         │
//! ┌──────────────┴───────────┐ ┌───────────┴────────────────┐
//! │     LENDING ENGINE       │ │     NOTIFY                 │
//! │  issue / return /        │ │  due-soon sweep, daily     │
//! │  due dates / recommend   │ │  scheduler, sender seam    │
//! └──────────────┬───────────┘ └───────────┬────────────────┘
//!                │                         │
//! ┌──────────────┴─────────────────────────┴─────────────────┐
//! │                    STORE (sqlx / SQLite)                 │
//! │  books, members, borrow_requests; CAS status updates     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The one concurrency-sensitive path is issuing a book: the
//! Available->Borrowed transition is a single conditional UPDATE, so two
//! concurrent issues on the same copy cannot both succeed.

/// Password hashing and bearer tokens.
pub mod auth;

/// Service configuration.
pub mod config;

/// Error kinds and HTTP mapping.
pub mod error;

/// Borrow lifecycle engine.
pub mod lending;

/// Record types.
pub mod models;

/// Outgoing notices and the due-soon scheduler.
pub mod notify;

/// SQLite-backed stores.
pub mod store;

/// REST API.
pub mod api;

// === Re-exports ===

pub use config::ServiceConfig;
pub use error::ApiError;
pub use models::{Book, BookStatus, BorrowRequest, Member, RequestStatus, Role};
pub use store::Store;
