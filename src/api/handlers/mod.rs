//! API handlers, grouped by route prefix.

pub mod admin;
pub mod auth;
pub mod books;
pub mod member;
pub mod status;
