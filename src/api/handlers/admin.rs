//! Admin handlers: registration approval, borrow-request review, issue and
//! return, due-date management, notices, and catalog seeding.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::{ApiState, Caller};
use crate::error::ApiError;
use crate::lending;
use crate::models::{BorrowedBook, Member, NewBook, PendingRequest, RequestStatus};
use crate::notify::{self, EmailMessage};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    pub book_isbn: String,
    pub member_email: String,
}

/// Issue a book to a member by email (the over-the-counter flow).
pub async fn issue(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Json(req): Json<IssueRequest>,
) -> Result<Json<Value>, ApiError> {
    caller.require_admin()?;

    if req.book_isbn.trim().is_empty() || req.member_email.trim().is_empty() {
        return Err(ApiError::InvalidInput("Missing fields".into()));
    }

    let member = state
        .store
        .member_by_email(req.member_email.trim())
        .await?
        .ok_or_else(|| ApiError::NotFound("Member not found".into()))?;

    let due = lending::issue(&state.store, req.book_isbn.trim(), member.id).await?;
    Ok(Json(json!({ "ok": true, "dueDate": due })))
}

/// Registrations awaiting review.
pub async fn pending_users(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
) -> Result<Json<Vec<Member>>, ApiError> {
    caller.require_admin()?;
    Ok(Json(state.store.pending_members().await?))
}

/// Accept a registration. Approving twice is an error so the admin UI can
/// tell a stale screen from a successful click.
pub async fn approve_user(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    caller.require_admin()?;

    let member = state
        .store
        .member_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    if member.approved {
        return Err(ApiError::Conflict("User already approved".into()));
    }

    state.store.set_approved(id).await?;
    Ok(Json(json!({ "ok": true, "message": "User approved" })))
}

/// Reject a registration. This hard-deletes the row; the email becomes
/// available again.
pub async fn reject_user(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    caller.require_admin()?;

    state
        .store
        .member_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    state.store.delete_member(id).await?;
    Ok(Json(json!({ "ok": true, "message": "User registration rejected" })))
}

/// Pending borrow requests with requester identity.
pub async fn list_requests(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
) -> Result<Json<Vec<PendingRequest>>, ApiError> {
    caller.require_admin()?;
    Ok(Json(state.store.pending_requests().await?))
}

/// Approve a borrow request: issues the book to the requester through the
/// same path as a direct issue, then marks the request approved.
pub async fn approve_request(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    caller.require_admin()?;

    let request = state
        .store
        .request_by_id(id)
        .await?
        .filter(|r| r.status == RequestStatus::Pending)
        .ok_or_else(|| ApiError::NotFound("Request not found".into()))?;

    let due = lending::issue(&state.store, &request.book_isbn, request.member_id).await?;
    state
        .store
        .set_request_status(id, RequestStatus::Approved)
        .await?;

    Ok(Json(json!({ "ok": true, "dueDate": due })))
}

/// Reject a borrow request. No effect on the book.
pub async fn reject_request(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    caller.require_admin()?;

    state
        .store
        .request_by_id(id)
        .await?
        .filter(|r| r.status == RequestStatus::Pending)
        .ok_or_else(|| ApiError::NotFound("Request not found".into()))?;

    state
        .store
        .set_request_status(id, RequestStatus::Rejected)
        .await?;
    Ok(Json(json!({ "ok": true })))
}

/// All borrowed books with borrower identity.
pub async fn borrowed(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
) -> Result<Json<Vec<BorrowedBook>>, ApiError> {
    caller.require_admin()?;
    Ok(Json(state.store.borrowed_with_members().await?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    pub book_isbn: String,
}

/// Return any borrowed copy, regardless of holder.
pub async fn return_book(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Json(req): Json<ReturnRequest>,
) -> Result<Json<Value>, ApiError> {
    caller.require_admin()?;

    if req.book_isbn.trim().is_empty() {
        return Err(ApiError::InvalidInput("Missing fields".into()));
    }

    let late = lending::return_book(&state.store, req.book_isbn.trim(), None).await?;
    Ok(Json(json!({ "ok": true, "late": late })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DueDateRequest {
    pub due_date: Option<String>,
}

/// Move a borrowed book's due date. The borrower is notified best-effort
/// in the background.
pub async fn update_due_date(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Path(isbn): Path<String>,
    Json(req): Json<DueDateRequest>,
) -> Result<Json<Value>, ApiError> {
    caller.require_admin()?;

    let raw = req
        .due_date
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::InvalidInput("Missing dueDate".into()))?;

    let new_due = parse_due_date(raw)
        .ok_or_else(|| ApiError::InvalidInput("Invalid dueDate format".into()))?;

    let due = lending::update_due_date(
        &state.store,
        state.notifier.clone(),
        &state.mail_from,
        &isbn,
        new_due,
    )
    .await?;

    Ok(Json(json!({ "ok": true, "dueDate": due })))
}

/// Accept RFC 3339 timestamps or a bare `YYYY-MM-DD` taken as midnight
/// UTC.
fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForceDueSoonRequest {
    pub book_isbn: String,
    pub hours: Option<i64>,
}

/// Testing utility: force a book Borrowed with a due date N hours from now
/// (default 1), so the due-soon sweep and late-return paths can be
/// exercised without waiting two weeks.
pub async fn force_due_soon(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Json(req): Json<ForceDueSoonRequest>,
) -> Result<Json<Value>, ApiError> {
    caller.require_admin()?;

    if req.book_isbn.trim().is_empty() {
        return Err(ApiError::InvalidInput("Missing bookIsbn".into()));
    }

    let due = Utc::now() + Duration::hours(req.hours.unwrap_or(1));
    if !state
        .store
        .force_borrowed_due(req.book_isbn.trim(), due)
        .await?
    {
        return Err(ApiError::NotFound("Book not found".into()));
    }

    Ok(Json(json!({ "ok": true, "dueDate": due })))
}

/// Run the due-soon sweep right now and report how many notices went out.
pub async fn send_due_notices(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
) -> Result<Json<Value>, ApiError> {
    caller.require_admin()?;

    let sent =
        notify::send_due_soon_notices(&state.store, state.notifier.as_ref(), &state.mail_from)
            .await?;
    Ok(Json(json!({ "sent": sent })))
}

#[derive(Deserialize)]
pub struct TestEmailRequest {
    pub to: Option<String>,
    pub subject: Option<String>,
    pub text: Option<String>,
}

/// Send a direct test email through the configured transport.
pub async fn send_test_email(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
    Json(req): Json<TestEmailRequest>,
) -> Result<Json<Value>, ApiError> {
    caller.require_admin()?;

    let to = req
        .to
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::InvalidInput("Missing to".into()))?;

    let message = EmailMessage {
        from: state.mail_from.clone(),
        to: to.to_string(),
        subject: req.subject.unwrap_or_else(|| "LMS Test Email".into()),
        text: req
            .text
            .unwrap_or_else(|| "This is a test email from your Library Management System.".into()),
    };

    state
        .notifier
        .send(&message)
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(json!({ "ok": true })))
}

/// Seed the sample catalog, skipping ISBNs that already exist.
pub async fn seed_books(
    State(state): State<Arc<ApiState>>,
    caller: Caller,
) -> Result<Json<Value>, ApiError> {
    caller.require_admin()?;

    let mut created = 0;
    for sample in sample_catalog() {
        if state.store.book_by_isbn(&sample.isbn).await?.is_none() {
            state.store.insert_book(&sample).await?;
            created += 1;
        }
    }

    let total = state.store.count_books().await?;
    Ok(Json(json!({ "created": created, "total": total })))
}

fn sample_catalog() -> Vec<NewBook> {
    fn book(title: &str, author: &str, genre: &str, isbn: &str, description: &str) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: author.to_string(),
            isbn: isbn.to_string(),
            genre: Some(genre.to_string()),
            description: description.to_string(),
            cover_image: format!("https://covers.lms.local/{}.jpg", isbn),
        }
    }

    vec![
        book(
            "The Silent Sea",
            "L. Carter",
            "Sci-Fi",
            "9780000001001",
            "A voyage across an unforgiving void to find a new home.",
        ),
        book(
            "Gardens of Dawn",
            "M. Singh",
            "Romance",
            "9780000001002",
            "Love blooms with the first light over the valley.",
        ),
        book(
            "Codebreakers",
            "A. Rivera",
            "Tech",
            "9780000001003",
            "A gripping tale of hackers, ciphers, and global stakes.",
        ),
        book(
            "The Last Kingdom",
            "J. Warren",
            "Fantasy",
            "9780000001004",
            "An heir fights destiny to reclaim a fractured throne.",
        ),
        book(
            "Deep Blue",
            "R. Okoye",
            "Thriller",
            "9780000001005",
            "A submarine chase beneath the polar ice.",
        ),
        book(
            "Quantum Garden",
            "E. Petrov",
            "Sci-Fi",
            "9780000001006",
            "Where physics bends, realities bloom.",
        ),
        book(
            "Midnight Library",
            "T. Huang",
            "Literary",
            "9780000001007",
            "Between pages and choices, a life rewritten.",
        ),
        book(
            "Data Dreams",
            "K. Ahmed",
            "Tech",
            "9780000001008",
            "Building intelligent systems that feel almost human.",
        ),
        book(
            "Echoes of War",
            "S. Novak",
            "History",
            "9780000001009",
            "From letters at the front to the home they left behind.",
        ),
        book(
            "Moonlit Paths",
            "Y. Tanaka",
            "Poetry",
            "9780000001010",
            "Verses woven from night and wanderers.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_date_parsing_accepts_both_forms() {
        assert!(parse_due_date("2026-09-10T12:30:00Z").is_some());
        assert!(parse_due_date("2026-09-10T12:30:00+02:00").is_some());

        let midnight = parse_due_date("2026-09-10").unwrap();
        assert_eq!(midnight.to_rfc3339(), "2026-09-10T00:00:00+00:00");

        assert!(parse_due_date("next tuesday").is_none());
        assert!(parse_due_date("").is_none());
    }
}
