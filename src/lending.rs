//! Borrow lifecycle engine.
//!
//! A book moves `Available --issue--> Borrowed --return--> Available`; an
//! admin may move the due date of a Borrowed book in place. There are no
//! other transitions. Lateness is never stored: it is `now > due_date`
//! evaluated at the moment of the check, so a book can drift into being
//! late with no state change at all.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::error::ApiError;
use crate::notify::{due_date_change_notice, NotificationSender};
use crate::store::Store;

/// Fixed borrowing window applied at issue/approval time.
pub const DUE_PERIOD_DAYS: i64 = 14;

/// Cap on genre recommendations.
const RECOMMEND_LIMIT: i64 = 3;

/// Issue a book to a member: Available -> Borrowed with a fresh 14-day due
/// date. The availability check and the transition are one atomic
/// conditional update, so concurrent issues on the same copy cannot both
/// succeed. Also records the book's genre as the member's latest, feeding
/// recommendations.
///
/// The caller is responsible for having resolved `member_id` to a real
/// member.
pub async fn issue(store: &Store, isbn: &str, member_id: i64) -> Result<DateTime<Utc>, ApiError> {
    let book = store
        .book_by_isbn(isbn)
        .await?
        .ok_or_else(|| ApiError::NotFound("Book not found".into()))?;

    let due = Utc::now() + Duration::days(DUE_PERIOD_DAYS);
    if !store.try_borrow(isbn, member_id, due).await? {
        return Err(ApiError::Conflict("Book not available".into()));
    }

    if let Some(genre) = &book.genre {
        store.set_last_genre(member_id, genre).await?;
    }

    Ok(due)
}

/// Return a book: Borrowed -> Available. `holder` scopes the lookup for
/// member self-returns (members may only return their own copy); admins
/// pass None and may return any copy. Reports whether the return was late,
/// computed against the due date before it is cleared.
pub async fn return_book(
    store: &Store,
    isbn: &str,
    holder: Option<i64>,
) -> Result<bool, ApiError> {
    let book = match holder {
        Some(member_id) => store.book_held_by(isbn, member_id).await?.ok_or_else(|| {
            ApiError::NotFound("Book not found or not borrowed by you".into())
        })?,
        None => store
            .book_by_isbn(isbn)
            .await?
            .ok_or_else(|| ApiError::NotFound("Book not found".into()))?,
    };

    if book.status != crate::models::BookStatus::Borrowed {
        return Err(ApiError::Conflict("Book is not borrowed".into()));
    }

    let late = book.due_date.is_some_and(|due| Utc::now() > due);

    if !store.try_release(isbn, holder).await? {
        // Lost the race against another return.
        return Err(ApiError::Conflict("Book is not borrowed".into()));
    }

    Ok(late)
}

/// Move the due date of a Borrowed book, then notify the borrower
/// best-effort in the background. Notification failures are logged, never
/// surfaced.
pub async fn update_due_date(
    store: &Store,
    notifier: Arc<dyn NotificationSender>,
    mail_from: &str,
    isbn: &str,
    new_due: DateTime<Utc>,
) -> Result<DateTime<Utc>, ApiError> {
    let book = store
        .book_by_isbn(isbn)
        .await?
        .ok_or_else(|| ApiError::NotFound("Book not found".into()))?;

    if book.status != crate::models::BookStatus::Borrowed {
        return Err(ApiError::Conflict("Book is not borrowed".into()));
    }

    let old_due = book.due_date;
    if !store.set_due_date(isbn, new_due).await? {
        return Err(ApiError::Conflict("Book is not borrowed".into()));
    }

    if let Some(borrower_id) = book.borrowed_by {
        let store = store.clone();
        let from = mail_from.to_string();
        let title = book.title.clone();
        tokio::spawn(async move {
            let borrower = match store.member_by_id(borrower_id).await {
                Ok(Some(m)) => m,
                Ok(None) => return,
                Err(e) => {
                    warn!(error = %e, "could not resolve borrower for due-date notice");
                    return;
                }
            };
            let message = due_date_change_notice(
                &from,
                &borrower.email,
                &borrower.username,
                &title,
                old_due,
                new_due,
            );
            if let Err(e) = notifier.send(&message).await {
                warn!(to = %borrower.email, error = %e, "due-date change notice failed");
            }
        });
    }

    Ok(new_due)
}

/// Up to three Available books sharing the member's last borrowed genre.
/// Empty when the member has no recorded genre (or no longer exists).
pub async fn recommend(
    store: &Store,
    member_id: i64,
) -> Result<Vec<crate::models::Book>, ApiError> {
    let member = match store.member_by_id(member_id).await? {
        Some(m) => m,
        None => return Ok(Vec::new()),
    };

    match member.last_genre {
        Some(genre) => store.available_by_genre(&genre, RECOMMEND_LIMIT).await,
        None => Ok(Vec::new()),
    }
}
