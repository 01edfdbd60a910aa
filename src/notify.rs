//! Outgoing notices: the injected sender seam, the due-soon sweep, and the
//! daily scheduler task.
//!
//! The transport is a collaborator, not part of this service, so everything
//! here talks to a [`NotificationSender`] trait object handed in at
//! construction. The default [`JsonTransport`] mirrors a dev mail transport:
//! it serializes the message into the log and always succeeds.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::error::ApiError;
use crate::models::BorrowedBook;
use crate::store::Store;

/// Reminders go out for books due within this window.
const DUE_SOON_WINDOW_HOURS: i64 = 24;

/// How often the scheduler sweeps.
const SWEEP_PERIOD: std::time::Duration = std::time::Duration::from_secs(24 * 60 * 60);

/// A single outgoing email.
#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Transport seam for outgoing notices. Implementations decide delivery;
/// callers treat every send as best-effort.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<()>;
}

/// Dev transport: logs the message as JSON instead of delivering it.
pub struct JsonTransport;

#[async_trait]
impl NotificationSender for JsonTransport {
    async fn send(&self, message: &EmailMessage) -> anyhow::Result<()> {
        let body = serde_json::to_string(message)?;
        info!(to = %message.to, subject = %message.subject, payload = %body, "email (json transport)");
        Ok(())
    }
}

/// Reminder for a book due within the window.
pub fn due_soon_notice(from: &str, entry: &BorrowedBook) -> EmailMessage {
    let due = entry
        .due_date
        .map(format_date)
        .unwrap_or_else(|| "soon".to_string());
    EmailMessage {
        from: from.to_string(),
        to: entry.email.clone(),
        subject: format!("Reminder: '{}' is due soon", entry.title),
        text: format!(
            "Hello {},\n\nYour borrowed book '{}' is due on {}. Please return it on time.",
            entry.username, entry.title, due
        ),
    }
}

/// Notice that an admin moved a book's due date.
pub fn due_date_change_notice(
    from: &str,
    to: &str,
    username: &str,
    title: &str,
    old_due: Option<DateTime<Utc>>,
    new_due: DateTime<Utc>,
) -> EmailMessage {
    let old = old_due.map(format_date).unwrap_or_else(|| "N/A".to_string());
    EmailMessage {
        from: from.to_string(),
        to: to.to_string(),
        subject: format!("Due Date Updated for '{}'", title),
        text: format!(
            "Hello {},\n\nYour due date for '{}' has been updated from {} to {}.\n\n\
             Please make sure to return the book by the new due date.\n\n\
             Thank you,\nLibrary Management System",
            username,
            title,
            old,
            format_date(new_due)
        ),
    }
}

fn format_date(d: DateTime<Utc>) -> String {
    d.format("%a %b %d %Y").to_string()
}

/// Sweep for books due within the next 24 hours and send one reminder per
/// book. Each dispatch is independent: a failed send is logged and skipped,
/// never retried. Returns the number of notices dispatched.
pub async fn send_due_soon_notices(
    store: &Store,
    sender: &dyn NotificationSender,
    mail_from: &str,
) -> Result<usize, ApiError> {
    let now = Utc::now();
    let due_soon = store
        .due_within(now, now + Duration::hours(DUE_SOON_WINDOW_HOURS))
        .await?;

    let mut sent = 0;
    for entry in &due_soon {
        let message = due_soon_notice(mail_from, entry);
        match sender.send(&message).await {
            Ok(()) => sent += 1,
            Err(e) => warn!(isbn = %entry.isbn, to = %entry.email, error = %e, "due-soon notice failed"),
        }
    }

    if sent > 0 {
        info!(count = sent, "due notices sent");
    }
    Ok(sent)
}

/// Start the daily due-soon sweep in a background task. The first sweep
/// runs one period after startup, then on every tick; overlap with a manual
/// admin trigger is tolerated.
pub fn spawn_scheduler(
    store: Store,
    sender: Arc<dyn NotificationSender>,
    mail_from: String,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_PERIOD);
        // The first tick completes immediately; consume it so the sweep
        // starts one full period after boot.
        interval.tick().await;

        loop {
            interval.tick().await;
            if let Err(e) = send_due_soon_notices(&store, sender.as_ref(), &mail_from).await {
                error!(error = %e, "scheduled due-soon sweep failed");
            }
        }
    })
}
