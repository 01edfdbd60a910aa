//! HTTP API for the library service.
//!
//! Route groups:
//! - `/api/auth` — registration and login
//! - `/api/books` — public catalog plus admin CRUD
//! - `/api/member` — borrowing actions for approved members
//! - `/api/admin` — approvals, issue/return, due dates, notices

mod caller;
pub mod handlers;

pub use caller::Caller;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::TokenKeys;
use crate::config::ServiceConfig;
use crate::notify::NotificationSender;
use crate::store::Store;

/// Shared state for API handlers.
pub struct ApiState {
    /// The document store.
    pub store: Store,

    /// Token signing/verification keys.
    pub tokens: TokenKeys,

    /// Injected notice transport; handlers and the scheduler share it.
    pub notifier: Arc<dyn NotificationSender>,

    /// From-address stamped on outgoing notices.
    pub mail_from: String,
}

impl ApiState {
    pub fn new(
        store: Store,
        config: &ServiceConfig,
        notifier: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            store,
            tokens: TokenKeys::new(&config.jwt_secret),
            notifier,
            mail_from: config.mail_from.clone(),
        }
    }
}

/// Build the API router with all routes.
pub fn router(state: Arc<ApiState>) -> Router {
    // Permissive CORS: the frontend is served separately in development.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::status::health))
        // Auth
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/me", get(handlers::auth::me))
        // Catalog (public reads, admin writes)
        .route(
            "/api/books",
            get(handlers::books::list).post(handlers::books::add),
        )
        // GET looks up by isbn; PUT/DELETE address the row id.
        .route(
            "/api/books/:key",
            get(handlers::books::get_by_isbn)
                .put(handlers::books::update)
                .delete(handlers::books::delete),
        )
        // Member actions (approved members only)
        .route("/api/member/my-books", get(handlers::member::my_books))
        .route("/api/member/borrow", post(handlers::member::borrow))
        .route("/api/member/return", post(handlers::member::return_book))
        .route(
            "/api/member/recommendations",
            get(handlers::member::recommendations),
        )
        .route("/api/member/requests", get(handlers::member::my_requests))
        .route(
            "/api/member/request-borrow",
            post(handlers::member::request_borrow),
        )
        // Admin: registration approval
        .route("/api/admin/pending-users", get(handlers::admin::pending_users))
        .route(
            "/api/admin/approve-user/:id",
            post(handlers::admin::approve_user),
        )
        .route(
            "/api/admin/reject-user/:id",
            post(handlers::admin::reject_user),
        )
        // Admin: borrow requests
        .route("/api/admin/requests", get(handlers::admin::list_requests))
        .route(
            "/api/admin/requests/:id/approve",
            post(handlers::admin::approve_request),
        )
        .route(
            "/api/admin/requests/:id/reject",
            post(handlers::admin::reject_request),
        )
        // Admin: lifecycle
        .route("/api/admin/issue", post(handlers::admin::issue))
        .route("/api/admin/borrowed", get(handlers::admin::borrowed))
        .route("/api/admin/return", post(handlers::admin::return_book))
        .route(
            "/api/admin/borrowed/:isbn/due-date",
            post(handlers::admin::update_due_date),
        )
        .route(
            "/api/admin/force-due-soon",
            post(handlers::admin::force_due_soon),
        )
        // Admin: notices and seeding
        .route(
            "/api/admin/send-due-notices",
            post(handlers::admin::send_due_notices),
        )
        .route(
            "/api/admin/send-test-email",
            post(handlers::admin::send_test_email),
        )
        .route("/api/admin/seed-books", post(handlers::admin::seed_books))
        // Middleware
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                })
                .on_request(())
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        let status = response.status();
                        if !status.is_success() {
                            tracing::warn!(
                                status = %status,
                                latency_ms = latency.as_millis(),
                                "request failed"
                            );
                        }
                    },
                ),
        )
        .with_state(state)
}

/// Start the API server.
pub async fn serve(state: Arc<ApiState>, bind_addr: &str) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;

    tracing::info!("API listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
