//! End-to-end tests driving the router the way the frontend does: register,
//! approve, borrow-request, issue, due dates, return.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use bibliotheca::{
    api::{self, ApiState},
    config::{AdminSeed, ServiceConfig},
    notify::JsonTransport,
    store::Store,
};

const ADMIN_EMAIL: &str = "admin@lms.local";
const ADMIN_PASSWORD: &str = "admin-pass";

async fn test_app() -> (TempDir, Router) {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("test.db");
    let store = Store::connect(path.to_str().unwrap()).await.unwrap();

    store
        .seed_admin(&AdminSeed {
            username: "admin".into(),
            email: ADMIN_EMAIL.into(),
            password: ADMIN_PASSWORD.into(),
        })
        .await
        .unwrap();

    let config = ServiceConfig::default().with_jwt_secret("integration-test-secret");
    let state = Arc::new(ApiState::new(store, &config, Arc::new(JsonTransport)));
    (temp, api::router(state))
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn post(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        post(
            "/api/auth/login",
            None,
            json!({ "email": email, "password": password }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["token"].as_str().unwrap().to_string()
}

async fn add_book(app: &Router, admin: &str, isbn: &str, genre: &str) {
    let (status, body) = send(
        app,
        post(
            "/api/books",
            Some(admin),
            json!({
                "title": format!("Book {isbn}"),
                "author": "A. Author",
                "isbn": isbn,
                "genre": genre,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "add book failed: {body}");
}

#[tokio::test]
async fn full_borrow_request_lifecycle() {
    let (_temp, app) = test_app().await;

    // Register a member; the account starts unapproved.
    let (status, body) = send(
        &app,
        post(
            "/api/auth/register",
            None,
            json!({
                "username": "ada",
                "email": "ada@example.com",
                "password": "lovelace"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let member_id = body["id"].as_i64().unwrap();
    assert!(body["message"].as_str().unwrap().contains("approval"));

    // Login is refused with the dedicated pending-approval message.
    let (status, body) = send(
        &app,
        post(
            "/api/auth/login",
            None,
            json!({ "email": "ada@example.com", "password": "lovelace" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Account pending approval");

    // Admin approves the registration.
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let (status, body) = send(&app, get("/api/admin/pending-users", Some(&admin))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["email"], "ada@example.com");
    assert!(body[0].get("passwordHash").is_none());

    let (status, _) = send(
        &app,
        post(
            &format!("/api/admin/approve-user/{member_id}"),
            Some(&admin),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Approving again is an error.
    let (status, body) = send(
        &app,
        post(
            &format!("/api/admin/approve-user/{member_id}"),
            Some(&admin),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User already approved");

    // Member can log in now.
    let member = login(&app, "ada@example.com", "lovelace").await;

    // Catalog is publicly listable.
    add_book(&app, &admin, "9780000001001", "Sci-Fi").await;
    let (status, body) = send(&app, get("/api/books", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["status"], "Available");

    // Member requests the book; a duplicate pending request is refused.
    let (status, body) = send(
        &app,
        post(
            "/api/member/request-borrow",
            Some(&member),
            json!({ "bookIsbn": "9780000001001" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let request_id = body["requestId"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        post(
            "/api/member/request-borrow",
            Some(&member),
            json!({ "bookIsbn": "9780000001001" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Already requested");

    // Admin sees the request with the requester's identity and approves.
    let (status, body) = send(&app, get("/api/admin/requests", Some(&admin))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["username"], "ada");
    assert_eq!(body[0]["bookIsbn"], "9780000001001");

    let (status, body) = send(
        &app,
        post(
            &format!("/api/admin/requests/{request_id}/approve"),
            Some(&admin),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["dueDate"].is_string());

    // The book is now Borrowed by the member, due ~14 days out.
    let (status, body) = send(&app, get("/api/books/9780000001001", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Borrowed");
    assert_eq!(body["borrowedBy"].as_i64().unwrap(), member_id);
    let due: chrono::DateTime<chrono::Utc> =
        body["dueDate"].as_str().unwrap().parse().unwrap();
    let days_out = (due - chrono::Utc::now()).num_days();
    assert!((13..=14).contains(&days_out), "due {days_out} days out");

    // Borrowing recorded the genre for recommendations.
    add_book(&app, &admin, "9780000001002", "Sci-Fi").await;
    let (status, body) = send(&app, get("/api/member/recommendations", Some(&member))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["genre"], "Sci-Fi");

    // Approving the resolved request again: gone from the pending list.
    let (status, body) = send(
        &app,
        post(
            &format!("/api/admin/requests/{request_id}/approve"),
            Some(&admin),
            json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Request not found");

    // Member returns the copy on time.
    let (status, body) = send(
        &app,
        post(
            "/api/member/return",
            Some(&member),
            json!({ "bookIsbn": "9780000001001" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["late"], false);

    let (_, body) = send(&app, get("/api/books/9780000001001", None)).await;
    assert_eq!(body["status"], "Available");
    assert!(body["borrowedBy"].is_null());
    assert!(body["dueDate"].is_null());
}

#[tokio::test]
async fn issue_conflicts_when_already_borrowed() {
    let (_temp, app) = test_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    add_book(&app, &admin, "1", "Tech").await;

    let issue = json!({ "bookIsbn": "1", "memberEmail": ADMIN_EMAIL });
    let (status, _) = send(&app, post("/api/admin/issue", Some(&admin), issue.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, post("/api/admin/issue", Some(&admin), issue)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Book not available");
}

#[tokio::test]
async fn forced_past_due_return_reports_late() {
    let (_temp, app) = test_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    add_book(&app, &admin, "1", "Tech").await;

    let (status, _) = send(
        &app,
        post(
            "/api/admin/issue",
            Some(&admin),
            json!({ "bookIsbn": "1", "memberEmail": ADMIN_EMAIL }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Force the due date an hour into the past.
    let (status, _) = send(
        &app,
        post(
            "/api/admin/force-due-soon",
            Some(&admin),
            json!({ "bookIsbn": "1", "hours": -1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        post("/api/admin/return", Some(&admin), json!({ "bookIsbn": "1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["late"], true);
}

#[tokio::test]
async fn rejected_registration_frees_the_email() {
    let (_temp, app) = test_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let register = json!({
        "username": "bob",
        "email": "bob@example.com",
        "password": "secret-pw"
    });
    let (status, body) = send(&app, post("/api/auth/register", None, register.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let id = body["id"].as_i64().unwrap();

    // Registering the same email again conflicts while the row exists.
    let (status, _) = send(&app, post("/api/auth/register", None, register.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post(&format!("/api/admin/reject-user/{id}"), Some(&admin), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, get("/api/admin/pending-users", Some(&admin))).await;
    assert!(body.as_array().unwrap().is_empty());

    // The email is available again.
    let (status, _) = send(&app, post("/api/auth/register", None, register)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn authorization_gates_are_distinct() {
    let (_temp, app) = test_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    // No token at all.
    let (status, body) = send(&app, get("/api/admin/pending-users", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    // Garbage token.
    let (status, body) = send(&app, get("/api/admin/pending-users", Some("nope"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token");

    // Approved member hitting an admin route: forbidden, not pending.
    let (_, body) = send(
        &app,
        post(
            "/api/auth/register",
            None,
            json!({
                "username": "eve",
                "email": "eve@example.com",
                "password": "secret-pw"
            }),
        ),
    )
    .await;
    let id = body["id"].as_i64().unwrap();
    send(
        &app,
        post(&format!("/api/admin/approve-user/{id}"), Some(&admin), json!({})),
    )
    .await;
    let member = login(&app, "eve@example.com", "secret-pw").await;

    let (status, body) = send(&app, get("/api/admin/pending-users", Some(&member))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");

    // Member routes work for the approved member.
    let (status, _) = send(&app, get("/api/member/my-books", Some(&member))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn due_date_update_validates_input_and_state() {
    let (_temp, app) = test_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    add_book(&app, &admin, "1", "Tech").await;

    // Not borrowed yet.
    let (status, body) = send(
        &app,
        post(
            "/api/admin/borrowed/1/due-date",
            Some(&admin),
            json!({ "dueDate": "2030-01-01" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Book is not borrowed");

    let (status, _) = send(
        &app,
        post(
            "/api/admin/issue",
            Some(&admin),
            json!({ "bookIsbn": "1", "memberEmail": ADMIN_EMAIL }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Unparsable date.
    let (status, body) = send(
        &app,
        post(
            "/api/admin/borrowed/1/due-date",
            Some(&admin),
            json!({ "dueDate": "whenever" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid dueDate format");

    // Valid update.
    let (status, body) = send(
        &app,
        post(
            "/api/admin/borrowed/1/due-date",
            Some(&admin),
            json!({ "dueDate": "2030-01-01" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["dueDate"].as_str().unwrap().starts_with("2030-01-01"));

    // Visible in the borrowed list.
    let (status, body) = send(&app, get("/api/admin/borrowed", Some(&admin))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["isbn"], "1");
    assert!(body[0]["dueDate"].as_str().unwrap().starts_with("2030-01-01"));
}

#[tokio::test]
async fn manual_due_notice_sweep_reports_count() {
    let (_temp, app) = test_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    add_book(&app, &admin, "1", "Tech").await;
    add_book(&app, &admin, "2", "Tech").await;

    // Nothing borrowed: nothing to send.
    let (status, body) = send(
        &app,
        post("/api/admin/send-due-notices", Some(&admin), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sent"], 0);

    // One book due within the window, one due far out.
    for isbn in ["1", "2"] {
        let (status, _) = send(
            &app,
            post(
                "/api/admin/issue",
                Some(&admin),
                json!({ "bookIsbn": isbn, "memberEmail": ADMIN_EMAIL }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, _) = send(
        &app,
        post(
            "/api/admin/force-due-soon",
            Some(&admin),
            json!({ "bookIsbn": "1", "hours": 2 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        post("/api/admin/send-due-notices", Some(&admin), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sent"], 1);
}

#[tokio::test]
async fn seed_books_is_idempotent() {
    let (_temp, app) = test_app().await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let (status, body) = send(&app, post("/api/admin/seed-books", Some(&admin), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], 10);
    assert_eq!(body["total"], 10);

    let (status, body) = send(&app, post("/api/admin/seed-books", Some(&admin), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["created"], 0);
    assert_eq!(body["total"], 10);
}
