//! End-to-end tests for the HTTP endpoints, driven through the router.

#![cfg(feature = "server")]

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Duration, NaiveDateTime, TimeZone, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use eyeshield::clock::{Clock, ManualClock};
use eyeshield::registry::Registry;
use eyeshield::server::handlers::AppState;
use eyeshield::server::logging::REQUEST_ID_HEADER;
use eyeshield::server::routes::build_router;
use eyeshield::store::MemoryStore;

/// Helper: an app backed by an in-memory store and a manual clock.
fn setup_test_app() -> (axum::Router, ManualClock, MemoryStore) {
    let start = Utc.with_ymd_and_hms(2024, 2, 28, 10, 0, 0).unwrap();
    let clock = ManualClock::new(start);
    let store = MemoryStore::new();
    let registry = Registry::load(store.clone(), "EyesShield");
    let app = build_router(AppState::with_clock(registry, clock.clone()));
    (app, clock, store)
}

/// Helper to send a request to the app and decode the JSON body.
async fn request(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&v).unwrap())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(json!({}));

    (status, body)
}

async fn generate(app: axum::Router, duration: &str) -> (StatusCode, Value) {
    request(
        app,
        "POST",
        "/GenerateLicense",
        Some(json!({ "duration": duration })),
    )
    .await
}

#[tokio::test]
async fn one_day_license_lifecycle() {
    let (app, clock, store) = setup_test_app();

    let (status, body) = generate(app.clone(), "1 day").await;
    assert_eq!(status, StatusCode::CREATED);

    let key = body["license"].as_str().unwrap().to_string();
    assert!(key.starts_with("EyesShield-"));
    assert!(Uuid::parse_str(key.strip_prefix("EyesShield-").unwrap()).is_ok());

    let expiry =
        NaiveDateTime::parse_from_str(body["expiryDate"].as_str().unwrap(), "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc();
    assert_eq!(expiry, clock.now() + Duration::hours(24));
    assert_eq!(store.save_count(), 1);

    let uri = format!("/GetMainInfo?keyused={key}");
    let (status, body) = request(app.clone(), "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], json!(true));

    clock.advance(Duration::hours(25));
    let (status, body) = request(app.clone(), "GET", &uri, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "LICENSE_EXPIRED");

    let (status, body) = request(
        app.clone(),
        "GET",
        "/GetMainInfo?keyused=EyesShield-unrelated",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "LICENSE_NOT_FOUND");

    let (status, _) = request(app, "GET", "/GetMainInfo", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_keyused_is_bad_request() {
    let (app, _, _) = setup_test_app();
    let (status, body) = request(app, "GET", "/GetMainInfo?keyused=", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "MISSING_FIELD");
}

#[tokio::test]
async fn generate_requires_duration() {
    let (app, _, store) = setup_test_app();

    let (status, body) = request(app.clone(), "POST", "/GenerateLicense", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"]["field"], "duration");

    let (status, _) = generate(app.clone(), "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request(app, "POST", "/GenerateLicense", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn generate_rejects_unparseable_duration() {
    let (app, _, store) = setup_test_app();

    let (status, body) = generate(app.clone(), "banana").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_DURATION");

    let (status, _) = request(
        app,
        "POST",
        "/GenerateLicense",
        Some(json!({ "duration": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(store.contents().is_none());
}

#[tokio::test]
async fn lifetime_license_reports_sentinel_expiry() {
    let (app, clock, _) = setup_test_app();

    let (status, body) = generate(app.clone(), "lifetime").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["expiryDate"], "9999-12-31 00:00:00");

    clock.advance(Duration::days(365 * 100));
    let uri = format!("/GetMainInfo?keyused={}", body["license"].as_str().unwrap());
    let (status, _) = request(app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn year_and_months_add_calendar_months() {
    let (app, _, _) = setup_test_app();

    // 2024-02-28 10:00 + 15 calendar months
    let (status, body) = generate(app, "1 year 3 months").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["expiryDate"], "2025-05-28 10:00:00");
}

#[tokio::test]
async fn responses_carry_request_id_and_health_counts_licenses() {
    let (app, _, _) = setup_test_app();
    generate(app.clone(), "2 hours").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["licenses"], 1);
    assert_eq!(body["service"], "eyeshield");
}

#[tokio::test]
async fn health_does_not_count_expired_licenses() {
    let (app, clock, store) = setup_test_app();
    generate(app.clone(), "2 hours").await;
    generate(app.clone(), "1 day").await;

    clock.advance(Duration::hours(3));

    let (status, body) = request(app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["licenses"], 1);
    // Two insertions plus the sweep run by the health check.
    assert_eq!(store.save_count(), 3);
}
