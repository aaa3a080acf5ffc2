//! Purpose-scoped rate limits applied through the HTTP surface.

mod common;

use axum::http::{header, Method, StatusCode};
use common::{json_request, read_json, TestApp, PNG};
use serde_json::json;
use std::net::SocketAddr;
use submission_service::config::RateLimitRule;

fn login_body() -> serde_json::Value {
    json!({ "email": "nobody@example.com", "password": "whatever1" })
}

#[tokio::test]
async fn login_is_limited_per_source_address() {
    let app = TestApp::spawn_with(|config| {
        config.rate_limit.login = RateLimitRule {
            attempts: 3,
            window_seconds: 60,
        };
    })
    .await;

    for _ in 0..3 {
        let (status, _) = app
            .send_json(Method::POST, "/api/v1/auth/login", None, login_body())
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let req = json_request(Method::POST, "/api/v1/auth/login", None, Some(login_body()));
    let response = app.request(req).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "60");

    // Another source address has its own budget.
    let other: SocketAddr = "192.0.2.44:1234".parse().unwrap();
    let req = json_request(Method::POST, "/api/v1/auth/login", None, Some(login_body()));
    let (status, _) = read_json(app.request_from(other, req).await).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_window_resets_after_expiry() {
    let app = TestApp::spawn_with(|config| {
        config.rate_limit.login = RateLimitRule {
            attempts: 1,
            window_seconds: 60,
        };
    })
    .await;

    let (status, _) = app
        .send_json(Method::POST, "/api/v1/auth/login", None, login_body())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app
        .send_json(Method::POST, "/api/v1/auth/login", None, login_body())
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    app.clock.advance(chrono::Duration::seconds(61));

    let (status, _) = app
        .send_json(Method::POST, "/api/v1/auth/login", None, login_body())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn send_code_is_limited_per_email() {
    let app = TestApp::spawn().await;
    let send = |email: &'static str| {
        app.send_json(
            Method::POST,
            "/api/v1/auth/send-code",
            None,
            json!({ "email": email }),
        )
    };

    assert_eq!(send("ivan@example.com").await.0, StatusCode::OK);
    assert_eq!(send("IVAN@example.com").await.0, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(send("judy@example.com").await.0, StatusCode::OK);
    assert_eq!(app.email.sent_count(), 2);
}

#[tokio::test]
async fn store_outage_denies_rate_limited_routes() {
    let app = TestApp::spawn().await;
    app.store.set_available(false);

    let (status, _) = app
        .send_json(Method::POST, "/api/v1/auth/login", None, login_body())
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _) = app
        .send_json(
            Method::POST,
            "/api/v1/auth/send-code",
            None,
            json!({ "email": "kim@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(app.email.sent_count(), 0);
}

#[tokio::test]
async fn missing_source_address_is_rejected() {
    let app = TestApp::spawn().await;

    // No ConnectInfo and no trusted forwarding header.
    let req = json_request(Method::POST, "/api/v1/auth/login", None, Some(login_body()));
    let response = tower::util::ServiceExt::oneshot(app.router.clone(), req)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn trusted_forwarded_for_scopes_by_client() {
    let app = TestApp::spawn_with(|config| {
        config.security.trust_forwarded_for = true;
        config.rate_limit.login = RateLimitRule {
            attempts: 1,
            window_seconds: 60,
        };
    })
    .await;

    let forwarded = |client: &str| {
        let mut req = json_request(Method::POST, "/api/v1/auth/login", None, Some(login_body()));
        req.headers_mut()
            .insert("x-forwarded-for", client.parse().unwrap());
        req
    };

    assert_eq!(app.request(forwarded("198.51.100.1")).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        app.request(forwarded("198.51.100.1")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(app.request(forwarded("198.51.100.2")).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn uploads_are_limited_per_principal() {
    let app = TestApp::spawn_with(|config| {
        config.rate_limit.upload = RateLimitRule {
            attempts: 2,
            window_seconds: 60,
        };
    })
    .await;
    let (_, admin) = app.admin("admin@example.com").await;
    let activity = app.create_activity(&admin, 10).await;
    let (_, member) = app.register_and_login("lena@example.com").await;

    assert_eq!(app.upload(&member, activity, "a.png", PNG).await.0, StatusCode::CREATED);
    assert_eq!(app.upload(&member, activity, "b.png", PNG).await.0, StatusCode::CREATED);
    assert_eq!(
        app.upload(&member, activity, "c.png", PNG).await.0,
        StatusCode::TOO_MANY_REQUESTS
    );

    // The admin's own budget is untouched.
    assert_eq!(app.upload(&admin, activity, "d.png", PNG).await.0, StatusCode::CREATED);
}
