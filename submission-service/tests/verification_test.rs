//! Verification-code registration flow.

mod common;

use axum::http::{Method, StatusCode};
use common::{TestApp, PASSWORD};
use serde_json::{json, Value};

fn register_body(email: &str, code: &str) -> Value {
    json!({
        "email": email,
        "code": code,
        "password": PASSWORD,
        "nickname": "newcomer",
    })
}

async fn send_code(app: &TestApp, email: &str) -> String {
    let (status, _) = app
        .send_json(
            Method::POST,
            "/api/v1/auth/send-code",
            None,
            json!({ "email": email }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    app.email.last_code_for(email).unwrap()
}

#[tokio::test]
async fn code_is_single_use() {
    let app = TestApp::spawn().await;
    let code = send_code(&app, "mia@example.com").await;

    let (status, _) = app
        .send_json(
            Method::POST,
            "/api/v1/auth/register",
            None,
            register_body("mia@example.com", &code),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // Same email again: already registered wins over the spent code.
    let (status, _) = app
        .send_json(
            Method::POST,
            "/api/v1/auth/register",
            None,
            register_body("mia@example.com", &code),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn wrong_code_does_not_burn_the_real_one() {
    let app = TestApp::spawn().await;
    let code = send_code(&app, "noah@example.com").await;
    let wrong = if code == "111111" { "222222" } else { "111111" };

    let (status, _) = app
        .send_json(
            Method::POST,
            "/api/v1/auth/register",
            None,
            register_body("noah@example.com", wrong),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send_json(
            Method::POST,
            "/api/v1/auth/register",
            None,
            register_body("noah@example.com", &code),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn expired_code_is_rejected() {
    let app = TestApp::spawn().await;
    let code = send_code(&app, "olga@example.com").await;

    app.clock.advance(chrono::Duration::seconds(301));

    let (status, _) = app
        .send_json(
            Method::POST,
            "/api/v1/auth/register",
            None,
            register_body("olga@example.com", &code),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reissue_replaces_outstanding_code() {
    let app = TestApp::spawn().await;
    let first = send_code(&app, "pete@example.com").await;

    app.clock.advance(chrono::Duration::seconds(61));
    let second = send_code(&app, "pete@example.com").await;

    if first != second {
        let (status, _) = app
            .send_json(
                Method::POST,
                "/api/v1/auth/register",
                None,
                register_body("pete@example.com", &first),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, _) = app
        .send_json(
            Method::POST,
            "/api/v1/auth/register",
            None,
            register_body("pete@example.com", &second),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn registration_input_rules() {
    let app = TestApp::spawn().await;
    let code = send_code(&app, "quinn@example.com").await;

    let cases = [
        json!({ "email": "not-an-email", "code": code, "password": PASSWORD, "nickname": "quinn" }),
        json!({ "email": "quinn@example.com", "code": "12ab56", "password": PASSWORD, "nickname": "quinn" }),
        json!({ "email": "quinn@example.com", "code": code, "password": "lettersonly", "nickname": "quinn" }),
        json!({ "email": "quinn@example.com", "code": code, "password": PASSWORD, "nickname": "q" }),
    ];
    for body in cases {
        let (status, _) = app
            .send_json(Method::POST, "/api/v1/auth/register", None, body)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    // Validation failures never reached the code, so it still works.
    let (status, _) = app
        .send_json(
            Method::POST,
            "/api/v1/auth/register",
            None,
            register_body("quinn@example.com", &code),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn email_delivery_failure_surfaces_as_error() {
    let app = TestApp::spawn().await;
    app.email.set_failing(true);

    let (status, _) = app
        .send_json(
            Method::POST,
            "/api/v1/auth/send-code",
            None,
            json!({ "email": "rita@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
