//! Test helper module for submission-service integration tests.
//!
//! Builds the full router over in-memory adapters and drives it with
//! `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{header, Method, Request, Response, StatusCode},
    Router,
};
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use submission_service::{
    build_router,
    config::{
        DatabaseConfig, Environment, JwtConfig, RateLimitConfig, RateLimitRule, RedisConfig,
        SecurityConfig, SmtpConfig, SubmissionConfig, UploadConfig, VerificationConfig,
    },
    models::Role,
    services::{
        InMemoryRepository, LocalBlobStore, ManualClock, MemoryStore, MockEmailSender,
        Repository,
    },
    AppDeps, AppState,
};
use tempfile::TempDir;
use tower::util::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "password123";
pub const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
const BOUNDARY: &str = "----submission-test-boundary";

pub fn test_config(upload_path: &str) -> SubmissionConfig {
    let generous = RateLimitRule {
        attempts: 1000,
        window_seconds: 60,
    };
    SubmissionConfig {
        common: CoreConfig::default(),
        environment: Environment::Dev,
        service_name: "submission-service".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        redis: RedisConfig {
            url: "redis://unused".to_string(),
            timeout_ms: 500,
        },
        jwt: JwtConfig {
            secret: "integration-test-secret-0123456789abcdef".to_string(),
            expiry_hours: 24,
        },
        verification: VerificationConfig {
            code_ttl_seconds: 300,
        },
        smtp: SmtpConfig {
            host: "localhost".to_string(),
            port: 25,
            username: String::new(),
            password: String::new(),
            from: "no-reply@localhost".to_string(),
        },
        upload: UploadConfig {
            path: upload_path.to_string(),
            max_bytes: 64 * 1024,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            trust_forwarded_for: false,
        },
        rate_limit: RateLimitConfig {
            login: generous,
            register: generous,
            upload: generous,
            ..RateLimitConfig::default()
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub repo: Arc<InMemoryRepository>,
    pub email: Arc<MockEmailSender>,
    pub clock: Arc<ManualClock>,
    pub peer: SocketAddr,
    _upload_dir: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Spawn with a config tweak applied before the router is built.
    pub async fn spawn_with(configure: impl FnOnce(&mut SubmissionConfig)) -> Self {
        let upload_dir = tempfile::tempdir().unwrap();
        let mut config = test_config(upload_dir.path().to_str().unwrap());
        configure(&mut config);

        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(MemoryStore::new(clock.clone()));
        let repo = Arc::new(InMemoryRepository::new());
        let email = Arc::new(MockEmailSender::new());
        let blobs = Arc::new(LocalBlobStore::new(upload_dir.path()).await.unwrap());

        let state = AppState::new(
            config,
            AppDeps {
                store: store.clone(),
                repo: repo.clone(),
                blobs,
                email: email.clone(),
                clock: clock.clone(),
            },
        )
        .expect("Failed to build state");
        let router = build_router(state.clone()).expect("Failed to build router");

        Self {
            router,
            state,
            store,
            repo,
            email,
            clock,
            peer: "127.0.0.1:40000".parse().unwrap(),
            _upload_dir: upload_dir,
        }
    }

    /// Send a request as if it arrived from `self.peer`.
    pub async fn request(&self, mut req: Request<Body>) -> Response<Body> {
        req.extensions_mut().insert(ConnectInfo(self.peer));
        self.router.clone().oneshot(req).await.unwrap()
    }

    pub async fn request_from(&self, peer: SocketAddr, mut req: Request<Body>) -> Response<Body> {
        req.extensions_mut().insert(ConnectInfo(peer));
        self.router.clone().oneshot(req).await.unwrap()
    }

    pub async fn send_json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> (StatusCode, Value) {
        let req = json_request(method, uri, token, Some(body));
        read_json(self.request(req).await).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let req = json_request(Method::GET, uri, token, None);
        read_json(self.request(req).await).await
    }

    /// Send-code then register. Returns the new principal id.
    pub async fn register(&self, email: &str) -> Uuid {
        let (status, _) = self
            .send_json(
                Method::POST,
                "/api/v1/auth/send-code",
                None,
                json!({ "email": email }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let code = self.email.last_code_for(email).expect("no code sent");
        let (status, body) = self
            .send_json(
                Method::POST,
                "/api/v1/auth/register",
                None,
                json!({
                    "email": email,
                    "code": code,
                    "password": PASSWORD,
                    "nickname": "tester",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        body["principal"]["id"]
            .as_str()
            .and_then(|id| Uuid::parse_str(id).ok())
            .expect("principal id missing")
    }

    pub async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .send_json(
                Method::POST,
                "/api/v1/auth/login",
                None,
                json!({ "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["access_token"].as_str().unwrap().to_string()
    }

    pub async fn register_and_login(&self, email: &str) -> (Uuid, String) {
        let id = self.register(email).await;
        let token = self.login(email).await;
        (id, token)
    }

    pub async fn promote(&self, id: Uuid) {
        let mut principal = self.repo.get_principal_by_id(id).await.unwrap().unwrap();
        principal.role = Role::Admin;
        self.repo.update_principal(&principal).await.unwrap();
    }

    pub async fn admin(&self, email: &str) -> (Uuid, String) {
        let (id, token) = self.register_and_login(email).await;
        self.promote(id).await;
        (id, token)
    }

    pub async fn create_activity(&self, admin_token: &str, max_uploads: i32) -> Uuid {
        let (status, body) = self
            .send_json(
                Method::POST,
                "/api/v1/admin/activities",
                Some(admin_token),
                json!({
                    "name": "Spring Exhibition",
                    "description": "Landscapes",
                    "max_uploads_per_user": max_uploads,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create activity failed: {}", body);
        Uuid::parse_str(body["id"].as_str().unwrap()).unwrap()
    }

    pub async fn upload(
        &self,
        token: &str,
        activity_id: Uuid,
        file_name: &str,
        data: &[u8],
    ) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/submissions")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(activity_id, file_name, data)))
            .unwrap();
        read_json(self.request(req).await).await
    }

    pub async fn approve(&self, admin_token: &str, submission_id: &str) {
        let (status, _) = self
            .send_json(
                Method::PUT,
                &format!("/api/v1/admin/submissions/{}/review", submission_id),
                Some(admin_token),
                json!({ "approved": true }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
}

pub fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn read_json(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

pub fn multipart_body(activity_id: Uuid, file_name: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"activity_id\"\r\n\r\n{id}\r\n",
            b = BOUNDARY,
            id = activity_id
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            b = BOUNDARY,
            name = file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}
