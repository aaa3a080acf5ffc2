pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use utoipa::{Modify, OpenApi};

use crate::config::SubmissionConfig;
use crate::middleware::{
    principal_rate_limit_middleware, require_admin, session_middleware,
    source_rate_limit_middleware, RouteRateLimit,
};
use crate::services::{
    ActivityService, AdminService, AuthService, AuthServiceDeps, BlobStore, Clock,
    ContentService, EmailSender, EphemeralStore, RateLimitPolicies, RateLimiter, Repository,
    RevocationRegistry, SessionAuthenticator, SubmissionAccess, SubmissionService,
    SubmissionServiceDeps, TokenService, UserService, VerificationCodeIssuer,
};

/// Multipart framing allowance on top of the largest accepted image.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::auth::registration::send_code,
        handlers::auth::registration::register,
        handlers::auth::session::login,
        handlers::auth::session::logout,
        handlers::user::get_profile,
        handlers::user::update_profile,
        handlers::user::change_password,
        handlers::user::list_submissions,
        handlers::activity::list_activities,
        handlers::activity::get_activity,
        handlers::submission::upload_submission,
        handlers::submission::get_submission,
        handlers::submission::get_submission_content,
        handlers::submission::delete_submission,
        handlers::admin::activities::create_activity,
        handlers::admin::activities::update_activity,
        handlers::admin::activities::delete_activity,
        handlers::admin::reviews::review_queue,
        handlers::admin::reviews::review_submission,
        handlers::admin::reviews::batch_review,
        handlers::admin::users::list_users,
        handlers::admin::users::update_role,
        handlers::admin::users::user_statistics,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::MessageResponse,
            dtos::auth::SendCodeRequest,
            dtos::auth::RegisterRequest,
            dtos::auth::RegisterResponse,
            dtos::auth::LoginRequest,
            dtos::auth::LoginResponse,
            dtos::user::UpdateProfileRequest,
            dtos::user::ChangePasswordRequest,
            dtos::activity::ActivityRequest,
            dtos::activity::ActivityListResponse,
            dtos::submission::UploadSubmissionForm,
            dtos::admin::ReviewDecisionRequest,
            dtos::admin::BatchReviewRequest,
            dtos::admin::BatchReviewResponse,
            dtos::admin::UpdateRoleRequest,
            dtos::admin::ReviewQueueResponse,
            dtos::admin::PrincipalListResponse,
            models::Activity,
            models::PrincipalProfile,
            models::Role,
            models::ReviewStatus,
            models::Submission,
            services::PrincipalStatistics,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Verification codes, registration and sessions"),
        (name = "User", description = "Own profile and submissions"),
        (name = "Activities", description = "Submission windows"),
        (name = "Submissions", description = "Upload, view and delete submissions"),
        (name = "Admin", description = "Review and principal management"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Adapters the state is assembled from. Production wires Redis, Postgres,
/// the local filesystem and SMTP; tests wire the in-memory versions.
pub struct AppDeps {
    pub store: Arc<dyn EphemeralStore>,
    pub repo: Arc<dyn Repository>,
    pub blobs: Arc<dyn BlobStore>,
    pub email: Arc<dyn EmailSender>,
    pub clock: Arc<dyn Clock>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<SubmissionConfig>,
    pub store: Arc<dyn EphemeralStore>,
    pub repo: Arc<dyn Repository>,
    pub tokens: TokenService,
    pub sessions: SessionAuthenticator,
    pub limiter: RateLimiter,
    pub policies: RateLimitPolicies,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub activity_service: ActivityService,
    pub submission_service: SubmissionService,
    pub content_service: ContentService,
    pub admin_service: AdminService,
}

impl AppState {
    pub fn new(config: SubmissionConfig, deps: AppDeps) -> Result<Self, AppError> {
        let tokens = TokenService::new(&config.jwt, deps.clock.clone())
            .map_err(AppError::ConfigError)?;
        let revocations =
            RevocationRegistry::new(deps.store.clone(), tokens.clone(), deps.clock.clone());
        let codes = VerificationCodeIssuer::new(
            deps.store.clone(),
            Duration::from_secs(config.verification.code_ttl_seconds),
        );
        let limiter = RateLimiter::new(deps.store.clone());
        let policies = RateLimitPolicies::from(&config.rate_limit);
        let authority = Arc::new(SubmissionAccess::new(deps.repo.clone()));

        let auth_service = AuthService::new(AuthServiceDeps {
            repo: deps.repo.clone(),
            codes,
            limiter: limiter.clone(),
            policies: policies.clone(),
            email: deps.email,
            tokens: tokens.clone(),
            revocations: revocations.clone(),
            clock: deps.clock.clone(),
        });
        let submission_service = SubmissionService::new(SubmissionServiceDeps {
            repo: deps.repo.clone(),
            blobs: deps.blobs.clone(),
            authority: authority.clone(),
            clock: deps.clock.clone(),
            max_upload_bytes: config.upload.max_bytes,
        });

        Ok(Self {
            sessions: SessionAuthenticator::new(tokens.clone(), revocations, deps.repo.clone()),
            user_service: UserService::new(deps.repo.clone(), deps.clock.clone()),
            activity_service: ActivityService::new(deps.repo.clone(), deps.clock.clone()),
            content_service: ContentService::new(authority, deps.blobs),
            admin_service: AdminService::new(deps.repo.clone(), deps.clock),
            auth_service,
            submission_service,
            tokens,
            limiter,
            policies,
            store: deps.store,
            repo: deps.repo,
            config: Arc::new(config),
        })
    }
}

pub fn build_router(state: AppState) -> Result<Router, AppError> {
    let trust_forwarded_for = state.config.security.trust_forwarded_for;
    let route_limit = |policy| RouteRateLimit::new(state.limiter.clone(), policy, trust_forwarded_for);

    let login_route = Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .layer(from_fn_with_state(
            route_limit(state.policies.login.clone()),
            source_rate_limit_middleware,
        ));

    let register_route = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .layer(from_fn_with_state(
            route_limit(state.policies.register.clone()),
            source_rate_limit_middleware,
        ));

    let upload_route = Router::new()
        .route("/submissions", post(handlers::submission::upload_submission))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(
            state.config.upload.max_bytes + MULTIPART_OVERHEAD_BYTES,
        ))
        .layer(from_fn_with_state(
            route_limit(state.policies.upload.clone()),
            principal_rate_limit_middleware,
        ));

    let session_routes = Router::new()
        .route("/auth/logout", post(handlers::auth::logout))
        .route(
            "/user/profile",
            get(handlers::user::get_profile).put(handlers::user::update_profile),
        )
        .route("/user/password", put(handlers::user::change_password))
        .route(
            "/users/:id/submissions",
            get(handlers::user::list_submissions),
        )
        .route(
            "/submissions/:id",
            get(handlers::submission::get_submission)
                .delete(handlers::submission::delete_submission),
        )
        .route(
            "/submissions/:id/content",
            get(handlers::submission::get_submission_content),
        )
        .merge(upload_route)
        .layer(from_fn_with_state(state.clone(), session_middleware));

    let admin_routes = Router::new()
        .route("/admin/activities", post(handlers::admin::create_activity))
        .route(
            "/admin/activities/:id",
            put(handlers::admin::update_activity).delete(handlers::admin::delete_activity),
        )
        .route("/admin/review-queue", get(handlers::admin::review_queue))
        .route(
            "/admin/submissions/batch-review",
            put(handlers::admin::batch_review),
        )
        .route(
            "/admin/submissions/:id/review",
            put(handlers::admin::review_submission),
        )
        .route("/admin/users", get(handlers::admin::list_users))
        .route("/admin/users/:id/role", put(handlers::admin::update_role))
        .route(
            "/admin/users/:id/statistics",
            get(handlers::admin::user_statistics),
        )
        .layer(from_fn(require_admin))
        .layer(from_fn_with_state(state.clone(), session_middleware));

    let api = Router::new()
        .route("/auth/send-code", post(handlers::auth::send_code))
        .route("/activities", get(handlers::activity::list_activities))
        .route("/activities/:id", get(handlers::activity::get_activity))
        .merge(login_route)
        .merge(register_route)
        .merge(session_routes)
        .merge(admin_routes);

    let allowed_origins = state
        .config
        .security
        .allowed_origins
        .iter()
        .map(|origin| {
            origin.parse::<HeaderValue>().map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Invalid CORS origin '{}': {}", origin, e))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let app = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .nest("/api/v1", api)
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    header::AUTHORIZATION,
                    header::CONTENT_TYPE,
                    HeaderName::from_static(REQUEST_ID_HEADER),
                ]),
        );

    Ok(app)
}

/// Shared store and database reachability
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service healthy"),
        (status = 503, description = "A dependency is down", body = dtos::ErrorResponse)
    ),
    tag = "Observability"
)]
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Shared store health check failed");
        AppError::ServiceUnavailable("shared store".to_string())
    })?;

    state.repo.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Database health check failed");
        AppError::ServiceUnavailable("database".to_string())
    })?;

    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
        "checks": {
            "store": "up",
            "database": "up"
        }
    })))
}
