use axum::{extract::State, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::{
        auth::{LoginRequest, LoginResponse},
        MessageResponse,
    },
    middleware::AuthSession,
    models::PrincipalProfile,
    utils::{Password, ValidatedJson},
    AppState,
};
// Named only inside `#[utoipa::path]` so the schema `$ref`s resolve.
#[allow(unused_imports)]
use crate::dtos::ErrorResponse;

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (principal, issued) = state
        .auth_service
        .login(&req.email, Password::new(req.password))
        .await?;

    Ok(Json(LoginResponse {
        access_token: issued.token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.lifetime_seconds(),
        expires_at: issued.expires_at,
        principal: PrincipalProfile::from(&principal),
    }))
}

/// Revoke the presented access token
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Invalid or revoked token", body = ErrorResponse),
        (status = 503, description = "Shared store unavailable", body = ErrorResponse)
    ),
    tag = "Authentication",
    security(("bearer_auth" = []))
)]
pub async fn logout(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.logout(&session.token).await?;
    tracing::info!(principal_id = %session.principal.id, "Logged out");
    Ok(Json(MessageResponse::new("Logged out successfully")))
}
