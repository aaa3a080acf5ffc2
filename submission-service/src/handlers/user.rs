use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::{
        user::{ChangePasswordRequest, UpdateProfileRequest},
        MessageResponse,
    },
    middleware::AuthSession,
    models::PrincipalProfile,
    utils::{Password, ValidatedJson},
    AppState,
};
// Named only inside `#[utoipa::path]` so the schema `$ref`s resolve.
#[allow(unused_imports)]
use crate::{dtos::ErrorResponse, models::Submission};

/// Current principal's profile
#[utoipa::path(
    get,
    path = "/api/v1/user/profile",
    responses(
        (status = 200, description = "Profile", body = PrincipalProfile),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn get_profile(AuthSession(session): AuthSession) -> impl IntoResponse {
    Json(PrincipalProfile::from(&session.principal))
}

/// Change nickname
#[utoipa::path(
    put,
    path = "/api/v1/user/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = PrincipalProfile),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let principal = state
        .user_service
        .update_nickname(session.principal.id, &req.nickname)
        .await?;
    Ok(Json(PrincipalProfile::from(&principal)))
}

/// Change password; the old password must match
#[utoipa::path(
    put,
    path = "/api/v1/user/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Validation error or wrong old password", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn change_password(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .user_service
        .change_password(
            session.principal.id,
            Password::new(req.old_password),
            Password::new(req.new_password),
        )
        .await?;
    Ok(Json(MessageResponse::new("Password changed successfully")))
}

/// Submissions owned by a principal (self or admin)
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/submissions",
    params(("id" = Uuid, Path, description = "Owner principal id")),
    responses(
        (status = 200, description = "Submissions", body = [Submission]),
        (status = 403, description = "Not the owner or an admin", body = ErrorResponse),
        (status = 404, description = "Principal not found", body = ErrorResponse)
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn list_submissions(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(owner_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let submissions = state
        .user_service
        .list_submissions(owner_id, &session.principal)
        .await?;
    Ok(Json(submissions))
}
