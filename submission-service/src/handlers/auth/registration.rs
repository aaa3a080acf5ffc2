use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::{
        auth::{RegisterRequest, RegisterResponse, SendCodeRequest},
        MessageResponse,
    },
    models::PrincipalProfile,
    utils::{Password, ValidatedJson},
    AppState,
};
// Named only inside `#[utoipa::path]` so the schema `$ref`s resolve.
#[allow(unused_imports)]
use crate::dtos::ErrorResponse;

/// Send a registration verification code
#[utoipa::path(
    post,
    path = "/api/v1/auth/send-code",
    request_body = SendCodeRequest,
    responses(
        (status = 200, description = "Code sent", body = MessageResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 429, description = "A code was sent recently", body = ErrorResponse),
        (status = 503, description = "Shared store unavailable", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn send_code(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SendCodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.send_verification_code(&req.email).await?;
    Ok(Json(MessageResponse::new("Verification code sent")))
}

/// Register with a verification code
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Principal registered", body = RegisterResponse),
        (status = 400, description = "Validation error or bad code", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 429, description = "Too many attempts", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let principal = state
        .auth_service
        .register(&req.email, &req.code, Password::new(req.password), &req.nickname)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            principal: PrincipalProfile::from(&principal),
            message: "Registration successful".to_string(),
        }),
    ))
}
