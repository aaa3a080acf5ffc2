use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::activity::ActivityRequest,
    middleware::AuthSession,
    utils::ValidatedJson,
    AppState,
};
// Named only inside `#[utoipa::path]` so the schema `$ref`s resolve.
#[allow(unused_imports)]
use crate::{dtos::ErrorResponse, models::Activity};

/// Create an activity
#[utoipa::path(
    post,
    path = "/api/v1/admin/activities",
    request_body = ActivityRequest,
    responses(
        (status = 201, description = "Activity created", body = Activity),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse)
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn create_activity(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    ValidatedJson(req): ValidatedJson<ActivityRequest>,
) -> Result<impl IntoResponse, AppError> {
    let activity = state.activity_service.create(req.into()).await?;
    tracing::info!(activity_id = %activity.id, admin_id = %session.principal.id, "Admin created activity");
    Ok((StatusCode::CREATED, Json(activity)))
}

/// Update an activity
#[utoipa::path(
    put,
    path = "/api/v1/admin/activities/{id}",
    params(("id" = Uuid, Path, description = "Activity id")),
    request_body = ActivityRequest,
    responses(
        (status = 200, description = "Activity updated", body = Activity),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Activity not found", body = ErrorResponse)
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn update_activity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<ActivityRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.activity_service.update(id, req.into()).await?))
}

/// Soft-delete an activity
#[utoipa::path(
    delete,
    path = "/api/v1/admin/activities/{id}",
    params(("id" = Uuid, Path, description = "Activity id")),
    responses(
        (status = 204, description = "Activity deleted"),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Activity not found", body = ErrorResponse)
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn delete_activity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.activity_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
