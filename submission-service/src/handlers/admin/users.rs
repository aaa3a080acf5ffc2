use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::{
        admin::{PrincipalListResponse, UpdateRoleRequest},
        PageQuery,
    },
    middleware::AuthSession,
    models::PrincipalProfile,
    services::Page,
    AppState,
};
// Named only inside `#[utoipa::path]` so the schema `$ref`s resolve.
#[allow(unused_imports)]
use crate::{dtos::ErrorResponse, services::PrincipalStatistics};

/// List principals
#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    params(PageQuery),
    responses(
        (status = 200, description = "Principals", body = PrincipalListResponse),
        (status = 403, description = "Admin only", body = ErrorResponse)
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = Page::from(query);
    let paged = state.admin_service.list_principals(&session.principal, page).await?;
    Ok(Json(PrincipalListResponse::new(paged, page)))
}

/// Change a principal's role
#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}/role",
    params(("id" = Uuid, Path, description = "Principal id")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = PrincipalProfile),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Principal not found", body = ErrorResponse)
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn update_role(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let principal = state
        .admin_service
        .update_role(&session.principal, id, req.role)
        .await?;
    Ok(Json(PrincipalProfile::from(&principal)))
}

/// Submission counts for one principal
#[utoipa::path(
    get,
    path = "/api/v1/admin/users/{id}/statistics",
    params(("id" = Uuid, Path, description = "Principal id")),
    responses(
        (status = 200, description = "Statistics", body = PrincipalStatistics),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Principal not found", body = ErrorResponse)
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn user_statistics(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.admin_service.statistics(&session.principal, id).await?))
}
