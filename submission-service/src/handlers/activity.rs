use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::{activity::ActivityListResponse, PageQuery},
    services::Page,
    AppState,
};
// Named only inside `#[utoipa::path]` so the schema `$ref`s resolve.
#[allow(unused_imports)]
use crate::{dtos::ErrorResponse, models::Activity};

/// List open and closed activities, newest first
#[utoipa::path(
    get,
    path = "/api/v1/activities",
    params(PageQuery),
    responses(
        (status = 200, description = "Activities", body = ActivityListResponse)
    ),
    tag = "Activities"
)]
pub async fn list_activities(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = Page::from(query);
    let paged = state.activity_service.list(page).await?;
    Ok(Json(ActivityListResponse::new(paged, page)))
}

/// Get one activity
#[utoipa::path(
    get,
    path = "/api/v1/activities/{id}",
    params(("id" = Uuid, Path, description = "Activity id")),
    responses(
        (status = 200, description = "Activity", body = Activity),
        (status = 404, description = "Activity not found", body = ErrorResponse)
    ),
    tag = "Activities"
)]
pub async fn get_activity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.activity_service.get(id).await?))
}
