use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::{
        admin::{BatchReviewRequest, BatchReviewResponse, ReviewDecisionRequest, ReviewQueueResponse},
        PageQuery,
    },
    middleware::AuthSession,
    services::Page,
    utils::ValidatedJson,
    AppState,
};
// Named only inside `#[utoipa::path]` so the schema `$ref`s resolve.
#[allow(unused_imports)]
use crate::{dtos::ErrorResponse, models::Submission};

/// Pending submissions, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/admin/review-queue",
    params(PageQuery),
    responses(
        (status = 200, description = "Review queue", body = ReviewQueueResponse),
        (status = 403, description = "Admin only", body = ErrorResponse)
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn review_queue(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = Page::from(query);
    let paged = state.admin_service.review_queue(&session.principal, page).await?;
    Ok(Json(ReviewQueueResponse::new(paged, page)))
}

/// Approve a submission, or return it to pending
#[utoipa::path(
    put,
    path = "/api/v1/admin/submissions/{id}/review",
    params(("id" = Uuid, Path, description = "Submission id")),
    request_body = ReviewDecisionRequest,
    responses(
        (status = 200, description = "Decision recorded", body = Submission),
        (status = 403, description = "Admin only", body = ErrorResponse),
        (status = 404, description = "Submission not found", body = ErrorResponse)
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn review_submission(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviewDecisionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let submission = state
        .admin_service
        .decide(&session.principal, id, req.approved)
        .await?;
    Ok(Json(submission))
}

/// Apply one decision to many submissions
#[utoipa::path(
    put,
    path = "/api/v1/admin/submissions/batch-review",
    request_body = BatchReviewRequest,
    responses(
        (status = 200, description = "Decisions recorded", body = BatchReviewResponse),
        (status = 400, description = "Empty id list", body = ErrorResponse),
        (status = 403, description = "Admin only", body = ErrorResponse)
    ),
    tag = "Admin",
    security(("bearer_auth" = []))
)]
pub async fn batch_review(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    ValidatedJson(req): ValidatedJson<BatchReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let updated = state
        .admin_service
        .decide_batch(&session.principal, &req.submission_ids, req.approved)
        .await?;
    Ok(Json(BatchReviewResponse { updated }))
}
