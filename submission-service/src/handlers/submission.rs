use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    middleware::AuthSession,
    AppState,
};
// Named only inside `#[utoipa::path]` so the schema `$ref`s resolve.
#[allow(unused_imports)]
use crate::{dtos::ErrorResponse, models::Submission};

struct UploadParts {
    activity_id: Uuid,
    file_name: String,
    data: Vec<u8>,
}

fn multipart_error(e: impl std::fmt::Display) -> AppError {
    AppError::BadRequest(anyhow::anyhow!("Failed to read multipart field: {}", e))
}

async fn read_upload(mut multipart: Multipart) -> Result<UploadParts, AppError> {
    let mut activity_id = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("activity_id") => {
                let text = field.text().await.map_err(multipart_error)?;
                let id = Uuid::parse_str(text.trim()).map_err(|_| {
                    AppError::BadRequest(anyhow::anyhow!("activity_id must be a UUID"))
                })?;
                activity_id = Some(id);
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or("unnamed").to_string();
                let data = field.bytes().await.map_err(multipart_error)?.to_vec();
                file = Some((file_name, data));
            }
            _ => {}
        }
    }

    let activity_id =
        activity_id.ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("activity_id is required")))?;
    let (file_name, data) =
        file.ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("No file uploaded")))?;

    Ok(UploadParts {
        activity_id,
        file_name,
        data,
    })
}

/// Upload an image into an active activity
#[utoipa::path(
    post,
    path = "/api/v1/submissions",
    request_body(content = crate::dtos::submission::UploadSubmissionForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Submission created pending review", body = Submission),
        (status = 400, description = "Invalid image, closed activity or upload limit reached", body = ErrorResponse),
        (status = 404, description = "Activity not found", body = ErrorResponse),
        (status = 429, description = "Too many uploads", body = ErrorResponse)
    ),
    tag = "Submissions",
    security(("bearer_auth" = []))
)]
pub async fn upload_submission(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let parts = read_upload(multipart).await?;

    tracing::info!(
        principal_id = %session.principal.id,
        activity_id = %parts.activity_id,
        file_name = %parts.file_name,
        size = parts.data.len(),
        "Submission upload started"
    );

    let submission = state
        .submission_service
        .upload(&session.principal, parts.activity_id, &parts.file_name, &parts.data)
        .await?;

    Ok((StatusCode::CREATED, Json(submission)))
}

/// Submission metadata, if the caller may view it
#[utoipa::path(
    get,
    path = "/api/v1/submissions/{id}",
    params(("id" = Uuid, Path, description = "Submission id")),
    responses(
        (status = 200, description = "Submission", body = Submission),
        (status = 403, description = "Not visible to caller", body = ErrorResponse),
        (status = 404, description = "Submission not found", body = ErrorResponse)
    ),
    tag = "Submissions",
    security(("bearer_auth" = []))
)]
pub async fn get_submission(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.submission_service.get(id, &session.principal).await?))
}

/// Stored image bytes, gated by the same view check as metadata
#[utoipa::path(
    get,
    path = "/api/v1/submissions/{id}/content",
    params(("id" = Uuid, Path, description = "Submission id")),
    responses(
        (status = 200, description = "Image bytes", content_type = "application/octet-stream"),
        (status = 403, description = "Not visible to caller", body = ErrorResponse),
        (status = 404, description = "Submission not found", body = ErrorResponse)
    ),
    tag = "Submissions",
    security(("bearer_auth" = []))
)]
pub async fn get_submission_content(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let content = state.content_service.read(id, &session.principal).await?;
    let disposition = format!(
        "inline; filename=\"{}\"",
        content.file_name.replace('"', "")
    );

    Ok((
        [
            (header::CONTENT_TYPE, content.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        content.bytes,
    ))
}

/// Delete an own submission
#[utoipa::path(
    delete,
    path = "/api/v1/submissions/{id}",
    params(("id" = Uuid, Path, description = "Submission id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Submission not found", body = ErrorResponse)
    ),
    tag = "Submissions",
    security(("bearer_auth" = []))
)]
pub async fn delete_submission(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.submission_service.delete(id, &session.principal).await?;
    Ok(StatusCode::NO_CONTENT)
}
