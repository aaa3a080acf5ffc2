use axum::{extract::Request, middleware::Next, response::Response};
use service_core::error::AppError;

use crate::services::error::{AuthError, PermissionError, ServiceError};
use crate::services::{AccessPolicy, Session};

/// Runs after `session_middleware`; non-admin sessions get 403.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let session = req
        .extensions()
        .get::<Session>()
        .ok_or(ServiceError::from(AuthError::MissingCredentials))?;

    if !AccessPolicy.can_decide_review(&session.principal) {
        tracing::warn!(
            principal_id = %session.principal.id,
            path = %req.uri().path(),
            "Admin route denied"
        );
        return Err(ServiceError::from(PermissionError::Forbidden).into());
    }

    Ok(next.run(req).await)
}
