use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::services::error::{AuthError, ServiceError};
use crate::services::Session;
use crate::AppState;

/// Token from `Authorization: Bearer <token>`, if present and non-empty.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Require a valid, unrevoked bearer token and attach the `Session`.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())
        .ok_or(ServiceError::from(AuthError::MissingCredentials))?
        .to_string();

    let session = state.sessions.authenticate(&token).await.map_err(|e| {
        tracing::info!(error = %e, "Session rejected");
        e
    })?;

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

/// Extractor for the session attached by `session_middleware`.
pub struct AuthSession(pub Session);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(ServiceError::from(AuthError::MissingCredentials))?;

        Ok(AuthSession(session.clone()))
    }
}
