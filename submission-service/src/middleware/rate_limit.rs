use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;
use std::net::SocketAddr;

use crate::services::rate_limit::RateLimitPolicy;
use crate::services::{RateLimiter, Session};

/// One policy bound to one group of routes.
#[derive(Clone)]
pub struct RouteRateLimit {
    limiter: RateLimiter,
    policy: RateLimitPolicy,
    trust_forwarded_for: bool,
}

impl RouteRateLimit {
    pub fn new(limiter: RateLimiter, policy: RateLimitPolicy, trust_forwarded_for: bool) -> Self {
        Self {
            limiter,
            policy,
            trust_forwarded_for,
        }
    }
}

/// Source address of the request. `X-Forwarded-For` is only honoured when the
/// deployment sits behind a trusted proxy.
pub fn client_address(req: &Request, trust_forwarded_for: bool) -> Option<String> {
    if trust_forwarded_for {
        let forwarded = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty());
        if let Some(addr) = forwarded {
            return Some(addr.to_string());
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
}

/// Limits by source address (login, registration).
pub async fn source_rate_limit_middleware(
    State(limit): State<RouteRateLimit>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let source = client_address(&req, limit.trust_forwarded_for).unwrap_or_default();
    limit.limiter.guard(&limit.policy, &source).await?;
    Ok(next.run(req).await)
}

/// Limits by the authenticated principal; must run after the session layer.
pub async fn principal_rate_limit_middleware(
    State(limit): State<RouteRateLimit>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal_id = req
        .extensions()
        .get::<Session>()
        .map(|session| session.principal.id.to_string())
        .unwrap_or_default();
    limit.limiter.guard(&limit.policy, &principal_id).await?;
    Ok(next.run(req).await)
}
