use service_core::error::AppError;
use std::time::Duration;
use thiserror::Error;

/// Why a bearer credential was not honored.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing bearer credentials")]
    MissingCredentials,

    #[error("Malformed token")]
    Malformed,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Token revoked")]
    Revoked,

    #[error("Unknown principal")]
    UnknownPrincipal,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodeError {
    #[error("Verification code not found or expired")]
    NotFoundOrExpired,

    #[error("Verification code mismatch")]
    Mismatch,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    #[error("Rate limit exceeded for {policy}")]
    Exceeded {
        policy: &'static str,
        window: Duration,
    },

    #[error("Rate limit scope for {policy} could not be determined")]
    MissingScope { policy: &'static str },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    #[error("Forbidden")]
    Forbidden,
}

/// Shared-store failures. Security checks deny on these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InfrastructureError {
    #[error("Shared store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Shared store timed out")]
    Timeout,
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Code(#[from] CodeError),

    #[error(transparent)]
    RateLimit(#[from] RateLimitError),

    #[error(transparent)]
    Permission(#[from] PermissionError),

    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("File exceeds the {0} byte limit")]
    PayloadTooLarge(usize),

    #[error("Activity is not accepting submissions")]
    ActivityClosed,

    #[error("Upload limit of {0} reached for this activity")]
    UploadLimitReached(i32),

    #[error("Database error: {0}")]
    Database(anyhow::Error),

    #[error("Storage error: {0}")]
    Storage(anyhow::Error),

    #[error("Email error: {0}")]
    Email(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Client-facing detail for any store failure; the cause is only logged.
const STORE_UNAVAILABLE_MESSAGE: &str = "Session store temporarily unavailable";

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Auth(e) => AppError::Unauthorized(anyhow::anyhow!(e)),
            ServiceError::Code(e) => AppError::BadRequest(anyhow::anyhow!(e)),
            ServiceError::RateLimit(RateLimitError::Exceeded { policy, window }) => {
                AppError::TooManyRequests(
                    format!("Too many {} requests, try again later", policy),
                    Some(window.as_secs()),
                )
            }
            ServiceError::RateLimit(e @ RateLimitError::MissingScope { .. }) => {
                AppError::BadRequest(anyhow::anyhow!(e))
            }
            ServiceError::Permission(e) => AppError::Forbidden(anyhow::anyhow!(e)),
            ServiceError::Infrastructure(e) => {
                tracing::error!(error = %e, "Shared store unavailable");
                AppError::ServiceUnavailable(STORE_UNAVAILABLE_MESSAGE.to_string())
            }
            ServiceError::InvalidCredentials => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid credentials"))
            }
            ServiceError::EmailAlreadyRegistered => {
                AppError::Conflict(anyhow::anyhow!("Email already registered"))
            }
            ServiceError::NotFound(what) => AppError::NotFound(anyhow::anyhow!("{} not found", what)),
            ServiceError::Validation(e) => AppError::BadRequest(anyhow::anyhow!(e)),
            e @ ServiceError::PayloadTooLarge(_) => AppError::PayloadTooLarge(anyhow::anyhow!(e)),
            e @ (ServiceError::ActivityClosed | ServiceError::UploadLimitReached(_)) => {
                AppError::BadRequest(anyhow::anyhow!(e.to_string()))
            }
            ServiceError::Database(e) => AppError::DatabaseError(e),
            ServiceError::Storage(e) => AppError::StorageError(e),
            ServiceError::Email(e) => AppError::EmailError(e),
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn status(err: impl Into<ServiceError>) -> StatusCode {
        AppError::from(err.into()).status_code()
    }

    #[test]
    fn test_boundary_categories() {
        assert_eq!(status(AuthError::Revoked), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AuthError::Expired), StatusCode::UNAUTHORIZED);
        assert_eq!(status(CodeError::Mismatch), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(RateLimitError::Exceeded {
                policy: "login",
                window: Duration::from_secs(60)
            }),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status(RateLimitError::MissingScope { policy: "login" }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(PermissionError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            status(InfrastructureError::Timeout),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status(ServiceError::EmailAlreadyRegistered),
            StatusCode::CONFLICT
        );
        assert_eq!(status(ServiceError::NotFound("Submission")), StatusCode::NOT_FOUND);
        assert_eq!(
            status(ServiceError::PayloadTooLarge(1024)),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_store_failure_detail_is_not_exposed() {
        let app_err = AppError::from(ServiceError::from(InfrastructureError::StoreUnavailable(
            "Connection refused (os error 111) at 10.0.0.7:6379".to_string(),
        )));
        match app_err {
            AppError::ServiceUnavailable(detail) => {
                assert_eq!(detail, STORE_UNAVAILABLE_MESSAGE);
                assert!(!detail.contains("10.0.0.7"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_rate_limit_carries_window() {
        let app_err = AppError::from(ServiceError::from(RateLimitError::Exceeded {
            policy: "upload",
            window: Duration::from_secs(60),
        }));
        match app_err {
            AppError::TooManyRequests(_, retry) => assert_eq!(retry, Some(60)),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
