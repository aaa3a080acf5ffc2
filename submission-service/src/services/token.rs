use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::models::{Principal, Role};
use crate::services::clock::Clock;
use crate::services::error::AuthError;

const MIN_SECRET_BYTES: usize = 32;

/// Issues and validates HS256 bearer tokens. The signing secret is fixed at
/// construction and never changes afterwards.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
    clock: Arc<dyn Clock>,
}

/// Claims embedded in every bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (principal ID)
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Distinguishes tokens issued within the same second
    pub jti: String,
}

impl AccessClaims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenService {
    pub fn new(config: &JwtConfig, clock: Arc<dyn Clock>) -> Result<Self, anyhow::Error> {
        if config.secret.len() < MIN_SECRET_BYTES {
            return Err(anyhow::anyhow!(
                "JWT secret must be at least {} bytes",
                MIN_SECRET_BYTES
            ));
        }
        if config.expiry_hours <= 0 {
            return Err(anyhow::anyhow!("JWT expiry must be positive"));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock instead.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        tracing::info!(lifetime_hours = config.expiry_hours, "Token service initialized with HS256");

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            lifetime: Duration::hours(config.expiry_hours),
            clock,
        })
    }

    pub fn issue(&self, principal: &Principal) -> Result<IssuedToken, anyhow::Error> {
        let now = self.clock.now();
        let expires_at = now + self.lifetime;

        let claims = AccessClaims {
            sub: principal.id,
            email: principal.email.clone(),
            role: principal.role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode access token: {}", e))?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Verify signature and algorithm, then expiry against the clock.
    pub fn validate(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let data = decode::<AccessClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    AuthError::InvalidSignature
                }
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Malformed,
            },
        )?;

        if self.clock.now().timestamp() >= data.claims.exp {
            return Err(AuthError::Expired);
        }

        Ok(data.claims)
    }

    pub fn lifetime_seconds(&self) -> i64 {
        self.lifetime.num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::clock::ManualClock;

    const SECRET: &str = "test-secret-that-is-at-least-32-bytes-long";

    fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
            expiry_hours: 24,
        }
    }

    fn principal(role: Role) -> Principal {
        let mut p = Principal::new(
            "alice@example.com".to_string(),
            "hash".to_string(),
            "alice".to_string(),
            Utc::now(),
        );
        p.role = role;
        p
    }

    fn service() -> (Arc<ManualClock>, TokenService) {
        let clock = Arc::new(ManualClock::default());
        let svc = TokenService::new(&config(SECRET), clock.clone()).unwrap();
        (clock, svc)
    }

    #[test]
    fn test_short_secret_rejected() {
        let clock = Arc::new(ManualClock::default());
        assert!(TokenService::new(&config("too-short"), clock).is_err());
    }

    #[test]
    fn test_issue_then_validate_returns_claims() {
        let (clock, svc) = service();
        let p = principal(Role::Admin);
        let issued = svc.issue(&p).unwrap();

        let claims = svc.validate(&issued.token).unwrap();
        assert_eq!(claims.sub, p.id);
        assert_eq!(claims.email, p.email);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
        assert_eq!(claims.iat, clock.now().timestamp());
        assert_eq!(issued.expires_at.timestamp(), claims.exp);
    }

    #[test]
    fn test_tokens_in_same_second_are_distinct() {
        let (_, svc) = service();
        let p = principal(Role::Member);
        let a = svc.issue(&p).unwrap();
        let b = svc.issue(&p).unwrap();
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn test_expired_after_lifetime() {
        let (clock, svc) = service();
        let issued = svc.issue(&principal(Role::Member)).unwrap();

        clock.advance(Duration::hours(24) - Duration::seconds(1));
        assert!(svc.validate(&issued.token).is_ok());

        clock.advance(Duration::seconds(1));
        assert_eq!(svc.validate(&issued.token), Err(AuthError::Expired));
    }

    #[test]
    fn test_wrong_secret_is_invalid_signature() {
        let (clock, svc) = service();
        let other = TokenService::new(&config("another-secret-that-is-32-bytes-or-more"), clock).unwrap();
        let issued = other.issue(&principal(Role::Member)).unwrap();
        assert_eq!(svc.validate(&issued.token), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let (clock, svc) = service();
        let now = clock.now();
        let claims = AccessClaims {
            sub: Uuid::new_v4(),
            email: "mallory@example.com".to_string(),
            role: Role::Admin,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(svc.validate(&token), Err(AuthError::InvalidSignature));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let (_, svc) = service();
        assert_eq!(svc.validate("not-a-token"), Err(AuthError::Malformed));
        assert_eq!(svc.validate(""), Err(AuthError::Malformed));
    }
}
