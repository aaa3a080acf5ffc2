use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::services::clock::Clock;
use crate::services::error::{AuthError, InfrastructureError, ServiceError};
use crate::services::store::{EphemeralStore, REVOCATION_PREFIX};
use crate::services::token::TokenService;

/// Logout registry. Each entry lives exactly as long as the token it revokes.
#[derive(Clone)]
pub struct RevocationRegistry {
    store: Arc<dyn EphemeralStore>,
    tokens: TokenService,
    clock: Arc<dyn Clock>,
}

fn revocation_key(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{}{}", REVOCATION_PREFIX, hex::encode(digest))
}

impl RevocationRegistry {
    pub fn new(store: Arc<dyn EphemeralStore>, tokens: TokenService, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            tokens,
            clock,
        }
    }

    /// Revoke a token for the rest of its natural lifetime. Revoking an
    /// already-expired token does nothing.
    pub async fn revoke(&self, token: &str) -> Result<(), ServiceError> {
        let claims = match self.tokens.validate(token) {
            Ok(claims) => claims,
            Err(AuthError::Expired) => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let remaining = claims.expires_at() - self.clock.now();
        let remaining = match remaining.to_std() {
            Ok(d) if !d.is_zero() => d,
            _ => return Ok(()),
        };

        self.store
            .put(&revocation_key(token), "revoked", remaining)
            .await?;

        tracing::info!(
            principal_id = %claims.sub,
            ttl_seconds = remaining.as_secs(),
            "Token revoked"
        );
        Ok(())
    }

    pub async fn is_revoked(&self, token: &str) -> Result<bool, InfrastructureError> {
        self.store.exists(&revocation_key(token)).await
    }
}
