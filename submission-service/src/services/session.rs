use std::sync::Arc;

use crate::models::Principal;
use crate::services::error::{AuthError, ServiceError};
use crate::services::repository::Repository;
use crate::services::revocation::RevocationRegistry;
use crate::services::token::{AccessClaims, TokenService};

/// Request-scoped identity established from a bearer token.
#[derive(Debug, Clone)]
pub struct Session {
    pub principal: Principal,
    pub claims: AccessClaims,
    pub token: String,
}

/// Turns a bearer token into a `Session`: signature and expiry first, then
/// revocation, then a fresh principal snapshot.
#[derive(Clone)]
pub struct SessionAuthenticator {
    tokens: TokenService,
    revocations: RevocationRegistry,
    repo: Arc<dyn Repository>,
}

impl SessionAuthenticator {
    pub fn new(
        tokens: TokenService,
        revocations: RevocationRegistry,
        repo: Arc<dyn Repository>,
    ) -> Self {
        Self {
            tokens,
            revocations,
            repo,
        }
    }

    pub async fn authenticate(&self, token: &str) -> Result<Session, ServiceError> {
        let claims = self.tokens.validate(token)?;

        if self.revocations.is_revoked(token).await? {
            metrics::counter!("revoked_token_rejections_total").increment(1);
            tracing::warn!(principal_id = %claims.sub, "Revoked token presented");
            return Err(AuthError::Revoked.into());
        }

        let principal = self
            .repo
            .get_principal_by_id(claims.sub)
            .await?
            .ok_or(AuthError::UnknownPrincipal)?;

        Ok(Session {
            principal,
            claims,
            token: token.to_string(),
        })
    }
}
