use std::sync::Arc;

use crate::models::Principal;
use crate::services::clock::Clock;
use crate::services::email::EmailSender;
use crate::services::error::ServiceError;
use crate::services::rate_limit::{RateLimitPolicies, RateLimiter};
use crate::services::repository::Repository;
use crate::services::revocation::RevocationRegistry;
use crate::services::token::{IssuedToken, TokenService};
use crate::services::verification::VerificationCodeIssuer;
use crate::utils::password::{
    hash_password, verify_password, Password, PasswordHashString,
};

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Registration, login and logout.
#[derive(Clone)]
pub struct AuthService {
    repo: Arc<dyn Repository>,
    codes: VerificationCodeIssuer,
    limiter: RateLimiter,
    policies: RateLimitPolicies,
    email: Arc<dyn EmailSender>,
    tokens: TokenService,
    revocations: RevocationRegistry,
    clock: Arc<dyn Clock>,
}

pub struct AuthServiceDeps {
    pub repo: Arc<dyn Repository>,
    pub codes: VerificationCodeIssuer,
    pub limiter: RateLimiter,
    pub policies: RateLimitPolicies,
    pub email: Arc<dyn EmailSender>,
    pub tokens: TokenService,
    pub revocations: RevocationRegistry,
    pub clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(deps: AuthServiceDeps) -> Self {
        Self {
            repo: deps.repo,
            codes: deps.codes,
            limiter: deps.limiter,
            policies: deps.policies,
            email: deps.email,
            tokens: deps.tokens,
            revocations: deps.revocations,
            clock: deps.clock,
        }
    }

    /// Rate limited per email, then issue and deliver a fresh code.
    pub async fn send_verification_code(&self, email: &str) -> Result<(), ServiceError> {
        let email = normalize_email(email);
        self.limiter
            .guard(&self.policies.verification_code, &email)
            .await?;

        let code = self.codes.issue_code(&email).await?;
        self.email.send_code(&email, &code).await?;

        tracing::info!(email = %email, "Verification code sent");
        Ok(())
    }

    pub async fn register(
        &self,
        email: &str,
        code: &str,
        password: Password,
        nickname: &str,
    ) -> Result<Principal, ServiceError> {
        let email = normalize_email(email);

        if self.repo.email_exists(&email).await? {
            return Err(ServiceError::EmailAlreadyRegistered);
        }

        self.codes.consume_code(&email, code).await?;

        let hash = hash_password(&password)?;
        let principal = Principal::new(
            email,
            hash.into_string(),
            nickname.trim().to_string(),
            self.clock.now(),
        );

        // A concurrent registration can still win here; the repository's
        // uniqueness check decides.
        self.repo.create_principal(&principal).await?;

        tracing::info!(principal_id = %principal.id, "Principal registered");
        Ok(principal)
    }

    pub async fn login(
        &self,
        email: &str,
        password: Password,
    ) -> Result<(Principal, IssuedToken), ServiceError> {
        let email = normalize_email(email);

        let principal = match self.repo.get_principal_by_email(&email).await? {
            Some(p) => p,
            None => {
                tracing::info!(email = %email, "Login for unknown email");
                return Err(ServiceError::InvalidCredentials);
            }
        };

        let stored = PasswordHashString::new(principal.password_hash.clone());
        if verify_password(&password, &stored).is_err() {
            tracing::info!(principal_id = %principal.id, "Login with wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        let issued = self.tokens.issue(&principal)?;
        tracing::info!(principal_id = %principal.id, "Principal logged in");
        Ok((principal, issued))
    }

    pub async fn logout(&self, token: &str) -> Result<(), ServiceError> {
        self.revocations.revoke(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::services::clock::ManualClock;
    use crate::services::email::MockEmailSender;
    use crate::services::error::{AuthError, CodeError, RateLimitError};
    use crate::services::memory::InMemoryRepository;
    use crate::services::store::MemoryStore;
    use std::time::Duration;

    struct Fixture {
        clock: Arc<ManualClock>,
        email: Arc<MockEmailSender>,
        tokens: TokenService,
        auth: AuthService,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(MemoryStore::new(clock.clone()));
        let repo = Arc::new(InMemoryRepository::new());
        let email = Arc::new(MockEmailSender::new());
        let tokens = TokenService::new(
            &JwtConfig {
                secret: "auth-service-test-secret-32-bytes-long!!".to_string(),
                expiry_hours: 24,
            },
            clock.clone(),
        )
        .unwrap();
        let revocations = RevocationRegistry::new(store.clone(), tokens.clone(), clock.clone());
        let auth = AuthService::new(AuthServiceDeps {
            repo,
            codes: VerificationCodeIssuer::new(store.clone(), Duration::from_secs(300)),
            limiter: RateLimiter::new(store),
            policies: RateLimitPolicies::default(),
            email: email.clone(),
            tokens: tokens.clone(),
            revocations,
            clock: clock.clone(),
        });
        Fixture {
            clock,
            email,
            tokens,
            auth,
        }
    }

    async fn register(f: &Fixture, email: &str) -> Principal {
        f.auth.send_verification_code(email).await.unwrap();
        let code = f.email.last_code_for(email).unwrap();
        f.auth
            .register(email, &code, Password::new("password123".to_string()), "nick")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let f = fixture();
        let p = register(&f, "Dave@Example.com").await;
        assert_eq!(p.email, "dave@example.com");

        let (principal, issued) = f
            .auth
            .login("dave@example.com", Password::new("password123".to_string()))
            .await
            .unwrap();
        assert_eq!(principal.id, p.id);
        assert_eq!(f.tokens.validate(&issued.token).unwrap().sub, p.id);
    }

    #[tokio::test]
    async fn test_code_send_rate_limited_per_email() {
        let f = fixture();
        f.auth.send_verification_code("e@example.com").await.unwrap();
        assert!(matches!(
            f.auth.send_verification_code("E@example.com").await,
            Err(ServiceError::RateLimit(RateLimitError::Exceeded { .. }))
        ));
        assert_eq!(f.email.sent_count(), 1);

        f.clock.advance(chrono::Duration::seconds(60));
        f.auth.send_verification_code("e@example.com").await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_email_never_shares_a_bucket() {
        let f = fixture();
        assert!(matches!(
            f.auth.send_verification_code("  ").await,
            Err(ServiceError::RateLimit(RateLimitError::MissingScope { .. }))
        ));
    }

    #[tokio::test]
    async fn test_register_wrong_code() {
        let f = fixture();
        f.auth.send_verification_code("f@example.com").await.unwrap();
        let code = f.email.last_code_for("f@example.com").unwrap();
        let wrong = if code == "111111" { "222222" } else { "111111" };

        assert!(matches!(
            f.auth
                .register("f@example.com", wrong, Password::new("password123".into()), "nick")
                .await,
            Err(ServiceError::Code(CodeError::Mismatch))
        ));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let f = fixture();
        register(&f, "g@example.com").await;
        assert!(matches!(
            f.auth
                .register("g@example.com", "123456", Password::new("password123".into()), "nick")
                .await,
            Err(ServiceError::EmailAlreadyRegistered)
        ));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let f = fixture();
        register(&f, "h@example.com").await;

        assert!(matches!(
            f.auth.login("h@example.com", Password::new("wrong-pass1".into())).await,
            Err(ServiceError::InvalidCredentials)
        ));
        assert!(matches!(
            f.auth.login("nobody@example.com", Password::new("password123".into())).await,
            Err(ServiceError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_logout_revokes() {
        let f = fixture();
        register(&f, "i@example.com").await;
        let (_, issued) = f
            .auth
            .login("i@example.com", Password::new("password123".into()))
            .await
            .unwrap();

        f.auth.logout(&issued.token).await.unwrap();
        assert!(matches!(
            f.auth.logout("not-a-token").await,
            Err(ServiceError::Auth(AuthError::Malformed))
        ));
    }
}
