use std::sync::Arc;
use std::time::Duration;

use crate::config::{RateLimitConfig, RateLimitRule};
use crate::services::error::{RateLimitError, ServiceError};
use crate::services::store::{EphemeralStore, RATE_LIMIT_PREFIX};

/// A purpose-scoped quota: at most `max_requests` per `window` per scope key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub name: &'static str,
    pub key_prefix: &'static str,
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    fn from_rule(name: &'static str, key_prefix: &'static str, rule: RateLimitRule) -> Self {
        Self {
            name,
            key_prefix,
            max_requests: rule.attempts,
            window: Duration::from_secs(rule.window_seconds),
        }
    }
}

/// The configured policies, one per guarded action.
#[derive(Debug, Clone)]
pub struct RateLimitPolicies {
    /// Keyed by email.
    pub verification_code: RateLimitPolicy,
    /// Keyed by source address.
    pub login: RateLimitPolicy,
    /// Keyed by source address.
    pub register: RateLimitPolicy,
    /// Keyed by principal id.
    pub upload: RateLimitPolicy,
}

impl From<&RateLimitConfig> for RateLimitPolicies {
    fn from(config: &RateLimitConfig) -> Self {
        Self {
            verification_code: RateLimitPolicy::from_rule(
                "verification_code",
                "email_code",
                config.verification_code,
            ),
            login: RateLimitPolicy::from_rule("login", "login", config.login),
            register: RateLimitPolicy::from_rule("register", "register", config.register),
            upload: RateLimitPolicy::from_rule("upload", "upload", config.upload),
        }
    }
}

impl Default for RateLimitPolicies {
    fn default() -> Self {
        Self::from(&RateLimitConfig::default())
    }
}

/// Store key for one policy and identifier. There is no anonymous bucket:
/// an empty identifier is refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeKey(String);

impl ScopeKey {
    pub fn new(policy: &RateLimitPolicy, identifier: &str) -> Result<Self, RateLimitError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(RateLimitError::MissingScope {
                policy: policy.name,
            });
        }
        Ok(Self(format!(
            "{}{}:{}",
            RATE_LIMIT_PREFIX,
            policy.key_prefix,
            identifier.to_lowercase()
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn EphemeralStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn EphemeralStore>) -> Self {
        Self { store }
    }

    /// Count this attempt against the policy or reject it. Store failures
    /// propagate, so callers deny rather than admit.
    pub async fn check_and_increment(
        &self,
        scope: &ScopeKey,
        policy: &RateLimitPolicy,
    ) -> Result<(), ServiceError> {
        let decision = self
            .store
            .increment_within_window(scope.as_str(), policy.max_requests, policy.window)
            .await?;

        if decision.admitted {
            return Ok(());
        }

        metrics::counter!("rate_limit_rejections_total", "policy" => policy.name).increment(1);
        tracing::warn!(
            policy = policy.name,
            scope = scope.as_str(),
            count = decision.count,
            reset_after_ms = decision.reset_after.as_millis() as u64,
            "Rate limit exceeded"
        );

        Err(RateLimitError::Exceeded {
            policy: policy.name,
            window: policy.window,
        }
        .into())
    }

    /// Build the scope key and check it in one step.
    pub async fn guard(&self, policy: &RateLimitPolicy, identifier: &str) -> Result<(), ServiceError> {
        let scope = ScopeKey::new(policy, identifier)?;
        self.check_and_increment(&scope, policy).await
    }
}
