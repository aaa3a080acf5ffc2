use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use crate::services::error::{CodeError, ServiceError};
use crate::services::store::{ConsumeOutcome, EphemeralStore, VERIFICATION_CODE_PREFIX};

/// One-time six digit codes keyed by email. Issuing a new code for an email
/// replaces any code still outstanding for it.
#[derive(Clone)]
pub struct VerificationCodeIssuer {
    store: Arc<dyn EphemeralStore>,
    ttl: Duration,
}

/// Store key for an email; case and surrounding whitespace are ignored.
pub fn code_key(email: &str) -> String {
    format!(
        "{}{}",
        VERIFICATION_CODE_PREFIX,
        email.trim().to_lowercase()
    )
}

impl VerificationCodeIssuer {
    pub fn new(store: Arc<dyn EphemeralStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub async fn issue_code(&self, email: &str) -> Result<String, ServiceError> {
        let code = rand::thread_rng().gen_range(100_000..=999_999).to_string();
        self.store.put(&code_key(email), &code, self.ttl).await?;
        metrics::counter!("verification_codes_issued_total").increment(1);
        Ok(code)
    }

    /// Accept `submitted` only if it equals the last code issued for `email`.
    /// A successful match deletes the code.
    pub async fn consume_code(&self, email: &str, submitted: &str) -> Result<(), ServiceError> {
        match self
            .store
            .consume_if_equals(&code_key(email), submitted.trim())
            .await?
        {
            ConsumeOutcome::Consumed => Ok(()),
            ConsumeOutcome::Missing => Err(CodeError::NotFoundOrExpired.into()),
            ConsumeOutcome::Mismatch => Err(CodeError::Mismatch.into()),
        }
    }
}
