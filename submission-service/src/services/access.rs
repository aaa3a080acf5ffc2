use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Principal, ReviewStatus, Submission};
use crate::services::error::{PermissionError, ServiceError};
use crate::services::repository::Repository;

/// Who may see, review and delete a submission. Pure decisions, no I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessPolicy;

impl AccessPolicy {
    /// Admins see everything. Pending submissions are hidden from everyone
    /// else, owners included; approved ones are visible to their owner only.
    pub fn can_view(&self, submission: &Submission, principal: &Principal) -> bool {
        if principal.is_admin() {
            return true;
        }
        match submission.review_status {
            ReviewStatus::Pending => false,
            ReviewStatus::Approved => principal.id == submission.owner_id,
        }
    }

    pub fn can_decide_review(&self, principal: &Principal) -> bool {
        principal.is_admin()
    }

    /// Owner only. Review authority does not grant deletion.
    pub fn can_delete(&self, submission: &Submission, principal: &Principal) -> bool {
        principal.id == submission.owner_id
    }

    pub fn ensure_can_decide_review(&self, principal: &Principal) -> Result<(), PermissionError> {
        if self.can_decide_review(principal) {
            Ok(())
        } else {
            Err(PermissionError::Forbidden)
        }
    }
}

/// Answers "may this principal see submission `id`", returning the record
/// when the answer is yes. Both the metadata and the content paths go
/// through this.
#[async_trait]
pub trait ViewAuthority: Send + Sync {
    async fn authorize_view(
        &self,
        submission_id: Uuid,
        principal: &Principal,
    ) -> Result<Submission, ServiceError>;
}

#[derive(Clone)]
pub struct SubmissionAccess {
    repo: Arc<dyn Repository>,
    policy: AccessPolicy,
}

impl SubmissionAccess {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self {
            repo,
            policy: AccessPolicy,
        }
    }
}

#[async_trait]
impl ViewAuthority for SubmissionAccess {
    async fn authorize_view(
        &self,
        submission_id: Uuid,
        principal: &Principal,
    ) -> Result<Submission, ServiceError> {
        let submission = self
            .repo
            .get_submission(submission_id)
            .await?
            .ok_or(ServiceError::NotFound("Submission"))?;

        if !self.policy.can_view(&submission, principal) {
            tracing::warn!(
                principal_id = %principal.id,
                submission_id = %submission_id,
                "Submission view denied"
            );
            return Err(PermissionError::Forbidden.into());
        }

        Ok(submission)
    }
}
