use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Principal, ReviewStatus, Role, Submission};
use crate::services::access::AccessPolicy;
use crate::services::clock::Clock;
use crate::services::error::ServiceError;
use crate::services::repository::{Page, Paged, Repository};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PrincipalStatistics {
    pub principal_id: Uuid,
    pub total_submissions: i64,
    pub approved_submissions: i64,
    pub pending_submissions: i64,
}

/// Review decisions and principal management. Every call re-checks that the
/// acting principal may decide reviews.
#[derive(Clone)]
pub struct AdminService {
    repo: Arc<dyn Repository>,
    policy: AccessPolicy,
    clock: Arc<dyn Clock>,
}

impl AdminService {
    pub fn new(repo: Arc<dyn Repository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            policy: AccessPolicy,
            clock,
        }
    }

    pub async fn review_queue(
        &self,
        actor: &Principal,
        page: Page,
    ) -> Result<Paged<Submission>, ServiceError> {
        self.policy.ensure_can_decide_review(actor)?;
        self.repo.review_queue(page).await
    }

    pub async fn decide(
        &self,
        actor: &Principal,
        submission_id: Uuid,
        approved: bool,
    ) -> Result<Submission, ServiceError> {
        self.policy.ensure_can_decide_review(actor)?;

        let mut submission = self
            .repo
            .get_submission(submission_id)
            .await?
            .ok_or(ServiceError::NotFound("Submission"))?;

        let previous = submission.review_status;
        let next = previous.apply_decision(approved);
        if next != previous {
            let now = self.clock.now();
            self.repo
                .update_review_status(submission_id, next, now)
                .await?;
            submission.review_status = next;
            submission.updated_utc = now;
        }

        if previous == ReviewStatus::Approved && next == ReviewStatus::Pending {
            tracing::info!(
                submission_id = %submission_id,
                owner_id = %submission.owner_id,
                admin_id = %actor.id,
                "Approval reverted to pending"
            );
        } else {
            tracing::info!(
                submission_id = %submission_id,
                admin_id = %actor.id,
                status = %next,
                "Review decision recorded"
            );
        }

        Ok(submission)
    }

    /// Applies one decision to every id; returns how many existed.
    pub async fn decide_batch(
        &self,
        actor: &Principal,
        submission_ids: &[Uuid],
        approved: bool,
    ) -> Result<u64, ServiceError> {
        self.policy.ensure_can_decide_review(actor)?;
        if submission_ids.is_empty() {
            return Err(ServiceError::Validation(
                "At least one submission id is required".to_string(),
            ));
        }

        let status = ReviewStatus::Pending.apply_decision(approved);
        let updated = self
            .repo
            .batch_update_review_status(submission_ids, status, self.clock.now())
            .await?;

        tracing::info!(
            requested = submission_ids.len(),
            updated,
            admin_id = %actor.id,
            status = %status,
            "Batch review decision recorded"
        );
        Ok(updated)
    }

    pub async fn list_principals(
        &self,
        actor: &Principal,
        page: Page,
    ) -> Result<Paged<Principal>, ServiceError> {
        self.policy.ensure_can_decide_review(actor)?;
        self.repo.list_principals(page).await
    }

    pub async fn update_role(
        &self,
        actor: &Principal,
        principal_id: Uuid,
        role: Role,
    ) -> Result<Principal, ServiceError> {
        self.policy.ensure_can_decide_review(actor)?;

        let mut principal = self
            .repo
            .get_principal_by_id(principal_id)
            .await?
            .ok_or(ServiceError::NotFound("Principal"))?;
        principal.role = role;
        principal.updated_utc = self.clock.now();
        self.repo.update_principal(&principal).await?;

        tracing::info!(principal_id = %principal_id, role = %role, admin_id = %actor.id, "Role updated");
        Ok(principal)
    }

    pub async fn statistics(
        &self,
        actor: &Principal,
        principal_id: Uuid,
    ) -> Result<PrincipalStatistics, ServiceError> {
        self.policy.ensure_can_decide_review(actor)?;

        if self.repo.get_principal_by_id(principal_id).await?.is_none() {
            return Err(ServiceError::NotFound("Principal"));
        }

        Ok(PrincipalStatistics {
            principal_id,
            total_submissions: self.repo.count_submissions_by_owner(principal_id, None).await?,
            approved_submissions: self
                .repo
                .count_submissions_by_owner(principal_id, Some(ReviewStatus::Approved))
                .await?,
            pending_submissions: self
                .repo
                .count_submissions_by_owner(principal_id, Some(ReviewStatus::Pending))
                .await?,
        })
    }
}
