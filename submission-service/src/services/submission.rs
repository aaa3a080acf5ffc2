use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Principal, Submission};
use crate::services::access::{AccessPolicy, ViewAuthority};
use crate::services::clock::Clock;
use crate::services::error::{PermissionError, ServiceError};
use crate::services::repository::Repository;
use crate::services::storage::BlobStore;
use crate::utils::image::validate_image;

pub struct SubmissionServiceDeps {
    pub repo: Arc<dyn Repository>,
    pub blobs: Arc<dyn BlobStore>,
    pub authority: Arc<dyn ViewAuthority>,
    pub clock: Arc<dyn Clock>,
    pub max_upload_bytes: usize,
}

/// Upload, metadata read and delete of submissions.
#[derive(Clone)]
pub struct SubmissionService {
    repo: Arc<dyn Repository>,
    blobs: Arc<dyn BlobStore>,
    authority: Arc<dyn ViewAuthority>,
    policy: AccessPolicy,
    clock: Arc<dyn Clock>,
    max_upload_bytes: usize,
}

impl SubmissionService {
    pub fn new(deps: SubmissionServiceDeps) -> Self {
        Self {
            repo: deps.repo,
            blobs: deps.blobs,
            authority: deps.authority,
            policy: AccessPolicy,
            clock: deps.clock,
            max_upload_bytes: deps.max_upload_bytes,
        }
    }

    pub async fn upload(
        &self,
        owner: &Principal,
        activity_id: Uuid,
        file_name: &str,
        data: &[u8],
    ) -> Result<Submission, ServiceError> {
        validate_image(file_name, data, self.max_upload_bytes)?;

        let activity = self
            .repo
            .get_activity(activity_id)
            .await?
            .filter(|a| !a.is_deleted)
            .ok_or(ServiceError::NotFound("Activity"))?;
        if !activity.is_active(self.clock.now()) {
            return Err(ServiceError::ActivityClosed);
        }

        let uploaded = self
            .repo
            .count_submissions_by_owner_and_activity(owner.id, activity_id)
            .await?;
        if uploaded >= i64::from(activity.max_uploads_per_user) {
            return Err(ServiceError::UploadLimitReached(activity.max_uploads_per_user));
        }

        let path = self.blobs.save(data, file_name).await?;
        let submission = Submission::new(
            activity_id,
            owner.id,
            path,
            file_name.to_string(),
            self.clock.now(),
        );

        if let Err(e) = self.repo.create_submission(&submission).await {
            if let Err(cleanup) = self.blobs.delete(&submission.file_path).await {
                tracing::error!(path = %submission.file_path, error = %cleanup, "Failed to remove orphaned blob");
            }
            return Err(e);
        }

        tracing::info!(
            submission_id = %submission.id,
            principal_id = %owner.id,
            activity_id = %activity_id,
            "Submission uploaded"
        );
        Ok(submission)
    }

    pub async fn get(&self, id: Uuid, principal: &Principal) -> Result<Submission, ServiceError> {
        self.authority.authorize_view(id, principal).await
    }

    /// Owner only. The record goes first; a blob that cannot be removed is
    /// logged and left behind.
    pub async fn delete(&self, id: Uuid, principal: &Principal) -> Result<(), ServiceError> {
        let submission = self
            .repo
            .get_submission(id)
            .await?
            .ok_or(ServiceError::NotFound("Submission"))?;

        if !self.policy.can_delete(&submission, principal) {
            tracing::warn!(principal_id = %principal.id, submission_id = %id, "Submission delete denied");
            return Err(PermissionError::Forbidden.into());
        }

        self.repo.delete_submission(id).await?;

        if let Err(e) = self.blobs.delete(&submission.file_path).await {
            tracing::error!(submission_id = %id, path = %submission.file_path, error = %e, "Failed to delete blob");
        }

        tracing::info!(submission_id = %id, principal_id = %principal.id, "Submission deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Activity, Role};
    use crate::services::access::SubmissionAccess;
    use crate::services::clock::ManualClock;
    use crate::services::memory::InMemoryRepository;
    use crate::services::storage::LocalBlobStore;
    use chrono::{Duration, Utc};

    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    struct Fixture {
        _dir: tempfile::TempDir,
        clock: Arc<ManualClock>,
        repo: Arc<InMemoryRepository>,
        svc: SubmissionService,
        owner: Principal,
        activity: Activity,
    }

    async fn fixture(max_uploads: i32) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::default());
        let repo = Arc::new(InMemoryRepository::new());
        let blobs = Arc::new(LocalBlobStore::new(dir.path()).await.unwrap());
        let svc = SubmissionService::new(SubmissionServiceDeps {
            repo: repo.clone(),
            blobs,
            authority: Arc::new(SubmissionAccess::new(repo.clone())),
            clock: clock.clone(),
            max_upload_bytes: 1024,
        });
        let owner = Principal::new("o@example.com".into(), "h".into(), "owner".into(), Utc::now());
        let activity = Activity::new(
            "Spring".into(),
            String::new(),
            Some(clock.now() + Duration::days(1)),
            max_uploads,
            clock.now(),
        );
        repo.create_activity(&activity).await.unwrap();
        Fixture {
            _dir: dir,
            clock,
            repo,
            svc,
            owner,
            activity,
        }
    }

    #[tokio::test]
    async fn test_upload_creates_pending() {
        let f = fixture(2).await;
        let s = f.svc.upload(&f.owner, f.activity.id, "a.png", PNG).await.unwrap();
        assert_eq!(s.review_status, crate::models::ReviewStatus::Pending);
        assert!(matches!(
            f.svc.get(s.id, &f.owner).await,
            Err(ServiceError::Permission(PermissionError::Forbidden))
        ));
    }

    #[tokio::test]
    async fn test_upload_limit_per_activity() {
        let f = fixture(2).await;
        f.svc.upload(&f.owner, f.activity.id, "a.png", PNG).await.unwrap();
        f.svc.upload(&f.owner, f.activity.id, "b.png", PNG).await.unwrap();
        assert!(matches!(
            f.svc.upload(&f.owner, f.activity.id, "c.png", PNG).await,
            Err(ServiceError::UploadLimitReached(2))
        ));
    }

    #[tokio::test]
    async fn test_upload_after_deadline_rejected() {
        let f = fixture(2).await;
        f.clock.advance(Duration::days(2));
        assert!(matches!(
            f.svc.upload(&f.owner, f.activity.id, "a.png", PNG).await,
            Err(ServiceError::ActivityClosed)
        ));
    }

    #[tokio::test]
    async fn test_delete_is_owner_only() {
        let f = fixture(2).await;
        let s = f.svc.upload(&f.owner, f.activity.id, "a.png", PNG).await.unwrap();
        let mut admin = Principal::new("a@example.com".into(), "h".into(), "admin".into(), Utc::now());
        admin.role = Role::Admin;

        assert!(matches!(
            f.svc.delete(s.id, &admin).await,
            Err(ServiceError::Permission(PermissionError::Forbidden))
        ));
        f.svc.delete(s.id, &f.owner).await.unwrap();
        assert!(f.repo.get_submission(s.id).await.unwrap().is_none());
    }
}
