use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Activity, Principal, ReviewStatus, Submission};
use crate::services::error::ServiceError;

pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// One-based page request, clamped to `1..=MAX_PAGE_SIZE` items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
}

impl Page {
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Items of one page plus the total across all pages.
#[derive(Debug, Clone)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: i64,
}

/// Durable records for principals, activities and submissions.
#[async_trait]
pub trait Repository: Send + Sync {
    async fn health_check(&self) -> Result<(), ServiceError>;

    // ==================== Principals ====================

    async fn get_principal_by_id(&self, id: Uuid) -> Result<Option<Principal>, ServiceError>;

    /// Case-insensitive lookup.
    async fn get_principal_by_email(&self, email: &str) -> Result<Option<Principal>, ServiceError>;

    async fn email_exists(&self, email: &str) -> Result<bool, ServiceError>;

    /// Fails with `EmailAlreadyRegistered` when the email is taken.
    async fn create_principal(&self, principal: &Principal) -> Result<(), ServiceError>;

    async fn update_principal(&self, principal: &Principal) -> Result<(), ServiceError>;

    async fn list_principals(&self, page: Page) -> Result<Paged<Principal>, ServiceError>;

    // ==================== Activities ====================

    async fn create_activity(&self, activity: &Activity) -> Result<(), ServiceError>;

    async fn update_activity(&self, activity: &Activity) -> Result<(), ServiceError>;

    /// Includes soft-deleted activities.
    async fn get_activity(&self, id: Uuid) -> Result<Option<Activity>, ServiceError>;

    /// Newest first, soft-deleted activities excluded.
    async fn list_activities(&self, page: Page) -> Result<Paged<Activity>, ServiceError>;

    async fn soft_delete_activity(&self, id: Uuid, now: DateTime<Utc>) -> Result<bool, ServiceError>;

    // ==================== Submissions ====================

    async fn create_submission(&self, submission: &Submission) -> Result<(), ServiceError>;

    async fn get_submission(&self, id: Uuid) -> Result<Option<Submission>, ServiceError>;

    async fn delete_submission(&self, id: Uuid) -> Result<bool, ServiceError>;

    /// Newest first.
    async fn list_submissions_by_owner(&self, owner_id: Uuid) -> Result<Vec<Submission>, ServiceError>;

    async fn count_submissions_by_owner_and_activity(
        &self,
        owner_id: Uuid,
        activity_id: Uuid,
    ) -> Result<i64, ServiceError>;

    /// Pending submissions, oldest first.
    async fn review_queue(&self, page: Page) -> Result<Paged<Submission>, ServiceError>;

    async fn update_review_status(
        &self,
        id: Uuid,
        status: ReviewStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, ServiceError>;

    /// Returns how many of `ids` existed and were updated.
    async fn batch_update_review_status(
        &self,
        ids: &[Uuid],
        status: ReviewStatus,
        now: DateTime<Utc>,
    ) -> Result<u64, ServiceError>;

    async fn count_submissions_by_owner(
        &self,
        owner_id: Uuid,
        status: Option<ReviewStatus>,
    ) -> Result<i64, ServiceError>;
}
