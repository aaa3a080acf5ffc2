use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::models::{Activity, Principal, ReviewStatus, Submission};
use crate::services::error::ServiceError;
use crate::services::repository::{Page, Paged, Repository};

#[derive(Default)]
struct Tables {
    principals: HashMap<Uuid, Principal>,
    activities: HashMap<Uuid, Activity>,
    submissions: HashMap<Uuid, Submission>,
}

/// Process-local repository used by tests and local runs without Postgres.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: Mutex<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, ServiceError> {
        self.tables
            .lock()
            .map_err(|e| ServiceError::Database(anyhow::anyhow!("Repository mutex poisoned: {}", e)))
    }
}

fn paginate<T: Clone>(items: Vec<T>, page: Page) -> Paged<T> {
    let total = items.len() as i64;
    let items = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    Paged { items, total }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn health_check(&self) -> Result<(), ServiceError> {
        self.lock().map(|_| ())
    }

    async fn get_principal_by_id(&self, id: Uuid) -> Result<Option<Principal>, ServiceError> {
        Ok(self.lock()?.principals.get(&id).cloned())
    }

    async fn get_principal_by_email(&self, email: &str) -> Result<Option<Principal>, ServiceError> {
        Ok(self
            .lock()?
            .principals
            .values()
            .find(|p| p.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, ServiceError> {
        Ok(self.get_principal_by_email(email).await?.is_some())
    }

    async fn create_principal(&self, principal: &Principal) -> Result<(), ServiceError> {
        let mut tables = self.lock()?;
        if tables
            .principals
            .values()
            .any(|p| p.email.eq_ignore_ascii_case(&principal.email))
        {
            return Err(ServiceError::EmailAlreadyRegistered);
        }
        tables.principals.insert(principal.id, principal.clone());
        Ok(())
    }

    async fn update_principal(&self, principal: &Principal) -> Result<(), ServiceError> {
        let mut tables = self.lock()?;
        match tables.principals.get_mut(&principal.id) {
            Some(existing) => {
                *existing = principal.clone();
                Ok(())
            }
            None => Err(ServiceError::NotFound("Principal")),
        }
    }

    async fn list_principals(&self, page: Page) -> Result<Paged<Principal>, ServiceError> {
        let mut all: Vec<Principal> = self.lock()?.principals.values().cloned().collect();
        all.sort_by(|a, b| b.created_utc.cmp(&a.created_utc).then(a.id.cmp(&b.id)));
        Ok(paginate(all, page))
    }

    async fn create_activity(&self, activity: &Activity) -> Result<(), ServiceError> {
        self.lock()?.activities.insert(activity.id, activity.clone());
        Ok(())
    }

    async fn update_activity(&self, activity: &Activity) -> Result<(), ServiceError> {
        let mut tables = self.lock()?;
        match tables.activities.get_mut(&activity.id) {
            Some(existing) => {
                *existing = activity.clone();
                Ok(())
            }
            None => Err(ServiceError::NotFound("Activity")),
        }
    }

    async fn get_activity(&self, id: Uuid) -> Result<Option<Activity>, ServiceError> {
        Ok(self.lock()?.activities.get(&id).cloned())
    }

    async fn list_activities(&self, page: Page) -> Result<Paged<Activity>, ServiceError> {
        let mut all: Vec<Activity> = self
            .lock()?
            .activities
            .values()
            .filter(|a| !a.is_deleted)
            .cloned()
            .collect();
        all.sort_by(|a, b| b.created_utc.cmp(&a.created_utc).then(a.id.cmp(&b.id)));
        Ok(paginate(all, page))
    }

    async fn soft_delete_activity(&self, id: Uuid, now: DateTime<Utc>) -> Result<bool, ServiceError> {
        let mut tables = self.lock()?;
        match tables.activities.get_mut(&id) {
            Some(activity) if !activity.is_deleted => {
                activity.is_deleted = true;
                activity.updated_utc = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn create_submission(&self, submission: &Submission) -> Result<(), ServiceError> {
        self.lock()?
            .submissions
            .insert(submission.id, submission.clone());
        Ok(())
    }

    async fn get_submission(&self, id: Uuid) -> Result<Option<Submission>, ServiceError> {
        Ok(self.lock()?.submissions.get(&id).cloned())
    }

    async fn delete_submission(&self, id: Uuid) -> Result<bool, ServiceError> {
        Ok(self.lock()?.submissions.remove(&id).is_some())
    }

    async fn list_submissions_by_owner(&self, owner_id: Uuid) -> Result<Vec<Submission>, ServiceError> {
        let mut owned: Vec<Submission> = self
            .lock()?
            .submissions
            .values()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_utc.cmp(&a.created_utc).then(a.id.cmp(&b.id)));
        Ok(owned)
    }

    async fn count_submissions_by_owner_and_activity(
        &self,
        owner_id: Uuid,
        activity_id: Uuid,
    ) -> Result<i64, ServiceError> {
        Ok(self
            .lock()?
            .submissions
            .values()
            .filter(|s| s.owner_id == owner_id && s.activity_id == activity_id)
            .count() as i64)
    }

    async fn review_queue(&self, page: Page) -> Result<Paged<Submission>, ServiceError> {
        let mut pending: Vec<Submission> = self
            .lock()?
            .submissions
            .values()
            .filter(|s| s.review_status == ReviewStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.created_utc.cmp(&b.created_utc).then(a.id.cmp(&b.id)));
        Ok(paginate(pending, page))
    }

    async fn update_review_status(
        &self,
        id: Uuid,
        status: ReviewStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, ServiceError> {
        let mut tables = self.lock()?;
        match tables.submissions.get_mut(&id) {
            Some(submission) => {
                submission.review_status = status;
                submission.updated_utc = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn batch_update_review_status(
        &self,
        ids: &[Uuid],
        status: ReviewStatus,
        now: DateTime<Utc>,
    ) -> Result<u64, ServiceError> {
        let mut tables = self.lock()?;
        let mut updated = 0;
        for id in ids {
            if let Some(submission) = tables.submissions.get_mut(id) {
                submission.review_status = status;
                submission.updated_utc = now;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn count_submissions_by_owner(
        &self,
        owner_id: Uuid,
        status: Option<ReviewStatus>,
    ) -> Result<i64, ServiceError> {
        Ok(self
            .lock()?
            .submissions
            .values()
            .filter(|s| s.owner_id == owner_id)
            .filter(|s| status.map_or(true, |st| s.review_status == st))
            .count() as i64)
    }
}
