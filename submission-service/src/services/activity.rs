use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::models::activity::normalize_max_uploads;
use crate::models::Activity;
use crate::services::clock::Clock;
use crate::services::error::ServiceError;
use crate::services::repository::{Page, Paged, Repository};

#[derive(Debug, Clone)]
pub struct ActivityInput {
    pub name: String,
    pub description: String,
    pub deadline: Option<DateTime<Utc>>,
    pub max_uploads_per_user: Option<i32>,
}

#[derive(Clone)]
pub struct ActivityService {
    repo: Arc<dyn Repository>,
    clock: Arc<dyn Clock>,
}

impl ActivityService {
    pub fn new(repo: Arc<dyn Repository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    pub async fn list(&self, page: Page) -> Result<Paged<Activity>, ServiceError> {
        self.repo.list_activities(page).await
    }

    /// Soft-deleted activities are reported as missing.
    pub async fn get(&self, id: Uuid) -> Result<Activity, ServiceError> {
        self.repo
            .get_activity(id)
            .await?
            .filter(|a| !a.is_deleted)
            .ok_or(ServiceError::NotFound("Activity"))
    }

    pub async fn create(&self, input: ActivityInput) -> Result<Activity, ServiceError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation("Activity name is required".to_string()));
        }

        let activity = Activity::new(
            name.to_string(),
            input.description,
            input.deadline,
            input.max_uploads_per_user.unwrap_or(0),
            self.clock.now(),
        );
        self.repo.create_activity(&activity).await?;

        tracing::info!(activity_id = %activity.id, "Activity created");
        Ok(activity)
    }

    /// Blank names and non-positive limits keep the current values; the
    /// description and deadline are replaced as given.
    pub async fn update(&self, id: Uuid, input: ActivityInput) -> Result<Activity, ServiceError> {
        let mut activity = self.get(id).await?;

        let name = input.name.trim();
        if !name.is_empty() {
            activity.name = name.to_string();
        }
        activity.description = input.description;
        activity.deadline = input.deadline;
        if let Some(max) = input.max_uploads_per_user.filter(|m| *m > 0) {
            activity.max_uploads_per_user = normalize_max_uploads(max);
        }
        activity.updated_utc = self.clock.now();

        self.repo.update_activity(&activity).await?;
        Ok(activity)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        if !self.repo.soft_delete_activity(id, self.clock.now()).await? {
            return Err(ServiceError::NotFound("Activity"));
        }
        tracing::info!(activity_id = %id, "Activity deleted");
        Ok(())
    }
}
