//! Activity model - a time-boxed window that accepts submissions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

pub const DEFAULT_MAX_UPLOADS_PER_USER: i32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Activity {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub deadline: Option<DateTime<Utc>>,
    pub max_uploads_per_user: i32,
    #[serde(skip)]
    pub is_deleted: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Activity {
    pub fn new(
        name: String,
        description: String,
        deadline: Option<DateTime<Utc>>,
        max_uploads_per_user: i32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            deadline,
            max_uploads_per_user: normalize_max_uploads(max_uploads_per_user),
            is_deleted: false,
            created_utc: now,
            updated_utc: now,
        }
    }

    /// Accepts uploads while not deleted and the deadline (if any) has not passed.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        if self.is_deleted {
            return false;
        }
        match self.deadline {
            Some(deadline) => now <= deadline,
            None => true,
        }
    }
}

/// Non-positive limits fall back to the default.
pub fn normalize_max_uploads(value: i32) -> i32 {
    if value <= 0 {
        DEFAULT_MAX_UPLOADS_PER_USER
    } else {
        value
    }
}
