//! Submission model - an uploaded resource and its review state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Review state of a submission. `Pending` is the initial state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
        }
    }

    /// The only transition: an admin decision. Repeating a decision is a no-op
    /// and an approval may be reverted by a later `false`.
    pub fn apply_decision(self, approved: bool) -> ReviewStatus {
        if approved {
            ReviewStatus::Approved
        } else {
            ReviewStatus::Pending
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReviewStatus::Pending),
            "approved" => Ok(ReviewStatus::Approved),
            other => Err(format!("Invalid review status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Submission {
    pub id: Uuid,
    pub activity_id: Uuid,
    pub owner_id: Uuid,
    #[serde(skip)]
    pub file_path: String,
    pub file_name: String,
    pub review_status: ReviewStatus,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Submission {
    pub fn new(
        activity_id: Uuid,
        owner_id: Uuid,
        file_path: String,
        file_name: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            activity_id,
            owner_id,
            file_path,
            file_name,
            review_status: ReviewStatus::Pending,
            created_utc: now,
            updated_utc: now,
        }
    }
}
