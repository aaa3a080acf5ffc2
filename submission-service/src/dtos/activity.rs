use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::Activity;
use crate::services::{ActivityInput, Paged};

/// Body for both create and update. On update a blank name or a
/// non-positive limit keeps the stored value.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ActivityRequest {
    #[validate(length(max = 200, message = "Name must be at most 200 characters"))]
    #[schema(example = "Spring Exhibition")]
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    #[schema(example = "Landscapes only")]
    pub description: String,

    pub deadline: Option<DateTime<Utc>>,

    #[schema(example = 5)]
    pub max_uploads_per_user: Option<i32>,
}

impl From<ActivityRequest> for ActivityInput {
    fn from(req: ActivityRequest) -> Self {
        ActivityInput {
            name: req.name,
            description: req.description,
            deadline: req.deadline,
            max_uploads_per_user: req.max_uploads_per_user,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActivityListResponse {
    pub items: Vec<Activity>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

impl ActivityListResponse {
    pub fn new(paged: Paged<Activity>, page: crate::services::Page) -> Self {
        Self {
            items: paged.items,
            total: paged.total,
            page: page.page,
            page_size: page.page_size,
        }
    }
}
