use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Principal, PrincipalProfile, Role, Submission};
use crate::services::{Page, Paged};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewDecisionRequest {
    /// `true` approves, `false` returns the submission to pending.
    #[schema(example = true)]
    pub approved: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BatchReviewRequest {
    #[validate(length(min = 1, message = "At least one submission id is required"))]
    pub submission_ids: Vec<Uuid>,
    #[schema(example = true)]
    pub approved: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BatchReviewResponse {
    #[schema(example = 3)]
    pub updated: u64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewQueueResponse {
    pub items: Vec<Submission>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

impl ReviewQueueResponse {
    pub fn new(paged: Paged<Submission>, page: Page) -> Self {
        Self {
            items: paged.items,
            total: paged.total,
            page: page.page,
            page_size: page.page_size,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PrincipalListResponse {
    pub items: Vec<PrincipalProfile>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

impl PrincipalListResponse {
    pub fn new(paged: Paged<Principal>, page: Page) -> Self {
        Self {
            items: paged.items.iter().map(PrincipalProfile::from).collect(),
            total: paged.total,
            page: page.page,
            page_size: page.page_size,
        }
    }
}
