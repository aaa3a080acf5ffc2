use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::utils::validation::validate_password;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 50, message = "Nickname must be 2-50 characters"))]
    #[schema(example = "painter")]
    pub nickname: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Old password is required"))]
    pub old_password: String,

    #[validate(custom(function = "validate_password"))]
    #[schema(min_length = 8)]
    pub new_password: String,
}
