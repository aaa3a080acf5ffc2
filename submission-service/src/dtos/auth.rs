use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::PrincipalProfile;
use crate::utils::validation::{validate_code, validate_password};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SendCodeRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,

    #[validate(custom(function = "validate_code"))]
    #[schema(example = "042317", min_length = 6, max_length = 6)]
    pub code: String,

    #[validate(custom(function = "validate_password"))]
    #[schema(example = "password123", min_length = 8)]
    pub password: String,

    #[validate(length(min = 2, max = 50, message = "Nickname must be 2-50 characters"))]
    #[schema(example = "painter")]
    pub nickname: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub principal: PrincipalProfile,
    #[schema(example = "Registration successful")]
    pub message: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "password123")]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    #[schema(example = 86400)]
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
    pub principal: PrincipalProfile,
}
