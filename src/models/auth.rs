//! Authentication request/response models

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::UserResponse;

/// Request DTO for account signup
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub full_name: Option<String>,
    pub country_code: Option<String>,
    pub phone: Option<String>,
}

/// Request DTO for login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Request DTO for refreshing tokens
#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Tokens plus the authenticated user, returned on signup/login/refresh
#[derive(Debug, Serialize)]
pub struct AuthTokensResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}
