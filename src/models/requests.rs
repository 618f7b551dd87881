//! Request payloads.

use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::user::DeveloperType;
use crate::validators::{validate_hourly_rate, validate_not_blank, validate_password_strength};

/// Email/password registration.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "developer@example.com")]
    pub email: String,

    #[validate(
        length(min = 8, max = 100, message = "Password must be between 8 and 100 characters"),
        custom(function = "validate_password_strength")
    )]
    #[schema(example = "password123!")]
    pub password: String,

    #[validate(custom(function = "validate_not_blank", message = "Password confirmation is required"))]
    #[schema(example = "password123!")]
    pub confirm_password: String,

    #[validate(length(min = 2, max = 50, message = "Nickname must be between 2 and 50 characters"))]
    #[schema(example = "devtracker")]
    pub nickname: String,

    #[validate(required(message = "Developer type is required"))]
    pub developer_type: Option<DeveloperType>,

    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[validate(custom(function = "validate_hourly_rate"))]
    #[schema(value_type = Option<f64>, example = 50000)]
    pub hourly_rate: Option<Decimal>,

    #[validate(length(equal = 3, message = "Currency must be a 3-letter code"))]
    #[schema(example = "KRW")]
    pub preferred_currency: Option<String>,

    #[validate(length(max = 100, message = "GitHub username must be at most 100 characters"))]
    #[schema(example = "developer123")]
    pub github_username: Option<String>,
}

impl SignUpRequest {
    pub fn is_password_matching(&self) -> bool {
        self.password == self.confirm_password
    }
}

/// Email/password sign-in.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "developer@example.com")]
    pub email: String,

    #[validate(custom(function = "validate_not_blank", message = "Password is required"))]
    #[schema(example = "password123!")]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[validate(custom(function = "validate_not_blank", message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Optional logout body; when present its refresh token is revoked too.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

/// Partial profile update; absent fields stay unchanged.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 50, message = "Nickname must be between 2 and 50 characters"))]
    pub nickname: Option<String>,

    #[validate(length(max = 500, message = "Profile image URL must be at most 500 characters"))]
    pub profile_image: Option<String>,

    pub developer_type: Option<DeveloperType>,

    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[validate(custom(function = "validate_hourly_rate"))]
    #[schema(value_type = Option<f64>)]
    pub hourly_rate: Option<Decimal>,

    #[validate(length(max = 100, message = "GitHub username must be at most 100 characters"))]
    pub github_username: Option<String>,
}
