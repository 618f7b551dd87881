//! Response payloads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::user::{DeveloperType, SubscriptionPlan, User};

pub const TOKEN_TYPE_BEARER: &str = "Bearer";

/// Public view of a user; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "developer@example.com")]
    pub email: String,
    pub nickname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    pub developer_type: DeveloperType,
    pub subscription_plan: SubscriptionPlan,
    #[schema(example = "Asia/Seoul")]
    pub timezone: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 50000)]
    pub hourly_rate: Decimal,
    #[schema(example = "KRW")]
    pub preferred_currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gitlab_username: Option<String>,
    #[schema(example = "github")]
    pub provider: String,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            nickname: user.nickname.clone(),
            profile_image: user.profile_image.clone(),
            developer_type: user.developer_type,
            subscription_plan: user.subscription_plan,
            timezone: user.timezone.clone(),
            hourly_rate: user.hourly_rate,
            preferred_currency: user.preferred_currency.clone(),
            github_username: user.github_username.clone(),
            gitlab_username: user.gitlab_username.clone(),
            provider: user.provider.clone(),
            email_verified: user.email_verified,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Token pair handed out by sign-in, refresh and OAuth2 login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Access token lifetime in seconds
    #[schema(example = 86400)]
    pub expires_in: u64,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeveloperTypeCount {
    pub developer_type: DeveloperType,
    pub display_name: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeveloperTypeStats {
    pub total: i64,
    pub by_type: Vec<DeveloperTypeCount>,
}
