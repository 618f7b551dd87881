//! User entity and its enums.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_TIMEZONE: &str = "Asia/Seoul";
pub const DEFAULT_CURRENCY: &str = "KRW";
pub const PROVIDER_LOCAL: &str = "local";
pub const PROVIDER_GITHUB: &str = "github";
/// `hourly_rate` is NUMERIC(10, 2)
pub const HOURLY_RATE_SCALE: u32 = 2;

/// Largest value NUMERIC(10, 2) holds: 99999999.99
pub fn max_hourly_rate() -> Decimal {
    Decimal::new(9_999_999_999, HOURLY_RATE_SCALE)
}

/// Rounds to cents the way PostgreSQL does, half away from zero.
pub fn normalize_hourly_rate(rate: Decimal) -> Decimal {
    rate.round_dp_with_strategy(HOURLY_RATE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// What kind of developer the account belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeveloperType {
    Frontend,
    Backend,
    Fullstack,
    Mobile,
    Designer,
    Devops,
    Other,
}

impl DeveloperType {
    pub const ALL: [DeveloperType; 7] = [
        DeveloperType::Frontend,
        DeveloperType::Backend,
        DeveloperType::Fullstack,
        DeveloperType::Mobile,
        DeveloperType::Designer,
        DeveloperType::Devops,
        DeveloperType::Other,
    ];

    /// Stored/serialised name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeveloperType::Frontend => "FRONTEND",
            DeveloperType::Backend => "BACKEND",
            DeveloperType::Fullstack => "FULLSTACK",
            DeveloperType::Mobile => "MOBILE",
            DeveloperType::Designer => "DESIGNER",
            DeveloperType::Devops => "DEVOPS",
            DeveloperType::Other => "OTHER",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DeveloperType::Frontend => "Frontend",
            DeveloperType::Backend => "Backend",
            DeveloperType::Fullstack => "Full-stack",
            DeveloperType::Mobile => "Mobile",
            DeveloperType::Designer => "Designer",
            DeveloperType::Devops => "DevOps",
            DeveloperType::Other => "Other",
        }
    }
}

impl fmt::Display for DeveloperType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeveloperType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeveloperType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown developer type: {s}"))
    }
}

/// Subscription tier with its limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionPlan {
    Free,
    Basic,
    Pro,
}

impl SubscriptionPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "FREE",
            SubscriptionPlan::Basic => "BASIC",
            SubscriptionPlan::Pro => "PRO",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "Free",
            SubscriptionPlan::Basic => "Basic",
            SubscriptionPlan::Pro => "Pro",
        }
    }

    /// `u32::MAX` means unlimited.
    pub fn max_projects(&self) -> u32 {
        match self {
            SubscriptionPlan::Free => 3,
            SubscriptionPlan::Basic => 10,
            SubscriptionPlan::Pro => u32::MAX,
        }
    }

    pub fn git_integration_enabled(&self) -> bool {
        !matches!(self, SubscriptionPlan::Free)
    }
}

impl Default for SubscriptionPlan {
    fn default() -> Self {
        SubscriptionPlan::Free
    }
}

impl fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionPlan {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FREE" => Ok(SubscriptionPlan::Free),
            "BASIC" => Ok(SubscriptionPlan::Basic),
            "PRO" => Ok(SubscriptionPlan::Pro),
            other => Err(anyhow::anyhow!("Unknown subscription plan: {other}")),
        }
    }
}

/// A persisted user row.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: String,
    /// bcrypt hash; `None` for accounts created through OAuth2
    pub password: Option<String>,
    pub nickname: String,
    pub profile_image: Option<String>,
    pub developer_type: DeveloperType,
    pub subscription_plan: SubscriptionPlan,
    pub timezone: String,
    pub hourly_rate: Decimal,
    pub preferred_currency: String,
    pub github_username: Option<String>,
    pub gitlab_username: Option<String>,
    pub provider: String,
    pub provider_id: Option<String>,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Nickname is only replaced when non-blank; the image whenever one is given.
    pub fn update_profile(&mut self, nickname: Option<&str>, profile_image: Option<&str>) {
        if let Some(nickname) = nickname.filter(|n| !n.trim().is_empty()) {
            self.nickname = nickname.to_string();
        }
        if let Some(image) = profile_image {
            self.profile_image = Some(image.to_string());
        }
    }

    pub fn update_developer_info(&mut self, developer_type: Option<DeveloperType>, hourly_rate: Option<Decimal>) {
        if let Some(developer_type) = developer_type {
            self.developer_type = developer_type;
        }
        if let Some(rate) = hourly_rate {
            self.hourly_rate = normalize_hourly_rate(rate);
        }
    }

    pub fn update_github_username(&mut self, github_username: Option<String>) {
        self.github_username = github_username;
    }
}

/// Values for inserting a user; unset optional fields take the column defaults.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: String,
    pub password: Option<String>,
    pub nickname: String,
    pub profile_image: Option<String>,
    pub developer_type: Option<DeveloperType>,
    pub subscription_plan: Option<SubscriptionPlan>,
    pub timezone: Option<String>,
    pub hourly_rate: Option<Decimal>,
    pub preferred_currency: Option<String>,
    pub github_username: Option<String>,
    pub gitlab_username: Option<String>,
    pub provider: String,
    pub provider_id: Option<String>,
    pub email_verified: bool,
}

impl NewUser {
    /// Materialises the row the store will hold, with defaults filled in.
    pub fn into_user(self, id: i64, now: DateTime<Utc>) -> User {
        User {
            id,
            email: self.email,
            password: self.password,
            nickname: self.nickname,
            profile_image: self.profile_image,
            developer_type: self.developer_type.unwrap_or(DeveloperType::Other),
            subscription_plan: self.subscription_plan.unwrap_or_default(),
            timezone: self.timezone.unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
            hourly_rate: self.hourly_rate.map(normalize_hourly_rate).unwrap_or(Decimal::ZERO),
            preferred_currency: self
                .preferred_currency
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            github_username: self.github_username,
            gitlab_username: self.gitlab_username,
            provider: self.provider,
            provider_id: self.provider_id,
            email_verified: self.email_verified,
            created_at: now,
            updated_at: now,
        }
    }
}
