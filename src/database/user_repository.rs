// User persistence: the repository seam and its PostgreSQL implementation

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;

use crate::models::user::{DeveloperType, NewUser, User};

/// SQLSTATE for `unique_violation`
const UNIQUE_VIOLATION: &str = "23505";

/// Raised (wrapped in `anyhow::Error`) when a write collides with the unique
/// email constraint. Both backends report it the same way.
#[derive(Debug, Error)]
#[error("Email {0} is already registered")]
pub struct DuplicateEmail(pub String);

/// Storage operations on users. Implemented by PostgreSQL and by the
/// in-memory backend.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn exists_by_email(&self, email: &str) -> Result<bool>;
    async fn find_by_github_username(&self, github_username: &str) -> Result<Option<User>>;
    async fn exists_by_github_username(&self, github_username: &str) -> Result<bool>;
    async fn find_by_provider_and_provider_id(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> Result<Option<User>>;
    /// Only matches users whose email has been verified.
    async fn find_by_email_and_verified(&self, email: &str) -> Result<Option<User>>;
    async fn count_by_developer_type(&self, developer_type: DeveloperType) -> Result<i64>;

    /// Inserts a new row; the returned user carries the generated id and timestamps.
    async fn create(&self, user: NewUser) -> Result<User>;
    /// Writes every mutable column of an existing row and bumps `updated_at`.
    async fn update(&self, user: &User) -> Result<User>;

    /// Round-trips to the store; used by the health endpoint.
    async fn ping(&self) -> Result<()>;
}

const USER_COLUMNS: &str = "id, email, password, nickname, profile_image, developer_type, \
    subscription_plan, timezone, hourly_rate, preferred_currency, github_username, \
    gitlab_username, provider, provider_id, email_verified, created_at, updated_at";

#[derive(Clone, Debug)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(&self, clause: &str, binds: &[&str]) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {clause}");
        let mut query = sqlx::query_as::<_, UserRow>(&sql);
        for value in binds {
            query = query.bind(*value);
        }

        let row = query
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to query users where {clause}"))?;

        row.map(User::try_from).transpose()
    }
}

/// A `users` row as stored; enum columns hold their names.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password: Option<String>,
    nickname: String,
    profile_image: Option<String>,
    developer_type: String,
    subscription_plan: String,
    timezone: String,
    hourly_rate: Decimal,
    preferred_currency: String,
    github_username: Option<String>,
    gitlab_username: Option<String>,
    provider: String,
    provider_id: Option<String>,
    email_verified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            id: row.id,
            email: row.email,
            password: row.password,
            nickname: row.nickname,
            profile_image: row.profile_image,
            developer_type: row.developer_type.parse()?,
            subscription_plan: row.subscription_plan.parse()?,
            timezone: row.timezone,
            hourly_rate: row.hourly_rate,
            preferred_currency: row.preferred_currency,
            github_username: row.github_username,
            gitlab_username: row.gitlab_username,
            provider: row.provider,
            provider_id: row.provider_id,
            email_verified: row.email_verified,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Turns a unique violation into `DuplicateEmail`; anything else keeps its context.
fn write_error(err: sqlx::Error, email: &str, context: &'static str) -> anyhow::Error {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            DuplicateEmail(email.to_string()).into()
        }
        _ => anyhow::Error::new(err).context(context),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load user by id")?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.fetch_one_where("email = $1", &[email]).await
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check email existence")?;
        Ok(exists)
    }

    async fn find_by_github_username(&self, github_username: &str) -> Result<Option<User>> {
        self.fetch_one_where("github_username = $1", &[github_username]).await
    }

    async fn exists_by_github_username(&self, github_username: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE github_username = $1)")
                .bind(github_username)
                .fetch_one(&self.pool)
                .await
                .context("Failed to check GitHub username existence")?;
        Ok(exists)
    }

    async fn find_by_provider_and_provider_id(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> Result<Option<User>> {
        self.fetch_one_where("provider = $1 AND provider_id = $2", &[provider, provider_id])
            .await
    }

    async fn find_by_email_and_verified(&self, email: &str) -> Result<Option<User>> {
        self.fetch_one_where("email = $1 AND email_verified = TRUE", &[email]).await
    }

    async fn count_by_developer_type(&self, developer_type: DeveloperType) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE developer_type = $1")
            .bind(developer_type.as_str())
            .fetch_one(&self.pool)
            .await
            .context("Failed to count users by developer type")?;
        Ok(count)
    }

    async fn create(&self, user: NewUser) -> Result<User> {
        // Defaults are resolved here so both backends store identical rows
        let now = Utc::now();
        let draft = user.into_user(0, now);

        let sql = format!(
            r#"
            INSERT INTO users (
                email, password, nickname, profile_image, developer_type,
                subscription_plan, timezone, hourly_rate, preferred_currency,
                github_username, gitlab_username, provider, provider_id,
                email_verified, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $15)
            RETURNING {USER_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&draft.email)
            .bind(&draft.password)
            .bind(&draft.nickname)
            .bind(&draft.profile_image)
            .bind(draft.developer_type.as_str())
            .bind(draft.subscription_plan.as_str())
            .bind(&draft.timezone)
            .bind(draft.hourly_rate)
            .bind(&draft.preferred_currency)
            .bind(&draft.github_username)
            .bind(&draft.gitlab_username)
            .bind(&draft.provider)
            .bind(&draft.provider_id)
            .bind(draft.email_verified)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| write_error(err, &draft.email, "Failed to insert user"))?;

        User::try_from(row)
    }

    async fn update(&self, user: &User) -> Result<User> {
        let sql = format!(
            r#"
            UPDATE users SET
                email = $2, password = $3, nickname = $4, profile_image = $5,
                developer_type = $6, subscription_plan = $7, timezone = $8,
                hourly_rate = $9, preferred_currency = $10, github_username = $11,
                gitlab_username = $12, provider = $13, provider_id = $14,
                email_verified = $15, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.id)
            .bind(&user.email)
            .bind(&user.password)
            .bind(&user.nickname)
            .bind(&user.profile_image)
            .bind(user.developer_type.as_str())
            .bind(user.subscription_plan.as_str())
            .bind(&user.timezone)
            .bind(user.hourly_rate)
            .bind(&user.preferred_currency)
            .bind(&user.github_username)
            .bind(&user.gitlab_username)
            .bind(&user.provider)
            .bind(&user.provider_id)
            .bind(user.email_verified)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| write_error(err, &user.email, "Failed to update user"))?
            .with_context(|| format!("User {} does not exist", user.id))?;

        User::try_from(row)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database ping failed")?;
        Ok(())
    }
}
