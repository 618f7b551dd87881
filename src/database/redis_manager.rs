use std::sync::Arc;
use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::environment::EnvironmentVariables;
use crate::models::responses::UserResponse;

pub const REVOKED_TOKEN_PREFIX: &str = "revoked:";
pub const USER_CACHE_PREFIX: &str = "user:";

pub fn revoked_key(jti: &str) -> String {
    format!("{REVOKED_TOKEN_PREFIX}{jti}")
}

pub fn user_key(user_id: i64) -> String {
    format!("{USER_CACHE_PREFIX}{user_id}")
}

/// Short-lived auth state: revoked token ids and cached user views.
#[async_trait]
pub trait AuthCache: Send + Sync {
    /// Marks a token id as revoked for `ttl_seconds`.
    async fn revoke_token(&self, jti: &str, ttl_seconds: u64) -> Result<()>;
    /// Revokes only if not already revoked; `false` means someone else got there first.
    async fn revoke_once(&self, jti: &str, ttl_seconds: u64) -> Result<bool>;
    async fn is_token_revoked(&self, jti: &str) -> Result<bool>;
    async fn cache_user(&self, user: &UserResponse, ttl_seconds: u64) -> Result<()>;
    async fn cached_user(&self, user_id: i64) -> Result<Option<UserResponse>>;
    async fn evict_user(&self, user_id: i64) -> Result<()>;
    async fn ping(&self) -> Result<()>;
}

#[derive(Clone)]
pub struct RedisService {
    client: Client,
    connection: Arc<OnceCell<ConnectionManager>>,
}

impl RedisService {
    pub fn new(env: Arc<EnvironmentVariables>) -> Result<Self> {
        let client = Client::open(env.redis_connection_info()).context("Failed to create Redis client")?;
        Ok(Self {
            client,
            connection: Arc::new(OnceCell::new()),
        })
    }

    /// Opens the managed connection and verifies it with a PING.
    pub async fn initialize(&self) -> Result<()> {
        self.get_connection().await?;
        self.ping().await?;
        info!("Redis connection established successfully");
        Ok(())
    }

    /// The connection manager reconnects on its own; clones share one socket.
    pub async fn get_connection(&self) -> Result<ConnectionManager> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                ConnectionManager::new(self.client.clone())
                    .await
                    .context("Failed to connect to Redis")
            })
            .await?;
        Ok(manager.clone())
    }

    pub async fn shutdown(&self) {
        // Connections close when the last manager clone is dropped
        info!("Redis service shutdown (noop)");
    }
}

impl std::fmt::Debug for RedisService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisService")
            .field("connected", &self.connection.initialized())
            .finish()
    }
}

#[async_trait]
impl AuthCache for RedisService {
    async fn revoke_token(&self, jti: &str, ttl_seconds: u64) -> Result<()> {
        let mut conn = self.get_connection().await?;
        // SET EX rejects a zero expiry
        let _: () = conn
            .set_ex(revoked_key(jti), "1", ttl_seconds.max(1))
            .await
            .context("Failed to store revoked token in Redis")?;
        Ok(())
    }

    async fn revoke_once(&self, jti: &str, ttl_seconds: u64) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        // SET NX EX answers nil when the key already exists
        let stored: Option<String> = redis::cmd("SET")
            .arg(revoked_key(jti))
            .arg("1")
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds.max(1))
            .query_async(&mut conn)
            .await
            .context("Failed to claim token revocation in Redis")?;
        Ok(stored.is_some())
    }

    async fn is_token_revoked(&self, jti: &str) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let exists: bool = conn
            .exists(revoked_key(jti))
            .await
            .context("Failed to check token revocation in Redis")?;
        Ok(exists)
    }

    async fn cache_user(&self, user: &UserResponse, ttl_seconds: u64) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let payload = serde_json::to_string(user).context("Failed to serialize cached user")?;
        let _: () = conn
            .set_ex(user_key(user.id), payload, ttl_seconds.max(1))
            .await
            .context("Failed to cache user in Redis")?;
        Ok(())
    }

    async fn cached_user(&self, user_id: i64) -> Result<Option<UserResponse>> {
        let mut conn = self.get_connection().await?;
        let payload: Option<String> = conn
            .get(user_key(user_id))
            .await
            .context("Failed to read cached user from Redis")?;

        payload
            .map(|json| serde_json::from_str(&json).context("Corrupt cached user payload"))
            .transpose()
    }

    async fn evict_user(&self, user_id: i64) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let _: () = conn
            .del(user_key(user_id))
            .await
            .context("Failed to evict cached user from Redis")?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .context("Failed to ping Redis")?;
        Ok(())
    }
}
