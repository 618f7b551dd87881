// In-process storage backend: users in a map, auth cache in a DashMap with expiry

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};
use tokio::sync::RwLock;

use crate::database::redis_manager::{revoked_key, user_key, AuthCache};
use crate::database::user_repository::{DuplicateEmail, UserRepository};
use crate::models::responses::UserResponse;
use crate::models::user::{DeveloperType, NewUser, User};

#[derive(Debug)]
pub struct MemoryUserRepository {
    users: RwLock<HashMap<i64, User>>,
    next_id: AtomicI64,
}

impl Default for MemoryUserRepository {
    fn default() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn find_first(&self, predicate: impl Fn(&User) -> bool + Send) -> Option<User> {
        self.users
            .read()
            .await
            .values()
            .find(|user| predicate(user))
            .cloned()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.find_first(|u| u.email == email).await)
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    async fn find_by_github_username(&self, github_username: &str) -> Result<Option<User>> {
        Ok(self
            .find_first(|u| u.github_username.as_deref() == Some(github_username))
            .await)
    }

    async fn exists_by_github_username(&self, github_username: &str) -> Result<bool> {
        Ok(self.find_by_github_username(github_username).await?.is_some())
    }

    async fn find_by_provider_and_provider_id(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> Result<Option<User>> {
        Ok(self
            .find_first(|u| u.provider == provider && u.provider_id.as_deref() == Some(provider_id))
            .await)
    }

    async fn find_by_email_and_verified(&self, email: &str) -> Result<Option<User>> {
        Ok(self.find_first(|u| u.email == email && u.email_verified).await)
    }

    async fn count_by_developer_type(&self, developer_type: DeveloperType) -> Result<i64> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .filter(|u| u.developer_type == developer_type)
            .count() as i64)
    }

    async fn create(&self, user: NewUser) -> Result<User> {
        let mut users = self.users.write().await;

        // Mirrors the UNIQUE constraint on users.email
        if users.values().any(|u| u.email == user.email) {
            return Err(DuplicateEmail(user.email).into());
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let stored = user.into_user(id, Utc::now());
        users.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, user: &User) -> Result<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.id != user.id && u.email == user.email) {
            return Err(DuplicateEmail(user.email.clone()).into());
        }
        let Some(existing) = users.get_mut(&user.id) else {
            bail!("User {} does not exist", user.id);
        };

        let created_at = existing.created_at;
        *existing = User {
            created_at,
            updated_at: Utc::now(),
            ..user.clone()
        };
        Ok(existing.clone())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Entry that stops being visible once `expires_at` passes.
#[derive(Debug, Clone)]
struct Expiring {
    value: String,
    expires_at: Instant,
}

/// DashMap-backed stand-in for Redis, keyed exactly like the Redis cache.
#[derive(Debug, Default)]
pub struct MemoryAuthCache {
    entries: DashMap<String, Expiring>,
}

impl MemoryAuthCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn expiring(value: String, ttl_seconds: u64) -> Expiring {
        Expiring {
            value,
            expires_at: Instant::now() + Duration::from_secs(ttl_seconds.max(1)),
        }
    }

    fn put(&self, key: String, value: String, ttl_seconds: u64) {
        self.entries.insert(key, Self::expiring(value, ttl_seconds));
    }

    /// Inserts unless a live entry exists; the shard lock makes check and insert one step.
    fn put_if_absent(&self, key: String, value: String, ttl_seconds: u64) -> bool {
        match self.entries.entry(key) {
            Entry::Occupied(mut entry) => {
                if entry.get().expires_at > Instant::now() {
                    return false;
                }
                entry.insert(Self::expiring(value, ttl_seconds));
                true
            }
            Entry::Vacant(entry) => {
                entry.insert(Self::expiring(value, ttl_seconds));
                true
            }
        }
    }

    fn get_live(&self, key: &str) -> Option<String> {
        let live = self
            .entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone());

        if live.is_none() {
            let now = Instant::now();
            self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        }
        live
    }
}

#[async_trait]
impl AuthCache for MemoryAuthCache {
    async fn revoke_token(&self, jti: &str, ttl_seconds: u64) -> Result<()> {
        self.put(revoked_key(jti), "1".to_string(), ttl_seconds);
        Ok(())
    }

    async fn revoke_once(&self, jti: &str, ttl_seconds: u64) -> Result<bool> {
        Ok(self.put_if_absent(revoked_key(jti), "1".to_string(), ttl_seconds))
    }

    async fn is_token_revoked(&self, jti: &str) -> Result<bool> {
        Ok(self.get_live(&revoked_key(jti)).is_some())
    }

    async fn cache_user(&self, user: &UserResponse, ttl_seconds: u64) -> Result<()> {
        self.put(user_key(user.id), serde_json::to_string(user)?, ttl_seconds);
        Ok(())
    }

    async fn cached_user(&self, user_id: i64) -> Result<Option<UserResponse>> {
        self.get_live(&user_key(user_id))
            .map(|json| serde_json::from_str(&json).map_err(anyhow::Error::from))
            .transpose()
    }

    async fn evict_user(&self, user_id: i64) -> Result<()> {
        self.entries.remove(&user_key(user_id));
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
