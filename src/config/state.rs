// Application state shared by every handler

use std::sync::Arc;
use anyhow::Result;
use tracing::info;

use crate::auth::{JwtTokenProvider, PasswordEncoder};
use crate::config::environment::{EnvironmentVariables, StorageBackend};
use crate::database::{
    AuthCache, DatabaseService, MemoryAuthCache, MemoryUserRepository, PgUserRepository,
    RedisService, UserRepository,
};
use crate::oauth2::GitHubOAuthService;
use crate::services::{AuthService, OAuth2UserService, UserService};

#[derive(Clone)]
pub struct AppState {
    pub environment: Arc<EnvironmentVariables>,
    pub jwt: JwtTokenProvider,
    pub users: Arc<dyn UserRepository>,
    pub cache: Arc<dyn AuthCache>,
    pub github: Arc<GitHubOAuthService>,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub oauth2_user_service: OAuth2UserService,
    /// Present for the postgres backend only
    pub database: Option<DatabaseService>,
    pub redis: Option<RedisService>,
}

impl AppState {
    /// Builds the state for the configured backend. For `postgres` the pool
    /// is created, the schema applied and Redis pinged before returning.
    pub async fn initialize(environment: Arc<EnvironmentVariables>) -> Result<Self> {
        match environment.storage_backend {
            StorageBackend::Memory => {
                info!("Using in-memory storage backend");
                Self::in_memory(environment)
            }
            StorageBackend::Postgres => {
                let database = DatabaseService::new(environment.clone());
                let pool = database.initialize().await?.clone();

                let redis = RedisService::new(environment.clone())?;
                redis.initialize().await?;

                info!("Services (DB + Redis) initialized successfully");
                Self::assemble(
                    environment,
                    Arc::new(PgUserRepository::new(pool)),
                    Arc::new(redis.clone()),
                    Some(database),
                    Some(redis),
                )
            }
        }
    }

    /// State backed entirely by process memory.
    pub fn in_memory(environment: Arc<EnvironmentVariables>) -> Result<Self> {
        Self::assemble(
            environment,
            Arc::new(MemoryUserRepository::new()),
            Arc::new(MemoryAuthCache::new()),
            None,
            None,
        )
    }

    fn assemble(
        environment: Arc<EnvironmentVariables>,
        users: Arc<dyn UserRepository>,
        cache: Arc<dyn AuthCache>,
        database: Option<DatabaseService>,
        redis: Option<RedisService>,
    ) -> Result<Self> {
        let jwt = JwtTokenProvider::from_env(&environment);
        let passwords = PasswordEncoder::new(environment.bcrypt_cost);
        let github = Arc::new(GitHubOAuthService::new(&environment)?);

        let auth_service = AuthService::new(
            users.clone(),
            cache.clone(),
            jwt.clone(),
            passwords,
            environment.user_cache_ttl_seconds,
        );
        let user_service = UserService::new(users.clone(), cache.clone());
        let oauth2_user_service = OAuth2UserService::new(users.clone(), cache.clone());

        Ok(Self {
            environment,
            jwt,
            users,
            cache,
            github,
            auth_service,
            user_service,
            oauth2_user_service,
            database,
            redis,
        })
    }

    /// Gracefully closes backing connections.
    pub async fn shutdown(&self) {
        if let Some(database) = &self.database {
            database.shutdown().await;
        }
        if let Some(redis) = &self.redis {
            redis.shutdown().await;
        }
    }
}
