// Start of file: /src/config/environment.rs

// * Environment configuration with a singleton pattern
// * and zero-copy defaults.

use std::{borrow::Cow, collections::HashMap};
// * anyhow for convenient error handling
use anyhow::{bail, Context, Result};
// * once_cell for lazy static initialization
use once_cell::sync::Lazy;
use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use tracing::warn;

// ! Default values for environment variables (used if variables aren't set):
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PROTOCOL: &str = "http";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_BODY_SIZE: usize = 2_097_152; // 2MB
const DEFAULT_TIMEOUT: u64 = 10; // seconds
const DEFAULT_STORAGE_BACKEND: &str = "postgres";
const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_USER: &str = "postgres";
const DEFAULT_DB_PASSWORD: &str = "postgres";
const DEFAULT_DB_NAME: &str = "devtracker";
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_DB_MIN_CONNECTIONS: u32 = 5;
const DEFAULT_REDIS_HOST: &str = "localhost";
const DEFAULT_REDIS_PORT: u16 = 6379;
const DEFAULT_JWT_EXPIRATION_MS: u64 = 86_400_000; // 24 hours
const DEFAULT_JWT_REFRESH_EXPIRATION_MS: u64 = 604_800_000; // 7 days
const DEFAULT_BCRYPT_COST: u32 = 10;
const DEFAULT_USER_CACHE_TTL: u64 = 600;
const DEFAULT_GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const DEFAULT_GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
const DEFAULT_CORS_ALLOWED_ORIGINS: &str = "*";

/// HMAC-SHA256 keys must carry at least 256 bits.
pub const MIN_JWT_SECRET_BYTES: usize = 32;

/// Which persistence/cache pair backs the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    /// PostgreSQL for users, Redis for the auth cache
    Postgres,
    /// Everything in process memory (lightweight tests, local hacking)
    Memory,
}

// * A struct containing all environment variables used by the app
#[derive(Clone, Debug)]
pub struct EnvironmentVariables {
    pub environment: Cow<'static, str>,
    pub host: Cow<'static, str>,
    pub port: u16,
    pub protocol: Cow<'static, str>,
    pub max_request_body_size: usize,
    pub default_timeout_seconds: u64,
    pub storage_backend: StorageBackend,
    pub db_host: Cow<'static, str>,
    pub db_port: u16,
    pub db_user: Cow<'static, str>,
    pub db_password: Cow<'static, str>,
    pub db_name: Cow<'static, str>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub redis_host: Cow<'static, str>,
    pub redis_port: u16,
    pub redis_password: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration_ms: u64,
    pub jwt_refresh_expiration_ms: u64,
    pub bcrypt_cost: u32,
    pub user_cache_ttl_seconds: u64,
    pub github_client_id: Option<String>,
    pub github_client_secret: Option<String>,
    pub github_authorize_url: Cow<'static, str>,
    pub github_token_url: Cow<'static, str>,
    pub github_api_url: Cow<'static, str>,
    pub oauth2_callback_url: String,
    pub oauth2_authorized_redirect_uri: Option<String>,
    pub cors_allowed_origins: Vec<String>,
}

impl EnvironmentVariables {
    // * Loads environment variables from the process (and .env).
    // * Only reads .env if ENVIRONMENT != "production".
    pub fn load() -> Result<Self> {
        // ? In non-production environments, attempt to load .env
        if std::env::var("ENVIRONMENT").unwrap_or_default() != "production" {
            dotenv::dotenv().ok();
        }

        // * Collect all environment vars from the system and .env
        let vars: HashMap<String, String> = std::env::vars()
            .chain(dotenv::vars())
            .collect();

        Self::from_map(&vars)
    }

    // * Builds the configuration from an explicit key/value map, providing
    // * defaults if missing
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self> {
        // * A small helper closure to fetch a non-empty variable by key
        let get_var = |key: &str| {
            vars.get(key)
                .map(String::as_str)
                .filter(|v| !v.trim().is_empty())
        };

        let owned_or = |key: &str, default: &'static str| -> Cow<'static, str> {
            get_var(key)
                .map(|s| Cow::Owned(s.to_string()))
                .unwrap_or(Cow::Borrowed(default))
        };

        let owned_or_warn = |key: &str, default: &'static str| -> Cow<'static, str> {
            get_var(key)
                .map(|s| Cow::Owned(s.to_string()))
                .unwrap_or_else(|| {
                    warn!("Missing {key}, defaulting to '{default}'");
                    Cow::Borrowed(default)
                })
        };

        let environment = owned_or_warn("ENVIRONMENT", DEFAULT_ENVIRONMENT);
        let host = owned_or("HOST", DEFAULT_HOST);
        let protocol = owned_or("PROTOCOL", DEFAULT_PROTOCOL);

        let port: u16 = get_var("PORT")
            .map(|s| s.parse().context("Invalid PORT value"))
            .transpose()?
            .unwrap_or(DEFAULT_PORT);

        let storage_backend = match get_var("STORAGE_BACKEND").unwrap_or(DEFAULT_STORAGE_BACKEND) {
            "postgres" => StorageBackend::Postgres,
            "memory" => StorageBackend::Memory,
            other => bail!("Invalid STORAGE_BACKEND '{other}', expected 'postgres' or 'memory'"),
        };

        let jwt_secret: String = get_var("JWT_SECRET")
            .context("JWT_SECRET must be set")?
            .to_string();

        if jwt_secret.len() < MIN_JWT_SECRET_BYTES {
            bail!(
                "JWT_SECRET is {} bytes, at least {MIN_JWT_SECRET_BYTES} bytes are required",
                jwt_secret.len()
            );
        }

        let oauth2_callback_url: String = get_var("OAUTH2_CALLBACK_URL")
            .map(str::to_string)
            .unwrap_or_else(|| format!("{protocol}://{host}:{port}/oauth2/callback/github"));

        let cors_allowed_origins: Vec<String> = get_var("CORS_ALLOWED_ORIGINS")
            .unwrap_or(DEFAULT_CORS_ALLOWED_ORIGINS)
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        // * Build our EnvironmentVariables, providing defaults if missing
        Ok(Self {
            max_request_body_size: get_var("MAX_REQUEST_BODY_SIZE")
                .map(|s| s.parse().context("Invalid MAX_REQUEST_BODY_SIZE"))
                .transpose()?
                .unwrap_or(DEFAULT_MAX_BODY_SIZE),

            default_timeout_seconds: get_var("DEFAULT_TIMEOUT_SECONDS")
                .map(|s| s.parse().context("Invalid DEFAULT_TIMEOUT_SECONDS"))
                .transpose()?
                .unwrap_or(DEFAULT_TIMEOUT),

            db_host: owned_or_warn("DB_HOST", DEFAULT_DB_HOST),

            db_port: get_var("DB_PORT")
                .map(|s| s.parse().context("Invalid DB_PORT"))
                .transpose()?
                .unwrap_or(DEFAULT_DB_PORT),

            db_user: owned_or_warn("DB_USER", DEFAULT_DB_USER),
            db_password: owned_or_warn("DB_PASSWORD", DEFAULT_DB_PASSWORD),
            db_name: owned_or("DB_NAME", DEFAULT_DB_NAME),

            db_max_connections: get_var("DB_MAX_CONNECTIONS")
                .map(|s| s.parse().context("Invalid DB_MAX_CONNECTIONS"))
                .transpose()?
                .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS),

            db_min_connections: get_var("DB_MIN_CONNECTIONS")
                .map(|s| s.parse().context("Invalid DB_MIN_CONNECTIONS"))
                .transpose()?
                .unwrap_or(DEFAULT_DB_MIN_CONNECTIONS),

            redis_host: owned_or("REDIS_HOST", DEFAULT_REDIS_HOST),

            redis_port: get_var("REDIS_PORT")
                .map(|s| s.parse().context("Invalid REDIS_PORT"))
                .transpose()?
                .unwrap_or(DEFAULT_REDIS_PORT),

            redis_password: get_var("REDIS_PASSWORD").map(str::to_string),

            jwt_secret,

            jwt_expiration_ms: get_var("JWT_EXPIRATION_MS")
                .map(|s| s.parse().context("Invalid JWT_EXPIRATION_MS"))
                .transpose()?
                .unwrap_or(DEFAULT_JWT_EXPIRATION_MS),

            jwt_refresh_expiration_ms: get_var("JWT_REFRESH_EXPIRATION_MS")
                .map(|s| s.parse().context("Invalid JWT_REFRESH_EXPIRATION_MS"))
                .transpose()?
                .unwrap_or(DEFAULT_JWT_REFRESH_EXPIRATION_MS),

            bcrypt_cost: get_var("BCRYPT_COST")
                .map(|s| s.parse().context("Invalid BCRYPT_COST"))
                .transpose()?
                .unwrap_or(DEFAULT_BCRYPT_COST),

            user_cache_ttl_seconds: get_var("USER_CACHE_TTL_SECONDS")
                .map(|s| s.parse().context("Invalid USER_CACHE_TTL_SECONDS"))
                .transpose()?
                .unwrap_or(DEFAULT_USER_CACHE_TTL),

            github_client_id: get_var("GITHUB_CLIENT_ID").map(str::to_string),
            github_client_secret: get_var("GITHUB_CLIENT_SECRET").map(str::to_string),
            github_authorize_url: owned_or("GITHUB_AUTHORIZE_URL", DEFAULT_GITHUB_AUTHORIZE_URL),
            github_token_url: owned_or("GITHUB_TOKEN_URL", DEFAULT_GITHUB_TOKEN_URL),
            github_api_url: owned_or("GITHUB_API_URL", DEFAULT_GITHUB_API_URL),
            oauth2_callback_url,
            oauth2_authorized_redirect_uri: get_var("OAUTH2_AUTHORIZED_REDIRECT_URI")
                .map(str::to_string),
            cors_allowed_origins,

            environment,
            host,
            port,
            protocol,
            storage_backend,
        })
    }

    /// Redis address and credentials. The password is passed as-is, never
    /// through a URL, so reserved characters in it need no escaping.
    pub fn redis_connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            addr: ConnectionAddr::Tcp(self.redis_host.to_string(), self.redis_port),
            redis: RedisConnectionInfo {
                password: self.redis_password.clone(),
                ..Default::default()
            },
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    // * Returns a reference to the lazily-initialized environment configuration
    pub fn instance() -> Result<&'static Self> {
        static INSTANCE: Lazy<Result<EnvironmentVariables, anyhow::Error>> = Lazy::new(|| {
            let config: EnvironmentVariables = EnvironmentVariables::load()?;

            if cfg!(debug_assertions) {
                tracing::debug!(
                    environment = %config.environment,
                    storage = ?config.storage_backend,
                    "Loaded environment configuration"
                );
            }

            Ok(config)
        });

        // ! A load failure is cached and reported on every call
        INSTANCE
            .as_ref()
            .map_err(|err| anyhow::anyhow!("Failed to load environment configuration: {err:#}"))
    }
}


// End of file: /src/config/environment.rs
