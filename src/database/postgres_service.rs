// =============================================================================
// DATABASE SERVICE - PostgreSQL pool and schema bootstrap
// =============================================================================

use std::sync::Arc;
use std::time::Duration;
use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::{ConnectOptions, Executor, PgPool};
use tokio::sync::OnceCell;
use tracing::{debug, info, log::LevelFilter};

use crate::config::environment::EnvironmentVariables;

/// Idempotent schema script, executed on every startup
const INIT_SCHEMA_SQL: &str = include_str!("sql/schema_init.sql");

/// Database service owning the PostgreSQL connection pool.
#[derive(Clone, Debug)]
pub struct DatabaseService {
    /// Filled by `initialize()`
    pool: Arc<OnceCell<PgPool>>,
    config: Arc<EnvironmentVariables>,
}

impl DatabaseService {
    /// The pool is not created until `initialize()` is called.
    pub fn new(config: Arc<EnvironmentVariables>) -> Self {
        Self {
            pool: Arc::new(OnceCell::new()),
            config,
        }
    }

    /// Creates the pool and applies the schema script.
    pub async fn initialize(&self) -> Result<&PgPool> {
        info!("Initializing DatabaseService...");

        let pool = self
            .pool
            .get_or_try_init(|| async { self.create_pool().await })
            .await?;

        Self::apply_schema(pool).await?;

        info!("DatabaseService initialized successfully");
        Ok(pool)
    }

    /// Runs the idempotent schema script against `pool`.
    pub async fn apply_schema(pool: &PgPool) -> Result<()> {
        info!("Executing schema initialization...");
        pool.execute(INIT_SCHEMA_SQL)
            .await
            .context("Failed to execute schema initialization SQL")?;
        Ok(())
    }

    /// Gracefully shuts down the service.
    pub async fn shutdown(&self) {
        info!("Initiating DatabaseService shutdown...");
        if let Some(pool) = self.pool.get() {
            pool.close().await;
            info!("Database connection pool closed");
        } else {
            debug!("Database pool was not initialized, nothing to close");
        }
    }

    /// Errors if the pool has not been initialized.
    pub fn get_pool(&self) -> Result<&PgPool> {
        self.pool
            .get()
            .ok_or_else(|| anyhow::anyhow!("Database pool not initialized"))
    }
}

// =============================================================================
// INTERNAL HELPERS
// =============================================================================

impl DatabaseService {
    async fn create_pool(&self) -> Result<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(self.config.db_max_connections)
            .min_connections(self.config.db_min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(30))
            .connect_with(self.connect_options())
            .await
            .context("Failed to create database connection pool")?;

        info!(
            host = %self.config.db_host,
            database = %self.config.db_name,
            max_connections = self.config.db_max_connections,
            "Database connection pool created"
        );
        Ok(pool)
    }

    /// Connection options with UTC session timezone; TLS is required outside development
    fn connect_options(&self) -> PgConnectOptions {
        let ssl_mode = if self.config.is_development() {
            PgSslMode::Prefer
        } else {
            PgSslMode::Require
        };

        PgConnectOptions::new()
            .host(&self.config.db_host)
            .port(self.config.db_port)
            .username(&self.config.db_user)
            .password(&self.config.db_password)
            .database(&self.config.db_name)
            .options([("timezone", "UTC"), ("application_name", "devtracker-api")])
            .ssl_mode(ssl_mode)
            .log_statements(LevelFilter::Debug)
    }
}
