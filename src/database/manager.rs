use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::{self, Environment};

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

static POOL: OnceCell<PgPool> = OnceCell::const_new();

/// Shared connection pool, created lazily on first use
pub struct DatabaseManager;

impl DatabaseManager {
    pub async fn pool() -> Result<PgPool, DatabaseError> {
        let pool = POOL
            .get_or_try_init(|| async {
                let url = Self::database_url()?;
                let db_config = &config::config().database;

                let pool = PgPoolOptions::new()
                    .max_connections(db_config.max_connections)
                    .acquire_timeout(Duration::from_secs(db_config.connection_timeout_secs))
                    .connect(&url)
                    .await?;

                info!("Created database pool");
                Ok::<_, DatabaseError>(pool)
            })
            .await?;

        Ok(pool.clone())
    }

    /// Resolve the connection string. Test runs get their own database: the
    /// path from DATABASE_URL with a `_test` suffix.
    fn database_url() -> Result<String, DatabaseError> {
        let base = std::env::var("DATABASE_URL")
            .map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))?;

        if config::config().environment != Environment::Test {
            return Ok(base);
        }

        let mut url = url::Url::parse(&base).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        let database = url.path().trim_start_matches('/').to_string();
        if database.is_empty() {
            return Err(DatabaseError::InvalidDatabaseUrl);
        }
        url.set_path(&format!("/{}_test", database));
        Ok(url.to_string())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check() -> Result<(), DatabaseError> {
        let pool = Self::pool().await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(())
    }
}
