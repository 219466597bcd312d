//! Database connection pool management
//!
//! Uses sqlx PgPool with fixed connection limits. The pool is created once
//! at process start and shared by every invocation; connections are handed
//! out as guards that return to the pool when dropped.

use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres};

use crate::config::{ConfigError, DbConfig, StatementCacheConfig};
use crate::error::{DbError, DbResult};

/// Default maximum connections for the pool.
/// Kept low: each serverless instance handles one request at a time.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// How long `acquire` waits for a free connection before giving up.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Startup failure while building the pool
#[derive(Debug, thiserror::Error)]
pub enum PoolInitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to connect to database: {0}")]
    Connect(#[from] DbError),
}

/// Process-wide pool of Postgres connections.
#[derive(Clone, Debug)]
pub struct DbPool {
    pool: PgPool,
    statement_cache: StatementCacheConfig,
}

impl DbPool {
    /// Create the pool and open the first connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is unusable or the database is
    /// unreachable. Both are fatal at startup.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let pool = DbPool::connect(&DbConfig::from_env()?).await?;
    /// ```
    pub async fn connect(config: &DbConfig) -> Result<Self, PoolInitError> {
        let options = config.connect_options()?;
        let pool = PgPoolOptions::new()
            .max_connections(DEFAULT_MAX_CONNECTIONS)
            .acquire_timeout(DEFAULT_ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| match e {
                // Refused connections are retried until the acquire timeout,
                // so at startup a timeout means the server never answered.
                sqlx::Error::PoolTimedOut => DbError::Connectivity(e),
                other => DbError::from(other),
            })?;

        tracing::info!(
            max_connections = DEFAULT_MAX_CONNECTIONS,
            statement_cache = config.statement_cache.enabled,
            statement_cache_size = config.statement_cache.capacity,
            statement_cache_sql_limit = config.statement_cache.sql_limit,
            "database pool ready"
        );

        Ok(Self::from_pool(pool, config.statement_cache))
    }

    /// Wrap an existing sqlx pool.
    pub fn from_pool(pool: PgPool, statement_cache: StatementCacheConfig) -> Self {
        Self {
            pool,
            statement_cache,
        }
    }

    /// Check out a connection. It goes back to the pool when the guard drops,
    /// on every exit path.
    ///
    /// A timeout while the pool holds no connections at all means the server
    /// stopped answering, so it is reported as `Connectivity`. A timeout with
    /// live connections that are all checked out is `PoolExhausted`.
    pub async fn acquire(&self) -> DbResult<PoolConnection<Postgres>> {
        self.pool.acquire().await.map_err(|e| {
            let err = match e {
                sqlx::Error::PoolTimedOut if self.pool.size() == 0 => DbError::Connectivity(e),
                other => DbError::from(other),
            };
            tracing::warn!(error = %err, idle = self.pool.num_idle(), "connection acquire failed");
            err
        })
    }

    /// Whether `sql` should be prepared as a cached statement.
    pub fn caches(&self, sql: &str) -> bool {
        self.statement_cache.should_cache(sql)
    }

    /// Close all connections, waiting for checked-out ones to return.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("database pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Integration tests require a real database
    // Run with: DATABASE_URL=postgres://... cargo test -p engineer-core -- --ignored

    async fn test_pool() -> DbPool {
        let config = DbConfig::from_env().expect("DATABASE_URL required");
        DbPool::connect(&config).await.expect("pool creation failed")
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn pool_acquires_connection() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.expect("acquire failed");

        let result: (i32,) = sqlx::query_as("SELECT 1")
            .fetch_one(&mut *conn)
            .await
            .expect("query failed");

        assert_eq!(result.0, 1);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn exhausted_pool_times_out() {
        let pool = test_pool().await;

        let mut held = Vec::new();
        for _ in 0..DEFAULT_MAX_CONNECTIONS {
            held.push(pool.acquire().await.expect("acquire failed"));
        }

        let err = pool.acquire().await.expect_err("pool should be exhausted");
        assert!(matches!(err, DbError::PoolExhausted));

        drop(held);
        assert!(pool.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn unreachable_database_fails_at_startup() {
        let config = DbConfig::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://app@db.invalid:5432/engineers".to_string()),
            _ => None,
        })
        .unwrap();

        let err = DbPool::connect(&config).await.unwrap_err();
        assert!(matches!(err, PoolInitError::Connect(DbError::Connectivity(_))));
    }

    #[tokio::test]
    async fn outage_after_startup_is_connectivity() {
        use crate::store::EngineerStore;
        use crate::EngineerRepo;
        use sqlx::postgres::PgConnectOptions;

        // Nothing listens on port 1, so the pool never holds a live connection
        let options = PgConnectOptions::new()
            .host("127.0.0.1")
            .port(1)
            .database("engineers")
            .username("app");
        let pg = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(2))
            .connect_lazy_with(options);
        let pool = DbPool::from_pool(pg, StatementCacheConfig::default());

        let err = pool.acquire().await.unwrap_err();
        assert!(matches!(err, DbError::Connectivity(_)), "got {err:?}");
        assert!(!err.is_retryable());

        let err = EngineerRepo::new(pool).get_all().await.unwrap_err();
        assert!(matches!(err, DbError::Connectivity(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn invalid_url_is_a_config_error() {
        let config = DbConfig::from_lookup(|key| match key {
            "DATABASE_URL" => Some("not a url".to_string()),
            _ => None,
        })
        .unwrap();

        let err = DbPool::connect(&config).await.unwrap_err();
        assert!(matches!(err, PoolInitError::Config(ConfigError::InvalidUrl(_))));
    }
}
