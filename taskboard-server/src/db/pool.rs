//! Connection pool sized and bounded by [`StoreConfig`]
//!
//! The acquire timeout matters as much as `lock_timeout`: a request that
//! cannot get a connection fails with `PoolTimedOut`, which the store
//! retries, so each attempt must give up in bounded time.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::StoreConfig;

/// Pool options for a store running with `config`.
pub fn pool_options(config: &StoreConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
}

/// Connect a pool for a store running with `config`.
///
/// # Example
///
/// ```ignore
/// let config = StoreConfig::default();
/// let pool = connect("postgres://localhost/taskboard", &config).await?;
/// let store = Store::new(pool, config);
/// ```
pub async fn connect(database_url: &str, config: &StoreConfig) -> Result<PgPool, sqlx::Error> {
    pool_options(config).connect(database_url).await
}
