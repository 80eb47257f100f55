//! Command implementations for the taskboard CLI

pub mod audit;
pub mod migrate;
pub mod serve;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use sqlx::PgPool;
use taskboard_server::config::{DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_MAX_CONNECTIONS};
use taskboard_server::StoreConfig;

pub use audit::run_audit;
pub use migrate::run_migrate;
pub use serve::run_serve;

/// Database connection flags shared by every subcommand
#[derive(Args, Debug)]
pub struct DatabaseArgs {
    /// Postgres connection URL
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Maximum pooled connections
    #[arg(long, env = "TASKBOARD_MAX_CONNECTIONS", default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: u32,

    /// How long a request waits for a free pooled connection
    #[arg(long, env = "TASKBOARD_ACQUIRE_TIMEOUT_MS", default_value_t = DEFAULT_ACQUIRE_TIMEOUT.as_millis() as u64)]
    pub acquire_timeout_ms: u64,
}

impl DatabaseArgs {
    /// Store settings covered by these flags; the rest are defaults.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            max_connections: self.max_connections,
            acquire_timeout: Duration::from_millis(self.acquire_timeout_ms),
            ..StoreConfig::default()
        }
    }

    pub async fn connect(&self, store: &StoreConfig) -> Result<PgPool> {
        let database_url = self
            .database_url
            .as_deref()
            .context("DATABASE_URL not set. Set via --database-url, DATABASE_URL env, or .env")?;

        taskboard_server::connect(database_url, store)
            .await
            .context("Failed to create database pool")
    }
}
