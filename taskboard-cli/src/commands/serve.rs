//! HTTP server command
//!
//! Applies migrations, then runs the API until Ctrl+C or SIGTERM.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use taskboard_core::RetryPolicy;
use taskboard_server::config::DEFAULT_LOCK_TIMEOUT;
use taskboard_server::{run_server, AuthConfig, ServerConfig, StoreConfig, MIGRATOR};

use super::DatabaseArgs;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', env = "TASKBOARD_BIND", default_value = "127.0.0.1:3001")]
    pub bind: SocketAddr,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Secret used to sign access tokens (required, no default)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Access token lifetime in hours
    #[arg(long, env = "TASKBOARD_TOKEN_TTL_HOURS", default_value_t = 24)]
    pub token_ttl_hours: u64,

    /// bcrypt work factor for new password hashes
    #[arg(long, env = "TASKBOARD_BCRYPT_COST")]
    pub bcrypt_cost: Option<u32>,

    /// How long a write waits for a row lock before retrying
    #[arg(long, env = "TASKBOARD_LOCK_TIMEOUT_MS", default_value_t = DEFAULT_LOCK_TIMEOUT.as_millis() as u64)]
    pub lock_timeout_ms: u64,

    /// Attempts per write when it hits a lock timeout or deadlock
    #[arg(long, env = "TASKBOARD_MAX_RETRIES", default_value_t = RetryPolicy::default().max_attempts)]
    pub max_retries: u32,

    /// Skip applying migrations on startup
    #[arg(long)]
    pub skip_migrations: bool,

    #[command(flatten)]
    pub db: DatabaseArgs,
}

impl ServeArgs {
    fn server_config(&self) -> Result<ServerConfig> {
        let secret = self
            .jwt_secret
            .clone()
            .context("JWT_SECRET not set. Set via --jwt-secret, JWT_SECRET env, or .env")?;

        let ttl_secs = self.token_ttl_hours.checked_mul(60 * 60).with_context(|| {
            format!("token TTL of {} hours is out of range", self.token_ttl_hours)
        })?;
        let mut auth = AuthConfig::new(secret)?.with_token_ttl(Duration::from_secs(ttl_secs))?;
        if let Some(cost) = self.bcrypt_cost {
            auth = auth.with_bcrypt_cost(cost)?;
        }

        let mut config = ServerConfig::new(auth);
        config.bind_addr = self.bind;
        config.cors_permissive = self.cors_permissive;
        config.store = StoreConfig {
            lock_timeout: Duration::from_millis(self.lock_timeout_ms),
            retry: RetryPolicy::default().with_max_attempts(self.max_retries),
            ..self.db.store_config()
        };
        Ok(config)
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    // Validate settings before touching the database.
    let config = args.server_config()?;
    let pool = args.db.connect(&config.store).await?;

    if !args.skip_migrations {
        MIGRATOR.run(&pool).await.context("Failed to apply migrations")?;
    }

    tracing::info!("Starting taskboard server on {}", config.bind_addr);
    run_server(pool, config).await.context("Server error")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ServeArgs {
        #[derive(Parser)]
        struct Harness {
            #[command(flatten)]
            serve: ServeArgs,
        }
        let mut argv = vec!["taskboard"];
        argv.extend_from_slice(args);
        Harness::parse_from(argv).serve
    }

    #[test]
    fn flags_flow_into_server_config() {
        let args = parse(&[
            "--jwt-secret",
            "s3cret",
            "--bind",
            "0.0.0.0:8080",
            "--lock-timeout-ms",
            "250",
            "--max-retries",
            "7",
            "--token-ttl-hours",
            "2",
            "--bcrypt-cost",
            "4",
        ]);
        let config = args.server_config().unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.store.lock_timeout, Duration::from_millis(250));
        assert_eq!(config.store.retry.max_attempts, 7);
        assert_eq!(config.auth.token_ttl, Duration::from_secs(7200));
        assert_eq!(config.auth.bcrypt_cost, 4);
    }

    #[test]
    fn pool_flags_flow_into_store_config() {
        let args = parse(&[
            "--jwt-secret",
            "s3cret",
            "--max-connections",
            "12",
            "--acquire-timeout-ms",
            "300",
        ]);
        let config = args.server_config().unwrap();

        assert_eq!(config.store.max_connections, 12);
        assert_eq!(config.store.acquire_timeout, Duration::from_millis(300));
    }

    #[test]
    fn oversized_token_ttl_is_rejected() {
        let huge = u64::MAX.to_string();
        let args = parse(&["--jwt-secret", "s3cret", "--token-ttl-hours", huge.as_str()]);
        assert!(args.server_config().is_err());

        let past_cap = parse(&["--jwt-secret", "s3cret", "--token-ttl-hours", "100000"]);
        assert!(past_cap.server_config().is_err());

        let zero = parse(&["--jwt-secret", "s3cret", "--token-ttl-hours", "0"]);
        assert!(zero.server_config().is_err());
    }

    #[test]
    fn empty_secret_is_rejected() {
        let args = parse(&["--jwt-secret", "  "]);
        assert!(args.server_config().is_err());
    }

    #[test]
    fn out_of_range_cost_is_rejected() {
        let args = parse(&["--jwt-secret", "s3cret", "--bcrypt-cost", "2"]);
        assert!(args.server_config().is_err());
    }
}
