//! Server, auth and store configuration
//!
//! Values are assembled by the CLI from flags and environment variables;
//! nothing in this crate reads the environment itself.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use taskboard_core::RetryPolicy;

/// Default lifetime of issued tokens.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Longest accepted token lifetime (one year).
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Default `lock_timeout` for reorder transactions.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Default wait for a free pooled connection. Same bound as a lock wait.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = DEFAULT_LOCK_TIMEOUT;

/// Default maximum connections for the pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JWT secret must not be empty")]
    EmptySecret,

    #[error("bcrypt cost must be between 4 and 31, got {0}")]
    InvalidCost(u32),

    #[error("token lifetime must be between 1 second and {max_secs} seconds, got {ttl:?}")]
    InvalidTokenTtl { ttl: Duration, max_secs: u64 },
}

/// Token signing and password hashing settings.
#[derive(Clone)]
pub struct AuthConfig {
    jwt_secret: String,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
}

impl AuthConfig {
    /// Create an auth config. There is no fallback secret.
    pub fn new(jwt_secret: impl Into<String>) -> Result<Self, ConfigError> {
        let jwt_secret = jwt_secret.into();
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        Ok(Self {
            jwt_secret,
            token_ttl: DEFAULT_TOKEN_TTL,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        })
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Result<Self, ConfigError> {
        if ttl.as_secs() == 0 || ttl > MAX_TOKEN_TTL {
            return Err(ConfigError::InvalidTokenTtl {
                ttl,
                max_secs: MAX_TOKEN_TTL.as_secs(),
            });
        }
        self.token_ttl = ttl;
        Ok(self)
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Result<Self, ConfigError> {
        if !(4..=31).contains(&cost) {
            return Err(ConfigError::InvalidCost(cost));
        }
        self.bcrypt_cost = cost;
        Ok(self)
    }

    pub(crate) fn secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

/// Pool and transaction settings for the collection store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Upper bound on waiting for a row lock before the attempt fails
    pub lock_timeout: Duration,
    /// Upper bound on waiting for a pooled connection. An exhausted pool is
    /// retried like a lock timeout, so this bounds each attempt too.
    pub acquire_timeout: Duration,
    pub max_connections: u32,
    /// Retry policy for transient failures (lock timeouts, deadlocks)
    pub retry: RetryPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            retry: RetryPolicy::default(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:3001)
    pub bind_addr: SocketAddr,

    /// Allow any origin. Off by default: only localhost origins pass CORS.
    pub cors_permissive: bool,

    pub auth: AuthConfig,

    pub store: StoreConfig,
}

impl ServerConfig {
    pub fn new(auth: AuthConfig) -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            cors_permissive: false,
            auth,
            store: StoreConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::new(AuthConfig::new("secret").unwrap());
        assert_eq!(config.bind_addr.port(), 3001);
        assert!(!config.cors_permissive);
        assert_eq!(config.auth.token_ttl, DEFAULT_TOKEN_TTL);
        assert_eq!(config.store.lock_timeout, DEFAULT_LOCK_TIMEOUT);
        assert_eq!(config.store.acquire_timeout, DEFAULT_LOCK_TIMEOUT);
        assert_eq!(config.store.max_connections, DEFAULT_MAX_CONNECTIONS);
    }

    #[test]
    fn secret_is_required() {
        assert!(matches!(AuthConfig::new(""), Err(ConfigError::EmptySecret)));
        assert!(matches!(AuthConfig::new("  "), Err(ConfigError::EmptySecret)));
    }

    #[test]
    fn debug_redacts_secret() {
        let config = AuthConfig::new("hunter2").unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn bcrypt_cost_bounds() {
        let config = AuthConfig::new("secret").unwrap();
        assert!(config.clone().with_bcrypt_cost(3).is_err());
        assert_eq!(config.with_bcrypt_cost(4).unwrap().bcrypt_cost, 4);
    }

    #[test]
    fn token_ttl_bounds() {
        let config = AuthConfig::new("secret").unwrap();
        assert!(config.clone().with_token_ttl(Duration::ZERO).is_err());
        assert!(config
            .clone()
            .with_token_ttl(MAX_TOKEN_TTL + Duration::from_secs(1))
            .is_err());
        assert_eq!(
            config.with_token_ttl(MAX_TOKEN_TTL).unwrap().token_ttl,
            MAX_TOKEN_TTL
        );
    }
}
