//! taskboard-server: HTTP API for boards, ordered lists and cards
//!
//! Every list and card keeps a dense 1-based position inside its parent.
//! Reorders run through one engine (`db::store`) that locks the affected
//! parents, shifts sibling ranges and retries transient lock failures.

pub mod auth;
pub mod config;
pub mod db;
pub mod http;
pub mod models;

pub use config::{AuthConfig, ServerConfig, StoreConfig};
pub use db::{connect, pool_options, DbError, Store};
pub use http::{build_router, run_server, ApiError, AppState};

/// Embedded schema migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
