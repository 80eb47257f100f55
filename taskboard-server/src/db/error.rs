//! Database error type and SQLSTATE classification

use std::borrow::Cow;

use taskboard_core::{CoreError, Transient};

/// `lock_not_available`, raised when `lock_timeout` expires
pub const LOCK_NOT_AVAILABLE: &str = "55P03";
/// `serialization_failure`
pub const SERIALIZATION_FAILURE: &str = "40001";
/// `deadlock_detected`
pub const DEADLOCK_DETECTED: &str = "40P01";
/// `unique_violation`
pub const UNIQUE_VIOLATION: &str = "23505";

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    /// Destination of a move that the acting user does not own
    #[error("forbidden: {resource} '{id}'")]
    Forbidden { resource: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    /// The item changed parent between the ownership read and the lock.
    #[error("{resource} '{id}' was moved concurrently")]
    Contended { resource: &'static str, id: String },

    #[error(transparent)]
    Position(#[from] CoreError),
}

impl DbError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// SQLSTATE of the underlying Postgres error, if any.
    pub fn sqlstate(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Sqlx(sqlx::Error::Database(err)) => err.code(),
            _ => None,
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        self.sqlstate().as_deref() == Some(UNIQUE_VIOLATION)
    }
}

impl Transient for DbError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Contended { .. } => true,
            Self::Sqlx(sqlx::Error::PoolTimedOut) => true,
            Self::Sqlx(_) => matches!(
                self.sqlstate().as_deref(),
                Some(LOCK_NOT_AVAILABLE | SERIALIZATION_FAILURE | DEADLOCK_DETECTED)
            ),
            _ => false,
        }
    }
}
