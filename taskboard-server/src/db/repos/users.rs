//! User repository

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::db::{DbError, Store};
use crate::models::Email;

/// User record from database
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// User repository
pub struct UserRepo<'a> {
    store: &'a Store,
}

impl<'a> UserRepo<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Insert a user. A taken email is a `Conflict`, decided by the unique
    /// constraint rather than a prior lookup.
    pub async fn create(&self, email: &Email, password_hash: &str) -> Result<User, DbError> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(email.as_str())
        .bind(password_hash)
        .fetch_one(self.store.pool())
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(err) => {
                let err = DbError::from(err);
                if err.is_unique_violation() {
                    Err(DbError::Conflict("email is already registered".into()))
                } else {
                    Err(err)
                }
            }
        }
    }

    pub async fn find_by_email(&self, email: &Email) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email.as_str())
        .fetch_optional(self.store.pool())
        .await?;
        Ok(user)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.store.pool())
        .await?;
        Ok(user)
    }
}
