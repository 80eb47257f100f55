//! Ownership resolution
//!
//! Each resolver walks the hierarchy up to the board's owner in one JOIN.
//! Something that exists but belongs to another user resolves exactly like
//! something that does not exist.

use sqlx::PgExecutor;
use uuid::Uuid;

use super::error::DbError;
use super::repos::{Board, Card, List};

/// Outcome of looking up an entity on behalf of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ownership<T> {
    Found(T),
    /// Missing, or owned by somebody else
    NotFound,
    /// Destination of a move that the user may not write to
    Forbidden,
}

impl<T> Ownership<T> {
    fn from_row(row: Option<T>) -> Self {
        match row {
            Some(value) => Self::Found(value),
            None => Self::NotFound,
        }
    }

    /// Treat a miss as forbidden. Used for move destinations.
    pub fn forbid_missing(self) -> Self {
        match self {
            Self::NotFound => Self::Forbidden,
            other => other,
        }
    }

    /// Convert into a result, naming the entity in the error.
    pub fn require(self, resource: &'static str, id: Uuid) -> Result<T, DbError> {
        match self {
            Self::Found(value) => Ok(value),
            Self::NotFound => Err(DbError::not_found(resource, id)),
            Self::Forbidden => Err(DbError::Forbidden {
                resource,
                id: id.to_string(),
            }),
        }
    }
}

const BOARD_COLUMNS: &str = "b.id, b.user_id, b.title, b.created_at, b.updated_at";
const LIST_COLUMNS: &str = "l.id, l.board_id, l.title, l.position, l.created_at, l.updated_at";
const CARD_COLUMNS: &str =
    "c.id, c.list_id, c.title, c.description, c.position, c.created_at, c.updated_at";

fn board_sql(lock: &str) -> String {
    format!("SELECT {BOARD_COLUMNS} FROM boards b WHERE b.id = $1 AND b.user_id = $2{lock}")
}

fn list_sql(lock: &str) -> String {
    format!(
        "SELECT {LIST_COLUMNS} FROM lists l \
         JOIN boards b ON b.id = l.board_id \
         WHERE l.id = $1 AND b.user_id = $2{lock}"
    )
}

fn card_sql(lock: &str) -> String {
    format!(
        "SELECT {CARD_COLUMNS} FROM cards c \
         JOIN lists l ON l.id = c.list_id \
         JOIN boards b ON b.id = l.board_id \
         WHERE c.id = $1 AND b.user_id = $2{lock}"
    )
}

pub async fn resolve_owned_board<'e>(
    executor: impl PgExecutor<'e>,
    board_id: Uuid,
    user_id: Uuid,
) -> Result<Ownership<Board>, DbError> {
    let row = sqlx::query_as::<_, Board>(&board_sql(""))
        .bind(board_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;
    Ok(Ownership::from_row(row))
}

pub async fn resolve_owned_list<'e>(
    executor: impl PgExecutor<'e>,
    list_id: Uuid,
    user_id: Uuid,
) -> Result<Ownership<List>, DbError> {
    let row = sqlx::query_as::<_, List>(&list_sql(""))
        .bind(list_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;
    Ok(Ownership::from_row(row))
}

pub async fn resolve_owned_card<'e>(
    executor: impl PgExecutor<'e>,
    card_id: Uuid,
    user_id: Uuid,
) -> Result<Ownership<Card>, DbError> {
    let row = sqlx::query_as::<_, Card>(&card_sql(""))
        .bind(card_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;
    Ok(Ownership::from_row(row))
}

/// Like [`resolve_owned_list`], also locking the list row.
pub async fn resolve_owned_list_for_update<'e>(
    executor: impl PgExecutor<'e>,
    list_id: Uuid,
    user_id: Uuid,
) -> Result<Ownership<List>, DbError> {
    let row = sqlx::query_as::<_, List>(&list_sql(" FOR UPDATE OF l"))
        .bind(list_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;
    Ok(Ownership::from_row(row))
}

/// Like [`resolve_owned_card`], also locking the card row.
pub async fn resolve_owned_card_for_update<'e>(
    executor: impl PgExecutor<'e>,
    card_id: Uuid,
    user_id: Uuid,
) -> Result<Ownership<Card>, DbError> {
    let row = sqlx::query_as::<_, Card>(&card_sql(" FOR UPDATE OF c"))
        .bind(card_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;
    Ok(Ownership::from_row(row))
}
