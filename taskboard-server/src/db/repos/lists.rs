//! List repository
//!
//! Lists are ordered inside their board. Creation appends, deletion re-packs
//! the remaining lists, and every position change goes through
//! [`store::move_item`], including a move to another board.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use taskboard_core::Position;
use uuid::Uuid;

use crate::db::ownership::{resolve_owned_board, resolve_owned_list, resolve_owned_list_for_update};
use crate::db::store::{self, Collection};
use crate::db::{DbError, Store};
use crate::models::Title;

/// List record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct List {
    pub id: Uuid,
    pub board_id: Uuid,
    pub title: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update of a list
#[derive(Debug, Clone, Default)]
pub struct ListPatch {
    pub title: Option<Title>,
    pub order: Option<Position>,
}

/// List repository
pub struct ListRepo<'a> {
    store: &'a Store,
}

impl<'a> ListRepo<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Append a list to a board the user owns.
    pub async fn create(&self, board_id: Uuid, user_id: Uuid, title: Title) -> Result<List, DbError> {
        self.store
            .with_transaction(move |conn| Box::pin(create_in(conn, board_id, user_id, title.clone())))
            .await
    }

    /// Rename and/or reorder a list within its board.
    pub async fn update(&self, list_id: Uuid, user_id: Uuid, patch: ListPatch) -> Result<List, DbError> {
        self.store
            .with_transaction(move |conn| Box::pin(update_in(conn, list_id, user_id, patch.clone())))
            .await
    }

    /// Move a list to `order` inside `to_board`, which may be its own board.
    ///
    /// The list must be the user's (`NotFound` otherwise); a different
    /// destination board must be too (`Forbidden` otherwise).
    pub async fn move_to(
        &self,
        list_id: Uuid,
        user_id: Uuid,
        to_board: Uuid,
        order: Position,
    ) -> Result<List, DbError> {
        self.store
            .with_transaction(move |conn| Box::pin(move_in(conn, list_id, user_id, to_board, order)))
            .await
    }

    /// Delete a list (and its cards), closing the gap among its siblings.
    pub async fn delete(&self, list_id: Uuid, user_id: Uuid) -> Result<(), DbError> {
        self.store
            .with_transaction(move |conn| Box::pin(delete_in(conn, list_id, user_id)))
            .await
    }
}

async fn create_in(
    conn: &mut PgConnection,
    board_id: Uuid,
    user_id: Uuid,
    title: Title,
) -> Result<List, DbError> {
    resolve_owned_board(&mut *conn, board_id, user_id)
        .await?
        .require("board", board_id)?;

    let position = store::append_slot(conn, Collection::Lists, board_id).await?;
    let list = sqlx::query_as::<_, List>(
        r#"
        INSERT INTO lists (board_id, title, position)
        VALUES ($1, $2, $3)
        RETURNING id, board_id, title, position, created_at, updated_at
        "#,
    )
    .bind(board_id)
    .bind(title.as_str())
    .bind(position.as_i32())
    .fetch_one(&mut *conn)
    .await?;

    tracing::debug!(list_id = %list.id, %board_id, %position, "list created");
    Ok(list)
}

async fn update_in(
    conn: &mut PgConnection,
    list_id: Uuid,
    user_id: Uuid,
    patch: ListPatch,
) -> Result<List, DbError> {
    let list = match patch.order {
        Some(order) => {
            let list = resolve_owned_list(&mut *conn, list_id, user_id)
                .await?
                .require("list", list_id)?;
            store::move_item(conn, Collection::Lists, list_id, list.board_id, list.board_id, order)
                .await?;
            list
        }
        // Title only: lock just this row, siblings are untouched.
        None => resolve_owned_list_for_update(&mut *conn, list_id, user_id)
            .await?
            .require("list", list_id)?,
    };

    if let Some(title) = &patch.title {
        sqlx::query("UPDATE lists SET title = $2, updated_at = NOW() WHERE id = $1")
            .bind(list.id)
            .bind(title.as_str())
            .execute(&mut *conn)
            .await?;
    }

    fetch_list(conn, list_id).await
}

async fn move_in(
    conn: &mut PgConnection,
    list_id: Uuid,
    user_id: Uuid,
    to_board: Uuid,
    order: Position,
) -> Result<List, DbError> {
    let list = resolve_owned_list(&mut *conn, list_id, user_id)
        .await?
        .require("list", list_id)?;

    if to_board != list.board_id {
        resolve_owned_board(&mut *conn, to_board, user_id)
            .await?
            .forbid_missing()
            .require("board", to_board)?;
    }

    store::move_item(conn, Collection::Lists, list_id, list.board_id, to_board, order).await?;
    fetch_list(conn, list_id).await
}

async fn delete_in(conn: &mut PgConnection, list_id: Uuid, user_id: Uuid) -> Result<(), DbError> {
    let list = resolve_owned_list(&mut *conn, list_id, user_id)
        .await?
        .require("list", list_id)?;
    store::remove_item(conn, Collection::Lists, list_id, list.board_id).await?;
    Ok(())
}

pub(crate) async fn fetch_list(conn: &mut PgConnection, list_id: Uuid) -> Result<List, DbError> {
    sqlx::query_as::<_, List>(
        "SELECT id, board_id, title, position, created_at, updated_at FROM lists WHERE id = $1",
    )
    .bind(list_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("list", list_id))
}
