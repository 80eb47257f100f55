//! Board repository
//!
//! Boards are unordered, so nothing here goes through the reorder engine.
//! Deleting a board cascades to its lists and cards.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::cards::Card;
use super::lists::List;
use crate::db::ownership::resolve_owned_board;
use crate::db::{DbError, Store};
use crate::models::Title;

/// Board record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Board {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A list and its cards, both in position order
#[derive(Debug, Clone)]
pub struct ListWithCards {
    pub list: List,
    pub cards: Vec<Card>,
}

/// A board with everything on it
#[derive(Debug, Clone)]
pub struct BoardTree {
    pub board: Board,
    pub lists: Vec<ListWithCards>,
}

/// Board repository
pub struct BoardRepo<'a> {
    store: &'a Store,
}

impl<'a> BoardRepo<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub async fn create(&self, user_id: Uuid, title: Title) -> Result<Board, DbError> {
        let board = sqlx::query_as::<_, Board>(
            r#"
            INSERT INTO boards (user_id, title)
            VALUES ($1, $2)
            RETURNING id, user_id, title, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(title.as_str())
        .fetch_one(self.store.pool())
        .await?;
        Ok(board)
    }

    /// The user's boards, oldest first.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Board>, DbError> {
        let boards = sqlx::query_as::<_, Board>(
            r#"
            SELECT id, user_id, title, created_at, updated_at
            FROM boards
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.store.pool())
        .await?;
        Ok(boards)
    }

    /// Board with its lists and cards. Three queries regardless of size,
    /// read from one snapshot so a concurrent move never shows a card twice.
    pub async fn get_tree(&self, board_id: Uuid, user_id: Uuid) -> Result<BoardTree, DbError> {
        let mut tx = self.store.pool().begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let board = resolve_owned_board(&mut *tx, board_id, user_id)
            .await?
            .require("board", board_id)?;

        let lists = sqlx::query_as::<_, List>(
            r#"
            SELECT id, board_id, title, position, created_at, updated_at
            FROM lists
            WHERE board_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(board_id)
        .fetch_all(&mut *tx)
        .await?;

        let cards = sqlx::query_as::<_, Card>(
            r#"
            SELECT c.id, c.list_id, c.title, c.description, c.position, c.created_at, c.updated_at
            FROM cards c
            JOIN lists l ON l.id = c.list_id
            WHERE l.board_id = $1
            ORDER BY l.position ASC, c.position ASC
            "#,
        )
        .bind(board_id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(BoardTree {
            board,
            lists: group_cards(lists, cards),
        })
    }

    pub async fn rename(&self, board_id: Uuid, user_id: Uuid, title: Title) -> Result<Board, DbError> {
        sqlx::query_as::<_, Board>(
            r#"
            UPDATE boards SET title = $3, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, created_at, updated_at
            "#,
        )
        .bind(board_id)
        .bind(user_id)
        .bind(title.as_str())
        .fetch_optional(self.store.pool())
        .await?
        .ok_or_else(|| DbError::not_found("board", board_id))
    }

    pub async fn delete(&self, board_id: Uuid, user_id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM boards WHERE id = $1 AND user_id = $2")
            .bind(board_id)
            .bind(user_id)
            .execute(self.store.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("board", board_id));
        }
        tracing::debug!(%board_id, "board deleted");
        Ok(())
    }
}

/// Attach cards (sorted by list, then position) to their lists.
fn group_cards(lists: Vec<List>, cards: Vec<Card>) -> Vec<ListWithCards> {
    let mut grouped: Vec<ListWithCards> = lists
        .into_iter()
        .map(|list| ListWithCards {
            list,
            cards: Vec::new(),
        })
        .collect();

    for card in cards {
        if let Some(entry) = grouped.iter_mut().find(|entry| entry.list.id == card.list_id) {
            entry.cards.push(card);
        }
    }
    grouped
}
