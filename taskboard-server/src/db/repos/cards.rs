//! Card repository
//!
//! Cards are ordered inside their list. Creation appends, deletion re-packs,
//! and both `move_to` and positional fields of `update` go through
//! [`store::move_item`].

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use taskboard_core::Position;
use uuid::Uuid;

use crate::db::ownership::{resolve_owned_card, resolve_owned_card_for_update, resolve_owned_list};
use crate::db::store::{self, Collection};
use crate::db::{DbError, Store};
use crate::models::{Description, Title};

/// Card record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Card {
    pub id: Uuid,
    pub list_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update of a card
#[derive(Debug, Clone, Default)]
pub struct CardPatch {
    pub title: Option<Title>,
    /// `Some(None)` clears the description
    pub description: Option<Option<Description>>,
    pub list_id: Option<Uuid>,
    pub order: Option<Position>,
}

impl CardPatch {
    /// True when the patch changes where the card sits.
    pub fn is_positional(&self) -> bool {
        self.list_id.is_some() || self.order.is_some()
    }

    /// Destination slot for a card currently at `current`.
    ///
    /// A new list without an order appends; an order without a list stays in
    /// the current list.
    fn target(&self, current_list: Uuid, current_position: Position) -> (Uuid, Position) {
        let list_id = self.list_id.unwrap_or(current_list);
        let position = match self.order {
            Some(order) => order,
            None if list_id != current_list => Position::LAST,
            None => current_position,
        };
        (list_id, position)
    }
}

/// Card repository
pub struct CardRepo<'a> {
    store: &'a Store,
}

impl<'a> CardRepo<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Append a card to a list the user owns.
    pub async fn create(
        &self,
        list_id: Uuid,
        user_id: Uuid,
        title: Title,
        description: Option<Description>,
    ) -> Result<Card, DbError> {
        self.store
            .with_transaction(move |conn| {
                Box::pin(create_in(conn, list_id, user_id, title.clone(), description.clone()))
            })
            .await
    }

    /// Move a card to `order` inside `to_list`, which may be its own list.
    ///
    /// The card must be the user's (`NotFound` otherwise); a different
    /// destination list must be too (`Forbidden` otherwise).
    pub async fn move_to(
        &self,
        card_id: Uuid,
        user_id: Uuid,
        to_list: Uuid,
        order: Position,
    ) -> Result<Card, DbError> {
        self.store
            .with_transaction(move |conn| Box::pin(move_in(conn, card_id, user_id, to_list, order)))
            .await
    }

    /// Apply a partial update. Positional fields are routed through the
    /// reorder engine so siblings stay dense.
    pub async fn update(&self, card_id: Uuid, user_id: Uuid, patch: CardPatch) -> Result<Card, DbError> {
        self.store
            .with_transaction(move |conn| Box::pin(update_in(conn, card_id, user_id, patch.clone())))
            .await
    }

    /// Delete a card, closing the gap among its siblings.
    pub async fn delete(&self, card_id: Uuid, user_id: Uuid) -> Result<(), DbError> {
        self.store
            .with_transaction(move |conn| Box::pin(delete_in(conn, card_id, user_id)))
            .await
    }
}

async fn create_in(
    conn: &mut PgConnection,
    list_id: Uuid,
    user_id: Uuid,
    title: Title,
    description: Option<Description>,
) -> Result<Card, DbError> {
    resolve_owned_list(&mut *conn, list_id, user_id)
        .await?
        .require("list", list_id)?;

    let position = store::append_slot(conn, Collection::Cards, list_id).await?;
    let card = sqlx::query_as::<_, Card>(
        r#"
        INSERT INTO cards (list_id, title, description, position)
        VALUES ($1, $2, $3, $4)
        RETURNING id, list_id, title, description, position, created_at, updated_at
        "#,
    )
    .bind(list_id)
    .bind(title.as_str())
    .bind(description.as_ref().map(Description::as_str))
    .bind(position.as_i32())
    .fetch_one(&mut *conn)
    .await?;

    tracing::debug!(card_id = %card.id, %list_id, %position, "card created");
    Ok(card)
}

async fn move_in(
    conn: &mut PgConnection,
    card_id: Uuid,
    user_id: Uuid,
    to_list: Uuid,
    order: Position,
) -> Result<Card, DbError> {
    let card = resolve_owned_card(&mut *conn, card_id, user_id)
        .await?
        .require("card", card_id)?;
    relocate(conn, &card, user_id, to_list, order).await?;
    fetch_card(conn, card_id).await
}

async fn update_in(
    conn: &mut PgConnection,
    card_id: Uuid,
    user_id: Uuid,
    patch: CardPatch,
) -> Result<Card, DbError> {
    let card = if patch.is_positional() {
        let card = resolve_owned_card(&mut *conn, card_id, user_id)
            .await?
            .require("card", card_id)?;
        let current = Position::try_from(card.position)?;
        let (to_list, order) = patch.target(card.list_id, current);
        relocate(conn, &card, user_id, to_list, order).await?;
        card
    } else {
        // Text only: lock just this row, siblings are untouched.
        resolve_owned_card_for_update(&mut *conn, card_id, user_id)
            .await?
            .require("card", card_id)?
    };

    if patch.title.is_some() || patch.description.is_some() {
        let description = patch
            .description
            .as_ref()
            .map(|d| d.as_ref().map(Description::as_str));
        sqlx::query(
            r#"
            UPDATE cards SET
                title = COALESCE($2, title),
                description = CASE WHEN $3 THEN $4 ELSE description END,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(card.id)
        .bind(patch.title.as_ref().map(Title::as_str))
        .bind(description.is_some())
        .bind(description.flatten())
        .execute(&mut *conn)
        .await?;
    }

    fetch_card(conn, card_id).await
}

async fn delete_in(conn: &mut PgConnection, card_id: Uuid, user_id: Uuid) -> Result<(), DbError> {
    let card = resolve_owned_card(&mut *conn, card_id, user_id)
        .await?
        .require("card", card_id)?;
    store::remove_item(conn, Collection::Cards, card_id, card.list_id).await?;
    Ok(())
}

/// Authorize a cross-list destination, then run the move.
async fn relocate(
    conn: &mut PgConnection,
    card: &Card,
    user_id: Uuid,
    to_list: Uuid,
    order: Position,
) -> Result<(), DbError> {
    if to_list != card.list_id {
        resolve_owned_list(&mut *conn, to_list, user_id)
            .await?
            .forbid_missing()
            .require("list", to_list)?;
    }
    store::move_item(conn, Collection::Cards, card.id, card.list_id, to_list, order).await?;
    Ok(())
}

pub(crate) async fn fetch_card(conn: &mut PgConnection, card_id: Uuid) -> Result<Card, DbError> {
    sqlx::query_as::<_, Card>(
        "SELECT id, list_id, title, description, position, created_at, updated_at \
         FROM cards WHERE id = $1",
    )
    .bind(card_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("card", card_id))
}
