//! Collection store: transactions, parent locks and range shifts
//!
//! Lists inside boards and cards inside lists are the same shape: a child
//! table with a parent column and a dense `position`. [`Collection`] names
//! the two shapes so the functions below serve both.
//!
//! Every function taking `&mut PgConnection` expects to run inside
//! [`Store::with_transaction`]. Positional writes lock the parent rows
//! first, always in ascending id order.

use std::time::Duration;

use futures::future::BoxFuture;
use sqlx::{PgConnection, PgPool};
use taskboard_core::{
    next_position, plan_move, plan_removal, retry, MovePlan, Position, RangeShift, Slot,
};
use uuid::Uuid;

use super::error::DbError;
use crate::config::StoreConfig;

/// An ordered child collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Lists ordered inside a board
    Lists,
    /// Cards ordered inside a list
    Cards,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Lists, Collection::Cards];

    pub fn table(self) -> &'static str {
        match self {
            Self::Lists => "lists",
            Self::Cards => "cards",
        }
    }

    pub fn parent_table(self) -> &'static str {
        match self {
            Self::Lists => "boards",
            Self::Cards => "lists",
        }
    }

    pub fn parent_column(self) -> &'static str {
        match self {
            Self::Lists => "board_id",
            Self::Cards => "list_id",
        }
    }

    /// Singular name used in errors and logs.
    pub fn resource(self) -> &'static str {
        match self {
            Self::Lists => "list",
            Self::Cards => "card",
        }
    }

    pub fn parent_resource(self) -> &'static str {
        match self {
            Self::Lists => "board",
            Self::Cards => "list",
        }
    }
}

/// Pool plus transaction settings.
#[derive(Debug, Clone)]
pub struct Store {
    pool: PgPool,
    config: StoreConfig,
}

impl Store {
    pub fn new(pool: PgPool, config: StoreConfig) -> Self {
        Self { pool, config }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Run `op` in a transaction, retrying transient failures.
    ///
    /// Each attempt gets a fresh transaction with `lock_timeout` applied.
    /// The transaction commits only when `op` returns `Ok`; otherwise it is
    /// rolled back and, if the error is transient and the retry policy
    /// allows, `op` runs again from the start.
    ///
    /// ```ignore
    /// let card = store
    ///     .with_transaction(move |conn| Box::pin(move_card_in(conn, card_id, user_id, to, at)))
    ///     .await?;
    /// ```
    pub async fn with_transaction<T, F>(&self, op: F) -> Result<T, DbError>
    where
        T: Send,
        F: for<'c> Fn(&'c mut PgConnection) -> BoxFuture<'c, Result<T, DbError>> + Sync,
    {
        retry(&self.config.retry, |attempt| self.attempt(&op, attempt)).await
    }

    async fn attempt<T, F>(&self, op: &F, attempt: u32) -> Result<T, DbError>
    where
        T: Send,
        F: for<'c> Fn(&'c mut PgConnection) -> BoxFuture<'c, Result<T, DbError>> + Sync,
    {
        let mut tx = self.pool.begin().await?;
        set_lock_timeout(&mut *tx, self.config.lock_timeout).await?;

        let outcome = op(&mut *tx).await;
        match outcome {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::warn!(attempt, error = %rollback, "rollback failed");
                }
                Err(err)
            }
        }
    }
}

async fn set_lock_timeout(conn: &mut PgConnection, timeout: Duration) -> Result<(), DbError> {
    sqlx::query("SELECT set_config('lock_timeout', $1, true)")
        .bind(format!("{}ms", timeout.as_millis()))
        .execute(conn)
        .await?;
    Ok(())
}

/// Lock parent rows with `FOR UPDATE`, in ascending id order.
///
/// Fails with `NotFound` when a parent no longer exists.
pub async fn lock_parents(
    conn: &mut PgConnection,
    collection: Collection,
    parents: &[Uuid],
) -> Result<(), DbError> {
    let mut ids = parents.to_vec();
    ids.sort_unstable();
    ids.dedup();

    let sql = format!(
        "SELECT id FROM {} WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        collection.parent_table()
    );
    let locked: Vec<Uuid> = sqlx::query_scalar(&sql)
        .bind(&ids)
        .fetch_all(&mut *conn)
        .await?;

    if let Some(missing) = ids.iter().find(|id| !locked.contains(id)) {
        return Err(DbError::not_found(collection.parent_resource(), missing));
    }
    Ok(())
}

/// Current parent and position of an item.
pub async fn current_slot(
    conn: &mut PgConnection,
    collection: Collection,
    item: Uuid,
) -> Result<Option<Slot<Uuid>>, DbError> {
    let sql = format!(
        "SELECT {}, position FROM {} WHERE id = $1",
        collection.parent_column(),
        collection.table()
    );
    let row: Option<(Uuid, i32)> = sqlx::query_as(&sql)
        .bind(item)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(|(parent, position)| Position::try_from(position).map(|p| Slot::new(parent, p)))
        .transpose()
        .map_err(DbError::from)
}

/// Number of children in `parent`.
pub async fn count_children(
    conn: &mut PgConnection,
    collection: Collection,
    parent: Uuid,
) -> Result<u32, DbError> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE {} = $1",
        collection.table(),
        collection.parent_column()
    );
    let count: i64 = sqlx::query_scalar(&sql)
        .bind(parent)
        .fetch_one(&mut *conn)
        .await?;
    Ok(u32::try_from(count).unwrap_or(Position::MAX))
}

/// Largest position in `parent`, `None` when it has no children.
pub async fn max_position(
    conn: &mut PgConnection,
    collection: Collection,
    parent: Uuid,
) -> Result<Option<Position>, DbError> {
    let sql = format!(
        "SELECT MAX(position) FROM {} WHERE {} = $1",
        collection.table(),
        collection.parent_column()
    );
    let max: Option<i32> = sqlx::query_scalar(&sql)
        .bind(parent)
        .fetch_one(&mut *conn)
        .await?;
    Ok(max.map(Position::try_from).transpose()?)
}

/// Apply a bulk shift to every sibling in the shift's range.
pub async fn update_range(
    conn: &mut PgConnection,
    collection: Collection,
    shift: &RangeShift<Uuid>,
) -> Result<u64, DbError> {
    let sql = format!(
        "UPDATE {} SET position = position + $2, updated_at = NOW() \
         WHERE {} = $1 AND position >= $3 AND ($4::INTEGER IS NULL OR position <= $4)",
        collection.table(),
        collection.parent_column()
    );
    let result = sqlx::query(&sql)
        .bind(shift.parent)
        .bind(shift.delta)
        .bind(shift.range.start.as_i32())
        .bind(shift.range.end.map(Position::as_i32))
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

async fn place(
    conn: &mut PgConnection,
    collection: Collection,
    item: Uuid,
    slot: Slot<Uuid>,
) -> Result<(), DbError> {
    let sql = format!(
        "UPDATE {} SET {} = $2, position = $3, updated_at = NOW() WHERE id = $1",
        collection.table(),
        collection.parent_column()
    );
    sqlx::query(&sql)
        .bind(item)
        .bind(slot.parent)
        .bind(slot.position.as_i32())
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Lock `parent` and return the position a new child takes.
pub async fn append_slot(
    conn: &mut PgConnection,
    collection: Collection,
    parent: Uuid,
) -> Result<Position, DbError> {
    lock_parents(conn, collection, &[parent]).await?;
    let max = max_position(conn, collection, parent).await?;
    Ok(next_position(max)?)
}

/// Lock both parents, re-read the item's slot and move it.
///
/// `expected_parent` is the parent seen by the (unlocked) ownership check.
/// If the item is elsewhere by the time the locks are held, the attempt
/// fails with [`DbError::Contended`] so the caller's transaction retries.
pub async fn move_item(
    conn: &mut PgConnection,
    collection: Collection,
    item: Uuid,
    expected_parent: Uuid,
    to_parent: Uuid,
    requested: Position,
) -> Result<MovePlan<Uuid>, DbError> {
    lock_parents(conn, collection, &[expected_parent, to_parent]).await?;

    let from = current_slot(conn, collection, item)
        .await?
        .ok_or_else(|| DbError::not_found(collection.resource(), item))?;
    if from.parent != expected_parent {
        return Err(DbError::Contended {
            resource: collection.resource(),
            id: item.to_string(),
        });
    }

    let destination_len = count_children(conn, collection, to_parent).await?;
    let plan = plan_move(from, to_parent, requested, destination_len);
    if plan.is_noop() {
        tracing::debug!(resource = collection.resource(), %item, "move to current slot");
        return Ok(plan);
    }

    for shift in &plan.shifts {
        let shifted = update_range(conn, collection, shift).await?;
        tracing::trace!(parent = %shift.parent, range = %shift.range, delta = shift.delta, shifted, "range shift");
    }
    place(conn, collection, item, plan.to).await?;

    tracing::debug!(
        resource = collection.resource(),
        %item,
        from_parent = %plan.from.parent,
        from = %plan.from.position,
        to_parent = %plan.to.parent,
        to = %plan.to.position,
        "moved"
    );
    Ok(plan)
}

/// Lock the parent, delete the item and close the gap it leaves.
pub async fn remove_item(
    conn: &mut PgConnection,
    collection: Collection,
    item: Uuid,
    expected_parent: Uuid,
) -> Result<Slot<Uuid>, DbError> {
    lock_parents(conn, collection, &[expected_parent]).await?;

    let slot = current_slot(conn, collection, item)
        .await?
        .ok_or_else(|| DbError::not_found(collection.resource(), item))?;
    if slot.parent != expected_parent {
        return Err(DbError::Contended {
            resource: collection.resource(),
            id: item.to_string(),
        });
    }

    let sql = format!("DELETE FROM {} WHERE id = $1", collection.table());
    sqlx::query(&sql).bind(item).execute(&mut *conn).await?;

    let repacked = update_range(conn, collection, &plan_removal(slot)).await?;
    tracing::debug!(resource = collection.resource(), %item, position = %slot.position, repacked, "removed");
    Ok(slot)
}
