//! Density audit and repair
//!
//! Positions written through the store are always dense. Rows imported or
//! edited by hand may not be; `audit` finds those parents and `repair`
//! renumbers one of them in place.

use sqlx::PgConnection;
use taskboard_core::{check_dense, compact, DensityViolation};
use uuid::Uuid;

use super::error::DbError;
use super::store::{lock_parents, Collection, Store};

/// A parent whose children are not at exactly `1..=N`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DensityReport {
    pub collection: Collection,
    pub parent: Uuid,
    pub children: usize,
    pub violation: DensityViolation,
}

impl Store {
    /// Scan every parent of `collection`.
    pub async fn audit(&self, collection: Collection) -> Result<Vec<DensityReport>, DbError> {
        let sql = format!(
            "SELECT {}, position FROM {} ORDER BY {}",
            collection.parent_column(),
            collection.table(),
            collection.parent_column()
        );
        let rows: Vec<(Uuid, i32)> = sqlx::query_as(&sql).fetch_all(self.pool()).await?;
        Ok(scan(collection, &rows))
    }

    /// Renumber the children of `parent` to `1..=N`, keeping their order.
    /// Ties are broken by creation time. Returns how many rows changed.
    pub async fn repair(&self, collection: Collection, parent: Uuid) -> Result<usize, DbError> {
        let changed = self
            .with_transaction(move |conn| Box::pin(repair_in(conn, collection, parent)))
            .await?;
        tracing::info!(resource = collection.parent_resource(), %parent, changed, "repacked");
        Ok(changed)
    }
}

async fn repair_in(
    conn: &mut PgConnection,
    collection: Collection,
    parent: Uuid,
) -> Result<usize, DbError> {
    lock_parents(conn, collection, &[parent]).await?;

    let sql = format!(
        "SELECT id, position FROM {} WHERE {} = $1 ORDER BY position, created_at, id",
        collection.table(),
        collection.parent_column()
    );
    let rows: Vec<(Uuid, i32)> = sqlx::query_as(&sql)
        .bind(parent)
        .fetch_all(&mut *conn)
        .await?;
    let entries: Vec<(Uuid, i64)> = rows
        .into_iter()
        .map(|(id, position)| (id, i64::from(position)))
        .collect();

    let changes = compact(&entries);
    let sql = format!("UPDATE {} SET position = $2 WHERE id = $1", collection.table());
    for (id, position) in &changes {
        sqlx::query(&sql)
            .bind(id)
            .bind(position.as_i32())
            .execute(&mut *conn)
            .await?;
    }
    Ok(changes.len())
}

/// Group `(parent, position)` rows, sorted by parent, and check each group.
fn scan(collection: Collection, rows: &[(Uuid, i32)]) -> Vec<DensityReport> {
    rows.chunk_by(|a, b| a.0 == b.0)
        .filter_map(|group| {
            let parent = group[0].0;
            check_dense(group.iter().map(|&(_, position)| i64::from(position)))
                .err()
                .map(|violation| DensityReport {
                    collection,
                    parent,
                    children: group.len(),
                    violation,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_reports_each_bad_parent() {
        let dense = Uuid::from_u128(1);
        let gappy = Uuid::from_u128(2);
        let doubled = Uuid::from_u128(3);
        let rows = vec![
            (dense, 2),
            (dense, 1),
            (gappy, 1),
            (gappy, 3),
            (doubled, 1),
            (doubled, 1),
        ];

        let reports = scan(Collection::Cards, &rows);

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].parent, gappy);
        assert_eq!(reports[0].violation, DensityViolation::Gap { missing: 2 });
        assert_eq!(reports[1].parent, doubled);
        assert_eq!(reports[1].children, 2);
        assert_eq!(
            reports[1].violation,
            DensityViolation::Duplicate { position: 1 }
        );
    }

    #[test]
    fn scan_of_nothing_is_clean() {
        assert!(scan(Collection::Lists, &[]).is_empty());
    }
}
