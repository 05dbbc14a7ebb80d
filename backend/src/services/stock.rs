//! Remaining-stock calculation
//!
//! Stock is never stored. It is recomputed on every call as the signed sum
//! of the item's movement ledger: top-ups count positive, withdrawals count
//! negative. The executor parameter lets callers run the aggregate against
//! the pool or inside an open transaction, so a stock check and the write
//! that depends on it can share one transaction scope.

use sqlx::PgExecutor;

/// Remaining stock for an item over its full movement ledger.
///
/// Item existence is the caller's responsibility; an unknown id yields 0.
pub async fn remaining_stock<'e, E>(executor: E, item_id: i32) -> Result<i64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COALESCE(SUM(CASE WHEN kind = 'top_up' THEN qty ELSE -qty END), 0)
        FROM movements
        WHERE item_id = $1
        "#,
    )
    .bind(item_id)
    .fetch_one(executor)
    .await
}

/// Remaining stock for an item with one movement left out of the sum.
///
/// Used by movement update/delete to re-validate the ledger that the
/// mutation would leave behind.
pub async fn remaining_stock_excluding<'e, E>(
    executor: E,
    item_id: i32,
    movement_id: i32,
) -> Result<i64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COALESCE(SUM(CASE WHEN kind = 'top_up' THEN qty ELSE -qty END), 0)
        FROM movements
        WHERE item_id = $1 AND id <> $2
        "#,
    )
    .bind(item_id)
    .bind(movement_id)
    .fetch_one(executor)
    .await
}
