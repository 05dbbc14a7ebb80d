//! Inventory movement service
//!
//! The movement ledger is the source of truth for stock: each entry is a
//! top-up or a withdrawal for one item, optionally linked to the order that
//! produced it. Order-linked movements are owned by the order lifecycle and
//! cannot be changed or removed through the movement operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::item::lock_item_rows;
use crate::services::order::Order;
use crate::services::stock;
use shared::{PaginatedResponse, Pagination};

/// Inventory movement service
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

/// Movement kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "movement_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    TopUp,
    Withdrawal,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::TopUp => "top_up",
            MovementKind::Withdrawal => "withdrawal",
        }
    }

    /// Signed contribution of a movement of this kind to remaining stock
    pub fn signed(&self, qty: i32) -> i64 {
        match self {
            MovementKind::TopUp => i64::from(qty),
            MovementKind::Withdrawal => -i64::from(qty),
        }
    }
}

/// A single ledger entry
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Movement {
    pub id: i32,
    pub item_id: i32,
    pub item_name: String,
    pub qty: i32,
    pub kind: MovementKind,
    pub order_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Remaining stock for an item
#[derive(Debug, Clone, Serialize)]
pub struct StockBalance {
    pub item_id: i32,
    pub item_name: String,
    pub remaining_stock: i64,
}

/// Input for creating a movement
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMovementInput {
    pub item_id: i32,
    #[validate(range(min = 1, message = "Quantity must be greater than zero"))]
    pub qty: i32,
    pub kind: MovementKind,
    pub order_id: Option<Uuid>,
}

/// Input for updating a movement
///
/// The order reference is system-managed and not part of the input.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMovementInput {
    pub item_id: i32,
    #[validate(range(min = 1, message = "Quantity must be greater than zero"))]
    pub qty: i32,
    pub kind: MovementKind,
}

/// Row for the pre-mutation snapshot of a movement
#[derive(Debug, FromRow)]
struct MovementRow {
    item_id: i32,
    qty: i32,
    order_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get a movement by id
    pub async fn get_movement(&self, id: i32) -> AppResult<Movement> {
        let movement = sqlx::query_as::<_, Movement>(
            r#"
            SELECT m.id, m.item_id, i.name AS item_name, m.qty, m.kind, m.order_id, m.created_at
            FROM movements m
            JOIN items i ON i.id = m.item_id
            WHERE m.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Movement",
            id: id.to_string(),
        })?;

        Ok(movement)
    }

    /// List all movements, paged
    pub async fn list_movements(
        &self,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<Movement>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movements")
            .fetch_one(&self.db)
            .await?;

        let movements = sqlx::query_as::<_, Movement>(
            r#"
            SELECT m.id, m.item_id, i.name AS item_name, m.qty, m.kind, m.order_id, m.created_at
            FROM movements m
            JOIN items i ON i.id = m.item_id
            ORDER BY m.created_at DESC, m.id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse::new(movements, &pagination, total as u64))
    }

    /// List movements for an item, paged
    pub async fn list_movements_by_item(
        &self,
        item_id: i32,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<Movement>> {
        let item_exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM items WHERE id = $1)")
                .bind(item_id)
                .fetch_one(&self.db)
                .await?;

        if !item_exists {
            return Err(AppError::NotFound {
                resource: "Item",
                id: item_id.to_string(),
            });
        }

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movements WHERE item_id = $1")
            .bind(item_id)
            .fetch_one(&self.db)
            .await?;

        let movements = sqlx::query_as::<_, Movement>(
            r#"
            SELECT m.id, m.item_id, i.name AS item_name, m.qty, m.kind, m.order_id, m.created_at
            FROM movements m
            JOIN items i ON i.id = m.item_id
            WHERE m.item_id = $1
            ORDER BY m.created_at DESC, m.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(item_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse::new(movements, &pagination, total as u64))
    }

    /// Get the remaining stock for an item
    pub async fn get_remaining_stock(&self, item_id: i32) -> AppResult<StockBalance> {
        let item_name = sqlx::query_scalar::<_, String>("SELECT name FROM items WHERE id = $1")
            .bind(item_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource: "Item",
                id: item_id.to_string(),
            })?;

        let remaining_stock = stock::remaining_stock(&self.db, item_id).await?;

        Ok(StockBalance {
            item_id,
            item_name,
            remaining_stock,
        })
    }

    /// Create a movement
    ///
    /// A manual withdrawal (no order reference) must not take the item's
    /// remaining stock below zero; the check and the insert share one
    /// transaction with the item row locked.
    pub async fn create_movement(&self, input: CreateMovementInput) -> AppResult<Movement> {
        validate_quantity(input.qty)?;

        let mut tx = self.db.begin().await?;

        let item_name =
            sqlx::query_scalar::<_, String>("SELECT name FROM items WHERE id = $1 FOR UPDATE")
                .bind(input.item_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound {
                    resource: "Item",
                    id: input.item_id.to_string(),
                })?;

        if let Some(order_id) = input.order_id {
            let order_exists =
                sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM orders WHERE id = $1)")
                    .bind(order_id)
                    .fetch_one(&mut *tx)
                    .await?;

            if !order_exists {
                return Err(AppError::NotFound {
                    resource: "Order",
                    id: order_id.to_string(),
                });
            }
        }

        // Manual withdrawals are checked against the current stock; order
        // withdrawals are checked by the order service before it creates them.
        if input.kind == MovementKind::Withdrawal && input.order_id.is_none() {
            let available = stock::remaining_stock(&mut *tx, input.item_id).await?;
            if available < i64::from(input.qty) {
                return Err(AppError::InsufficientStock {
                    item_name,
                    requested: input.qty,
                    available,
                });
            }
        }

        let (id, created_at) = sqlx::query_as::<_, (i32, DateTime<Utc>)>(
            r#"
            INSERT INTO movements (item_id, qty, kind, order_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at
            "#,
        )
        .bind(input.item_id)
        .bind(input.qty)
        .bind(input.kind)
        .bind(input.order_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!("Created {} movement {} for item {}", input.kind.as_str(), id, input.item_id);

        Ok(Movement {
            id,
            item_id: input.item_id,
            item_name,
            qty: input.qty,
            kind: input.kind,
            order_id: input.order_id,
            created_at,
        })
    }

    /// Update a movement
    ///
    /// Order-linked movements are immutable through this path. The update is
    /// rejected if the ledger it would leave behind drops any affected
    /// item's stock below zero.
    pub async fn update_movement(&self, id: i32, input: UpdateMovementInput) -> AppResult<Movement> {
        validate_quantity(input.qty)?;

        let mut tx = self.db.begin().await?;

        let existing = sqlx::query_as::<_, MovementRow>(
            "SELECT item_id, qty, order_id, created_at FROM movements WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Movement",
            id: id.to_string(),
        })?;

        if existing.order_id.is_some() {
            return Err(AppError::RuleViolation(
                "Cannot update a movement that is linked to an order".to_string(),
            ));
        }

        let item_names = lock_item_rows(&mut tx, vec![existing.item_id, input.item_id]).await?;
        let item_name = item_names
            .get(&input.item_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound {
                resource: "Item",
                id: input.item_id.to_string(),
            })?;

        let item_changed = existing.item_id != input.item_id;
        let qty_changed = existing.qty != input.qty;

        // A withdrawal must still be covered by the rest of the target
        // item's ledger.
        if input.kind == MovementKind::Withdrawal && (item_changed || qty_changed) {
            let available =
                stock::remaining_stock_excluding(&mut *tx, input.item_id, id).await?;
            if available < i64::from(input.qty) {
                return Err(AppError::InsufficientStock {
                    item_name,
                    requested: input.qty,
                    available,
                });
            }
        }

        // Re-validate the ledger the update would leave behind: no affected
        // item's stock may drop below zero.
        let target_balance = stock::remaining_stock_excluding(&mut *tx, input.item_id, id).await?
            + input.kind.signed(input.qty);
        if target_balance < 0 {
            return Err(AppError::RuleViolation(format!(
                "Cannot update this movement: remaining stock for item '{}' would become negative",
                item_name
            )));
        }

        if item_changed {
            let source_balance =
                stock::remaining_stock_excluding(&mut *tx, existing.item_id, id).await?;
            if source_balance < 0 {
                let source_name = item_names
                    .get(&existing.item_id)
                    .map(String::as_str)
                    .unwrap_or("unknown");
                return Err(AppError::RuleViolation(format!(
                    "Cannot update this movement: remaining stock for item '{}' would become negative",
                    source_name
                )));
            }
        }

        sqlx::query("UPDATE movements SET item_id = $1, qty = $2, kind = $3 WHERE id = $4")
            .bind(input.item_id)
            .bind(input.qty)
            .bind(input.kind)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("Updated movement {}", id);

        Ok(Movement {
            id,
            item_id: input.item_id,
            item_name,
            qty: input.qty,
            kind: input.kind,
            order_id: None,
            created_at: existing.created_at,
        })
    }

    /// Delete a movement
    ///
    /// Order-linked movements must be removed by deleting their order. The
    /// deletion is rejected if the remaining ledger would leave the item's
    /// stock negative (removing a top-up must not starve existing
    /// withdrawals).
    pub async fn delete_movement(&self, id: i32) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let existing = sqlx::query_as::<_, MovementRow>(
            "SELECT item_id, qty, order_id, created_at FROM movements WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Movement",
            id: id.to_string(),
        })?;

        if existing.order_id.is_some() {
            return Err(AppError::RuleViolation(
                "Cannot delete a movement that is linked to an order. Delete the order instead."
                    .to_string(),
            ));
        }

        let item_names = lock_item_rows(&mut tx, vec![existing.item_id]).await?;

        let remaining = stock::remaining_stock_excluding(&mut *tx, existing.item_id, id).await?;
        if remaining < 0 {
            let item_name = item_names
                .get(&existing.item_id)
                .map(String::as_str)
                .unwrap_or("unknown");
            return Err(AppError::RuleViolation(format!(
                "Cannot delete this movement: remaining stock for item '{}' would become negative",
                item_name
            )));
        }

        sqlx::query("DELETE FROM movements WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("Deleted movement {}", id);

        Ok(())
    }

    /// Create the withdrawal movement for an order, inside the caller's
    /// transaction.
    ///
    /// The order service checks stock before calling this, so no re-check
    /// happens here.
    pub async fn create_withdrawal_for_order(
        tx: &mut Transaction<'_, Postgres>,
        order: &Order,
    ) -> AppResult<()> {
        sqlx::query("INSERT INTO movements (item_id, qty, kind, order_id) VALUES ($1, $2, $3, $4)")
            .bind(order.item_id)
            .bind(order.qty)
            .bind(MovementKind::Withdrawal)
            .bind(order.id)
            .execute(&mut **tx)
            .await?;

        tracing::debug!("Created withdrawal movement for order {}", order.order_no);

        Ok(())
    }

    /// Delete all movements linked to an order, inside the caller's
    /// transaction.
    pub async fn delete_movements_for_order(
        tx: &mut Transaction<'_, Postgres>,
        order_id: Uuid,
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM movements WHERE order_id = $1")
            .bind(order_id)
            .execute(&mut **tx)
            .await?;

        tracing::debug!("Deleted movements for order {}", order_id);

        Ok(())
    }
}

/// Defensive re-check of the quantity invariant
fn validate_quantity(qty: i32) -> AppResult<()> {
    if !shared::validation::is_positive_quantity(qty) {
        return Err(AppError::Validation {
            field: "qty".to_string(),
            message: "Quantity must be greater than zero".to_string(),
        });
    }

    Ok(())
}
