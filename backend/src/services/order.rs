//! Order service
//!
//! An order consumes stock through a linked withdrawal movement. The order
//! and its withdrawal are created, replaced, and removed together inside a
//! single transaction, so either both changes commit or neither does.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::inventory::InventoryService;
use crate::services::item::lock_item_rows;
use crate::services::order_number;
use crate::services::stock;
use shared::{PaginatedResponse, Pagination};

/// Order service
#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
}

/// A customer order
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub order_no: String,
    pub item_id: i32,
    pub item_name: String,
    pub qty: i32,
    pub price: Decimal,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an order
///
/// The unit price is snapshotted from the item at creation time, so it is
/// not part of the input.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderInput {
    pub item_id: i32,
    #[validate(range(min = 1, message = "Quantity must be greater than zero"))]
    pub qty: i32,
}

/// Input for updating an order
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrderInput {
    pub item_id: i32,
    #[validate(range(min = 1, message = "Quantity must be greater than zero"))]
    pub qty: i32,
    #[validate(custom = "shared::validation::validate_positive_price")]
    pub price: Decimal,
}

/// Row for the pre-update snapshot of an order
#[derive(Debug, FromRow)]
struct OrderRow {
    order_no: String,
    item_id: i32,
    qty: i32,
}

const ORDER_SELECT: &str = r#"
    SELECT o.id, o.order_no, o.item_id, i.name AS item_name, o.qty, o.price,
           o.qty * o.price AS total_price, o.created_at, o.updated_at
    FROM orders o
    JOIN items i ON i.id = o.item_id
"#;

impl OrderService {
    /// Create a new OrderService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get an order by id
    pub async fn get_order(&self, id: Uuid) -> AppResult<Order> {
        let order = sqlx::query_as::<_, Order>(&format!("{} WHERE o.id = $1", ORDER_SELECT))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource: "Order",
                id: id.to_string(),
            })?;

        Ok(order)
    }

    /// List all orders, paged
    pub async fn list_orders(&self, pagination: Pagination) -> AppResult<PaginatedResponse<Order>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.db)
            .await?;

        let orders = sqlx::query_as::<_, Order>(&format!(
            "{} ORDER BY o.created_at DESC, o.order_no DESC LIMIT $1 OFFSET $2",
            ORDER_SELECT
        ))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse::new(orders, &pagination, total as u64))
    }

    /// List orders for an item, paged
    pub async fn list_orders_by_item(
        &self,
        item_id: i32,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<Order>> {
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

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE item_id = $1")
            .bind(item_id)
            .fetch_one(&self.db)
            .await?;

        let orders = sqlx::query_as::<_, Order>(&format!(
            "{} WHERE o.item_id = $1 ORDER BY o.created_at DESC, o.order_no DESC LIMIT $2 OFFSET $3",
            ORDER_SELECT
        ))
        .bind(item_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse::new(orders, &pagination, total as u64))
    }

    /// Create an order and its linked withdrawal movement
    ///
    /// The unit price is snapshotted from the item; any client-supplied
    /// price is ignored. The stock check, order insert, and withdrawal
    /// insert share one transaction with the item row locked, so two
    /// concurrent orders cannot both pass a stale check.
    pub async fn create_order(&self, input: CreateOrderInput) -> AppResult<Order> {
        validate_order_qty(input.qty)?;

        let mut tx = self.db.begin().await?;

        let (item_name, item_price) = sqlx::query_as::<_, (String, Decimal)>(
            "SELECT name, price FROM items WHERE id = $1 FOR UPDATE",
        )
        .bind(input.item_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Item",
            id: input.item_id.to_string(),
        })?;

        let available = stock::remaining_stock(&mut *tx, input.item_id).await?;
        if available < i64::from(input.qty) {
            return Err(AppError::InsufficientStock {
                item_name,
                requested: input.qty,
                available,
            });
        }

        let order_no = order_number::next_order_no(&mut tx).await?;
        let id = Uuid::new_v4();

        let (created_at, updated_at) = sqlx::query_as::<_, (DateTime<Utc>, DateTime<Utc>)>(
            r#"
            INSERT INTO orders (id, order_no, item_id, qty, price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&order_no)
        .bind(input.item_id)
        .bind(input.qty)
        .bind(item_price)
        .fetch_one(&mut *tx)
        .await?;

        let order = Order {
            id,
            order_no,
            item_id: input.item_id,
            item_name,
            qty: input.qty,
            price: item_price,
            total_price: item_price * Decimal::from(input.qty),
            created_at,
            updated_at,
        };

        InventoryService::create_withdrawal_for_order(&mut tx, &order).await?;

        tx.commit().await?;

        tracing::info!("Created order {} for item {}", order.order_no, order.item_id);

        Ok(order)
    }

    /// Update an order
    ///
    /// A change of item or quantity replaces the linked withdrawal: the old
    /// movements are deleted, stock is re-checked against the remaining
    /// ledger, and a fresh withdrawal is created. A price-only change
    /// leaves the ledger untouched.
    pub async fn update_order(&self, id: Uuid, input: UpdateOrderInput) -> AppResult<Order> {
        validate_order_qty(input.qty)?;
        validate_order_price(input.price)?;

        let mut tx = self.db.begin().await?;

        let existing = sqlx::query_as::<_, OrderRow>(
            "SELECT order_no, item_id, qty FROM orders WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Order",
            id: id.to_string(),
        })?;

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

        let order = if item_changed || qty_changed {
            InventoryService::delete_movements_for_order(&mut tx, id).await?;

            let available = stock::remaining_stock(&mut *tx, input.item_id).await?;
            if available < i64::from(input.qty) {
                return Err(AppError::InsufficientStock {
                    item_name,
                    requested: input.qty,
                    available,
                });
            }

            let (created_at, updated_at) = sqlx::query_as::<_, (DateTime<Utc>, DateTime<Utc>)>(
                r#"
                UPDATE orders
                SET item_id = $1, qty = $2, price = $3, updated_at = now()
                WHERE id = $4
                RETURNING created_at, updated_at
                "#,
            )
            .bind(input.item_id)
            .bind(input.qty)
            .bind(input.price)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

            let order = Order {
                id,
                order_no: existing.order_no,
                item_id: input.item_id,
                item_name,
                qty: input.qty,
                price: input.price,
                total_price: input.price * Decimal::from(input.qty),
                created_at,
                updated_at,
            };

            InventoryService::create_withdrawal_for_order(&mut tx, &order).await?;

            order
        } else {
            // Only the price changed; the ledger stays as it is.
            let (created_at, updated_at) = sqlx::query_as::<_, (DateTime<Utc>, DateTime<Utc>)>(
                r#"
                UPDATE orders
                SET price = $1, updated_at = now()
                WHERE id = $2
                RETURNING created_at, updated_at
                "#,
            )
            .bind(input.price)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

            Order {
                id,
                order_no: existing.order_no,
                item_id: input.item_id,
                item_name,
                qty: input.qty,
                price: input.price,
                total_price: input.price * Decimal::from(input.qty),
                created_at,
                updated_at,
            }
        };

        tx.commit().await?;

        tracing::info!("Updated order {}", order.order_no);

        Ok(order)
    }

    /// Delete an order and its linked withdrawal movement
    pub async fn delete_order(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let order_no =
            sqlx::query_scalar::<_, String>("SELECT order_no FROM orders WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound {
                    resource: "Order",
                    id: id.to_string(),
                })?;

        InventoryService::delete_movements_for_order(&mut tx, id).await?;

        sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("Deleted order {}", order_no);

        Ok(())
    }
}

/// Defensive re-check of the quantity invariant
fn validate_order_qty(qty: i32) -> AppResult<()> {
    if !shared::validation::is_positive_quantity(qty) {
        return Err(AppError::Validation {
            field: "qty".to_string(),
            message: "Quantity must be greater than zero".to_string(),
        });
    }

    Ok(())
}

/// Defensive re-check of the price invariant
fn validate_order_price(price: Decimal) -> AppResult<()> {
    if price <= Decimal::ZERO {
        return Err(AppError::Validation {
            field: "price".to_string(),
            message: "Price must be greater than zero".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_qty_validation() {
        assert!(validate_order_qty(1).is_ok());
        assert!(validate_order_qty(0).is_err());
    }

    #[test]
    fn test_order_price_validation() {
        assert!(validate_order_price(Decimal::new(999, 2)).is_ok());
        assert!(validate_order_price(Decimal::ZERO).is_err());
        assert!(validate_order_price(Decimal::new(-999, 2)).is_err());
    }
}
