//! Item catalog service
//!
//! CRUD over product definitions. Reads return the derived remaining stock
//! alongside the item; deletion is refused while the item still has
//! movements in the ledger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::collections::HashMap;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::stock;
use shared::{PaginatedResponse, Pagination};

/// Item catalog service
#[derive(Clone)]
pub struct ItemService {
    db: PgPool,
}

/// A catalog item
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Item {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A catalog item together with its derived remaining stock
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ItemWithStock {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
    pub remaining_stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an item
#[derive(Debug, Deserialize, Validate)]
pub struct CreateItemInput {
    #[validate(custom = "shared::validation::validate_not_blank")]
    pub name: String,
    #[validate(custom = "shared::validation::validate_positive_price")]
    pub price: Decimal,
}

/// Input for updating an item
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateItemInput {
    #[validate(custom = "shared::validation::validate_not_blank")]
    pub name: String,
    #[validate(custom = "shared::validation::validate_positive_price")]
    pub price: Decimal,
}

impl ItemService {
    /// Create a new ItemService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get an item by id
    pub async fn get_item(&self, id: i32) -> AppResult<Item> {
        let item = sqlx::query_as::<_, Item>(
            "SELECT id, name, price, created_at, updated_at FROM items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Item",
            id: id.to_string(),
        })?;

        Ok(item)
    }

    /// Get an item by id together with its remaining stock
    pub async fn get_item_with_stock(&self, id: i32) -> AppResult<ItemWithStock> {
        let item = self.get_item(id).await?;
        let remaining_stock = stock::remaining_stock(&self.db, id).await?;

        Ok(ItemWithStock {
            id: item.id,
            name: item.name,
            price: item.price,
            remaining_stock,
            created_at: item.created_at,
            updated_at: item.updated_at,
        })
    }

    /// List items with their remaining stock, paged
    pub async fn list_items(
        &self,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<ItemWithStock>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.db)
            .await?;

        let items = sqlx::query_as::<_, ItemWithStock>(
            r#"
            SELECT i.id, i.name, i.price,
                   COALESCE(SUM(CASE WHEN m.kind = 'top_up' THEN m.qty
                                     WHEN m.kind = 'withdrawal' THEN -m.qty
                                     ELSE 0 END), 0) AS remaining_stock,
                   i.created_at, i.updated_at
            FROM items i
            LEFT JOIN movements m ON m.item_id = i.id
            GROUP BY i.id, i.name, i.price, i.created_at, i.updated_at
            ORDER BY i.id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse::new(items, &pagination, total as u64))
    }

    /// Create a new item
    pub async fn create_item(&self, input: CreateItemInput) -> AppResult<Item> {
        validate_item_fields(&input.name, input.price)?;

        let item = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (name, price)
            VALUES ($1, $2)
            RETURNING id, name, price, created_at, updated_at
            "#,
        )
        .bind(&input.name)
        .bind(input.price)
        .fetch_one(&self.db)
        .await?;

        Ok(item)
    }

    /// Update an existing item
    pub async fn update_item(&self, id: i32, input: UpdateItemInput) -> AppResult<Item> {
        validate_item_fields(&input.name, input.price)?;

        let item = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items
            SET name = $1, price = $2, updated_at = now()
            WHERE id = $3
            RETURNING id, name, price, created_at, updated_at
            "#,
        )
        .bind(&input.name)
        .bind(input.price)
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound {
            resource: "Item",
            id: id.to_string(),
        })?;

        Ok(item)
    }

    /// Delete an item if it has no movements in the ledger
    pub async fn delete_item(&self, id: i32) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM items WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.db)
            .await?;

        if !exists {
            return Err(AppError::NotFound {
                resource: "Item",
                id: id.to_string(),
            });
        }

        let has_movements =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM movements WHERE item_id = $1)")
                .bind(id)
                .fetch_one(&self.db)
                .await?;

        if has_movements {
            return Err(AppError::RuleViolation(
                "Cannot delete item. Item has inventory movements. Delete the movements first."
                    .to_string(),
            ));
        }

        sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}

/// Defensive re-check of the item field invariants
fn validate_item_fields(name: &str, price: Decimal) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation {
            field: "name".to_string(),
            message: "Name must not be blank".to_string(),
        });
    }

    if price <= Decimal::ZERO {
        return Err(AppError::Validation {
            field: "price".to_string(),
            message: "Price must be greater than zero".to_string(),
        });
    }

    Ok(())
}

/// Lock the given item rows and return their names, keyed by id.
///
/// Rows are locked in ascending id order so concurrent transactions that
/// touch the same pair of items cannot deadlock. Ids that do not exist are
/// simply absent from the result.
pub(crate) async fn lock_item_rows(
    tx: &mut Transaction<'_, Postgres>,
    mut ids: Vec<i32>,
) -> Result<HashMap<i32, String>, sqlx::Error> {
    ids.sort_unstable();
    ids.dedup();

    let mut names = HashMap::new();
    for id in ids {
        let name = sqlx::query_scalar::<_, String>("SELECT name FROM items WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;

        if let Some(name) = name {
            names.insert(id, name);
        }
    }

    Ok(names)
}
