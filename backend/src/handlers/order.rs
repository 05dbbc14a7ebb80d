//! HTTP handlers for order endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppResult;
use crate::services::order::{CreateOrderInput, Order, OrderService, UpdateOrderInput};
use crate::AppState;
use shared::{PaginatedResponse, Pagination};

/// Get an order
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<Order>> {
    let service = OrderService::new(state.db);
    let order = service.get_order(order_id).await?;
    Ok(Json(order))
}

/// List all orders
pub async fn list_orders(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<PaginatedResponse<Order>>> {
    let service = OrderService::new(state.db);
    let orders = service.list_orders(pagination).await?;
    Ok(Json(orders))
}

/// List orders for an item
pub async fn list_orders_by_item(
    State(state): State<AppState>,
    Path(item_id): Path<i32>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<PaginatedResponse<Order>>> {
    let service = OrderService::new(state.db);
    let orders = service.list_orders_by_item(item_id, pagination).await?;
    Ok(Json(orders))
}

/// Create an order
pub async fn create_order(
    State(state): State<AppState>,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<Json<Order>> {
    input.validate()?;
    let service = OrderService::new(state.db);
    let order = service.create_order(input).await?;
    Ok(Json(order))
}

/// Update an order
pub async fn update_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdateOrderInput>,
) -> AppResult<Json<Order>> {
    input.validate()?;
    let service = OrderService::new(state.db);
    let order = service.update_order(order_id, input).await?;
    Ok(Json(order))
}

/// Delete an order
pub async fn delete_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = OrderService::new(state.db);
    service.delete_order(order_id).await?;
    Ok(Json(()))
}
