//! HTTP handlers for inventory movement endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use validator::Validate;

use crate::error::AppResult;
use crate::services::inventory::{
    CreateMovementInput, InventoryService, Movement, StockBalance, UpdateMovementInput,
};
use crate::AppState;
use shared::{PaginatedResponse, Pagination};

/// Get a movement
pub async fn get_movement(
    State(state): State<AppState>,
    Path(movement_id): Path<i32>,
) -> AppResult<Json<Movement>> {
    let service = InventoryService::new(state.db);
    let movement = service.get_movement(movement_id).await?;
    Ok(Json(movement))
}

/// List all movements
pub async fn list_movements(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<PaginatedResponse<Movement>>> {
    let service = InventoryService::new(state.db);
    let movements = service.list_movements(pagination).await?;
    Ok(Json(movements))
}

/// List movements for an item
pub async fn list_movements_by_item(
    State(state): State<AppState>,
    Path(item_id): Path<i32>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<PaginatedResponse<Movement>>> {
    let service = InventoryService::new(state.db);
    let movements = service.list_movements_by_item(item_id, pagination).await?;
    Ok(Json(movements))
}

/// Get the remaining stock for an item
pub async fn get_remaining_stock(
    State(state): State<AppState>,
    Path(item_id): Path<i32>,
) -> AppResult<Json<StockBalance>> {
    let service = InventoryService::new(state.db);
    let balance = service.get_remaining_stock(item_id).await?;
    Ok(Json(balance))
}

/// Create a movement
pub async fn create_movement(
    State(state): State<AppState>,
    Json(input): Json<CreateMovementInput>,
) -> AppResult<Json<Movement>> {
    input.validate()?;
    let service = InventoryService::new(state.db);
    let movement = service.create_movement(input).await?;
    Ok(Json(movement))
}

/// Update a movement
pub async fn update_movement(
    State(state): State<AppState>,
    Path(movement_id): Path<i32>,
    Json(input): Json<UpdateMovementInput>,
) -> AppResult<Json<Movement>> {
    input.validate()?;
    let service = InventoryService::new(state.db);
    let movement = service.update_movement(movement_id, input).await?;
    Ok(Json(movement))
}

/// Delete a movement
pub async fn delete_movement(
    State(state): State<AppState>,
    Path(movement_id): Path<i32>,
) -> AppResult<Json<()>> {
    let service = InventoryService::new(state.db);
    service.delete_movement(movement_id).await?;
    Ok(Json(()))
}
