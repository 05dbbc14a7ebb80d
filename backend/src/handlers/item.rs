//! HTTP handlers for item catalog endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use validator::Validate;

use crate::error::AppResult;
use crate::services::item::{CreateItemInput, Item, ItemService, ItemWithStock, UpdateItemInput};
use crate::AppState;
use shared::{PaginatedResponse, Pagination};

/// Get an item with its remaining stock
pub async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<i32>,
) -> AppResult<Json<ItemWithStock>> {
    let service = ItemService::new(state.db);
    let item = service.get_item_with_stock(item_id).await?;
    Ok(Json(item))
}

/// List items with their remaining stock
pub async fn list_items(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<PaginatedResponse<ItemWithStock>>> {
    let service = ItemService::new(state.db);
    let items = service.list_items(pagination).await?;
    Ok(Json(items))
}

/// Create a new item
pub async fn create_item(
    State(state): State<AppState>,
    Json(input): Json<CreateItemInput>,
) -> AppResult<Json<Item>> {
    input.validate()?;
    let service = ItemService::new(state.db);
    let item = service.create_item(input).await?;
    Ok(Json(item))
}

/// Update an item
pub async fn update_item(
    State(state): State<AppState>,
    Path(item_id): Path<i32>,
    Json(input): Json<UpdateItemInput>,
) -> AppResult<Json<Item>> {
    input.validate()?;
    let service = ItemService::new(state.db);
    let item = service.update_item(item_id, input).await?;
    Ok(Json(item))
}

/// Delete an item
pub async fn delete_item(
    State(state): State<AppState>,
    Path(item_id): Path<i32>,
) -> AppResult<Json<()>> {
    let service = ItemService::new(state.db);
    service.delete_item(item_id).await?;
    Ok(Json(()))
}
