use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Query;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::auth::{CurrentUser, RequireManager};
use crate::db::DbPool;
use crate::dto::{AdjustInventoryDto, CreateInventoryDto, InventoryFilter, UpdateInventoryDto};
use crate::errors::ApiError;
use crate::models::Inventory;
use crate::repo;

use super::common::{record, required_text};

/// Handler for creating a new inventory item
///
/// This function handles POST requests to `/api/inventory`.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `user` - The manager creating the item
/// * `payload` - The item's details and opening stock
///
/// ### Returns
///
/// The newly created inventory item as JSON
#[instrument(skip(pool, user, payload), fields(sku = %payload.sku))]
pub async fn create_inventory_handler(
    State(pool): State<Arc<DbPool>>,
    RequireManager(user): RequireManager,
    Json(mut payload): Json<CreateInventoryDto>,
) -> Result<Json<Inventory>, ApiError> {
    info!("Creating new inventory item");

    payload.name = required_text("Name", &payload.name)?;
    payload.sku = required_text("SKU", &payload.sku)?;

    let item = repo::create_inventory(&pool, &payload)?;
    record(
        &pool,
        &user,
        "create",
        "inventory",
        &item.id,
        json!({ "sku": item.sku, "quantity": item.quantity }),
    );

    info!("Successfully created inventory item with id: {}", item.id);
    Ok(Json(item))
}

/// Handler for listing inventory
///
/// This function handles GET requests to `/api/inventory`; `low_stock=true`
/// keeps items at or below their minimum quantity.
#[instrument(skip(pool, _user))]
pub async fn list_inventory_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(_user): CurrentUser,
    Query(filter): Query<InventoryFilter>,
) -> Result<Json<Vec<Inventory>>, ApiError> {
    let items = repo::list_inventory(&pool, &filter)?;
    debug!("Retrieved {} inventory items", items.len());
    Ok(Json(items))
}

/// Handler for retrieving a specific inventory item
///
/// This function handles GET requests to `/api/inventory/{id}`.
#[instrument(skip(pool, _user), fields(inventory_id = %id))]
pub async fn get_inventory_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Inventory>, ApiError> {
    let item = repo::get_inventory(&pool, &id)?
        .ok_or_else(|| ApiError::NotFound(format!("Inventory item {} not found", id)))?;
    Ok(Json(item))
}

/// Handler for updating an inventory item
///
/// This function handles PUT requests to `/api/inventory/{id}`. Stock on
/// hand is not changed here; use the adjust endpoint.
#[instrument(skip(pool, user, payload), fields(inventory_id = %id))]
pub async fn update_inventory_handler(
    State(pool): State<Arc<DbPool>>,
    RequireManager(user): RequireManager,
    Path(id): Path<String>,
    Json(payload): Json<UpdateInventoryDto>,
) -> Result<Json<Inventory>, ApiError> {
    let item = repo::update_inventory(&pool, &id, &payload)?;
    record(&pool, &user, "update", "inventory", &id, serde_json::to_value(&payload).unwrap_or_default());

    info!("Updated inventory item {}", id);
    Ok(Json(item))
}

/// Handler for deleting an inventory item
///
/// This function handles DELETE requests to `/api/inventory/{id}`.
/// Items recorded as used on maintenance cannot be deleted (409).
#[instrument(skip(pool, user), fields(inventory_id = %id))]
pub async fn delete_inventory_handler(
    State(pool): State<Arc<DbPool>>,
    RequireManager(user): RequireManager,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    repo::delete_inventory(&pool, &id)?;
    record(&pool, &user, "delete", "inventory", &id, json!({}));

    info!("Deleted inventory item {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for adjusting stock on hand
///
/// This function handles POST requests to `/api/inventory/{id}/adjust`.
/// The result may not go below zero.
#[instrument(skip(pool, user, payload), fields(inventory_id = %id, delta = payload.delta))]
pub async fn adjust_inventory_handler(
    State(pool): State<Arc<DbPool>>,
    RequireManager(user): RequireManager,
    Path(id): Path<String>,
    Json(payload): Json<AdjustInventoryDto>,
) -> Result<Json<Inventory>, ApiError> {
    let item = repo::adjust_inventory(&pool, &id, payload.delta)?;
    record(
        &pool,
        &user,
        "adjust",
        "inventory",
        &id,
        json!({ "delta": payload.delta, "quantity": item.quantity }),
    );

    info!("Adjusted inventory item {} by {}", id, payload.delta);
    Ok(Json(item))
}
