use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Query;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::auth::{CurrentUser, RequireManager};
use crate::db::DbPool;
use crate::dto::{
    AsOfQuery, AssetFilter, CheckoutFilter, CreateAssetDto, DepreciationRow, MaintenanceFilter, MoveAssetDto,
    UpdateAssetDto,
};
use crate::errors::ApiError;
use crate::models::{Asset, AssetLocationHistory, CheckInOut, Maintenance};
use crate::repo;

use super::common::{record, required_text};

/// Loads an asset or answers 404
fn find_asset(pool: &DbPool, id: &str) -> Result<Asset, ApiError> {
    repo::get_asset(pool, id)?.ok_or_else(|| ApiError::NotFound(format!("Asset {} not found", id)))
}

/// Handler for creating a new asset
///
/// This function handles POST requests to `/api/assets`.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `user` - The manager creating the asset
/// * `payload` - The asset's details
///
/// ### Returns
///
/// The newly created asset as JSON
#[instrument(skip(pool, user, payload), fields(serial_number = %payload.serial_number))]
pub async fn create_asset_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    RequireManager(user): RequireManager,
    // Extract and deserialize the JSON request body
    Json(mut payload): Json<CreateAssetDto>,
) -> Result<Json<Asset>, ApiError> {
    info!("Creating new asset");

    payload.name = required_text("Name", &payload.name)?;
    payload.serial_number = required_text("Serial number", &payload.serial_number)?;

    let asset = repo::create_asset(&pool, &payload, Some(&user.id))?;
    record(
        &pool,
        &user,
        "create",
        "asset",
        &asset.id,
        json!({ "name": asset.name, "serial_number": asset.serial_number }),
    );

    info!("Successfully created asset with id: {}", asset.id);
    Ok(Json(asset))
}

/// Handler for listing assets
///
/// This function handles GET requests to `/api/assets`, optionally filtered
/// by `status`, `asset_type_id`, `location_id` and a `search` term.
#[instrument(skip(pool, _user))]
pub async fn list_assets_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(_user): CurrentUser,
    // Extract the filter from the query string
    Query(filter): Query<AssetFilter>,
) -> Result<Json<Vec<Asset>>, ApiError> {
    let assets = repo::list_assets(&pool, &filter)?;
    debug!("Retrieved {} assets", assets.len());
    Ok(Json(assets))
}

/// Handler for retrieving a specific asset
///
/// This function handles GET requests to `/api/assets/{id}`.
#[instrument(skip(pool, _user), fields(asset_id = %id))]
pub async fn get_asset_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(_user): CurrentUser,
    // Extract the asset ID from the URL path
    Path(id): Path<String>,
) -> Result<Json<Asset>, ApiError> {
    Ok(Json(find_asset(&pool, &id)?))
}

/// Handler for updating an asset
///
/// This function handles PUT requests to `/api/assets/{id}`. The status
/// cannot be set to `checked_out` here, and the location changes only
/// through the move endpoint.
#[instrument(skip(pool, user, payload), fields(asset_id = %id))]
pub async fn update_asset_handler(
    State(pool): State<Arc<DbPool>>,
    RequireManager(user): RequireManager,
    Path(id): Path<String>,
    Json(mut payload): Json<UpdateAssetDto>,
) -> Result<Json<Asset>, ApiError> {
    if let Some(name) = &payload.name {
        payload.name = Some(required_text("Name", name)?);
    }
    if let Some(serial_number) = &payload.serial_number {
        payload.serial_number = Some(required_text("Serial number", serial_number)?);
    }

    let asset = repo::update_asset(&pool, &id, &payload)?;
    record(&pool, &user, "update", "asset", &id, serde_json::to_value(&payload).unwrap_or_default());

    info!("Updated asset {}", id);
    Ok(Json(asset))
}

/// Handler for deleting an asset
///
/// This function handles DELETE requests to `/api/assets/{id}`. The asset's
/// history, maintenance and checkouts go with it.
#[instrument(skip(pool, user), fields(asset_id = %id))]
pub async fn delete_asset_handler(
    State(pool): State<Arc<DbPool>>,
    RequireManager(user): RequireManager,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    repo::delete_asset(&pool, &id)?;
    record(&pool, &user, "delete", "asset", &id, json!({}));

    info!("Deleted asset {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for moving an asset
///
/// This function handles POST requests to `/api/assets/{id}/move`.
/// A missing `location_id` takes the asset out of any location.
///
/// ### Returns
///
/// The history entry recording the move
#[instrument(skip(pool, user, payload), fields(asset_id = %id))]
pub async fn move_asset_handler(
    State(pool): State<Arc<DbPool>>,
    RequireManager(user): RequireManager,
    Path(id): Path<String>,
    Json(payload): Json<MoveAssetDto>,
) -> Result<Json<AssetLocationHistory>, ApiError> {
    let entry = repo::move_asset(&pool, &id, payload.location_id, Some(&user.id))?;
    record(
        &pool,
        &user,
        "move",
        "asset",
        &id,
        json!({ "from": entry.from_location_id, "to": entry.to_location_id }),
    );

    info!("Moved asset {}", id);
    Ok(Json(entry))
}

/// Handler for an asset's location history
///
/// This function handles GET requests to `/api/assets/{id}/history`.
#[instrument(skip(pool, _user), fields(asset_id = %id))]
pub async fn asset_history_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<AssetLocationHistory>>, ApiError> {
    find_asset(&pool, &id)?;
    Ok(Json(repo::list_asset_history(&pool, &id)?))
}

/// Handler for an asset's maintenance jobs
///
/// This function handles GET requests to `/api/assets/{id}/maintenance`.
#[instrument(skip(pool, _user), fields(asset_id = %id))]
pub async fn asset_maintenance_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<Maintenance>>, ApiError> {
    find_asset(&pool, &id)?;
    let filter = MaintenanceFilter { asset_id: Some(id), ..Default::default() };
    Ok(Json(repo::list_maintenance(&pool, &filter)?))
}

/// Handler for an asset's checkouts
///
/// This function handles GET requests to `/api/assets/{id}/checkouts`.
#[instrument(skip(pool, _user), fields(asset_id = %id))]
pub async fn asset_checkouts_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<CheckInOut>>, ApiError> {
    find_asset(&pool, &id)?;
    let filter = CheckoutFilter { asset_id: Some(id), ..Default::default() };
    Ok(Json(repo::list_checkouts(&pool, &filter, Utc::now().naive_utc())?))
}

/// Handler for an asset's current depreciation
///
/// This function handles GET requests to `/api/assets/{id}/depreciation`,
/// valued today unless `as_of` is given.
#[instrument(skip(pool, _user), fields(asset_id = %id))]
pub async fn asset_depreciation_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<AsOfQuery>,
) -> Result<Json<DepreciationRow>, ApiError> {
    let asset = find_asset(&pool, &id)?;
    let as_of = query.as_of.unwrap_or_else(|| Utc::now().date_naive());
    Ok(Json(repo::depreciation_row(&asset, as_of)))
}
