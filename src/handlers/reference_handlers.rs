use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::auth::{CurrentUser, RequireManager};
use crate::db::DbPool;
use crate::dto::{CreateAssetTypeDto, CreateLocationDto, UpdateAssetTypeDto, UpdateLocationDto};
use crate::errors::ApiError;
use crate::models::{AssetType, Location};
use crate::repo;

use super::common::{record, required_text};

/// Handler for creating a new asset type
///
/// This function handles POST requests to `/api/asset-types`.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `user` - The manager creating the type
/// * `payload` - The request payload containing the name and description
///
/// ### Returns
///
/// The newly created asset type as JSON
#[instrument(skip(pool, user, payload), fields(name = %payload.name))]
pub async fn create_asset_type_handler(
    // Extract the database pool from the application state
    State(pool): State<Arc<DbPool>>,
    RequireManager(user): RequireManager,
    // Extract and deserialize the JSON request body
    Json(payload): Json<CreateAssetTypeDto>,
) -> Result<Json<AssetType>, ApiError> {
    info!("Creating new asset type");

    let name = required_text("Name", &payload.name)?;
    let asset_type = repo::create_asset_type(&pool, name, payload.description)?;
    record(&pool, &user, "create", "asset_type", &asset_type.id, json!({ "name": asset_type.name }));

    info!("Successfully created asset type with id: {}", asset_type.id);
    Ok(Json(asset_type))
}

/// Handler for listing all asset types
///
/// This function handles GET requests to `/api/asset-types`.
#[instrument(skip_all)]
pub async fn list_asset_types_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<AssetType>>, ApiError> {
    let asset_types = repo::list_asset_types(&pool)?;
    debug!("Retrieved {} asset types", asset_types.len());
    Ok(Json(asset_types))
}

/// Handler for retrieving a specific asset type
///
/// This function handles GET requests to `/api/asset-types/{id}`.
#[instrument(skip(pool, _user), fields(asset_type_id = %id))]
pub async fn get_asset_type_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(_user): CurrentUser,
    // Extract the asset type ID from the URL path
    Path(id): Path<String>,
) -> Result<Json<AssetType>, ApiError> {
    let asset_type = repo::get_asset_type(&pool, &id)?
        .ok_or_else(|| ApiError::NotFound(format!("Asset type {} not found", id)))?;
    Ok(Json(asset_type))
}

/// Handler for updating an asset type
///
/// This function handles PUT requests to `/api/asset-types/{id}`.
#[instrument(skip(pool, user, payload), fields(asset_type_id = %id))]
pub async fn update_asset_type_handler(
    State(pool): State<Arc<DbPool>>,
    RequireManager(user): RequireManager,
    Path(id): Path<String>,
    Json(mut payload): Json<UpdateAssetTypeDto>,
) -> Result<Json<AssetType>, ApiError> {
    if let Some(name) = &payload.name {
        payload.name = Some(required_text("Name", name)?);
    }

    let asset_type = repo::update_asset_type(&pool, &id, &payload)?;
    record(&pool, &user, "update", "asset_type", &id, json!({ "name": asset_type.name }));

    info!("Updated asset type {}", id);
    Ok(Json(asset_type))
}

/// Handler for deleting an asset type
///
/// This function handles DELETE requests to `/api/asset-types/{id}`.
/// A type still used by assets cannot be deleted (409).
#[instrument(skip(pool, user), fields(asset_type_id = %id))]
pub async fn delete_asset_type_handler(
    State(pool): State<Arc<DbPool>>,
    RequireManager(user): RequireManager,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    repo::delete_asset_type(&pool, &id)?;
    record(&pool, &user, "delete", "asset_type", &id, json!({}));

    info!("Deleted asset type {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for creating a new location
///
/// This function handles POST requests to `/api/locations`.
#[instrument(skip(pool, user, payload), fields(name = %payload.name))]
pub async fn create_location_handler(
    State(pool): State<Arc<DbPool>>,
    RequireManager(user): RequireManager,
    Json(payload): Json<CreateLocationDto>,
) -> Result<Json<Location>, ApiError> {
    info!("Creating new location");

    let name = required_text("Name", &payload.name)?;
    let location = repo::create_location(&pool, name, payload.address, payload.description)?;
    record(&pool, &user, "create", "location", &location.id, json!({ "name": location.name }));

    info!("Successfully created location with id: {}", location.id);
    Ok(Json(location))
}

/// Handler for listing all locations
///
/// This function handles GET requests to `/api/locations`.
#[instrument(skip_all)]
pub async fn list_locations_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<Location>>, ApiError> {
    let locations = repo::list_locations(&pool)?;
    Ok(Json(locations))
}

/// Handler for retrieving a specific location
///
/// This function handles GET requests to `/api/locations/{id}`.
#[instrument(skip(pool, _user), fields(location_id = %id))]
pub async fn get_location_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Location>, ApiError> {
    let location = repo::get_location(&pool, &id)?
        .ok_or_else(|| ApiError::NotFound(format!("Location {} not found", id)))?;
    Ok(Json(location))
}

/// Handler for updating a location
///
/// This function handles PUT requests to `/api/locations/{id}`.
#[instrument(skip(pool, user, payload), fields(location_id = %id))]
pub async fn update_location_handler(
    State(pool): State<Arc<DbPool>>,
    RequireManager(user): RequireManager,
    Path(id): Path<String>,
    Json(mut payload): Json<UpdateLocationDto>,
) -> Result<Json<Location>, ApiError> {
    if let Some(name) = &payload.name {
        payload.name = Some(required_text("Name", name)?);
    }

    let location = repo::update_location(&pool, &id, &payload)?;
    record(&pool, &user, "update", "location", &id, json!({ "name": location.name }));

    info!("Updated location {}", id);
    Ok(Json(location))
}

/// Handler for deleting a location
///
/// This function handles DELETE requests to `/api/locations/{id}`.
/// Assets and stock kept there are left without a location.
#[instrument(skip(pool, user), fields(location_id = %id))]
pub async fn delete_location_handler(
    State(pool): State<Arc<DbPool>>,
    RequireManager(user): RequireManager,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    repo::delete_location(&pool, &id)?;
    record(&pool, &user, "delete", "location", &id, json!({}));

    info!("Deleted location {}", id);
    Ok(StatusCode::NO_CONTENT)
}
