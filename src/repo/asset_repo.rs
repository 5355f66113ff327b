use crate::db::DbPool;
use crate::dto::{AssetFilter, CreateAssetDto, UpdateAssetDto};
use crate::errors::DomainError;
use crate::models::{Asset, AssetLocationHistory, AssetStatus};
use crate::schema::{asset_location_history, assets, locations};
use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::{debug, info, instrument};

/// Rejects negative money amounts and lifetimes
fn validate_asset_values(purchase_cost: f64, salvage_value: f64, useful_life_years: i32) -> Result<()> {
    if !purchase_cost.is_finite() || purchase_cost < 0.0 {
        return Err(DomainError::Validation("Purchase cost must be zero or more".to_string()).into());
    }
    if !salvage_value.is_finite() || salvage_value < 0.0 {
        return Err(DomainError::Validation("Salvage value must be zero or more".to_string()).into());
    }
    if useful_life_years < 0 {
        return Err(DomainError::Validation("Useful life must be zero or more years".to_string()).into());
    }
    Ok(())
}

/// Loads an asset inside an open connection, failing if it is missing
pub(crate) fn load_asset(conn: &mut SqliteConnection, id: &str) -> Result<Asset> {
    let asset = assets::table
        .find(id)
        .select(Asset::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| DomainError::not_found("Asset", id))?;
    Ok(asset)
}

fn ensure_location_exists(conn: &mut SqliteConnection, id: &str) -> Result<()> {
    let found: i64 = locations::table
        .filter(locations::id.eq(id))
        .count()
        .get_result(conn)?;
    if found == 0 {
        return Err(DomainError::not_found("Location", id).into());
    }
    Ok(())
}

/// Creates a new asset
///
/// When the asset is created at a location, that placement is recorded as
/// the first entry of its location history.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `dto` - The asset's details
/// * `created_by` - The user creating the asset, recorded on the history entry
///
/// ### Returns
///
/// A Result containing the newly created Asset
///
/// ### Errors
///
/// Returns an error if:
/// - The values are invalid, or the status is `checked_out`
/// - The initial location does not exist
/// - The serial number is taken (unique violation)
/// - The asset type does not exist (foreign key violation)
#[instrument(skip(pool, dto), fields(serial_number = %dto.serial_number))]
pub fn create_asset(pool: &DbPool, dto: &CreateAssetDto, created_by: Option<&str>) -> Result<Asset> {
    debug!("Creating new asset");

    validate_asset_values(dto.purchase_cost, dto.salvage_value, dto.useful_life_years)?;
    let status = dto.status.unwrap_or(AssetStatus::Available);
    if status == AssetStatus::CheckedOut {
        return Err(DomainError::Validation(
            "Assets can only be checked out through a checkout".to_string(),
        )
        .into());
    }

    let mut asset = Asset::new(
        dto.name.clone(),
        dto.serial_number.clone(),
        dto.asset_type_id.clone(),
        dto.purchase_date,
        dto.purchase_cost,
        dto.useful_life_years,
    );
    asset.status = status;
    asset.salvage_value = dto.salvage_value;
    asset.location_id = dto.location_id.clone();
    asset.notes = dto.notes.clone();

    let conn = &mut pool.get()?;
    conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
        if let Some(location_id) = &asset.location_id {
            ensure_location_exists(conn, location_id)?;
        }

        diesel::insert_into(assets::table)
            .values(&asset)
            .execute(conn)?;

        if asset.location_id.is_some() {
            let entry = AssetLocationHistory::new(
                asset.id.clone(),
                None,
                asset.location_id.clone(),
                created_by.map(str::to_string),
            );
            diesel::insert_into(asset_location_history::table)
                .values(&entry)
                .execute(conn)?;
        }
        Ok(())
    })?;

    info!("Successfully created asset with id: {}", asset.id);
    Ok(asset)
}

/// Retrieves an asset by ID
///
/// ### Returns
///
/// A Result containing an Option with the Asset if found, or None if not found
#[instrument(skip(pool), fields(asset_id = %id))]
pub fn get_asset(pool: &DbPool, id: &str) -> Result<Option<Asset>> {
    let conn = &mut pool.get()?;
    let result = assets::table
        .find(id)
        .select(Asset::as_select())
        .first(conn)
        .optional()?;
    Ok(result)
}

/// Lists assets matching a filter, newest first
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `filter` - Status, type and location must match exactly; `search` is a
///   case-insensitive substring of the name or serial number
#[instrument(skip(pool))]
pub fn list_assets(pool: &DbPool, filter: &AssetFilter) -> Result<Vec<Asset>> {
    let conn = &mut pool.get()?;

    let mut query = assets::table.select(Asset::as_select()).into_boxed();

    if let Some(status) = filter.status {
        query = query.filter(assets::status.eq(status));
    }
    if let Some(asset_type_id) = &filter.asset_type_id {
        query = query.filter(assets::asset_type_id.eq(asset_type_id.clone()));
    }
    if let Some(location_id) = &filter.location_id {
        query = query.filter(assets::location_id.eq(location_id.clone()));
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        query = query.filter(
            assets::name
                .like(pattern.clone())
                .or(assets::serial_number.like(pattern)),
        );
    }

    let result = query
        .order((assets::created_at.desc(), assets::name.asc()))
        .load(conn)?;

    info!("Retrieved {} assets", result.len());
    Ok(result)
}

/// Applies a partial update to an asset
///
/// ### Errors
///
/// Returns an error if:
/// - The asset does not exist
/// - The update sets the status to `checked_out`, or changes the status of an
///   asset that is currently checked out
/// - The resulting values are invalid
#[instrument(skip(pool, update), fields(asset_id = %id))]
pub fn update_asset(pool: &DbPool, id: &str, update: &UpdateAssetDto) -> Result<Asset> {
    let conn = &mut pool.get()?;

    conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
        let mut asset = load_asset(conn, id)?;

        if let Some(status) = update.status {
            if status == AssetStatus::CheckedOut {
                return Err(DomainError::Validation(
                    "Assets can only be checked out through a checkout".to_string(),
                )
                .into());
            }
            if asset.status == AssetStatus::CheckedOut && status != asset.status {
                return Err(DomainError::InvalidState(
                    "Asset is checked out; check it in before changing its status".to_string(),
                )
                .into());
            }
            asset.status = status;
        }
        if let Some(name) = &update.name {
            asset.name = name.clone();
        }
        if let Some(serial_number) = &update.serial_number {
            asset.serial_number = serial_number.clone();
        }
        if let Some(asset_type_id) = &update.asset_type_id {
            asset.asset_type_id = asset_type_id.clone();
        }
        if let Some(purchase_date) = update.purchase_date {
            asset.purchase_date = purchase_date;
        }
        if let Some(purchase_cost) = update.purchase_cost {
            asset.purchase_cost = purchase_cost;
        }
        if let Some(salvage_value) = update.salvage_value {
            asset.salvage_value = salvage_value;
        }
        if let Some(useful_life_years) = update.useful_life_years {
            asset.useful_life_years = useful_life_years;
        }
        if let Some(notes) = &update.notes {
            asset.notes = Some(notes.clone());
        }
        validate_asset_values(asset.purchase_cost, asset.salvage_value, asset.useful_life_years)?;
        asset.updated_at = Utc::now().naive_utc();

        diesel::update(assets::table.find(id))
            .set(&asset)
            .execute(conn)?;

        info!("Updated asset");
        Ok(asset)
    })
}

/// Deletes an asset along with its history, maintenance and checkouts
#[instrument(skip(pool), fields(asset_id = %id))]
pub fn delete_asset(pool: &DbPool, id: &str) -> Result<()> {
    let conn = &mut pool.get()?;
    let deleted = diesel::delete(assets::table.find(id)).execute(conn)?;
    if deleted == 0 {
        return Err(DomainError::not_found("Asset", id).into());
    }
    info!("Deleted asset");
    Ok(())
}

/// Moves an asset to another location, or out of any location
///
/// The move and its history entry are written together.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `id` - The asset to move
/// * `to_location_id` - The destination, or None to unassign the asset
/// * `moved_by` - The user performing the move
///
/// ### Returns
///
/// A Result containing the history entry describing the move
///
/// ### Errors
///
/// Returns an error if:
/// - The asset or the destination does not exist
/// - The asset is already at the destination
#[instrument(skip(pool), fields(asset_id = %id))]
pub fn move_asset(
    pool: &DbPool,
    id: &str,
    to_location_id: Option<String>,
    moved_by: Option<&str>,
) -> Result<AssetLocationHistory> {
    let conn = &mut pool.get()?;

    let entry = conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
        let asset = load_asset(conn, id)?;

        if asset.location_id == to_location_id {
            return Err(DomainError::InvalidState(
                "Asset is already at that location".to_string(),
            )
            .into());
        }
        if let Some(location_id) = &to_location_id {
            ensure_location_exists(conn, location_id)?;
        }

        let entry = AssetLocationHistory::new(
            asset.id.clone(),
            asset.location_id.clone(),
            to_location_id.clone(),
            moved_by.map(str::to_string),
        );
        diesel::insert_into(asset_location_history::table)
            .values(&entry)
            .execute(conn)?;

        diesel::update(assets::table.find(id))
            .set((
                assets::location_id.eq(&to_location_id),
                assets::updated_at.eq(entry.moved_at),
            ))
            .execute(conn)?;

        Ok(entry)
    })?;

    info!(
        "Moved asset from {:?} to {:?}",
        entry.from_location_id, entry.to_location_id
    );
    Ok(entry)
}

/// Lists an asset's moves, most recent first
#[instrument(skip(pool), fields(asset_id = %asset_id))]
pub fn list_asset_history(pool: &DbPool, asset_id: &str) -> Result<Vec<AssetLocationHistory>> {
    let conn = &mut pool.get()?;
    let result = asset_location_history::table
        .filter(asset_location_history::asset_id.eq(asset_id))
        .order(asset_location_history::moved_at.desc())
        .select(AssetLocationHistory::as_select())
        .load(conn)?;
    Ok(result)
}
