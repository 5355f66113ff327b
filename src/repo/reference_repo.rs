use crate::db::DbPool;
use crate::dto::{UpdateAssetTypeDto, UpdateLocationDto};
use crate::errors::DomainError;
use crate::models::{AssetType, Location};
use crate::schema::{asset_types, locations};
use anyhow::Result;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// Creates a new asset type
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `name` - The unique name of the asset type
/// * `description` - An optional free-text description
///
/// ### Returns
///
/// A Result containing the newly created AssetType
///
/// ### Errors
///
/// Returns an error if:
/// - Unable to get a connection from the pool
/// - An asset type with the same name exists (unique violation)
#[instrument(skip(pool), fields(name = %name))]
pub fn create_asset_type(pool: &DbPool, name: String, description: Option<String>) -> Result<AssetType> {
    debug!("Creating new asset type");

    let conn = &mut pool.get()?;
    let asset_type = AssetType::new(name, description);

    diesel::insert_into(asset_types::table)
        .values(&asset_type)
        .execute(conn)?;

    info!("Successfully created asset type with id: {}", asset_type.id);
    Ok(asset_type)
}

/// Retrieves an asset type by ID
///
/// ### Returns
///
/// A Result containing an Option with the AssetType if found, or None if not found
#[instrument(skip(pool), fields(asset_type_id = %id))]
pub fn get_asset_type(pool: &DbPool, id: &str) -> Result<Option<AssetType>> {
    let conn = &mut pool.get()?;
    let result = asset_types::table
        .find(id)
        .select(AssetType::as_select())
        .first(conn)
        .optional()?;
    Ok(result)
}

/// Lists every asset type, ordered by name
#[instrument(skip(pool))]
pub fn list_asset_types(pool: &DbPool) -> Result<Vec<AssetType>> {
    let conn = &mut pool.get()?;
    let result = asset_types::table
        .order(asset_types::name.asc())
        .select(AssetType::as_select())
        .load(conn)?;
    info!("Retrieved {} asset types", result.len());
    Ok(result)
}

/// Applies a partial update to an asset type
///
/// ### Errors
///
/// Returns `DomainError::NotFound` if the asset type does not exist, or a
/// unique violation if the new name is taken.
#[instrument(skip(pool, update), fields(asset_type_id = %id))]
pub fn update_asset_type(pool: &DbPool, id: &str, update: &UpdateAssetTypeDto) -> Result<AssetType> {
    let conn = &mut pool.get()?;

    let mut asset_type: AssetType = asset_types::table
        .find(id)
        .select(AssetType::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| DomainError::not_found("Asset type", id))?;

    if let Some(name) = &update.name {
        asset_type.name = name.clone();
    }
    if let Some(description) = &update.description {
        asset_type.description = Some(description.clone());
    }

    diesel::update(asset_types::table.find(id))
        .set(&asset_type)
        .execute(conn)?;

    info!("Updated asset type");
    Ok(asset_type)
}

/// Deletes an asset type
///
/// ### Errors
///
/// Returns `DomainError::NotFound` if it does not exist, or a foreign key
/// violation while assets still use it.
#[instrument(skip(pool), fields(asset_type_id = %id))]
pub fn delete_asset_type(pool: &DbPool, id: &str) -> Result<()> {
    let conn = &mut pool.get()?;
    let deleted = diesel::delete(asset_types::table.find(id)).execute(conn)?;
    if deleted == 0 {
        return Err(DomainError::not_found("Asset type", id).into());
    }
    info!("Deleted asset type");
    Ok(())
}

/// Creates a new location
///
/// ### Errors
///
/// Returns an error if a location with the same name exists (unique violation).
#[instrument(skip(pool), fields(name = %name))]
pub fn create_location(
    pool: &DbPool,
    name: String,
    address: Option<String>,
    description: Option<String>,
) -> Result<Location> {
    debug!("Creating new location");

    let conn = &mut pool.get()?;
    let location = Location::new(name, address, description);

    diesel::insert_into(locations::table)
        .values(&location)
        .execute(conn)?;

    info!("Successfully created location with id: {}", location.id);
    Ok(location)
}

/// Retrieves a location by ID
#[instrument(skip(pool), fields(location_id = %id))]
pub fn get_location(pool: &DbPool, id: &str) -> Result<Option<Location>> {
    let conn = &mut pool.get()?;
    let result = locations::table
        .find(id)
        .select(Location::as_select())
        .first(conn)
        .optional()?;
    Ok(result)
}

/// Lists every location, ordered by name
#[instrument(skip(pool))]
pub fn list_locations(pool: &DbPool) -> Result<Vec<Location>> {
    let conn = &mut pool.get()?;
    let result = locations::table
        .order(locations::name.asc())
        .select(Location::as_select())
        .load(conn)?;
    info!("Retrieved {} locations", result.len());
    Ok(result)
}

/// Applies a partial update to a location
#[instrument(skip(pool, update), fields(location_id = %id))]
pub fn update_location(pool: &DbPool, id: &str, update: &UpdateLocationDto) -> Result<Location> {
    let conn = &mut pool.get()?;

    let mut location: Location = locations::table
        .find(id)
        .select(Location::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| DomainError::not_found("Location", id))?;

    if let Some(name) = &update.name {
        location.name = name.clone();
    }
    if let Some(address) = &update.address {
        location.address = Some(address.clone());
    }
    if let Some(description) = &update.description {
        location.description = Some(description.clone());
    }

    diesel::update(locations::table.find(id))
        .set(&location)
        .execute(conn)?;

    info!("Updated location");
    Ok(location)
}

/// Deletes a location
///
/// Assets and stock kept there lose their location; their history keeps the
/// move but forgets where it went.
#[instrument(skip(pool), fields(location_id = %id))]
pub fn delete_location(pool: &DbPool, id: &str) -> Result<()> {
    let conn = &mut pool.get()?;
    let deleted = diesel::delete(locations::table.find(id)).execute(conn)?;
    if deleted == 0 {
        return Err(DomainError::not_found("Location", id).into());
    }
    info!("Deleted location");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    #[test]
    fn test_asset_type_crud() {
        let pool = setup_test_db();

        let created = create_asset_type(&pool, "Laptop".into(), Some("Portable computers".into())).unwrap();
        let fetched = get_asset_type(&pool, &created.id).unwrap().unwrap();
        assert_eq!(fetched, created);

        let update = UpdateAssetTypeDto { name: Some("Notebook".into()), description: None };
        let updated = update_asset_type(&pool, &created.id, &update).unwrap();
        assert_eq!(updated.name, "Notebook");
        assert_eq!(updated.description.as_deref(), Some("Portable computers"));

        create_asset_type(&pool, "Forklift".into(), None).unwrap();
        let names: Vec<String> = list_asset_types(&pool).unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Forklift", "Notebook"]);

        delete_asset_type(&pool, &created.id).unwrap();
        assert!(get_asset_type(&pool, &created.id).unwrap().is_none());
        assert!(delete_asset_type(&pool, &created.id).is_err());
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let pool = setup_test_db();
        create_asset_type(&pool, "Drill".into(), None).unwrap();
        assert!(create_asset_type(&pool, "Drill".into(), None).is_err());

        create_location(&pool, "Warehouse".into(), None, None).unwrap();
        assert!(create_location(&pool, "Warehouse".into(), None, None).is_err());
    }

    #[test]
    fn test_location_crud() {
        let pool = setup_test_db();

        let created = create_location(&pool, "HQ".into(), Some("1 Main St".into()), None).unwrap();
        assert_eq!(get_location(&pool, &created.id).unwrap().unwrap(), created);

        let update = UpdateLocationDto { description: Some("Head office".into()), ..Default::default() };
        let updated = update_location(&pool, &created.id, &update).unwrap();
        assert_eq!(updated.address.as_deref(), Some("1 Main St"));
        assert_eq!(updated.description.as_deref(), Some("Head office"));

        assert_eq!(list_locations(&pool).unwrap().len(), 1);
        delete_location(&pool, &created.id).unwrap();
        assert!(list_locations(&pool).unwrap().is_empty());

        let err = update_location(&pool, &created.id, &update).unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::NotFound { .. })));
    }
}
