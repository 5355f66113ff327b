use crate::db::DbPool;
use crate::dto::{CreateInventoryDto, InventoryFilter, UpdateInventoryDto};
use crate::errors::DomainError;
use crate::models::Inventory;
use crate::schema::inventory;
use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

fn validate_stock_values(quantity: i32, min_quantity: i32, unit_cost: f64) -> Result<()> {
    if quantity < 0 || min_quantity < 0 {
        return Err(DomainError::Validation("Quantities must be zero or more".to_string()).into());
    }
    if !unit_cost.is_finite() || unit_cost < 0.0 {
        return Err(DomainError::Validation("Unit cost must be zero or more".to_string()).into());
    }
    Ok(())
}

/// Creates a new inventory item
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `dto` - The item's details, including the opening stock
///
/// ### Returns
///
/// A Result containing the newly created Inventory row
///
/// ### Errors
///
/// Returns an error if:
/// - A quantity or the unit cost is negative
/// - The SKU is taken (unique violation)
/// - The location does not exist (foreign key violation)
#[instrument(skip(pool, dto), fields(sku = %dto.sku))]
pub fn create_inventory(pool: &DbPool, dto: &CreateInventoryDto) -> Result<Inventory> {
    debug!("Creating new inventory item");

    validate_stock_values(dto.quantity, dto.min_quantity, dto.unit_cost)?;

    let conn = &mut pool.get()?;

    let mut item = Inventory::new(
        dto.name.clone(),
        dto.sku.clone(),
        dto.quantity,
        dto.min_quantity,
        dto.unit_cost,
    );
    item.location_id = dto.location_id.clone();

    diesel::insert_into(inventory::table)
        .values(&item)
        .execute(conn)?;

    info!("Successfully created inventory item with id: {}", item.id);
    Ok(item)
}

/// Retrieves an inventory item by ID
#[instrument(skip(pool), fields(inventory_id = %id))]
pub fn get_inventory(pool: &DbPool, id: &str) -> Result<Option<Inventory>> {
    let conn = &mut pool.get()?;
    let result = inventory::table
        .find(id)
        .select(Inventory::as_select())
        .first(conn)
        .optional()?;
    Ok(result)
}

/// Lists inventory matching a filter, ordered by name
///
/// `low_stock = Some(true)` keeps items at or below their minimum quantity,
/// `Some(false)` keeps the rest.
#[instrument(skip(pool))]
pub fn list_inventory(pool: &DbPool, filter: &InventoryFilter) -> Result<Vec<Inventory>> {
    let conn = &mut pool.get()?;

    let mut query = inventory::table.select(Inventory::as_select()).into_boxed();

    match filter.low_stock {
        Some(true) => query = query.filter(inventory::quantity.le(inventory::min_quantity)),
        Some(false) => query = query.filter(inventory::quantity.gt(inventory::min_quantity)),
        None => {}
    }
    if let Some(location_id) = &filter.location_id {
        query = query.filter(inventory::location_id.eq(location_id.clone()));
    }

    let result = query
        .order((inventory::name.asc(), inventory::sku.asc()))
        .load(conn)?;

    info!("Retrieved {} inventory items", result.len());
    Ok(result)
}

/// Applies a partial update to an inventory item
///
/// Stock on hand is never written here; it only moves through
/// [`adjust_inventory`] and parts consumption.
#[instrument(skip(pool, update), fields(inventory_id = %id))]
pub fn update_inventory(pool: &DbPool, id: &str, update: &UpdateInventoryDto) -> Result<Inventory> {
    let conn = &mut pool.get()?;

    let item = conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
        let mut item: Inventory = inventory::table
            .find(id)
            .select(Inventory::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| DomainError::not_found("Inventory item", id))?;

        if let Some(name) = &update.name {
            item.name = name.clone();
        }
        if let Some(sku) = &update.sku {
            item.sku = sku.clone();
        }
        if let Some(min_quantity) = update.min_quantity {
            item.min_quantity = min_quantity;
        }
        if let Some(unit_cost) = update.unit_cost {
            item.unit_cost = unit_cost;
        }
        if let Some(location_id) = &update.location_id {
            item.location_id = Some(location_id.clone());
        }
        validate_stock_values(item.quantity, item.min_quantity, item.unit_cost)?;
        item.updated_at = Utc::now().naive_utc();

        diesel::update(inventory::table.find(id))
            .set((
                inventory::name.eq(&item.name),
                inventory::sku.eq(&item.sku),
                inventory::min_quantity.eq(item.min_quantity),
                inventory::unit_cost.eq(item.unit_cost),
                inventory::location_id.eq(&item.location_id),
                inventory::updated_at.eq(item.updated_at),
            ))
            .execute(conn)?;
        Ok(item)
    })?;

    info!("Updated inventory item");
    Ok(item)
}

/// Deletes an inventory item
///
/// ### Errors
///
/// Returns a foreign key violation while maintenance records still list the
/// item as a consumed part.
#[instrument(skip(pool), fields(inventory_id = %id))]
pub fn delete_inventory(pool: &DbPool, id: &str) -> Result<()> {
    let conn = &mut pool.get()?;
    let deleted = diesel::delete(inventory::table.find(id)).execute(conn)?;
    if deleted == 0 {
        return Err(DomainError::not_found("Inventory item", id).into());
    }
    info!("Deleted inventory item");
    Ok(())
}

/// Adds `delta` (which may be negative) to the stock on hand
///
/// ### Errors
///
/// Returns `DomainError::InsufficientStock` when the result would be negative;
/// the stored quantity is left untouched.
#[instrument(skip(pool), fields(inventory_id = %id))]
pub fn adjust_inventory(pool: &DbPool, id: &str, delta: i32) -> Result<Inventory> {
    let conn = &mut pool.get()?;

    let item = conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
        let mut item: Inventory = inventory::table
            .find(id)
            .select(Inventory::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| DomainError::not_found("Inventory item", id))?;

        let new_quantity = item.quantity.checked_add(delta).filter(|q| *q >= 0).ok_or_else(|| {
            DomainError::InsufficientStock {
                sku: item.sku.clone(),
                requested: delta.saturating_neg(),
                available: item.quantity,
            }
        })?;

        item.quantity = new_quantity;
        item.updated_at = Utc::now().naive_utc();

        diesel::update(inventory::table.find(id))
            .set((
                inventory::quantity.eq(item.quantity),
                inventory::updated_at.eq(item.updated_at),
            ))
            .execute(conn)?;
        Ok(item)
    })?;

    info!("Adjusted stock of {} to {}", item.sku, item.quantity);
    Ok(item)
}
