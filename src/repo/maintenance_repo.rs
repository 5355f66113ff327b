use crate::db::DbPool;
use crate::dto::{CreateMaintenanceDto, MaintenanceFilter, UpdateMaintenanceDto};
use crate::errors::DomainError;
use crate::models::{AssetStatus, Inventory, Maintenance, MaintenanceInventory, MaintenanceStatus, Role, User};
use crate::schema::{assets, inventory, maintenance, maintenance_inventory, users};
use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::{debug, info, instrument};

use super::asset_repo::load_asset;

fn load_maintenance(conn: &mut SqliteConnection, id: &str) -> Result<Maintenance> {
    let job = maintenance::table
        .find(id)
        .select(Maintenance::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| DomainError::not_found("Maintenance", id))?;
    Ok(job)
}

/// Checks that a user exists and may be assigned maintenance work
fn ensure_mechanic(conn: &mut SqliteConnection, user_id: &str) -> Result<()> {
    let user: User = users::table
        .find(user_id)
        .select(User::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| DomainError::not_found("User", user_id))?;
    if !user.role.at_least(Role::Mechanic) {
        return Err(DomainError::Validation(format!("{} is not a mechanic", user.name)).into());
    }
    Ok(())
}

/// Puts an asset back in service once no job is working on it any more
fn release_asset(conn: &mut SqliteConnection, asset_id: &str, finished_job_id: &str) -> Result<()> {
    let still_working: i64 = maintenance::table
        .filter(maintenance::asset_id.eq(asset_id))
        .filter(maintenance::status.eq(MaintenanceStatus::InProgress))
        .filter(maintenance::id.ne(finished_job_id))
        .count()
        .get_result(conn)?;

    if still_working == 0 {
        diesel::update(
            assets::table
                .find(asset_id)
                .filter(assets::status.eq(AssetStatus::InMaintenance)),
        )
        .set((
            assets::status.eq(AssetStatus::Available),
            assets::updated_at.eq(Utc::now().naive_utc()),
        ))
        .execute(conn)?;
    }
    Ok(())
}

/// Schedules a maintenance job on an asset
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `dto` - The asset, description, date and optional assigned mechanic
///
/// ### Returns
///
/// A Result containing the newly created Maintenance job, status `scheduled`
///
/// ### Errors
///
/// Returns an error if:
/// - The asset does not exist
/// - The assigned user does not exist or is not a mechanic
#[instrument(skip(pool, dto), fields(asset_id = %dto.asset_id))]
pub fn create_maintenance(pool: &DbPool, dto: &CreateMaintenanceDto) -> Result<Maintenance> {
    debug!("Scheduling maintenance");

    let conn = &mut pool.get()?;

    let job = conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
        load_asset(conn, &dto.asset_id)?;
        if let Some(mechanic_id) = &dto.mechanic_id {
            ensure_mechanic(conn, mechanic_id)?;
        }

        let mut job = Maintenance::new(dto.asset_id.clone(), dto.description.clone(), dto.scheduled_date);
        job.mechanic_id = dto.mechanic_id.clone();

        diesel::insert_into(maintenance::table)
            .values(&job)
            .execute(conn)?;
        Ok(job)
    })?;

    info!("Successfully scheduled maintenance with id: {}", job.id);
    Ok(job)
}

/// Retrieves a maintenance job by ID
#[instrument(skip(pool), fields(maintenance_id = %id))]
pub fn get_maintenance(pool: &DbPool, id: &str) -> Result<Option<Maintenance>> {
    let conn = &mut pool.get()?;
    let result = maintenance::table
        .find(id)
        .select(Maintenance::as_select())
        .first(conn)
        .optional()?;
    Ok(result)
}

/// Lists maintenance jobs matching a filter, soonest scheduled first
#[instrument(skip(pool))]
pub fn list_maintenance(pool: &DbPool, filter: &MaintenanceFilter) -> Result<Vec<Maintenance>> {
    let conn = &mut pool.get()?;

    let mut query = maintenance::table.select(Maintenance::as_select()).into_boxed();

    if let Some(status) = filter.status {
        query = query.filter(maintenance::status.eq(status));
    }
    if let Some(asset_id) = &filter.asset_id {
        query = query.filter(maintenance::asset_id.eq(asset_id.clone()));
    }
    if let Some(mechanic_id) = &filter.mechanic_id {
        query = query.filter(maintenance::mechanic_id.eq(mechanic_id.clone()));
    }

    let result = query
        .order((maintenance::scheduled_date.asc(), maintenance::created_at.asc()))
        .load(conn)?;

    info!("Retrieved {} maintenance jobs", result.len());
    Ok(result)
}

/// Edits an open maintenance job
///
/// Moving the scheduled date re-arms the reminder.
///
/// ### Errors
///
/// Returns an error if:
/// - The job does not exist or is already completed or cancelled
/// - The cost is negative
/// - A newly assigned user is not a mechanic
#[instrument(skip(pool, update), fields(maintenance_id = %id))]
pub fn update_maintenance(pool: &DbPool, id: &str, update: &UpdateMaintenanceDto) -> Result<Maintenance> {
    let conn = &mut pool.get()?;

    conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
        let mut job = load_maintenance(conn, id)?;

        if job.status.is_terminal() {
            return Err(DomainError::InvalidState(format!(
                "Maintenance is {} and can no longer be edited",
                job.status
            ))
            .into());
        }

        if let Some(description) = &update.description {
            job.description = description.clone();
        }
        if let Some(scheduled_date) = update.scheduled_date {
            if scheduled_date != job.scheduled_date {
                job.scheduled_date = scheduled_date;
                job.reminder_sent = false;
            }
        }
        if let Some(mechanic_id) = &update.mechanic_id {
            ensure_mechanic(conn, mechanic_id)?;
            job.mechanic_id = Some(mechanic_id.clone());
        }
        if let Some(cost) = update.cost {
            if !cost.is_finite() || cost < 0.0 {
                return Err(DomainError::Validation("Cost must be zero or more".to_string()).into());
            }
            job.cost = cost;
        }
        job.updated_at = Utc::now().naive_utc();

        diesel::update(maintenance::table.find(id))
            .set(&job)
            .execute(conn)?;

        info!("Updated maintenance");
        Ok(job)
    })
}

/// Moves a maintenance job to a new status and keeps its asset in step
///
/// Starting work puts the asset in maintenance; finishing or cancelling
/// in-progress work returns it to service once no other job is running on
/// it. Completing stamps `completed_at`.
///
/// ### Errors
///
/// Returns `DomainError::InvalidState` for a transition the lifecycle does
/// not allow, or when starting work on an asset that is checked out or retired.
#[instrument(skip(pool), fields(maintenance_id = %id, status = %next))]
pub fn set_maintenance_status(pool: &DbPool, id: &str, next: MaintenanceStatus) -> Result<Maintenance> {
    let conn = &mut pool.get()?;

    let job = conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
        let mut job = load_maintenance(conn, id)?;

        if !job.status.can_transition_to(next) {
            return Err(DomainError::InvalidState(format!(
                "Cannot change maintenance status from {} to {}",
                job.status, next
            ))
            .into());
        }

        let now = Utc::now().naive_utc();

        if next == MaintenanceStatus::InProgress {
            let asset = load_asset(conn, &job.asset_id)?;
            match asset.status {
                AssetStatus::Available => {
                    diesel::update(assets::table.find(&asset.id))
                        .set((
                            assets::status.eq(AssetStatus::InMaintenance),
                            assets::updated_at.eq(now),
                        ))
                        .execute(conn)?;
                }
                AssetStatus::InMaintenance => {}
                other => {
                    return Err(DomainError::InvalidState(format!(
                        "Asset is {} and cannot go into maintenance",
                        other
                    ))
                    .into());
                }
            }
        }

        if job.status == MaintenanceStatus::InProgress && next.is_terminal() {
            release_asset(conn, &job.asset_id, &job.id)?;
        }

        job.status = next;
        if next == MaintenanceStatus::Completed {
            job.completed_at = Some(now);
        }
        job.updated_at = now;

        diesel::update(maintenance::table.find(id))
            .set(&job)
            .execute(conn)?;
        Ok(job)
    })?;

    info!("Maintenance is now {}", job.status);
    Ok(job)
}

/// Deletes a maintenance job and its parts records
///
/// Deleting in-progress work returns the asset to service. Consumed stock is
/// not put back.
#[instrument(skip(pool), fields(maintenance_id = %id))]
pub fn delete_maintenance(pool: &DbPool, id: &str) -> Result<()> {
    let conn = &mut pool.get()?;

    conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
        let job = load_maintenance(conn, id)?;
        if job.status == MaintenanceStatus::InProgress {
            release_asset(conn, &job.asset_id, &job.id)?;
        }
        diesel::delete(maintenance::table.find(id)).execute(conn)?;
        Ok(())
    })?;

    info!("Deleted maintenance");
    Ok(())
}

/// Lists the parts consumed by a maintenance job, oldest first
#[instrument(skip(pool), fields(maintenance_id = %maintenance_id))]
pub fn list_parts(pool: &DbPool, maintenance_id: &str) -> Result<Vec<MaintenanceInventory>> {
    let conn = &mut pool.get()?;
    let result = maintenance_inventory::table
        .filter(maintenance_inventory::maintenance_id.eq(maintenance_id))
        .order(maintenance_inventory::created_at.asc())
        .select(MaintenanceInventory::as_select())
        .load(conn)?;
    Ok(result)
}

/// Consumes stock on a maintenance job
///
/// In one transaction: the stock is decremented, the usage is recorded, and
/// `quantity × unit_cost` is added to the job's cost. If any step fails
/// nothing is written.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `maintenance_id` - The job consuming the parts
/// * `inventory_id` - The stocked item used
/// * `quantity` - How many units were used; must be positive
///
/// ### Returns
///
/// A Result containing the usage record
///
/// ### Errors
///
/// Returns an error if:
/// - The quantity is not positive
/// - The job or the item does not exist
/// - The job is completed or cancelled
/// - There is not enough stock (`DomainError::InsufficientStock`)
#[instrument(skip(pool))]
pub fn consume_part(
    pool: &DbPool,
    maintenance_id: &str,
    inventory_id: &str,
    quantity: i32,
) -> Result<MaintenanceInventory> {
    if quantity <= 0 {
        return Err(DomainError::Validation("Quantity must be positive".to_string()).into());
    }

    let conn = &mut pool.get()?;

    let usage = conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
        let job = load_maintenance(conn, maintenance_id)?;
        if job.status.is_terminal() {
            return Err(DomainError::InvalidState(format!(
                "Maintenance is {} and cannot consume parts",
                job.status
            ))
            .into());
        }

        let item: Inventory = inventory::table
            .find(inventory_id)
            .select(Inventory::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| DomainError::not_found("Inventory item", inventory_id))?;

        if quantity > item.quantity {
            return Err(DomainError::InsufficientStock {
                sku: item.sku,
                requested: quantity,
                available: item.quantity,
            }
            .into());
        }

        let now = Utc::now().naive_utc();

        diesel::update(inventory::table.find(inventory_id))
            .set((
                inventory::quantity.eq(item.quantity - quantity),
                inventory::updated_at.eq(now),
            ))
            .execute(conn)?;

        let usage = MaintenanceInventory::new(job.id.clone(), item.id.clone(), quantity);
        diesel::insert_into(maintenance_inventory::table)
            .values(&usage)
            .execute(conn)?;

        diesel::update(maintenance::table.find(maintenance_id))
            .set((
                maintenance::cost.eq(job.cost + f64::from(quantity) * item.unit_cost),
                maintenance::updated_at.eq(now),
            ))
            .execute(conn)?;

        Ok(usage)
    })?;

    info!("Consumed {} units", usage.quantity_used);
    Ok(usage)
}
