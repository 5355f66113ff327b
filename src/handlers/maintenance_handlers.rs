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
use crate::dto::{ConsumePartDto, CreateMaintenanceDto, MaintenanceFilter, MaintenanceStatusDto, UpdateMaintenanceDto};
use crate::errors::ApiError;
use crate::models::{Maintenance, MaintenanceInventory, Role, User};
use crate::repo;

use super::common::{record, required_text};

/// Loads a maintenance job or answers 404
fn find_job(pool: &DbPool, id: &str) -> Result<Maintenance, ApiError> {
    repo::get_maintenance(pool, id)?.ok_or_else(|| ApiError::NotFound(format!("Maintenance {} not found", id)))
}

/// Managers may work on any job; mechanics only on jobs assigned to them
fn ensure_can_work_on(user: &User, job: &Maintenance) -> Result<(), ApiError> {
    if user.role.at_least(Role::Manager) {
        return Ok(());
    }
    if user.role.at_least(Role::Mechanic) && job.mechanic_id.as_deref() == Some(user.id.as_str()) {
        return Ok(());
    }
    debug!(user_id = %user.id, "Not allowed to work on this maintenance");
    Err(ApiError::Forbidden)
}

/// Handler for scheduling maintenance
///
/// This function handles POST requests to `/api/maintenance`.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `user` - The manager scheduling the job
/// * `payload` - The asset, description, date and optional mechanic
///
/// ### Returns
///
/// The newly scheduled job as JSON
#[instrument(skip(pool, user, payload), fields(asset_id = %payload.asset_id))]
pub async fn create_maintenance_handler(
    State(pool): State<Arc<DbPool>>,
    RequireManager(user): RequireManager,
    Json(mut payload): Json<CreateMaintenanceDto>,
) -> Result<Json<Maintenance>, ApiError> {
    info!("Scheduling maintenance");

    payload.description = required_text("Description", &payload.description)?;

    let job = repo::create_maintenance(&pool, &payload)?;
    record(
        &pool,
        &user,
        "create",
        "maintenance",
        &job.id,
        json!({ "asset_id": job.asset_id, "scheduled_date": job.scheduled_date, "mechanic_id": job.mechanic_id }),
    );

    info!("Successfully scheduled maintenance with id: {}", job.id);
    Ok(Json(job))
}

/// Handler for listing maintenance
///
/// This function handles GET requests to `/api/maintenance`, optionally
/// filtered by `status`, `asset_id` and `mechanic_id`.
#[instrument(skip(pool, _user))]
pub async fn list_maintenance_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(_user): CurrentUser,
    Query(filter): Query<MaintenanceFilter>,
) -> Result<Json<Vec<Maintenance>>, ApiError> {
    let jobs = repo::list_maintenance(&pool, &filter)?;
    debug!("Retrieved {} maintenance jobs", jobs.len());
    Ok(Json(jobs))
}

/// Handler for retrieving a specific maintenance job
///
/// This function handles GET requests to `/api/maintenance/{id}`.
#[instrument(skip(pool, _user), fields(maintenance_id = %id))]
pub async fn get_maintenance_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Maintenance>, ApiError> {
    Ok(Json(find_job(&pool, &id)?))
}

/// Handler for editing a maintenance job
///
/// This function handles PUT requests to `/api/maintenance/{id}`. The
/// assigned mechanic may edit the job; only managers may reassign it.
#[instrument(skip(pool, user, payload), fields(maintenance_id = %id))]
pub async fn update_maintenance_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(mut payload): Json<UpdateMaintenanceDto>,
) -> Result<Json<Maintenance>, ApiError> {
    let job = find_job(&pool, &id)?;
    ensure_can_work_on(&user, &job)?;

    if payload.mechanic_id.is_some() && !user.role.at_least(Role::Manager) {
        return Err(ApiError::Forbidden);
    }
    if let Some(description) = &payload.description {
        payload.description = Some(required_text("Description", description)?);
    }

    let job = repo::update_maintenance(&pool, &id, &payload)?;
    record(&pool, &user, "update", "maintenance", &id, serde_json::to_value(&payload).unwrap_or_default());

    info!("Updated maintenance {}", id);
    Ok(Json(job))
}

/// Handler for deleting a maintenance job
///
/// This function handles DELETE requests to `/api/maintenance/{id}`.
#[instrument(skip(pool, user), fields(maintenance_id = %id))]
pub async fn delete_maintenance_handler(
    State(pool): State<Arc<DbPool>>,
    RequireManager(user): RequireManager,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    repo::delete_maintenance(&pool, &id)?;
    record(&pool, &user, "delete", "maintenance", &id, json!({}));

    info!("Deleted maintenance {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for moving a job through its lifecycle
///
/// This function handles POST requests to `/api/maintenance/{id}/status`.
/// Starting work takes the asset out of service; completing or cancelling
/// in-progress work puts it back.
#[instrument(skip(pool, user, payload), fields(maintenance_id = %id, status = %payload.status))]
pub async fn set_maintenance_status_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<MaintenanceStatusDto>,
) -> Result<Json<Maintenance>, ApiError> {
    let job = find_job(&pool, &id)?;
    ensure_can_work_on(&user, &job)?;

    let previous = job.status;
    let job = repo::set_maintenance_status(&pool, &id, payload.status)?;
    record(
        &pool,
        &user,
        "status",
        "maintenance",
        &id,
        json!({ "from": previous, "to": job.status }),
    );

    info!("Maintenance {} is now {}", id, job.status);
    Ok(Json(job))
}

/// Handler for listing the parts used on a job
///
/// This function handles GET requests to `/api/maintenance/{id}/parts`.
#[instrument(skip(pool, _user), fields(maintenance_id = %id))]
pub async fn list_parts_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<MaintenanceInventory>>, ApiError> {
    find_job(&pool, &id)?;
    Ok(Json(repo::list_parts(&pool, &id)?))
}

/// Handler for using stocked parts on a job
///
/// This function handles POST requests to `/api/maintenance/{id}/parts`.
/// Stock is taken and the job's cost grows by the parts' value in one
/// transaction; asking for more than is in stock changes nothing.
#[instrument(skip(pool, user, payload), fields(maintenance_id = %id, inventory_id = %payload.inventory_id))]
pub async fn consume_part_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<ConsumePartDto>,
) -> Result<Json<MaintenanceInventory>, ApiError> {
    let job = find_job(&pool, &id)?;
    ensure_can_work_on(&user, &job)?;

    let usage = repo::consume_part(&pool, &id, &payload.inventory_id, payload.quantity)?;
    record(
        &pool,
        &user,
        "consume",
        "maintenance",
        &id,
        json!({ "inventory_id": usage.inventory_id, "quantity": usage.quantity_used }),
    );

    info!("Used {} of {} on maintenance {}", usage.quantity_used, usage.inventory_id, id);
    Ok(Json(usage))
}
