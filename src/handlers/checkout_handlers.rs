use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::Query;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::auth::{CurrentUser, RequireManager};
use crate::db::DbPool;
use crate::dto::{CheckoutFilter, CreateCheckoutDto};
use crate::errors::ApiError;
use crate::models::CheckInOut;
use crate::repo;

use super::common::record;

/// Handler for checking an asset out to an employee
///
/// This function handles POST requests to `/api/checkouts`. The asset must
/// be available.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `user` - The manager handing the asset out
/// * `payload` - The asset, the employee, and optionally when it is due back
///
/// ### Returns
///
/// The open checkout as JSON
#[instrument(skip(pool, user, payload), fields(asset_id = %payload.asset_id, employee_id = %payload.employee_id))]
pub async fn create_checkout_handler(
    State(pool): State<Arc<DbPool>>,
    RequireManager(user): RequireManager,
    Json(payload): Json<CreateCheckoutDto>,
) -> Result<Json<CheckInOut>, ApiError> {
    info!("Checking out asset");

    let checkout = repo::check_out_asset(&pool, &payload)?;
    record(
        &pool,
        &user,
        "check_out",
        "checkout",
        &checkout.id,
        json!({
            "asset_id": checkout.asset_id,
            "employee_id": checkout.employee_id,
            "expected_return_at": checkout.expected_return_at,
        }),
    );

    info!("Asset checked out with checkout id: {}", checkout.id);
    Ok(Json(checkout))
}

/// Handler for listing checkouts
///
/// This function handles GET requests to `/api/checkouts`, optionally
/// filtered by `active`, `overdue`, `asset_id` and `employee_id`.
#[instrument(skip(pool, _user))]
pub async fn list_checkouts_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(_user): CurrentUser,
    Query(filter): Query<CheckoutFilter>,
) -> Result<Json<Vec<CheckInOut>>, ApiError> {
    let checkouts = repo::list_checkouts(&pool, &filter, Utc::now().naive_utc())?;
    debug!("Retrieved {} checkouts", checkouts.len());
    Ok(Json(checkouts))
}

/// Handler for retrieving a specific checkout
///
/// This function handles GET requests to `/api/checkouts/{id}`.
#[instrument(skip(pool, _user), fields(checkout_id = %id))]
pub async fn get_checkout_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<CheckInOut>, ApiError> {
    let checkout = repo::get_checkout(&pool, &id)?
        .ok_or_else(|| ApiError::NotFound(format!("Checkout {} not found", id)))?;
    Ok(Json(checkout))
}

/// Handler for checking an asset back in
///
/// This function handles POST requests to `/api/checkouts/{id}/checkin`.
/// Checking in twice is rejected.
#[instrument(skip(pool, user), fields(checkout_id = %id))]
pub async fn check_in_handler(
    State(pool): State<Arc<DbPool>>,
    RequireManager(user): RequireManager,
    Path(id): Path<String>,
) -> Result<Json<CheckInOut>, ApiError> {
    let checkout = repo::check_in(&pool, &id)?;
    record(
        &pool,
        &user,
        "check_in",
        "checkout",
        &id,
        json!({ "asset_id": checkout.asset_id }),
    );

    info!("Checked in asset {}", checkout.asset_id);
    Ok(Json(checkout))
}
