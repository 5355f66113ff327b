use axum::{extract::State, Json};
use axum_extra::extract::Query;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::auth::RequireManager;
use crate::db::DbPool;
use crate::dto::{ActivityLogFilter, AsOfQuery, Dashboard, DepreciationReport, OverdueCheckout};
use crate::errors::ApiError;
use crate::models::{ActivityLog, Inventory};
use crate::{repo, AppState};

/// Handler for reading the activity log
///
/// This function handles GET requests to `/api/activity-logs`, filtered by
/// `entity_type`, `entity_id` and `user_id`. At most `limit` entries are
/// returned (100 by default, never more than 1000), newest first.
#[instrument(skip(pool, _user))]
pub async fn list_activity_logs_handler(
    State(pool): State<Arc<DbPool>>,
    RequireManager(_user): RequireManager,
    Query(filter): Query<ActivityLogFilter>,
) -> Result<Json<Vec<ActivityLog>>, ApiError> {
    let entries = repo::list_activity_logs(&pool, &filter)?;
    debug!("Retrieved {} activity log entries", entries.len());
    Ok(Json(entries))
}

/// Handler for the depreciation report
///
/// This function handles GET requests to `/api/reports/depreciation`.
///
/// ### Returns
///
/// One row per asset with its current value, plus the totals
#[instrument(skip(pool, _user))]
pub async fn depreciation_report_handler(
    State(pool): State<Arc<DbPool>>,
    RequireManager(_user): RequireManager,
    Query(query): Query<AsOfQuery>,
) -> Result<Json<DepreciationReport>, ApiError> {
    let as_of = query.as_of.unwrap_or_else(|| Utc::now().date_naive());
    Ok(Json(repo::depreciation_report(&pool, as_of)?))
}

/// Handler for the low stock report
///
/// This function handles GET requests to `/api/reports/low-stock`.
#[instrument(skip_all)]
pub async fn low_stock_report_handler(
    State(pool): State<Arc<DbPool>>,
    RequireManager(_user): RequireManager,
) -> Result<Json<Vec<Inventory>>, ApiError> {
    Ok(Json(repo::low_stock_report(&pool)?))
}

/// Handler for the overdue checkouts report
///
/// This function handles GET requests to `/api/reports/overdue-checkouts`.
/// Each row carries the asset's and the employee's names.
#[instrument(skip_all)]
pub async fn overdue_checkouts_report_handler(
    State(pool): State<Arc<DbPool>>,
    RequireManager(_user): RequireManager,
) -> Result<Json<Vec<OverdueCheckout>>, ApiError> {
    Ok(Json(repo::list_overdue_checkouts(&pool, Utc::now().naive_utc())?))
}

/// Handler for the dashboard
///
/// This function handles GET requests to `/api/dashboard`.
#[instrument(skip_all)]
pub async fn dashboard_handler(
    State(state): State<AppState>,
    RequireManager(_user): RequireManager,
) -> Result<Json<Dashboard>, ApiError> {
    let now = Utc::now();
    let dashboard = repo::dashboard(
        &state.pool,
        now.date_naive(),
        now.naive_utc(),
        state.config.reminder_window(),
    )?;
    Ok(Json(dashboard))
}
