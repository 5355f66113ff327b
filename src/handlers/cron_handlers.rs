use axum::{extract::State, http::HeaderMap, Json};
use chrono::Utc;
use tracing::{info, instrument};

use crate::auth::authorize_cron;
use crate::cron::{run_sweep, SweepReport};
use crate::errors::ApiError;
use crate::AppState;

/// Handler for triggering the periodic sweep
///
/// This function handles GET and POST requests to `/api/cron`. Callers
/// present the configured cron secret as a bearer token or hold an admin
/// session.
///
/// ### Returns
///
/// How many notifications of each kind the sweep created
#[instrument(skip_all)]
pub async fn run_cron_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SweepReport>, ApiError> {
    authorize_cron(&state, &headers)?;

    let pool = state.pool.clone();
    let window = state.config.reminder_window();
    let report = tokio::task::spawn_blocking(move || run_sweep(&pool, window, Utc::now().naive_utc()))
        .await
        .map_err(|e| ApiError::Database(e.into()))??;

    info!(total = report.total(), "Sweep triggered over HTTP");
    Ok(Json(report))
}

/// Handler for the health check
///
/// This function handles GET requests to `/health`. No authentication.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
