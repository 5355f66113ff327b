/// Assetdesk: An Asset Management Back Office
///
/// This library provides the core functionality for tracking a company's
/// equipment: assets with their types and locations, spare-part inventory,
/// employees who borrow assets, maintenance jobs and the parts they use, and
/// the notifications raised when something needs attention.
///
/// ### Modules
///
/// - `auth`: Passwords, sessions and role extractors
/// - `config`: Layered configuration (defaults, file, environment, flags)
/// - `cron`: The periodic sweep that raises notifications
/// - `db`: Database connection management
/// - `dto`: Request and response bodies
/// - `errors`: Domain and HTTP error types
/// - `handlers`: The HTTP handlers
/// - `models`: Data structures stored in the database
/// - `repo`: Repository layer for database operations
/// - `schema`: Database schema definitions
/// - `valuation`: Depreciation and due-date arithmetic
///
/// ### Web API
///
/// The library exposes a RESTful API under `/api` using Axum; see
/// `create_app` for the full route table. `GET /health` needs no session.

/// Authentication and authorization
pub mod auth;

/// Configuration module
pub mod config;

/// Periodic sweep
pub mod cron;

/// Database connection module
pub mod db;

/// Data transfer objects
pub mod dto;

/// Error types
pub mod errors;

/// HTTP handlers
pub mod handlers;

/// Data models module
pub mod models;

/// Repository module for database operations
pub mod repo;

/// Database schema module
pub mod schema;

/// Depreciation and scheduling arithmetic
pub mod valuation;

#[cfg(test)]
mod test_utils;

use axum::{
    extract::FromRef,
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use config::Config;
use db::DbPool;
use errors::ApiError;
use handlers::*;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<DbPool>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(pool: Arc<DbPool>, config: Config) -> Self {
        Self { pool, config: Arc::new(config) }
    }
}

impl FromRef<AppState> for Arc<DbPool> {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

/// Builds the CORS layer
///
/// Sessions travel in a cookie, so the requesting origin is mirrored back
/// and credentials are allowed.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}

/// Creates the application router with all routes configured
///
/// ### Arguments
///
/// * `state` - The database pool and configuration shared by all handlers
///
/// ### Returns
///
/// An Axum Router configured with all API routes
pub fn create_app(state: AppState) -> Router {
    let api = Router::new()
        // Accounts and sessions
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/me", get(me_handler))
        // User administration
        .route("/users", get(list_users_handler))
        .route(
            "/users/{id}",
            get(get_user_handler).put(update_user_handler).delete(delete_user_handler),
        )
        .route("/mechanics", get(list_mechanics_handler))
        // Reference data
        .route("/asset-types", post(create_asset_type_handler).get(list_asset_types_handler))
        .route(
            "/asset-types/{id}",
            get(get_asset_type_handler).put(update_asset_type_handler).delete(delete_asset_type_handler),
        )
        .route("/locations", post(create_location_handler).get(list_locations_handler))
        .route(
            "/locations/{id}",
            get(get_location_handler).put(update_location_handler).delete(delete_location_handler),
        )
        // Assets
        .route("/assets", post(create_asset_handler).get(list_assets_handler))
        .route(
            "/assets/{id}",
            get(get_asset_handler).put(update_asset_handler).delete(delete_asset_handler),
        )
        .route("/assets/{id}/move", post(move_asset_handler))
        .route("/assets/{id}/history", get(asset_history_handler))
        .route("/assets/{id}/maintenance", get(asset_maintenance_handler))
        .route("/assets/{id}/checkouts", get(asset_checkouts_handler))
        .route("/assets/{id}/depreciation", get(asset_depreciation_handler))
        // Inventory
        .route("/inventory", post(create_inventory_handler).get(list_inventory_handler))
        .route(
            "/inventory/{id}",
            get(get_inventory_handler).put(update_inventory_handler).delete(delete_inventory_handler),
        )
        .route("/inventory/{id}/adjust", post(adjust_inventory_handler))
        // Employees
        .route("/employees", post(create_employee_handler).get(list_employees_handler))
        .route(
            "/employees/{id}",
            get(get_employee_handler).put(update_employee_handler).delete(delete_employee_handler),
        )
        // Maintenance
        .route("/maintenance", post(create_maintenance_handler).get(list_maintenance_handler))
        .route(
            "/maintenance/{id}",
            get(get_maintenance_handler).put(update_maintenance_handler).delete(delete_maintenance_handler),
        )
        .route("/maintenance/{id}/status", post(set_maintenance_status_handler))
        .route("/maintenance/{id}/parts", get(list_parts_handler).post(consume_part_handler))
        // Check-in/out
        .route("/checkouts", post(create_checkout_handler).get(list_checkouts_handler))
        .route("/checkouts/{id}", get(get_checkout_handler))
        .route("/checkouts/{id}/checkin", post(check_in_handler))
        // Notifications
        .route("/notifications", get(list_notifications_handler))
        .route("/notifications/read-all", post(mark_all_notifications_read_handler))
        .route("/notifications/stream", get(notification_stream_handler))
        .route("/notifications/{id}/read", post(mark_notification_read_handler))
        // Activity and reports
        .route("/activity-logs", get(list_activity_logs_handler))
        .route("/reports/depreciation", get(depreciation_report_handler))
        .route("/reports/low-stock", get(low_stock_report_handler))
        .route("/reports/overdue-checkouts", get(overdue_checkouts_report_handler))
        .route("/dashboard", get(dashboard_handler))
        // Sweep trigger
        .route("/cron", get(run_cron_handler).post(run_cron_handler));

    Router::new()
        .nest("/api", api)
        .route("/health", get(health_handler))
        .fallback(|| async { ApiError::not_found() })
        .method_not_allowed_fallback(|| async { ApiError::MethodNotAllowed })
        .layer(cors_layer())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
