use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{AssetStatus, CheckInOut, MaintenanceStatus, Role, User};

// ============================================================================
// Authentication and users
// ============================================================================

/// Data transfer object for registering a new account
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterDto {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Data transfer object for signing in
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginDto {
    pub email: String,
    pub password: String,
}

/// Response to a successful login
///
/// The token is also set as a cookie; it is repeated here for clients that
/// send it as a bearer token instead.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

/// Data transfer object for an admin editing a user
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UpdateUserDto {
    pub name: Option<String>,
    pub role: Option<Role>,
}

// ============================================================================
// Reference data
// ============================================================================

/// Data transfer object for creating an asset type
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateAssetTypeDto {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Data transfer object for updating an asset type
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UpdateAssetTypeDto {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Data transfer object for creating a location
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateLocationDto {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Data transfer object for updating a location
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UpdateLocationDto {
    pub name: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
}

/// Data transfer object for creating an employee
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateEmployeeDto {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    /// Links the employee to a user account
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Data transfer object for updating an employee
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UpdateEmployeeDto {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub user_id: Option<String>,
}

// ============================================================================
// Assets
// ============================================================================

/// Data transfer object for creating an asset
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateAssetDto {
    pub name: String,
    pub serial_number: String,
    pub asset_type_id: String,
    /// Where the asset starts out; recorded as its first move
    #[serde(default)]
    pub location_id: Option<String>,
    /// Defaults to `available`; `checked_out` is only reachable through a checkout
    #[serde(default)]
    pub status: Option<AssetStatus>,
    pub purchase_date: NaiveDate,
    pub purchase_cost: f64,
    #[serde(default)]
    pub salvage_value: f64,
    pub useful_life_years: i32,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Data transfer object for updating an asset
///
/// Location is changed through the move endpoint so that history is kept.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UpdateAssetDto {
    pub name: Option<String>,
    pub serial_number: Option<String>,
    pub asset_type_id: Option<String>,
    pub status: Option<AssetStatus>,
    pub purchase_date: Option<NaiveDate>,
    pub purchase_cost: Option<f64>,
    pub salvage_value: Option<f64>,
    pub useful_life_years: Option<i32>,
    pub notes: Option<String>,
}

/// Query parameters for listing assets
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AssetFilter {
    pub status: Option<AssetStatus>,
    pub asset_type_id: Option<String>,
    pub location_id: Option<String>,
    /// Case-insensitive match on name or serial number
    pub search: Option<String>,
}

/// Data transfer object for moving an asset; `None` removes it from any location
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct MoveAssetDto {
    #[serde(default)]
    pub location_id: Option<String>,
}

// ============================================================================
// Inventory
// ============================================================================

/// Data transfer object for creating an inventory item
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateInventoryDto {
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default)]
    pub min_quantity: i32,
    #[serde(default)]
    pub unit_cost: f64,
    #[serde(default)]
    pub location_id: Option<String>,
}

/// Data transfer object for updating an inventory item
///
/// Stock levels change through adjustments, not updates.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UpdateInventoryDto {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub min_quantity: Option<i32>,
    pub unit_cost: Option<f64>,
    pub location_id: Option<String>,
}

/// Query parameters for listing inventory
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct InventoryFilter {
    /// Only items at or below their minimum quantity
    pub low_stock: Option<bool>,
    pub location_id: Option<String>,
}

/// Data transfer object for a stock adjustment
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AdjustInventoryDto {
    /// Signed change to the quantity on hand
    pub delta: i32,
}

// ============================================================================
// Maintenance
// ============================================================================

/// Data transfer object for scheduling maintenance
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateMaintenanceDto {
    pub asset_id: String,
    pub description: String,
    pub scheduled_date: NaiveDate,
    #[serde(default)]
    pub mechanic_id: Option<String>,
}

/// Data transfer object for editing a maintenance job
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UpdateMaintenanceDto {
    pub description: Option<String>,
    pub scheduled_date: Option<NaiveDate>,
    pub mechanic_id: Option<String>,
    pub cost: Option<f64>,
}

/// Query parameters for listing maintenance
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct MaintenanceFilter {
    pub status: Option<MaintenanceStatus>,
    pub asset_id: Option<String>,
    pub mechanic_id: Option<String>,
}

/// Data transfer object for moving a job through its lifecycle
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MaintenanceStatusDto {
    pub status: MaintenanceStatus,
}

/// Data transfer object for consuming parts on a job
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConsumePartDto {
    pub inventory_id: String,
    pub quantity: i32,
}

// ============================================================================
// Check-in/out
// ============================================================================

/// Data transfer object for checking an asset out to an employee
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateCheckoutDto {
    pub asset_id: String,
    pub employee_id: String,
    #[serde(default)]
    pub expected_return_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Query parameters for listing checkouts
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct CheckoutFilter {
    /// Only checkouts that have not been checked in
    pub active: Option<bool>,
    /// Only open checkouts past their expected return
    pub overdue: Option<bool>,
    pub asset_id: Option<String>,
    pub employee_id: Option<String>,
}

// ============================================================================
// Notifications and activity
// ============================================================================

/// Query parameters for listing notifications
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct NotificationFilter {
    pub unread: Option<bool>,
}

/// Query parameters for listing activity logs
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ActivityLogFilter {
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub user_id: Option<String>,
    pub limit: Option<i64>,
}

/// Default number of activity log entries returned
pub const DEFAULT_ACTIVITY_LIMIT: i64 = 100;
/// Largest number of activity log entries a single request may ask for
pub const MAX_ACTIVITY_LIMIT: i64 = 1000;

impl ActivityLogFilter {
    /// The requested limit, defaulted and clamped to `1..=MAX_ACTIVITY_LIMIT`
    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
            .clamp(1, MAX_ACTIVITY_LIMIT)
    }
}

// ============================================================================
// Reports
// ============================================================================

/// Query parameter choosing the day a valuation is made for; defaults to today
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
#[serde(default)]
pub struct AsOfQuery {
    pub as_of: Option<NaiveDate>,
}

/// One asset's line in the depreciation report
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DepreciationRow {
    pub asset_id: String,
    pub name: String,
    pub serial_number: String,
    pub status: AssetStatus,
    pub purchase_date: NaiveDate,
    pub purchase_cost: f64,
    pub salvage_value: f64,
    pub useful_life_years: i32,
    pub annual: f64,
    pub accumulated: f64,
    pub current_value: f64,
}

/// Depreciation of every asset as of one day
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DepreciationReport {
    pub as_of: NaiveDate,
    pub rows: Vec<DepreciationRow>,
    pub total_purchase_cost: f64,
    pub total_accumulated: f64,
    pub total_current_value: f64,
}

/// An open checkout past its expected return, with display names
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OverdueCheckout {
    #[serde(flatten)]
    pub checkout: CheckInOut,
    pub asset_name: String,
    pub serial_number: String,
    pub employee_name: String,
    pub employee_email: String,
}

/// Number of assets in each status
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetStatusCounts {
    pub available: i64,
    pub checked_out: i64,
    pub in_maintenance: i64,
    pub retired: i64,
    pub total: i64,
}

/// Headline figures for the back office
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub assets: AssetStatusCounts,
    pub total_purchase_cost: f64,
    pub total_current_value: f64,
    pub low_stock_count: i64,
    /// Quantity times unit cost, summed over all inventory
    pub inventory_value: f64,
    pub overdue_checkout_count: i64,
    pub upcoming_maintenance_count: i64,
    pub total_maintenance_cost: f64,
    pub generated_at: NaiveDateTime,
}
