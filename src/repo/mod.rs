/// Repository module
///
/// This module provides the data access layer for the application.
/// It contains functions for reading and writing users and sessions,
/// reference data, assets and their moves, inventory, maintenance,
/// checkouts, notifications and the activity log, plus the reports built
/// over them.
///
/// Every function takes the connection pool and returns `anyhow::Result`.
/// Rule violations are reported as `crate::errors::DomainError` inside the
/// error so handlers can map them to a status code. Work that touches more
/// than one row runs in a single transaction.

mod user_repo;
mod reference_repo;
mod employee_repo;
mod asset_repo;
mod inventory_repo;
mod maintenance_repo;
mod checkout_repo;
mod activity_log_repo;
mod notification_repo;
mod report_repo;

// Re-export all repository functions
pub use user_repo::*;
pub use reference_repo::*;
pub use employee_repo::*;
pub use asset_repo::*;
pub use inventory_repo::*;
pub use maintenance_repo::*;
pub use checkout_repo::*;
pub use activity_log_repo::*;
pub use notification_repo::*;
pub use report_repo::*;
