/// Web API Handlers
///
/// This module contains the handlers for the RESTful API endpoints.
/// Each handler is responsible for processing a specific type of HTTP request,
/// checking who is asking, calling the appropriate repository functions,
/// recording what was changed in the activity log, and returning a properly
/// formatted response.

mod common;
mod auth_handlers;
mod user_handlers;
mod reference_handlers;
mod employee_handlers;
mod asset_handlers;
mod inventory_handlers;
mod maintenance_handlers;
mod checkout_handlers;
mod notification_handlers;
mod report_handlers;
mod cron_handlers;

// Re-export all handlers
pub use auth_handlers::*;
pub use user_handlers::*;
pub use reference_handlers::*;
pub use employee_handlers::*;
pub use asset_handlers::*;
pub use inventory_handlers::*;
pub use maintenance_handlers::*;
pub use checkout_handlers::*;
pub use notification_handlers::*;
pub use report_handlers::*;
pub use cron_handlers::*;
