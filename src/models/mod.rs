/// Data models module
///
/// This module defines the rows stored in the database and the enums used to
/// describe their state. Every struct maps one-to-one onto a table in
/// `crate::schema`; constructors stamp fresh UUIDs and timestamps.

mod log_details;
pub use log_details::LogDetails;

mod enums;
pub use enums::{AssetStatus, MaintenanceStatus, NotificationKind, Role};

mod user;
pub use user::{normalize_email, Session, User};

mod employee;
pub use employee::Employee;

mod asset_type;
pub use asset_type::AssetType;

mod location;
pub use location::Location;

mod asset;
pub use asset::{Asset, AssetLocationHistory};

mod inventory;
pub use inventory::Inventory;

mod maintenance;
pub use maintenance::{Maintenance, MaintenanceInventory};

mod check_in_out;
pub use check_in_out::CheckInOut;

mod activity_log;
pub use activity_log::ActivityLog;

mod notification;
pub use notification::Notification;
