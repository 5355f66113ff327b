use chrono::{NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::MaintenanceStatus;

/// A maintenance job on an asset
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::maintenance)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct Maintenance {
    pub id: String,
    pub asset_id: String,
    pub mechanic_id: Option<String>,
    pub description: String,
    pub status: MaintenanceStatus,
    pub scheduled_date: NaiveDate,
    pub completed_at: Option<NaiveDateTime>,
    pub cost: f64,
    pub reminder_sent: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Maintenance {
    pub fn new(asset_id: String, description: String, scheduled_date: NaiveDate) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            asset_id,
            mechanic_id: None,
            description,
            status: MaintenanceStatus::Scheduled,
            scheduled_date,
            completed_at: None,
            cost: 0.0,
            reminder_sent: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Parts consumed by a maintenance job
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::maintenance_inventory)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MaintenanceInventory {
    pub id: String,
    pub maintenance_id: String,
    pub inventory_id: String,
    pub quantity_used: i32,
    pub created_at: NaiveDateTime,
}

impl MaintenanceInventory {
    pub fn new(maintenance_id: String, inventory_id: String, quantity_used: i32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            maintenance_id,
            inventory_id,
            quantity_used,
            created_at: Utc::now().naive_utc(),
        }
    }
}
