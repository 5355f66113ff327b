use chrono::{NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AssetStatus;
use crate::valuation::{self, Depreciation};

/// A tracked piece of equipment
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::assets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct Asset {
    pub id: String,
    pub name: String,
    pub serial_number: String,
    pub asset_type_id: String,
    pub location_id: Option<String>,
    pub status: AssetStatus,
    pub purchase_date: NaiveDate,
    pub purchase_cost: f64,
    pub salvage_value: f64,
    pub useful_life_years: i32,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Asset {
    /// Creates a new, available asset
    pub fn new(
        name: String,
        serial_number: String,
        asset_type_id: String,
        purchase_date: NaiveDate,
        purchase_cost: f64,
        useful_life_years: i32,
    ) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            serial_number,
            asset_type_id,
            location_id: None,
            status: AssetStatus::Available,
            purchase_date,
            purchase_cost,
            salvage_value: 0.0,
            useful_life_years,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Straight-line depreciation of this asset as of `as_of`
    pub fn depreciation(&self, as_of: NaiveDate) -> Depreciation {
        valuation::straight_line_depreciation(
            self.purchase_cost,
            self.salvage_value,
            self.useful_life_years,
            self.purchase_date,
            as_of,
        )
    }
}

/// One move of an asset between locations
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::asset_location_history)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AssetLocationHistory {
    pub id: String,
    pub asset_id: String,
    pub from_location_id: Option<String>,
    pub to_location_id: Option<String>,
    pub moved_by: Option<String>,
    pub moved_at: NaiveDateTime,
}

impl AssetLocationHistory {
    pub fn new(
        asset_id: String,
        from_location_id: Option<String>,
        to_location_id: Option<String>,
        moved_by: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            asset_id,
            from_location_id,
            to_location_id,
            moved_by,
            moved_at: Utc::now().naive_utc(),
        }
    }
}
