use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::valuation;

/// A stocked part or consumable
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::inventory)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct Inventory {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub quantity: i32,
    pub min_quantity: i32,
    pub unit_cost: f64,
    pub location_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Inventory {
    pub fn new(name: String, sku: String, quantity: i32, min_quantity: i32, unit_cost: f64) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            sku,
            quantity,
            min_quantity,
            unit_cost,
            location_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_low_stock(&self) -> bool {
        valuation::is_low_stock(self.quantity, self.min_quantity)
    }

    /// Value of the stock on hand
    pub fn stock_value(&self) -> f64 {
        f64::from(self.quantity) * self.unit_cost
    }
}
