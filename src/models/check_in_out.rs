use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::valuation;

/// An asset handed out to an employee
///
/// The checkout is open while `checked_in_at` is empty.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::check_in_out)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CheckInOut {
    pub id: String,
    pub asset_id: String,
    pub employee_id: String,
    pub checked_out_at: NaiveDateTime,
    pub expected_return_at: Option<NaiveDateTime>,
    pub checked_in_at: Option<NaiveDateTime>,
    pub overdue_notified: bool,
    pub notes: Option<String>,
}

impl CheckInOut {
    pub fn new(
        asset_id: String,
        employee_id: String,
        expected_return_at: Option<NaiveDateTime>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            asset_id,
            employee_id,
            checked_out_at: Utc::now().naive_utc(),
            expected_return_at,
            checked_in_at: None,
            overdue_notified: false,
            notes,
        }
    }

    pub fn is_open(&self) -> bool {
        self.checked_in_at.is_none()
    }

    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        valuation::is_overdue(self.expected_return_at, self.checked_in_at, now)
    }
}
