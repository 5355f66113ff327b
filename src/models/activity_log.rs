use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LogDetails;

/// An audit record of something a user did
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::activity_logs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ActivityLog {
    pub id: String,
    pub user_id: Option<String>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub details: LogDetails,
    pub created_at: NaiveDateTime,
}

impl ActivityLog {
    pub fn new(
        user_id: Option<String>,
        action: &str,
        entity_type: &str,
        entity_id: &str,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            details: LogDetails::from(details),
            created_at: Utc::now().naive_utc(),
        }
    }
}
