use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::NotificationKind;

/// A message addressed to a single user
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::notifications)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub entity_id: Option<String>,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

impl Notification {
    pub fn new(
        user_id: String,
        kind: NotificationKind,
        title: String,
        message: String,
        entity_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            kind,
            title,
            message,
            entity_id,
            is_read: false,
            created_at: Utc::now().naive_utc(),
        }
    }
}
