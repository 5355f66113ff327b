use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A place where assets and stock are kept
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::locations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

impl Location {
    pub fn new(name: String, address: Option<String>, description: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            address,
            description,
            created_at: Utc::now().naive_utc(),
        }
    }
}
