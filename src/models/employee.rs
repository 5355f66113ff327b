use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A person assets can be checked out to
///
/// Employees may optionally be linked to a user account.
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::employees)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct Employee {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub user_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Employee {
    pub fn new(first_name: String, last_name: String, email: &str) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            first_name,
            last_name,
            email: super::user::normalize_email(email),
            phone: None,
            department: None,
            position: None,
            user_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
