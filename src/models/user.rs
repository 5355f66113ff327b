use chrono::{Duration, NaiveDateTime, NaiveTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// An account that can sign in to the back office
#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    /// Argon2 PHC string; never leaves the server
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    /// Creates a new user from an already hashed password
    ///
    /// The email is normalised to lowercase so lookups are case-insensitive.
    pub fn new(email: &str, name: String, password_hash: String, role: Role) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4().to_string(),
            email: normalize_email(email),
            name,
            password_hash,
            role,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Lowercases and trims an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A signed-in session
///
/// `id` is the digest of the token handed to the client, never the token itself.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::sessions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

/// Sessions never outlive the last day stored dates can express
fn latest_expiry() -> NaiveDateTime {
    crate::valuation::LAST_DAY.and_time(NaiveTime::MIN)
}

impl Session {
    pub fn new(token_digest: String, user_id: String, ttl: Duration) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: token_digest,
            user_id,
            created_at: now,
            expires_at: now
                .checked_add_signed(ttl)
                .map_or(latest_expiry(), |expires_at| expires_at.min(latest_expiry())),
        }
    }

    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_new_normalizes_email() {
        let user = User::new("  Jane.Doe@Example.COM ", "Jane".to_string(), "hash".to_string(), Role::User);
        assert_eq!(user.email, "jane.doe@example.com");
        assert!(Uuid::parse_str(&user.id).is_ok());
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let user = User::new("a@b.c", "A".to_string(), "secret-hash".to_string(), Role::Admin);
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "admin");
    }

    #[test]
    fn test_session_expiry() {
        let session = Session::new("digest".to_string(), "user".to_string(), Duration::hours(1));
        assert!(!session.is_expired(Utc::now().naive_utc()));
        assert!(session.is_expired(session.expires_at));
        assert!(session.is_expired(session.expires_at + Duration::seconds(1)));
    }

    #[test]
    fn test_enormous_ttl_saturates() {
        let ttl = Duration::try_hours(10_000_000_000).unwrap();
        let session = Session::new("digest".to_string(), "user".to_string(), ttl);
        assert_eq!(session.expires_at, latest_expiry());
        assert!(!session.is_expired(Utc::now().naive_utc()));

        let session = Session::new("digest".to_string(), "user".to_string(), Duration::MAX);
        assert_eq!(session.expires_at, latest_expiry());
    }
}
