use crate::db::DbPool;
use crate::dto::UpdateUserDto;
use crate::errors::DomainError;
use crate::models::{Role, Session, User};
use crate::schema::{sessions, users};
use anyhow::Result;
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// Creates a new user account
///
/// The very first account becomes an admin so a fresh installation can be
/// administered; every later account starts as a plain user.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `email` - The email address, normalised before storing
/// * `name` - The display name
/// * `password_hash` - An already hashed password
///
/// ### Returns
///
/// A Result containing the newly created User
///
/// ### Errors
///
/// Returns an error if:
/// - Unable to get a connection from the pool
/// - The email is already registered (unique violation)
#[instrument(skip(pool, password_hash), fields(email = %email))]
pub fn create_user(pool: &DbPool, email: &str, name: String, password_hash: String) -> Result<User> {
    debug!("Creating new user");

    let conn = &mut pool.get()?;

    let user = conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
        let existing: i64 = users::table.count().get_result(conn)?;
        let role = if existing == 0 { Role::Admin } else { Role::User };

        let user = User::new(email, name, password_hash, role);
        diesel::insert_into(users::table)
            .values(&user)
            .execute(conn)?;
        Ok(user)
    })?;

    info!("Created user {} with role {}", user.id, user.role);
    Ok(user)
}

/// Retrieves a user by ID
#[instrument(skip(pool), fields(user_id = %id))]
pub fn get_user(pool: &DbPool, id: &str) -> Result<Option<User>> {
    let conn = &mut pool.get()?;
    let user = users::table
        .find(id)
        .select(User::as_select())
        .first(conn)
        .optional()?;
    Ok(user)
}

/// Retrieves a user by email address, ignoring case
#[instrument(skip(pool))]
pub fn get_user_by_email(pool: &DbPool, email: &str) -> Result<Option<User>> {
    let conn = &mut pool.get()?;
    let user = users::table
        .filter(users::email.eq(crate::models::normalize_email(email)))
        .select(User::as_select())
        .first(conn)
        .optional()?;
    Ok(user)
}

/// Lists every user, ordered by name
#[instrument(skip(pool))]
pub fn list_users(pool: &DbPool) -> Result<Vec<User>> {
    let conn = &mut pool.get()?;
    let result = users::table
        .order((users::name.asc(), users::email.asc()))
        .select(User::as_select())
        .load(conn)?;
    info!("Retrieved {} users", result.len());
    Ok(result)
}

/// Lists users holding any of the given roles, ordered by name
#[instrument(skip(pool))]
pub fn list_users_with_roles(pool: &DbPool, roles: &[Role]) -> Result<Vec<User>> {
    let conn = &mut pool.get()?;
    let result = users::table
        .filter(users::role.eq_any(roles.to_vec()))
        .order((users::name.asc(), users::email.asc()))
        .select(User::as_select())
        .load(conn)?;
    Ok(result)
}

/// Changes a user's name or role
///
/// ### Errors
///
/// Returns `DomainError::NotFound` if the user does not exist, and
/// `DomainError::InvalidState` if the change would leave no admin.
#[instrument(skip(pool, update), fields(user_id = %id))]
pub fn update_user(pool: &DbPool, id: &str, update: &UpdateUserDto) -> Result<User> {
    let conn = &mut pool.get()?;

    let user = conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
        let mut user: User = users::table
            .find(id)
            .select(User::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| DomainError::not_found("User", id))?;

        if let Some(name) = &update.name {
            user.name = name.clone();
        }
        if let Some(role) = update.role {
            if user.role == Role::Admin && role != Role::Admin {
                let admins: i64 = users::table
                    .filter(users::role.eq(Role::Admin))
                    .count()
                    .get_result(conn)?;
                if admins <= 1 {
                    return Err(DomainError::InvalidState(
                        "Cannot demote the last admin".to_string(),
                    )
                    .into());
                }
            }
            user.role = role;
        }
        user.updated_at = Utc::now().naive_utc();

        diesel::update(users::table.find(id))
            .set(&user)
            .execute(conn)?;
        Ok(user)
    })?;

    info!("Updated user");
    Ok(user)
}

/// Deletes a user together with their sessions and notifications
///
/// ### Errors
///
/// Returns `DomainError::NotFound` if the user does not exist.
#[instrument(skip(pool), fields(user_id = %id))]
pub fn delete_user(pool: &DbPool, id: &str) -> Result<()> {
    let conn = &mut pool.get()?;
    let deleted = diesel::delete(users::table.find(id)).execute(conn)?;
    if deleted == 0 {
        return Err(DomainError::not_found("User", id).into());
    }
    info!("Deleted user");
    Ok(())
}

/// Stores a new session
#[instrument(skip(pool, session), fields(user_id = %session.user_id))]
pub fn create_session(pool: &DbPool, session: Session) -> Result<Session> {
    let conn = &mut pool.get()?;
    diesel::insert_into(sessions::table)
        .values(&session)
        .execute(conn)?;
    debug!("Created session expiring at {}", session.expires_at);
    Ok(session)
}

/// Resolves a session digest to its user
///
/// An expired session is deleted on sight and treated as unknown.
///
/// ### Returns
///
/// The session's user, or None when the session is unknown or expired
#[instrument(skip(pool, digest))]
pub fn find_session_user(pool: &DbPool, digest: &str, now: NaiveDateTime) -> Result<Option<User>> {
    let conn = &mut pool.get()?;

    let found: Option<(Session, User)> = sessions::table
        .inner_join(users::table)
        .filter(sessions::id.eq(digest))
        .select((Session::as_select(), User::as_select()))
        .first(conn)
        .optional()?;

    match found {
        Some((session, _)) if session.is_expired(now) => {
            diesel::delete(sessions::table.find(&session.id)).execute(conn)?;
            debug!("Session expired");
            Ok(None)
        }
        Some((_, user)) => Ok(Some(user)),
        None => Ok(None),
    }
}

/// Deletes a session; returns whether it existed
#[instrument(skip(pool, digest))]
pub fn delete_session(pool: &DbPool, digest: &str) -> Result<bool> {
    let conn = &mut pool.get()?;
    let deleted = diesel::delete(sessions::table.find(digest)).execute(conn)?;
    Ok(deleted > 0)
}

/// Deletes every session that expired before `now`
#[instrument(skip(pool))]
pub fn delete_expired_sessions(pool: &DbPool, now: NaiveDateTime) -> Result<usize> {
    let conn = &mut pool.get()?;
    let deleted = diesel::delete(sessions::table.filter(sessions::expires_at.le(now))).execute(conn)?;
    if deleted > 0 {
        info!("Purged {} expired sessions", deleted);
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;
    use chrono::Duration;

    #[test]
    fn test_first_user_is_admin() {
        let pool = setup_test_db();
        let first = create_user(&pool, "Boss@Example.com", "Boss".into(), "h".into()).unwrap();
        let second = create_user(&pool, "worker@example.com", "Worker".into(), "h".into()).unwrap();

        assert_eq!(first.role, Role::Admin);
        assert_eq!(first.email, "boss@example.com");
        assert_eq!(second.role, Role::User);
    }

    #[test]
    fn test_duplicate_email_is_rejected() {
        let pool = setup_test_db();
        create_user(&pool, "dup@example.com", "One".into(), "h".into()).unwrap();
        let err = create_user(&pool, "DUP@example.com", "Two".into(), "h".into()).unwrap_err();
        let db_err = err.downcast_ref::<diesel::result::Error>().unwrap();
        assert!(matches!(
            db_err,
            diesel::result::Error::DatabaseError(diesel::result::DatabaseErrorKind::UniqueViolation, _)
        ));
    }

    #[test]
    fn test_lookup_by_email_ignores_case() {
        let pool = setup_test_db();
        let user = create_user(&pool, "case@example.com", "Case".into(), "h".into()).unwrap();
        let found = get_user_by_email(&pool, "  CASE@Example.com").unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(get_user_by_email(&pool, "nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn test_last_admin_cannot_be_demoted() {
        let pool = setup_test_db();
        let admin = create_user(&pool, "admin@example.com", "Admin".into(), "h".into()).unwrap();
        let other = create_user(&pool, "other@example.com", "Other".into(), "h".into()).unwrap();

        let demote = UpdateUserDto { name: None, role: Some(Role::Manager) };
        let err = update_user(&pool, &admin.id, &demote).unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::InvalidState(_))));
        assert_eq!(get_user(&pool, &admin.id).unwrap().unwrap().role, Role::Admin);

        // Renaming the last admin is still fine
        let rename = UpdateUserDto { name: Some("Chief".into()), role: Some(Role::Admin) };
        assert_eq!(update_user(&pool, &admin.id, &rename).unwrap().name, "Chief");

        // With a second admin in place the first may step down
        let promote = UpdateUserDto { name: None, role: Some(Role::Admin) };
        update_user(&pool, &other.id, &promote).unwrap();
        assert_eq!(update_user(&pool, &admin.id, &demote).unwrap().role, Role::Manager);
    }

    #[test]
    fn test_update_and_filter_by_role() {
        let pool = setup_test_db();
        create_user(&pool, "admin@example.com", "Admin".into(), "h".into()).unwrap();
        let user = create_user(&pool, "mech@example.com", "Mech".into(), "h".into()).unwrap();

        let updated = update_user(&pool, &user.id, &UpdateUserDto { name: None, role: Some(Role::Mechanic) }).unwrap();
        assert_eq!(updated.role, Role::Mechanic);
        assert_eq!(updated.name, "Mech");

        let mechanics = list_users_with_roles(&pool, &[Role::Mechanic]).unwrap();
        assert_eq!(mechanics.len(), 1);
        assert_eq!(mechanics[0].id, user.id);

        let err = update_user(&pool, "missing", &UpdateUserDto::default()).unwrap_err();
        assert!(matches!(err.downcast_ref::<DomainError>(), Some(DomainError::NotFound { .. })));
    }

    #[test]
    fn test_sessions_resolve_and_expire() {
        let pool = setup_test_db();
        let user = create_user(&pool, "s@example.com", "S".into(), "h".into()).unwrap();
        let now = Utc::now().naive_utc();

        create_session(&pool, Session::new("live".into(), user.id.clone(), Duration::hours(1))).unwrap();
        create_session(&pool, Session::new("stale".into(), user.id.clone(), Duration::hours(-1))).unwrap();

        assert_eq!(find_session_user(&pool, "live", now).unwrap().unwrap().id, user.id);
        assert!(find_session_user(&pool, "stale", now).unwrap().is_none());
        // The expired session was removed while being rejected
        assert!(!delete_session(&pool, "stale").unwrap());

        assert!(delete_session(&pool, "live").unwrap());
        assert!(find_session_user(&pool, "live", now).unwrap().is_none());
    }

    #[test]
    fn test_deleting_user_removes_sessions() {
        let pool = setup_test_db();
        let user = create_user(&pool, "gone@example.com", "Gone".into(), "h".into()).unwrap();
        create_session(&pool, Session::new("tok".into(), user.id.clone(), Duration::hours(1))).unwrap();

        delete_user(&pool, &user.id).unwrap();

        assert!(get_user(&pool, &user.id).unwrap().is_none());
        assert!(!delete_session(&pool, "tok").unwrap());
        assert!(delete_user(&pool, &user.id).is_err());
    }

    #[test]
    fn test_purge_expired_sessions() {
        let pool = setup_test_db();
        let user = create_user(&pool, "p@example.com", "P".into(), "h".into()).unwrap();
        create_session(&pool, Session::new("old".into(), user.id.clone(), Duration::hours(-2))).unwrap();
        create_session(&pool, Session::new("new".into(), user.id.clone(), Duration::hours(2))).unwrap();

        assert_eq!(delete_expired_sessions(&pool, Utc::now().naive_utc()).unwrap(), 1);
        assert!(delete_session(&pool, "new").unwrap());
    }
}
