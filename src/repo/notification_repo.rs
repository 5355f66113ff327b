use crate::db::DbPool;
use crate::errors::DomainError;
use crate::models::{Notification, NotificationKind};
use crate::schema::notifications;
use anyhow::Result;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::{debug, info, instrument};

/// Writes notifications inside an open connection
pub(crate) fn insert_notifications(conn: &mut SqliteConnection, batch: &[Notification]) -> Result<usize> {
    if batch.is_empty() {
        return Ok(0);
    }
    let inserted = diesel::insert_into(notifications::table)
        .values(batch)
        .execute(conn)?;
    Ok(inserted)
}

/// Whether a user already holds an unread notification of this kind about an entity
pub(crate) fn has_unread(
    conn: &mut SqliteConnection,
    user_id: &str,
    kind: NotificationKind,
    entity_id: &str,
) -> Result<bool> {
    let count: i64 = notifications::table
        .filter(notifications::user_id.eq(user_id))
        .filter(notifications::kind.eq(kind))
        .filter(notifications::entity_id.eq(entity_id))
        .filter(notifications::is_read.eq(false))
        .count()
        .get_result(conn)?;
    Ok(count > 0)
}

/// Stores a single notification
#[instrument(skip(pool, notification), fields(user_id = %notification.user_id, kind = %notification.kind))]
pub fn create_notification(pool: &DbPool, notification: &Notification) -> Result<()> {
    let conn = &mut pool.get()?;
    insert_notifications(conn, std::slice::from_ref(notification))?;
    debug!("Created notification {}", notification.id);
    Ok(())
}

/// Lists a user's notifications, newest first
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `user_id` - The owner of the notifications
/// * `unread_only` - Whether to leave out notifications already read
#[instrument(skip(pool), fields(user_id = %user_id))]
pub fn list_notifications(pool: &DbPool, user_id: &str, unread_only: bool) -> Result<Vec<Notification>> {
    let conn = &mut pool.get()?;

    let mut query = notifications::table
        .filter(notifications::user_id.eq(user_id))
        .select(Notification::as_select())
        .into_boxed();
    if unread_only {
        query = query.filter(notifications::is_read.eq(false));
    }

    let result = query
        .order((notifications::created_at.desc(), notifications::id.desc()))
        .load(conn)?;
    Ok(result)
}

/// Lists a user's unread notifications created after `after`, oldest first
///
/// With no cursor every unread notification is returned. Used by the
/// notification stream to send only what the client has not seen.
#[instrument(skip(pool), fields(user_id = %user_id))]
pub fn list_unread_since(
    pool: &DbPool,
    user_id: &str,
    after: Option<NaiveDateTime>,
) -> Result<Vec<Notification>> {
    let conn = &mut pool.get()?;

    let mut query = notifications::table
        .filter(notifications::user_id.eq(user_id))
        .filter(notifications::is_read.eq(false))
        .select(Notification::as_select())
        .into_boxed();
    if let Some(after) = after {
        query = query.filter(notifications::created_at.gt(after));
    }

    let result = query
        .order((notifications::created_at.asc(), notifications::id.asc()))
        .load(conn)?;
    Ok(result)
}

/// Marks one of a user's notifications as read
///
/// ### Errors
///
/// Returns `DomainError::NotFound` if the notification does not exist or
/// belongs to someone else.
#[instrument(skip(pool), fields(user_id = %user_id, notification_id = %id))]
pub fn mark_read(pool: &DbPool, user_id: &str, id: &str) -> Result<Notification> {
    let conn = &mut pool.get()?;

    conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
        let mut notification: Notification = notifications::table
            .find(id)
            .filter(notifications::user_id.eq(user_id))
            .select(Notification::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| DomainError::not_found("Notification", id))?;

        if !notification.is_read {
            diesel::update(notifications::table.find(id))
                .set(notifications::is_read.eq(true))
                .execute(conn)?;
            notification.is_read = true;
        }
        Ok(notification)
    })
}

/// Marks all of a user's notifications as read, returning how many changed
#[instrument(skip(pool), fields(user_id = %user_id))]
pub fn mark_all_read(pool: &DbPool, user_id: &str) -> Result<usize> {
    let conn = &mut pool.get()?;
    let updated = diesel::update(
        notifications::table
            .filter(notifications::user_id.eq(user_id))
            .filter(notifications::is_read.eq(false)),
    )
    .set(notifications::is_read.eq(true))
    .execute(conn)?;

    info!("Marked {} notifications as read", updated);
    Ok(updated)
}
