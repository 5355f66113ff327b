use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use axum_extra::extract::Query;
use chrono::NaiveDateTime;
use futures::stream::{self, Stream};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::auth::CurrentUser;
use crate::db::DbPool;
use crate::dto::NotificationFilter;
use crate::errors::ApiError;
use crate::models::Notification;
use crate::{repo, AppState};

/// Name of the SSE event carrying new notifications
pub const NOTIFICATION_EVENT: &str = "notifications";

/// Handler for listing the signed-in user's notifications
///
/// This function handles GET requests to `/api/notifications`; `unread=true`
/// leaves out what has been read. Newest first.
#[instrument(skip(pool, user))]
pub async fn list_notifications_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<NotificationFilter>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let notifications = repo::list_notifications(&pool, &user.id, filter.unread.unwrap_or(false))?;
    debug!("Retrieved {} notifications", notifications.len());
    Ok(Json(notifications))
}

/// Handler for marking one notification as read
///
/// This function handles POST requests to `/api/notifications/{id}/read`.
/// Someone else's notification answers 404.
#[instrument(skip(pool, user), fields(notification_id = %id))]
pub async fn mark_notification_read_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Notification>, ApiError> {
    let notification = repo::mark_read(&pool, &user.id, &id)?;
    Ok(Json(notification))
}

/// Handler for marking all of the user's notifications as read
///
/// This function handles POST requests to `/api/notifications/read-all`.
///
/// ### Returns
///
/// `{"updated": n}` with the number of notifications that changed
#[instrument(skip_all)]
pub async fn mark_all_notifications_read_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let updated = repo::mark_all_read(&pool, &user.id)?;
    info!("Marked {} notifications as read for {}", updated, user.id);
    Ok(Json(json!({ "updated": updated })))
}

/// Polling state of one notification stream
struct StreamCursor {
    pool: Arc<DbPool>,
    user_id: String,
    interval: tokio::time::Interval,
    last_sent: Option<NaiveDateTime>,
}

/// Waits for the next batch of unseen unread notifications
///
/// Each tick queries for unread notifications newer than the last one sent;
/// the first tick fires at once and sends everything unread.
async fn next_batch(mut cursor: StreamCursor) -> Option<(Result<Event, Infallible>, StreamCursor)> {
    loop {
        cursor.interval.tick().await;

        let batch = match repo::list_unread_since(&cursor.pool, &cursor.user_id, cursor.last_sent) {
            Ok(batch) => batch,
            Err(e) => {
                warn!(user_id = %cursor.user_id, "Notification poll failed: {:#}", e);
                continue;
            }
        };
        let Some(newest) = batch.last().map(|n| n.created_at) else {
            continue;
        };

        match Event::default().event(NOTIFICATION_EVENT).json_data(&batch) {
            Ok(event) => {
                cursor.last_sent = Some(newest);
                debug!(user_id = %cursor.user_id, "Streaming {} notifications", batch.len());
                return Some((Ok(event), cursor));
            }
            Err(e) => {
                warn!("Failed to encode notifications: {}", e);
                cursor.last_sent = Some(newest);
            }
        }
    }
}

/// Builds the notification event stream for a user
pub fn notification_stream(
    pool: Arc<DbPool>,
    user_id: String,
    period: Duration,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let cursor = StreamCursor { pool, user_id, interval, last_sent: None };
    stream::unfold(cursor, next_batch)
}

/// Handler for the live notification stream
///
/// This function handles GET requests to `/api/notifications/stream` with
/// Server-Sent Events. Every `notification_poll_seconds` the user's new
/// unread notifications are sent as one `notifications` event holding a
/// JSON array. The stream lasts until the client goes away.
#[instrument(skip_all)]
pub async fn notification_stream_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(user_id = %user.id, "Opening notification stream");

    let period = state.config.notification_poll_interval();
    Sse::new(notification_stream(state.pool.clone(), user.id, period)).keep_alive(KeepAlive::default())
}
