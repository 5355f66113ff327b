use serde_json::Value;
use tracing::warn;

use crate::db::DbPool;
use crate::errors::ApiError;
use crate::models::{ActivityLog, User};
use crate::repo;

/// Records a user's action in the activity log
///
/// The action has already happened by the time this runs, so a failure to
/// record it is logged rather than returned.
pub(crate) fn record(
    pool: &DbPool,
    user: &User,
    action: &str,
    entity_type: &str,
    entity_id: &str,
    details: Value,
) {
    let entry = ActivityLog::new(Some(user.id.clone()), action, entity_type, entity_id, details);
    if let Err(e) = repo::log_activity(pool, &entry) {
        warn!(action, entity_type, entity_id, "Failed to record activity: {:#}", e);
    }
}

/// Trims a required text field, rejecting it when nothing is left
pub(crate) fn required_text(field: &str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}
