use crate::db::DbPool;
use crate::dto::ActivityLogFilter;
use crate::models::ActivityLog;
use crate::schema::activity_logs;
use anyhow::Result;
use diesel::prelude::*;
use tracing::{debug, instrument};

/// Records an entry in the activity log
#[instrument(skip(pool, entry), fields(action = %entry.action, entity_type = %entry.entity_type))]
pub fn log_activity(pool: &DbPool, entry: &ActivityLog) -> Result<()> {
    let conn = &mut pool.get()?;
    diesel::insert_into(activity_logs::table)
        .values(entry)
        .execute(conn)?;
    debug!("Recorded activity {}", entry.id);
    Ok(())
}

/// Lists activity log entries matching a filter, newest first
///
/// At most `filter.effective_limit()` entries are returned.
#[instrument(skip(pool))]
pub fn list_activity_logs(pool: &DbPool, filter: &ActivityLogFilter) -> Result<Vec<ActivityLog>> {
    let conn = &mut pool.get()?;

    let mut query = activity_logs::table.select(ActivityLog::as_select()).into_boxed();

    if let Some(entity_type) = &filter.entity_type {
        query = query.filter(activity_logs::entity_type.eq(entity_type.clone()));
    }
    if let Some(entity_id) = &filter.entity_id {
        query = query.filter(activity_logs::entity_id.eq(entity_id.clone()));
    }
    if let Some(user_id) = &filter.user_id {
        query = query.filter(activity_logs::user_id.eq(user_id.clone()));
    }

    let result = query
        .order((activity_logs::created_at.desc(), activity_logs::id.desc()))
        .limit(filter.effective_limit())
        .load(conn)?;

    debug!("Retrieved {} activity log entries", result.len());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::test_utils::{seed_user, setup_test_db};
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn test_log_and_list_activity() {
        let pool = setup_test_db();
        let user = seed_user(&pool, "auditor@example.com", Role::Manager);

        let mut older = ActivityLog::new(Some(user.id.clone()), "create", "asset", "a-1", json!({"name": "Drill"}));
        older.created_at -= Duration::minutes(5);
        log_activity(&pool, &older).unwrap();
        let newer = ActivityLog::new(Some(user.id.clone()), "update", "asset", "a-1", json!({}));
        log_activity(&pool, &newer).unwrap();
        log_activity(&pool, &ActivityLog::new(None, "create", "location", "l-1", json!(null))).unwrap();

        let all = list_activity_logs(&pool, &ActivityLogFilter::default()).unwrap();
        assert_eq!(all.len(), 3);

        let for_asset = list_activity_logs(
            &pool,
            &ActivityLogFilter { entity_id: Some("a-1".into()), ..Default::default() },
        )
        .unwrap();
        assert_eq!(for_asset.len(), 2);
        assert_eq!(for_asset[0].id, newer.id);
        assert_eq!(for_asset[1].details.get("name"), "Drill");

        let by_user = list_activity_logs(
            &pool,
            &ActivityLogFilter { user_id: Some(user.id.clone()), ..Default::default() },
        )
        .unwrap();
        assert_eq!(by_user.len(), 2);

        let by_type = list_activity_logs(
            &pool,
            &ActivityLogFilter { entity_type: Some("location".into()), ..Default::default() },
        )
        .unwrap();
        assert_eq!(by_type.len(), 1);
        assert_eq!(by_type[0].user_id, None);
    }

    #[test]
    fn test_limit_is_applied() {
        let pool = setup_test_db();
        for i in 0..5 {
            log_activity(&pool, &ActivityLog::new(None, "create", "asset", &i.to_string(), json!({}))).unwrap();
        }

        let limited = list_activity_logs(&pool, &ActivityLogFilter { limit: Some(2), ..Default::default() }).unwrap();
        assert_eq!(limited.len(), 2);

        // Zero is clamped up to one
        let clamped = list_activity_logs(&pool, &ActivityLogFilter { limit: Some(0), ..Default::default() }).unwrap();
        assert_eq!(clamped.len(), 1);
    }
}
