//! Periodic sweep that turns due maintenance, overdue checkouts and low
//! stock into notifications
//!
//! The sweep runs on a timer inside the server and can also be triggered
//! through `/api/cron`. Each condition is notified once: maintenance and
//! checkouts carry a flag that is set in the same transaction as the
//! notifications, and low stock is skipped for anyone who still has an
//! unread notice about the same item.

use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

use crate::config::Config;
use crate::db::DbPool;
use crate::models::{CheckInOut, Inventory, Maintenance, MaintenanceStatus, Notification, NotificationKind, Role, User};
use crate::repo;
use crate::schema::{assets, check_in_out, employees, inventory, maintenance};
use crate::valuation;

/// Number of notifications created by one sweep, per condition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub maintenance_reminders: usize,
    pub overdue_notices: usize,
    pub low_stock_notices: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.maintenance_reminders + self.overdue_notices + self.low_stock_notices
    }
}

/// Builds the same notification for every recipient, each listed once
fn fan_out(
    recipients: &[String],
    kind: NotificationKind,
    title: &str,
    message: &str,
    entity_id: &str,
) -> Vec<Notification> {
    let mut unique: Vec<&String> = Vec::with_capacity(recipients.len());
    for user_id in recipients {
        if !unique.contains(&user_id) {
            unique.push(user_id);
        }
    }

    unique
        .into_iter()
        .map(|user_id| {
            Notification::new(
                user_id.clone(),
                kind,
                title.to_string(),
                message.to_string(),
                Some(entity_id.to_string()),
            )
        })
        .collect()
}

/// Reminds the assigned mechanic and all staff about maintenance coming up
fn remind_maintenance(
    pool: &DbPool,
    staff: &[String],
    window_days: i64,
    now: NaiveDateTime,
) -> anyhow::Result<usize> {
    let conn = &mut pool.get()?;
    let today = now.date();

    let pending: Vec<(Maintenance, String)> = maintenance::table
        .inner_join(assets::table)
        .filter(maintenance::status.eq(MaintenanceStatus::Scheduled))
        .filter(maintenance::reminder_sent.eq(false))
        .filter(maintenance::scheduled_date.le(valuation::window_end(today, window_days)))
        .order(maintenance::scheduled_date.asc())
        .select((Maintenance::as_select(), assets::name))
        .load(conn)?;

    let mut sent = 0;
    for (job, asset_name) in pending {
        if !valuation::is_reminder_due(job.status, job.scheduled_date, job.reminder_sent, today, window_days) {
            continue;
        }

        let mut recipients: Vec<String> = job.mechanic_id.iter().cloned().collect();
        recipients.extend(staff.iter().cloned());
        let batch = fan_out(
            &recipients,
            NotificationKind::MaintenanceDue,
            "Maintenance due",
            &format!("{} is due for maintenance on {}: {}", asset_name, job.scheduled_date, job.description),
            &job.id,
        );

        sent += conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
            let inserted = repo::insert_notifications(conn, &batch)?;
            diesel::update(maintenance::table.find(&job.id))
                .set(maintenance::reminder_sent.eq(true))
                .execute(conn)?;
            Ok(inserted)
        })?;
        debug!(maintenance_id = %job.id, "Sent maintenance reminder");
    }
    Ok(sent)
}

/// Tells staff about each checkout that has just become overdue
fn notify_overdue(pool: &DbPool, staff: &[String], now: NaiveDateTime) -> anyhow::Result<usize> {
    let conn = &mut pool.get()?;

    let pending: Vec<(CheckInOut, String, String, String)> = check_in_out::table
        .inner_join(assets::table)
        .inner_join(employees::table)
        .filter(check_in_out::checked_in_at.is_null())
        .filter(check_in_out::overdue_notified.eq(false))
        .filter(check_in_out::expected_return_at.lt(now))
        .select((
            CheckInOut::as_select(),
            assets::name,
            employees::first_name,
            employees::last_name,
        ))
        .load(conn)?;

    let mut sent = 0;
    for (checkout, asset_name, first_name, last_name) in pending {
        if !checkout.is_overdue(now) {
            continue;
        }
        let due = checkout
            .expected_return_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let batch = fan_out(
            staff,
            NotificationKind::OverdueCheckout,
            "Checkout overdue",
            &format!("{} checked out to {} {} was due back {}", asset_name, first_name, last_name, due),
            &checkout.id,
        );

        sent += conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
            let inserted = repo::insert_notifications(conn, &batch)?;
            diesel::update(check_in_out::table.find(&checkout.id))
                .set(check_in_out::overdue_notified.eq(true))
                .execute(conn)?;
            Ok(inserted)
        })?;
        debug!(checkout_id = %checkout.id, "Sent overdue notice");
    }
    Ok(sent)
}

/// Tells staff about low stock they have not yet been told about
fn notify_low_stock(pool: &DbPool, staff: &[String]) -> anyhow::Result<usize> {
    let conn = &mut pool.get()?;

    let low: Vec<Inventory> = inventory::table
        .filter(inventory::quantity.le(inventory::min_quantity))
        .select(Inventory::as_select())
        .load(conn)?;

    let mut sent = 0;
    for item in low.iter().filter(|i| i.is_low_stock()) {
        let mut recipients = Vec::new();
        for user_id in staff {
            if !repo::has_unread(conn, user_id, NotificationKind::LowStock, &item.id)? {
                recipients.push(user_id.clone());
            }
        }
        let batch = fan_out(
            &recipients,
            NotificationKind::LowStock,
            "Low stock",
            &format!(
                "{} ({}) is down to {} (minimum {})",
                item.name, item.sku, item.quantity, item.min_quantity
            ),
            &item.id,
        );
        sent += repo::insert_notifications(conn, &batch)?;
    }
    Ok(sent)
}

/// Runs every check once and reports how many notifications were created
///
/// Running it again straight away creates nothing new.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `reminder_window_days` - Maintenance due within this many days is reminded
/// * `now` - The instant due dates and expected returns are judged against
///
/// ### Errors
///
/// Returns the first database error hit; notifications already committed
/// by earlier steps stay committed.
#[instrument(skip(pool))]
pub fn run_sweep(pool: &DbPool, reminder_window_days: i64, now: NaiveDateTime) -> anyhow::Result<SweepReport> {
    let staff: Vec<String> = repo::list_users_with_roles(pool, &[Role::Manager, Role::Admin])?
        .into_iter()
        .map(|u: User| u.id)
        .collect();

    let report = SweepReport {
        maintenance_reminders: remind_maintenance(pool, &staff, reminder_window_days, now)?,
        overdue_notices: notify_overdue(pool, &staff, now)?,
        low_stock_notices: notify_low_stock(pool, &staff)?,
    };

    let purged = repo::delete_expired_sessions(pool, now)?;
    if purged > 0 {
        debug!("Purged {} expired sessions", purged);
    }

    info!(
        maintenance_reminders = report.maintenance_reminders,
        overdue_notices = report.overdue_notices,
        low_stock_notices = report.low_stock_notices,
        "Sweep finished"
    );
    Ok(report)
}

/// Starts the background sweep on the configured interval
///
/// Returns None when the interval is 0. Failures are logged and the next
/// tick tries again.
pub fn spawn_sweeper(pool: Arc<DbPool>, config: &Config) -> Option<JoinHandle<()>> {
    let period = config.cron_interval()?;
    let window_days = config.reminder_window();

    info!("Starting background sweep every {}s", period.as_secs());

    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;

            let pool = pool.clone();
            let result = tokio::task::spawn_blocking(move || {
                run_sweep(&pool, window_days, Utc::now().naive_utc())
            })
            .await;

            match result {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => error!("Background sweep failed: {:#}", e),
                Err(e) => error!("Background sweep task panicked: {}", e),
            }
        }
    });

    Some(handle)
}

#[cfg(test)]
mod tests;
