//! Business rules evaluated at query time
//!
//! Nothing here touches the database: every function is a plain calculation
//! over values already loaded, so reports and the sweep can share them.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::MaintenanceStatus;

/// Average length of a year in days, leap years included
const DAYS_PER_YEAR: f64 = 365.25;

/// Result of a straight-line depreciation calculation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Depreciation {
    /// Amount written off per full year
    pub annual: f64,
    /// Amount written off so far
    pub accumulated: f64,
    /// Book value after depreciation
    pub current_value: f64,
}

/// Straight-line depreciation of an asset as of a given day
///
/// The depreciable base `cost - salvage` is spread evenly over
/// `useful_life_years`. Value never drops below `salvage`, and time before
/// the purchase date does not count. Assets without a useful life, or whose
/// salvage value is at least their cost, do not depreciate.
pub fn straight_line_depreciation(
    cost: f64,
    salvage: f64,
    useful_life_years: i32,
    purchase_date: NaiveDate,
    as_of: NaiveDate,
) -> Depreciation {
    let base = cost - salvage;
    if useful_life_years <= 0 || base <= 0.0 {
        return Depreciation {
            annual: 0.0,
            accumulated: 0.0,
            current_value: cost,
        };
    }

    let annual = base / f64::from(useful_life_years);
    let elapsed_days = (as_of - purchase_date).num_days().max(0);
    let elapsed_years = elapsed_days as f64 / DAYS_PER_YEAR;
    let accumulated = (annual * elapsed_years).min(base);

    Depreciation {
        annual,
        accumulated,
        current_value: cost - accumulated,
    }
}

/// Stock is low once it reaches its minimum quantity
pub fn is_low_stock(quantity: i32, min_quantity: i32) -> bool {
    quantity <= min_quantity
}

/// A checkout is overdue when it is still open past its expected return
///
/// Checkouts without an expected return time are never overdue.
pub fn is_overdue(
    expected_return_at: Option<NaiveDateTime>,
    checked_in_at: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> bool {
    match (expected_return_at, checked_in_at) {
        (Some(expected), None) => expected < now,
        _ => false,
    }
}

/// Latest date a window may reach; later dates no longer sort correctly as
/// stored `YYYY-MM-DD` text
pub const LAST_DAY: NaiveDate = match NaiveDate::from_ymd_opt(9999, 12, 31) {
    Some(day) => day,
    None => NaiveDate::MAX,
};

/// Last day that falls inside a window of `window_days` starting at `today`
///
/// Saturates at 9999-12-31 instead of overflowing.
pub fn window_end(today: NaiveDate, window_days: i64) -> NaiveDate {
    Duration::try_days(window_days.max(0))
        .and_then(|window| today.checked_add_signed(window))
        .map_or(LAST_DAY, |end| end.min(LAST_DAY))
}

/// Whether a maintenance job should trigger its reminder today
pub fn is_reminder_due(
    status: MaintenanceStatus,
    scheduled_date: NaiveDate,
    reminder_sent: bool,
    today: NaiveDate,
    window_days: i64,
) -> bool {
    status == MaintenanceStatus::Scheduled
        && !reminder_sent
        && scheduled_date <= window_end(today, window_days)
}


#[cfg(test)]
mod prop_tests;
