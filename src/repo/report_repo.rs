use crate::db::DbPool;
use crate::dto::{AssetStatusCounts, Dashboard, DepreciationReport, DepreciationRow};
use crate::models::{Asset, AssetStatus, Inventory, MaintenanceStatus};
use crate::schema::{assets, check_in_out, inventory, maintenance};
use crate::valuation;
use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use diesel::dsl::sum;
use diesel::prelude::*;
use tracing::{info, instrument};

/// One asset's line in the depreciation report
pub fn depreciation_row(asset: &Asset, as_of: NaiveDate) -> DepreciationRow {
    let dep = asset.depreciation(as_of);
    DepreciationRow {
        asset_id: asset.id.clone(),
        name: asset.name.clone(),
        serial_number: asset.serial_number.clone(),
        status: asset.status,
        purchase_date: asset.purchase_date,
        purchase_cost: asset.purchase_cost,
        salvage_value: asset.salvage_value,
        useful_life_years: asset.useful_life_years,
        annual: dep.annual,
        accumulated: dep.accumulated,
        current_value: dep.current_value,
    }
}

/// Depreciation of every asset as of a given day, with totals
///
/// Rows are ordered by name, then serial number.
#[instrument(skip(pool))]
pub fn depreciation_report(pool: &DbPool, as_of: NaiveDate) -> Result<DepreciationReport> {
    let conn = &mut pool.get()?;

    let all_assets: Vec<Asset> = assets::table
        .order((assets::name.asc(), assets::serial_number.asc()))
        .select(Asset::as_select())
        .load(conn)?;

    let rows: Vec<DepreciationRow> = all_assets.iter().map(|a| depreciation_row(a, as_of)).collect();

    let report = DepreciationReport {
        as_of,
        total_purchase_cost: rows.iter().map(|r| r.purchase_cost).sum(),
        total_accumulated: rows.iter().map(|r| r.accumulated).sum(),
        total_current_value: rows.iter().map(|r| r.current_value).sum(),
        rows,
    };

    info!("Built depreciation report for {} assets", report.rows.len());
    Ok(report)
}

/// Inventory at or below its minimum quantity, emptiest first
#[instrument(skip(pool))]
pub fn low_stock_report(pool: &DbPool) -> Result<Vec<Inventory>> {
    let conn = &mut pool.get()?;
    let result = inventory::table
        .filter(inventory::quantity.le(inventory::min_quantity))
        .order((inventory::quantity.asc(), inventory::name.asc()))
        .select(Inventory::as_select())
        .load(conn)?;
    Ok(result)
}

/// Headline figures for the back office
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `today` - The day book values and the maintenance window are measured from
/// * `now` - The instant overdue checkouts are judged against
/// * `window_days` - How many days ahead counts as upcoming maintenance
#[instrument(skip(pool))]
pub fn dashboard(pool: &DbPool, today: NaiveDate, now: NaiveDateTime, window_days: i64) -> Result<Dashboard> {
    let conn = &mut pool.get()?;

    let all_assets: Vec<Asset> = assets::table.select(Asset::as_select()).load(conn)?;

    let mut counts = AssetStatusCounts::default();
    let mut total_purchase_cost = 0.0;
    let mut total_current_value = 0.0;
    for asset in &all_assets {
        match asset.status {
            AssetStatus::Available => counts.available += 1,
            AssetStatus::CheckedOut => counts.checked_out += 1,
            AssetStatus::InMaintenance => counts.in_maintenance += 1,
            AssetStatus::Retired => counts.retired += 1,
        }
        counts.total += 1;
        total_purchase_cost += asset.purchase_cost;
        total_current_value += asset.depreciation(today).current_value;
    }

    let stock: Vec<Inventory> = inventory::table.select(Inventory::as_select()).load(conn)?;
    let low_stock_count = stock.iter().filter(|item| item.is_low_stock()).count() as i64;
    let inventory_value: f64 = stock.iter().map(Inventory::stock_value).sum();

    let overdue_checkout_count: i64 = check_in_out::table
        .filter(check_in_out::checked_in_at.is_null())
        .filter(check_in_out::expected_return_at.lt(now))
        .count()
        .get_result(conn)?;

    let upcoming_maintenance_count: i64 = maintenance::table
        .filter(maintenance::status.eq(MaintenanceStatus::Scheduled))
        .filter(maintenance::scheduled_date.le(valuation::window_end(today, window_days)))
        .count()
        .get_result(conn)?;

    let total_maintenance_cost: Option<f64> = maintenance::table
        .select(sum(maintenance::cost))
        .first(conn)?;

    Ok(Dashboard {
        assets: counts,
        total_purchase_cost,
        total_current_value,
        low_stock_count,
        inventory_value,
        overdue_checkout_count,
        upcoming_maintenance_count,
        total_maintenance_cost: total_maintenance_cost.unwrap_or(0.0),
        generated_at: Utc::now().naive_utc(),
    })
}
