use crate::db::DbPool;
use crate::dto::{CheckoutFilter, CreateCheckoutDto, OverdueCheckout};
use crate::errors::DomainError;
use crate::models::{AssetStatus, CheckInOut, Employee};
use crate::schema::{assets, check_in_out, employees};
use anyhow::Result;
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use tracing::{debug, info, instrument};

use super::asset_repo::load_asset;

/// Checks an asset out to an employee
///
/// The asset must be available. The checkout row and the asset's new status
/// are written together.
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `dto` - The asset, the employee and the optional expected return time
///
/// ### Returns
///
/// A Result containing the open checkout
///
/// ### Errors
///
/// Returns an error if:
/// - The asset or the employee does not exist
/// - The asset is not available (`DomainError::InvalidState`)
#[instrument(skip(pool, dto), fields(asset_id = %dto.asset_id, employee_id = %dto.employee_id))]
pub fn check_out_asset(pool: &DbPool, dto: &CreateCheckoutDto) -> Result<CheckInOut> {
    debug!("Checking out asset");

    let conn = &mut pool.get()?;

    let checkout = conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
        let asset = load_asset(conn, &dto.asset_id)?;
        if asset.status != AssetStatus::Available {
            return Err(DomainError::InvalidState(format!(
                "Asset is {} and cannot be checked out",
                asset.status
            ))
            .into());
        }

        employees::table
            .find(&dto.employee_id)
            .select(Employee::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| DomainError::not_found("Employee", &dto.employee_id))?;

        let checkout = CheckInOut::new(
            asset.id.clone(),
            dto.employee_id.clone(),
            dto.expected_return_at.map(|t| t.naive_utc()),
            dto.notes.clone(),
        );
        diesel::insert_into(check_in_out::table)
            .values(&checkout)
            .execute(conn)?;

        diesel::update(assets::table.find(&asset.id))
            .set((
                assets::status.eq(AssetStatus::CheckedOut),
                assets::updated_at.eq(checkout.checked_out_at),
            ))
            .execute(conn)?;

        Ok(checkout)
    })?;

    info!("Checked out asset with checkout id: {}", checkout.id);
    Ok(checkout)
}

/// Closes an open checkout and makes the asset available again
///
/// ### Errors
///
/// Returns `DomainError::InvalidState` if the checkout is already closed.
#[instrument(skip(pool), fields(checkout_id = %id))]
pub fn check_in(pool: &DbPool, id: &str) -> Result<CheckInOut> {
    let conn = &mut pool.get()?;

    let checkout = conn.immediate_transaction::<_, anyhow::Error, _>(|conn| {
        let mut checkout: CheckInOut = check_in_out::table
            .find(id)
            .select(CheckInOut::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| DomainError::not_found("Checkout", id))?;

        if !checkout.is_open() {
            return Err(DomainError::InvalidState("Checkout is already checked in".to_string()).into());
        }

        let now = Utc::now().naive_utc();
        checkout.checked_in_at = Some(now);

        diesel::update(check_in_out::table.find(id))
            .set(check_in_out::checked_in_at.eq(now))
            .execute(conn)?;

        diesel::update(
            assets::table
                .find(&checkout.asset_id)
                .filter(assets::status.eq(AssetStatus::CheckedOut)),
        )
        .set((
            assets::status.eq(AssetStatus::Available),
            assets::updated_at.eq(now),
        ))
        .execute(conn)?;

        Ok(checkout)
    })?;

    info!("Checked in asset {}", checkout.asset_id);
    Ok(checkout)
}

/// Retrieves a checkout by ID
#[instrument(skip(pool), fields(checkout_id = %id))]
pub fn get_checkout(pool: &DbPool, id: &str) -> Result<Option<CheckInOut>> {
    let conn = &mut pool.get()?;
    let result = check_in_out::table
        .find(id)
        .select(CheckInOut::as_select())
        .first(conn)
        .optional()?;
    Ok(result)
}

/// Lists checkouts matching a filter, most recent first
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `filter` - `active` keeps open (or, when false, closed) checkouts;
///   `overdue` keeps open checkouts whose expected return is before `now`
/// * `now` - The instant overdue is judged against
#[instrument(skip(pool))]
pub fn list_checkouts(pool: &DbPool, filter: &CheckoutFilter, now: NaiveDateTime) -> Result<Vec<CheckInOut>> {
    let conn = &mut pool.get()?;

    let mut query = check_in_out::table.select(CheckInOut::as_select()).into_boxed();

    match filter.active {
        Some(true) => query = query.filter(check_in_out::checked_in_at.is_null()),
        Some(false) => query = query.filter(check_in_out::checked_in_at.is_not_null()),
        None => {}
    }
    match filter.overdue {
        Some(true) => {
            query = query
                .filter(check_in_out::checked_in_at.is_null())
                .filter(check_in_out::expected_return_at.lt(now));
        }
        Some(false) => {
            query = query.filter(
                check_in_out::checked_in_at
                    .is_not_null()
                    .or(check_in_out::expected_return_at.is_null())
                    .or(check_in_out::expected_return_at.ge(now)),
            );
        }
        None => {}
    }
    if let Some(asset_id) = &filter.asset_id {
        query = query.filter(check_in_out::asset_id.eq(asset_id.clone()));
    }
    if let Some(employee_id) = &filter.employee_id {
        query = query.filter(check_in_out::employee_id.eq(employee_id.clone()));
    }

    let result = query
        .order(check_in_out::checked_out_at.desc())
        .load(conn)?;

    info!("Retrieved {} checkouts", result.len());
    Ok(result)
}

/// Lists open checkouts past their expected return, with asset and employee
/// names, most overdue first
#[instrument(skip(pool))]
pub fn list_overdue_checkouts(pool: &DbPool, now: NaiveDateTime) -> Result<Vec<OverdueCheckout>> {
    let conn = &mut pool.get()?;

    let rows: Vec<(CheckInOut, (String, String), Employee)> = check_in_out::table
        .inner_join(assets::table)
        .inner_join(employees::table)
        .filter(check_in_out::checked_in_at.is_null())
        .filter(check_in_out::expected_return_at.lt(now))
        .order(check_in_out::expected_return_at.asc())
        .select((
            CheckInOut::as_select(),
            (assets::name, assets::serial_number),
            Employee::as_select(),
        ))
        .load(conn)?;

    let result: Vec<OverdueCheckout> = rows
        .into_iter()
        .map(|(checkout, (asset_name, serial_number), employee)| OverdueCheckout {
            checkout,
            asset_name,
            serial_number,
            employee_name: employee.full_name(),
            employee_email: employee.email,
        })
        .collect();

    info!("Found {} overdue checkouts", result.len());
    Ok(result)
}
