use super::*;
use chrono::Duration;
use crate::dto::{CreateCheckoutDto, CreateMaintenanceDto};
use crate::repo::{adjust_inventory, check_out_asset, create_maintenance, list_notifications, mark_all_read};
use crate::test_utils::{seed_asset, seed_employee, seed_inventory, seed_user, setup_test_db};

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

#[test]
fn test_empty_sweep_reports_nothing() {
    let pool = setup_test_db();
    seed_user(&pool, "admin@example.com", Role::Admin);

    let report = run_sweep(&pool, 3, now()).unwrap();
    assert_eq!(report, SweepReport::default());
    assert_eq!(report.total(), 0);
}

#[test]
fn test_maintenance_reminder_reaches_mechanic_and_staff_once() {
    let pool = setup_test_db();
    let admin = seed_user(&pool, "admin@example.com", Role::Admin);
    let manager = seed_user(&pool, "manager@example.com", Role::Manager);
    let mechanic = seed_user(&pool, "mechanic@example.com", Role::Mechanic);
    let bystander = seed_user(&pool, "user@example.com", Role::User);
    let asset = seed_asset(&pool, "SN-DUE");
    let today = now().date();

    let due = create_maintenance(
        &pool,
        &CreateMaintenanceDto {
            asset_id: asset.id.clone(),
            description: "Oil change".into(),
            scheduled_date: today + Duration::days(2),
            mechanic_id: Some(mechanic.id.clone()),
        },
    )
    .unwrap();
    create_maintenance(
        &pool,
        &CreateMaintenanceDto {
            asset_id: asset.id.clone(),
            description: "Annual inspection".into(),
            scheduled_date: today + Duration::days(30),
            mechanic_id: Some(mechanic.id.clone()),
        },
    )
    .unwrap();

    let report = run_sweep(&pool, 3, now()).unwrap();
    assert_eq!(report.maintenance_reminders, 3);

    for user in [&admin, &manager, &mechanic] {
        let notes = list_notifications(&pool, &user.id, true).unwrap();
        assert_eq!(notes.len(), 1, "{} should have one reminder", user.email);
        assert_eq!(notes[0].kind, NotificationKind::MaintenanceDue);
        assert_eq!(notes[0].entity_id.as_deref(), Some(due.id.as_str()));
    }
    assert!(list_notifications(&pool, &bystander.id, false).unwrap().is_empty());

    let again = run_sweep(&pool, 3, now()).unwrap();
    assert_eq!(again.maintenance_reminders, 0);
    assert!(repo::get_maintenance(&pool, &due.id).unwrap().unwrap().reminder_sent);
}

#[test]
fn test_manager_assigned_as_mechanic_is_notified_once() {
    let pool = setup_test_db();
    let manager = seed_user(&pool, "hands-on@example.com", Role::Manager);
    let asset = seed_asset(&pool, "SN-SELF");

    create_maintenance(
        &pool,
        &CreateMaintenanceDto {
            asset_id: asset.id.clone(),
            description: "Tyres".into(),
            scheduled_date: now().date(),
            mechanic_id: Some(manager.id.clone()),
        },
    )
    .unwrap();

    assert_eq!(run_sweep(&pool, 0, now()).unwrap().maintenance_reminders, 1);
    assert_eq!(list_notifications(&pool, &manager.id, false).unwrap().len(), 1);
}

#[test]
fn test_huge_reminder_window_reaches_far_future_jobs() {
    let pool = setup_test_db();
    let admin = seed_user(&pool, "admin@example.com", Role::Admin);
    let asset = seed_asset(&pool, "SN-FAR");

    create_maintenance(
        &pool,
        &CreateMaintenanceDto {
            asset_id: asset.id.clone(),
            description: "Overhaul".into(),
            scheduled_date: now().date() + Duration::days(365 * 50),
            mechanic_id: None,
        },
    )
    .unwrap();

    let report = run_sweep(&pool, i64::from(u32::MAX), now()).unwrap();
    assert_eq!(report.maintenance_reminders, 1);
    assert_eq!(list_notifications(&pool, &admin.id, true).unwrap().len(), 1);
}

#[test]
fn test_overdue_checkout_is_notified_once() {
    let pool = setup_test_db();
    let manager = seed_user(&pool, "manager@example.com", Role::Manager);
    let asset = seed_asset(&pool, "SN-LATE");
    let employee = seed_employee(&pool, "borrower@example.com");

    let checkout = check_out_asset(
        &pool,
        &CreateCheckoutDto {
            asset_id: asset.id.clone(),
            employee_id: employee.id.clone(),
            expected_return_at: Some(Utc::now() - Duration::hours(1)),
            notes: None,
        },
    )
    .unwrap();

    let report = run_sweep(&pool, 3, now()).unwrap();
    assert_eq!(report.overdue_notices, 1);

    let notes = list_notifications(&pool, &manager.id, false).unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind, NotificationKind::OverdueCheckout);
    assert_eq!(notes[0].entity_id.as_deref(), Some(checkout.id.as_str()));
    assert!(notes[0].message.contains("SN-LATE") || notes[0].message.contains(&asset.name));

    // Reading the notice does not bring it back
    mark_all_read(&pool, &manager.id).unwrap();
    assert_eq!(run_sweep(&pool, 3, now()).unwrap().overdue_notices, 0);
}

#[test]
fn test_low_stock_is_renotified_only_after_reading() {
    let pool = setup_test_db();
    let manager = seed_user(&pool, "manager@example.com", Role::Manager);
    let item = seed_inventory(&pool, "FILTER", 1, 2, 8.0);
    seed_inventory(&pool, "PLENTY", 50, 2, 1.0);

    assert_eq!(run_sweep(&pool, 3, now()).unwrap().low_stock_notices, 1);
    assert_eq!(run_sweep(&pool, 3, now()).unwrap().low_stock_notices, 0);

    mark_all_read(&pool, &manager.id).unwrap();
    assert_eq!(run_sweep(&pool, 3, now()).unwrap().low_stock_notices, 1);

    // Restocked items are left alone
    mark_all_read(&pool, &manager.id).unwrap();
    adjust_inventory(&pool, &item.id, 10).unwrap();
    assert_eq!(run_sweep(&pool, 3, now()).unwrap().low_stock_notices, 0);
}

#[test]
fn test_sweep_purges_expired_sessions() {
    let pool = setup_test_db();
    let user = seed_user(&pool, "sleepy@example.com", Role::User);
    let token = crate::auth::start_session(&pool, &user.id, chrono::Duration::hours(1)).unwrap();
    let digest = crate::auth::digest_token(&token);

    run_sweep(&pool, 3, now() + Duration::hours(2)).unwrap();

    assert!(repo::find_session_user(&pool, &digest, now()).unwrap().is_none());
}

#[test]
fn test_fan_out_skips_duplicates() {
    let recipients = vec!["a".to_string(), "b".to_string(), "a".to_string()];
    let batch = fan_out(&recipients, NotificationKind::Info, "Title", "Message", "entity");
    assert_eq!(batch.len(), 2);
    assert!(batch.iter().all(|n| n.entity_id.as_deref() == Some("entity")));
}

#[tokio::test]
async fn test_spawn_sweeper_disabled_at_zero() {
    let pool = setup_test_db();
    let mut config = crate::config::base_config(None);
    config.cron_interval_minutes = 0;
    assert!(spawn_sweeper(pool.clone(), &config).is_none());

    config.cron_interval_minutes = 60;
    let handle = spawn_sweeper(pool, &config).unwrap();
    handle.abort();
}
