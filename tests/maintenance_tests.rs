//! Integration tests for maintenance
//!
//! This file covers:
//! - Scheduling jobs and who may work on them
//! - The job lifecycle and its effect on the asset
//! - Consuming parts from inventory

use axum::http::StatusCode;
use serde_json::{json, Value};

mod common;
use common::*;

/// A manager, an assigned mechanic, an unassigned mechanic, and a scheduled job
struct Workshop {
    app: TestApp,
    manager: String,
    mechanic: String,
    other_mechanic: String,
    asset_id: String,
    job: Value,
}

async fn workshop() -> Workshop {
    let mut app = create_test_app();
    let admin = admin_token(&mut app).await;
    let (_, manager) = user_with_role(&mut app, &admin, "boss@example.com", "manager").await;
    let (mechanic_id, mechanic) = user_with_role(&mut app, &admin, "mech@example.com", "mechanic").await;
    let (_, other_mechanic) = user_with_role(&mut app, &admin, "other@example.com", "mechanic").await;

    let type_id = create_asset_type(&mut app, &manager, "Forklift").await;
    let asset = create_asset(&mut app, &manager, &type_id, "FL-1").await;
    let asset_id = asset["id"].as_str().unwrap().to_string();

    let (status, job) = post(
        &mut app,
        "/api/maintenance",
        &manager,
        json!({
            "asset_id": asset_id,
            "description": "Replace hydraulic filter",
            "scheduled_date": "2030-06-01",
            "mechanic_id": mechanic_id
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "schedule failed: {}", job);

    Workshop { app, manager, mechanic, other_mechanic, asset_id, job }
}

fn job_uri(job: &Value, suffix: &str) -> String {
    format!("/api/maintenance/{}{}", job["id"].as_str().unwrap(), suffix)
}

/// Tests scheduling and reading a job
#[tokio::test]
async fn test_schedule_maintenance() {
    let mut w = workshop().await;
    assert_eq!(w.job["status"], "scheduled");
    assert_eq!(w.job["cost"], 0.0);
    assert_eq!(w.job["reminder_sent"], false);

    let (status, fetched) = get(&mut w.app, &job_uri(&w.job, ""), &w.mechanic).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, w.job);

    let (_, for_asset) = get(&mut w.app, &format!("/api/assets/{}/maintenance", w.asset_id), &w.manager).await;
    assert_eq!(for_asset.as_array().unwrap().len(), 1);

    let (_, scheduled) = get(&mut w.app, "/api/maintenance?status=scheduled", &w.manager).await;
    assert_eq!(scheduled.as_array().unwrap().len(), 1);
    let (_, done) = get(&mut w.app, "/api/maintenance?status=completed", &w.manager).await;
    assert!(done.as_array().unwrap().is_empty());
}

/// Tests that only managers schedule and a plain user cannot be the mechanic
#[tokio::test]
async fn test_schedule_rejections() {
    let mut w = workshop().await;

    let body = json!({
        "asset_id": w.asset_id,
        "description": "Check tyres",
        "scheduled_date": "2030-06-02"
    });
    let (status, _) = post(&mut w.app, "/api/maintenance", &w.mechanic, body.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, me) = get(&mut w.app, "/api/me", &w.manager).await;
    let admin = login(&mut w.app, "admin@example.com").await;
    let (plain_id, _) = user_with_role(&mut w.app, &admin, "plain@example.com", "user").await;
    let mut with_plain = body.clone();
    with_plain["mechanic_id"] = json!(plain_id);
    let (status, _) = post(&mut w.app, "/api/maintenance", &w.manager, with_plain).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // A manager can take a job themselves
    let mut with_manager = body;
    with_manager["mechanic_id"] = me["id"].clone();
    let (status, _) = post(&mut w.app, "/api/maintenance", &w.manager, with_manager).await;
    assert_eq!(status, StatusCode::OK);
}

/// Tests that mechanics may only work on their own jobs
#[tokio::test]
async fn test_only_assigned_mechanic_works_on_job() {
    let mut w = workshop().await;

    let (status, _) = post(&mut w.app, &job_uri(&w.job, "/status"), &w.other_mechanic, json!({ "status": "in_progress" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = put(&mut w.app, &job_uri(&w.job, ""), &w.other_mechanic, json!({ "description": "Mine now" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = put(&mut w.app, &job_uri(&w.job, ""), &w.mechanic, json!({ "cost": 15.5 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["cost"], 15.5);

    // Reassigning is for managers only
    let (status, _) = put(
        &mut w.app,
        &job_uri(&w.job, ""),
        &w.mechanic,
        json!({ "mechanic_id": w.job["mechanic_id"] }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

/// Tests the lifecycle and that it drives the asset's status
#[tokio::test]
async fn test_lifecycle_drives_asset_status() {
    let mut w = workshop().await;
    let asset_uri = format!("/api/assets/{}", w.asset_id);

    // Scheduled work cannot jump straight to completed
    let (status, _) = post(&mut w.app, &job_uri(&w.job, "/status"), &w.mechanic, json!({ "status": "completed" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, started) = post(&mut w.app, &job_uri(&w.job, "/status"), &w.mechanic, json!({ "status": "in_progress" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["status"], "in_progress");
    let (_, asset) = get(&mut w.app, &asset_uri, &w.manager).await;
    assert_eq!(asset["status"], "in_maintenance");

    let (status, done) = post(&mut w.app, &job_uri(&w.job, "/status"), &w.mechanic, json!({ "status": "completed" })).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!done["completed_at"].is_null());
    let (_, asset) = get(&mut w.app, &asset_uri, &w.manager).await;
    assert_eq!(asset["status"], "available");

    // Completed is terminal
    let (status, _) = post(&mut w.app, &job_uri(&w.job, "/status"), &w.manager, json!({ "status": "cancelled" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, logs) = get(
        &mut w.app,
        &format!("/api/activity-logs?entity_type=maintenance&entity_id={}", w.job["id"].as_str().unwrap()),
        &w.manager,
    )
    .await;
    let statuses: Vec<&Value> = logs
        .as_array()
        .unwrap()
        .iter()
        .filter(|entry| entry["action"] == "status")
        .collect();
    assert_eq!(statuses.len(), 2);
}

/// Tests consuming parts: stock goes down and the job's cost goes up
#[tokio::test]
async fn test_consume_parts() {
    let mut w = workshop().await;
    let item = create_inventory(&mut w.app, &w.manager, "HF-9", 10, 2, 4.5).await;
    let item_uri = format!("/api/inventory/{}", item["id"].as_str().unwrap());

    let (status, usage) = post(
        &mut w.app,
        &job_uri(&w.job, "/parts"),
        &w.mechanic,
        json!({ "inventory_id": item["id"], "quantity": 4 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(usage["quantity_used"], 4);

    let (_, job) = get(&mut w.app, &job_uri(&w.job, ""), &w.mechanic).await;
    assert_eq!(job["cost"], 18.0);
    let (_, stock) = get(&mut w.app, &item_uri, &w.manager).await;
    assert_eq!(stock["quantity"], 6);

    // Asking for more than is left changes nothing
    let (status, _) = post(
        &mut w.app,
        &job_uri(&w.job, "/parts"),
        &w.mechanic,
        json!({ "inventory_id": item["id"], "quantity": 7 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, job) = get(&mut w.app, &job_uri(&w.job, ""), &w.mechanic).await;
    assert_eq!(job["cost"], 18.0);
    let (_, stock) = get(&mut w.app, &item_uri, &w.manager).await;
    assert_eq!(stock["quantity"], 6);

    let (status, parts) = get(&mut w.app, &job_uri(&w.job, "/parts"), &w.manager).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parts.as_array().unwrap().len(), 1);

    // Parts that were used cannot be deleted from inventory
    let (status, _) = delete(&mut w.app, &item_uri, &w.manager).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

/// Tests that finished jobs take no more parts
#[tokio::test]
async fn test_consume_after_cancel_rejected() {
    let mut w = workshop().await;
    let item = create_inventory(&mut w.app, &w.manager, "HF-9", 10, 2, 4.5).await;

    let (status, _) = post(&mut w.app, &job_uri(&w.job, "/status"), &w.manager, json!({ "status": "cancelled" })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post(
        &mut w.app,
        &job_uri(&w.job, "/parts"),
        &w.manager,
        json!({ "inventory_id": item["id"], "quantity": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// Tests deleting a job
#[tokio::test]
async fn test_delete_maintenance() {
    let mut w = workshop().await;

    let (status, _) = delete(&mut w.app, &job_uri(&w.job, ""), &w.mechanic).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = delete(&mut w.app, &job_uri(&w.job, ""), &w.manager).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = get(&mut w.app, &job_uri(&w.job, ""), &w.manager).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
