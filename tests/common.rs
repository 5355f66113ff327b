//! Common test utilities for assetdesk integration tests
//!
//! This file contains shared functions for all integration tests: building
//! an application over a private in-memory database, sending requests, and
//! creating signed-in users of each role.
#![allow(dead_code)]

use assetdesk::{
    config::{base_config, Config},
    create_app,
    db::{init_pool, run_migrations, DbPool},
    AppState,
};
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::Service;

/// Password used for every account created by these helpers
pub const PASSWORD: &str = "password123";

/// An application under test together with its database
pub struct TestApp {
    pub router: Router,
    pub pool: Arc<DbPool>,
}

/// Creates a test application with an in-memory SQLite database
///
/// Each call gets its own shared-cache database, so tests are isolated
/// from each other and need no cleanup.
pub fn create_test_app() -> TestApp {
    create_test_app_with_config(base_config(None))
}

/// Creates a test application with the given configuration
///
/// The configured database URL is ignored; every app gets a fresh database.
pub fn create_test_app_with_config(config: Config) -> TestApp {
    let database_url = format!("file:it_{}?mode=memory&cache=shared", uuid::Uuid::new_v4());
    let pool = Arc::new(init_pool(&database_url).unwrap());

    let mut conn = pool.get().unwrap();
    run_migrations(&mut conn).unwrap();
    drop(conn);

    let router = create_app(AppState::new(pool.clone(), config));
    TestApp { router, pool }
}

/// Sends a request and returns its status and JSON body (`Null` when empty)
pub async fn send(
    app: &mut TestApp,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().uri(uri).method(method);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.call(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Shorthand for an authenticated GET
pub async fn get(app: &mut TestApp, uri: &str, token: &str) -> (StatusCode, Value) {
    send(app, "GET", uri, Some(token), None).await
}

/// Shorthand for an authenticated POST with a JSON body
pub async fn post(app: &mut TestApp, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
    send(app, "POST", uri, Some(token), Some(body)).await
}

/// Shorthand for an authenticated PUT with a JSON body
pub async fn put(app: &mut TestApp, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
    send(app, "PUT", uri, Some(token), Some(body)).await
}

/// Shorthand for an authenticated DELETE
pub async fn delete(app: &mut TestApp, uri: &str, token: &str) -> (StatusCode, Value) {
    send(app, "DELETE", uri, Some(token), None).await
}

/// Registers an account and returns the created user
pub async fn register(app: &mut TestApp, email: &str, name: &str) -> Value {
    let (status, user) = send(
        app,
        "POST",
        "/api/register",
        None,
        Some(json!({ "email": email, "name": name, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "register failed: {}", user);
    user
}

/// Signs in and returns the session token
pub async fn login(app: &mut TestApp, email: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/login",
        None,
        Some(json!({ "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

/// Registers the first account, which becomes the admin, and signs it in
pub async fn admin_token(app: &mut TestApp) -> String {
    let user = register(app, "admin@example.com", "Admin").await;
    assert_eq!(user["role"], "admin");
    login(app, "admin@example.com").await
}

/// Registers an account, has the admin give it `role`, and signs it in
///
/// ### Returns
///
/// The user's id and session token
pub async fn user_with_role(app: &mut TestApp, admin: &str, email: &str, role: &str) -> (String, String) {
    let user = register(app, email, email).await;
    let id = user["id"].as_str().unwrap().to_string();
    if role != "user" {
        let (status, _) = put(app, &format!("/api/users/{}", id), admin, json!({ "role": role })).await;
        assert_eq!(status, StatusCode::OK);
    }
    let token = login(app, email).await;
    (id, token)
}

/// Creates an asset type and returns its id
pub async fn create_asset_type(app: &mut TestApp, token: &str, name: &str) -> String {
    let (status, body) = post(app, "/api/asset-types", token, json!({ "name": name })).await;
    assert_eq!(status, StatusCode::OK, "create asset type failed: {}", body);
    body["id"].as_str().unwrap().to_string()
}

/// Creates a location and returns its id
pub async fn create_location(app: &mut TestApp, token: &str, name: &str) -> String {
    let (status, body) = post(app, "/api/locations", token, json!({ "name": name })).await;
    assert_eq!(status, StatusCode::OK, "create location failed: {}", body);
    body["id"].as_str().unwrap().to_string()
}

/// Creates a three-year asset bought on 2024-01-01 for 3000
pub async fn create_asset(app: &mut TestApp, token: &str, asset_type_id: &str, serial: &str) -> Value {
    let (status, body) = post(
        app,
        "/api/assets",
        token,
        json!({
            "name": format!("Laptop {}", serial),
            "serial_number": serial,
            "asset_type_id": asset_type_id,
            "purchase_date": "2024-01-01",
            "purchase_cost": 3000.0,
            "useful_life_years": 3
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create asset failed: {}", body);
    body
}

/// Creates an employee and returns its id
pub async fn create_employee(app: &mut TestApp, token: &str, email: &str) -> String {
    let (status, body) = post(
        app,
        "/api/employees",
        token,
        json!({ "first_name": "Dana", "last_name": "Reyes", "email": email }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create employee failed: {}", body);
    body["id"].as_str().unwrap().to_string()
}

/// Creates an inventory item and returns it
pub async fn create_inventory(
    app: &mut TestApp,
    token: &str,
    sku: &str,
    quantity: i32,
    min_quantity: i32,
    unit_cost: f64,
) -> Value {
    let (status, body) = post(
        app,
        "/api/inventory",
        token,
        json!({
            "name": format!("Part {}", sku),
            "sku": sku,
            "quantity": quantity,
            "min_quantity": min_quantity,
            "unit_cost": unit_cost
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create inventory failed: {}", body);
    body
}
