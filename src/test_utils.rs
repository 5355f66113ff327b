use crate::*;
use crate::models::{Asset, Employee, Inventory, Role, User};
use proptest::prelude::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use diesel::RunQueryDsl;
use std::sync::Arc;
use tower::ServiceExt;

/// Sets up a test database with migrations applied
///
/// This function:
/// 1. Creates an in-memory SQLite database
/// 2. Runs all migrations to set up the schema
///
/// Foreign keys are switched on by the pool's connection customizer.
///
/// ### Returns
///
/// An Arc-wrapped database connection pool connected to the in-memory database
pub fn setup_test_db() -> Arc<db::DbPool> {
    // Plain ":memory:" gives each connection its own database, so use a unique
    // shared-cache URI that every connection in this pool (and only this pool) sees.
    let unique_id = uuid::Uuid::new_v4();
    let database_url = format!("file:test_{}?mode=memory&cache=shared", unique_id);
    let pool = db::init_pool(&database_url).expect("Failed to create pool");

    let mut conn = pool.get().expect("Failed to get connection");
    db::run_migrations(&mut conn).expect("Failed to run migrations");
    drop(conn);

    Arc::new(pool)
}

/// Sets up a migrated database in a temporary file
///
/// Unlike the in-memory database, a file gives every pooled connection its
/// own SQLite locks, which is what concurrent writers see in production.
/// Keep the returned directory alive for as long as the pool is used.
pub fn setup_file_test_db() -> (tempfile::TempDir, Arc<db::DbPool>) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let database_url = dir.path().join("assetdesk-test.db").to_string_lossy().to_string();
    let pool = db::init_pool(&database_url).expect("Failed to create pool");

    let mut conn = pool.get().expect("Failed to get connection");
    db::run_migrations(&mut conn).expect("Failed to run migrations");
    drop(conn);

    (dir, Arc::new(pool))
}

/// Builds an application state around a fresh test database
pub fn setup_test_state() -> AppState {
    AppState::new(setup_test_db(), config::base_config(None))
}

/// Inserts a user with the given role directly, bypassing registration
///
/// The password is always `password123`.
pub fn seed_user(pool: &db::DbPool, email: &str, role: Role) -> User {
    let hash = auth::hash_password("password123").expect("Failed to hash password");
    let user = User::new(email, email.to_string(), hash, role);
    let conn = &mut pool.get().expect("Failed to get connection");
    diesel::insert_into(schema::users::table)
        .values(&user)
        .execute(conn)
        .expect("Failed to insert user");
    user
}

/// A create request for a three-year asset bought on 2024-01-01 for 3000
pub fn asset_dto(asset_type_id: &str, serial_number: &str) -> dto::CreateAssetDto {
    dto::CreateAssetDto {
        name: format!("Asset {}", serial_number),
        serial_number: serial_number.to_string(),
        asset_type_id: asset_type_id.to_string(),
        location_id: None,
        status: None,
        purchase_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        purchase_cost: 3000.0,
        salvage_value: 0.0,
        useful_life_years: 3,
        notes: None,
    }
}

/// Inserts an asset (and a fresh asset type for it)
pub fn seed_asset(pool: &db::DbPool, serial_number: &str) -> Asset {
    let asset_type = repo::create_asset_type(pool, format!("Type for {}", serial_number), None)
        .expect("Failed to create asset type");
    repo::create_asset(pool, &asset_dto(&asset_type.id, serial_number), None)
        .expect("Failed to create asset")
}

/// Inserts an employee with the given email
pub fn seed_employee(pool: &db::DbPool, email: &str) -> Employee {
    let dto = dto::CreateEmployeeDto {
        first_name: "Test".to_string(),
        last_name: email.to_string(),
        email: email.to_string(),
        phone: None,
        department: None,
        position: None,
        user_id: None,
    };
    repo::create_employee(pool, &dto).expect("Failed to create employee")
}

/// Inserts an inventory item
pub fn seed_inventory(pool: &db::DbPool, sku: &str, quantity: i32, min_quantity: i32, unit_cost: f64) -> Inventory {
    let dto = dto::CreateInventoryDto {
        name: format!("Part {}", sku),
        sku: sku.to_string(),
        quantity,
        min_quantity,
        unit_cost,
        location_id: None,
    };
    repo::create_inventory(pool, &dto).expect("Failed to create inventory")
}

use diesel::sql_types::Text;
use diesel::QueryableByName;

#[derive(QueryableByName, Debug)]
struct TableName {
    #[diesel(sql_type = Text)]
    name: String,
}

/// Tests the setup_test_db function
///
/// This test verifies that:
/// 1. The test database can be created and connected to
/// 2. The database has the expected tables
/// 3. The health endpoint answers on a router built over it
#[tokio::test]
async fn test_setup_test_db() {
    let pool = setup_test_db();
    let mut conn = pool.get().unwrap();

    let table_names: Vec<TableName> = diesel::sql_query("SELECT name FROM sqlite_master WHERE type='table'")
        .load(&mut conn)
        .expect("Failed to load table names");

    let expected_tables = vec![
        "users", "sessions", "employees", "asset_types", "locations", "assets",
        "asset_location_history", "inventory", "maintenance", "maintenance_inventory",
        "check_in_out", "activity_logs", "notifications",
        "__diesel_schema_migrations",
    ];

    for table in expected_tables {
        let exists = table_names.iter().any(|t| t.name == table);
        assert!(exists, "Table '{}' not found in database", table);

        let query = format!("SELECT COUNT(*) FROM {}", table);
        let result = diesel::sql_query(&query).execute(&mut conn);
        assert!(result.is_ok(), "Failed to query table '{}': {:?}", table, result.err());
    }

    drop(conn);

    let app = create_app(AppState::new(pool, config::base_config(None)));
    let request = Request::builder()
        .uri("/health")
        .method("GET")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

/// Generates an arbitrary calendar date between 2000 and roughly 2040
pub fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0i64..(40 * 366)).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2000, 1, 1).unwrap() + chrono::Duration::days(offset)
    })
}

/// Generates a positive purchase price
///
/// Whole cents keep the arithmetic in a range where tolerances stay small.
pub fn arb_money() -> impl Strategy<Value = f64> {
    (100u64..100_000_000u64).prop_map(|cents| cents as f64 / 100.0)
}

/// Generates strings with whitespace, unicode and punctuation mixed in
pub fn arb_messy_string() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 ]{0,20}",
        "\\PC{0,20}",
        Just(String::new()),
        Just("   ".to_string()),
        Just("O'Brien \"quoted\" <tag>".to_string()),
    ]
}

/// Generates a password of acceptable length
pub fn arb_password() -> impl Strategy<Value = String> {
    "[ -~]{8,24}"
}
