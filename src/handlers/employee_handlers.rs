use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::auth::{CurrentUser, RequireManager};
use crate::db::DbPool;
use crate::dto::{CreateEmployeeDto, UpdateEmployeeDto};
use crate::errors::ApiError;
use crate::models::Employee;
use crate::repo;

use super::common::{record, required_text};

/// Handler for creating a new employee
///
/// This function handles POST requests to `/api/employees`.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `user` - The manager creating the employee
/// * `payload` - The employee's details
///
/// ### Returns
///
/// The newly created employee as JSON
#[instrument(skip(pool, user, payload), fields(email = %payload.email))]
pub async fn create_employee_handler(
    State(pool): State<Arc<DbPool>>,
    RequireManager(user): RequireManager,
    Json(mut payload): Json<CreateEmployeeDto>,
) -> Result<Json<Employee>, ApiError> {
    info!("Creating new employee");

    payload.first_name = required_text("First name", &payload.first_name)?;
    payload.last_name = required_text("Last name", &payload.last_name)?;
    if !payload.email.contains('@') {
        return Err(ApiError::BadRequest("A valid email address is required".to_string()));
    }

    let employee = repo::create_employee(&pool, &payload)?;
    record(&pool, &user, "create", "employee", &employee.id, json!({ "name": employee.full_name() }));

    info!("Successfully created employee with id: {}", employee.id);
    Ok(Json(employee))
}

/// Handler for listing all employees
///
/// This function handles GET requests to `/api/employees`.
#[instrument(skip_all)]
pub async fn list_employees_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<Employee>>, ApiError> {
    let employees = repo::list_employees(&pool)?;
    Ok(Json(employees))
}

/// Handler for retrieving a specific employee
///
/// This function handles GET requests to `/api/employees/{id}`.
#[instrument(skip(pool, _user), fields(employee_id = %id))]
pub async fn get_employee_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(_user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Employee>, ApiError> {
    let employee = repo::get_employee(&pool, &id)?
        .ok_or_else(|| ApiError::NotFound(format!("Employee {} not found", id)))?;
    Ok(Json(employee))
}

/// Handler for updating an employee
///
/// This function handles PUT requests to `/api/employees/{id}`.
#[instrument(skip(pool, user, payload), fields(employee_id = %id))]
pub async fn update_employee_handler(
    State(pool): State<Arc<DbPool>>,
    RequireManager(user): RequireManager,
    Path(id): Path<String>,
    Json(payload): Json<UpdateEmployeeDto>,
) -> Result<Json<Employee>, ApiError> {
    if let Some(email) = &payload.email {
        if !email.contains('@') {
            return Err(ApiError::BadRequest("A valid email address is required".to_string()));
        }
    }

    let employee = repo::update_employee(&pool, &id, &payload)?;
    record(&pool, &user, "update", "employee", &id, json!({ "name": employee.full_name() }));

    info!("Updated employee {}", id);
    Ok(Json(employee))
}

/// Handler for deleting an employee
///
/// This function handles DELETE requests to `/api/employees/{id}`.
/// Employees with checkout history cannot be deleted (409).
#[instrument(skip(pool, user), fields(employee_id = %id))]
pub async fn delete_employee_handler(
    State(pool): State<Arc<DbPool>>,
    RequireManager(user): RequireManager,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    repo::delete_employee(&pool, &id)?;
    record(&pool, &user, "delete", "employee", &id, json!({}));

    info!("Deleted employee {}", id);
    Ok(StatusCode::NO_CONTENT)
}
