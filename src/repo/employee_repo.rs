use crate::db::DbPool;
use crate::dto::{CreateEmployeeDto, UpdateEmployeeDto};
use crate::errors::DomainError;
use crate::models::{normalize_email, Employee};
use crate::schema::employees;
use anyhow::Result;
use chrono::Utc;
use diesel::prelude::*;
use tracing::{debug, info, instrument};

/// Creates a new employee
///
/// ### Arguments
///
/// * `pool` - A reference to the database connection pool
/// * `dto` - The employee's details; `user_id` optionally links a user account
///
/// ### Returns
///
/// A Result containing the newly created Employee
///
/// ### Errors
///
/// Returns an error if:
/// - Unable to get a connection from the pool
/// - The email or linked user is already taken (unique violation)
/// - The linked user does not exist (foreign key violation)
#[instrument(skip(pool, dto), fields(email = %dto.email))]
pub fn create_employee(pool: &DbPool, dto: &CreateEmployeeDto) -> Result<Employee> {
    debug!("Creating new employee");

    let conn = &mut pool.get()?;

    let mut employee = Employee::new(dto.first_name.clone(), dto.last_name.clone(), &dto.email);
    employee.phone = dto.phone.clone();
    employee.department = dto.department.clone();
    employee.position = dto.position.clone();
    employee.user_id = dto.user_id.clone();

    diesel::insert_into(employees::table)
        .values(&employee)
        .execute(conn)?;

    info!("Successfully created employee with id: {}", employee.id);
    Ok(employee)
}

/// Retrieves an employee by ID
#[instrument(skip(pool), fields(employee_id = %id))]
pub fn get_employee(pool: &DbPool, id: &str) -> Result<Option<Employee>> {
    let conn = &mut pool.get()?;
    let result = employees::table
        .find(id)
        .select(Employee::as_select())
        .first(conn)
        .optional()?;
    Ok(result)
}

/// Lists every employee, ordered by last then first name
#[instrument(skip(pool))]
pub fn list_employees(pool: &DbPool) -> Result<Vec<Employee>> {
    let conn = &mut pool.get()?;
    let result = employees::table
        .order((employees::last_name.asc(), employees::first_name.asc()))
        .select(Employee::as_select())
        .load(conn)?;
    info!("Retrieved {} employees", result.len());
    Ok(result)
}

/// Applies a partial update to an employee
#[instrument(skip(pool, update), fields(employee_id = %id))]
pub fn update_employee(pool: &DbPool, id: &str, update: &UpdateEmployeeDto) -> Result<Employee> {
    let conn = &mut pool.get()?;

    let mut employee: Employee = employees::table
        .find(id)
        .select(Employee::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| DomainError::not_found("Employee", id))?;

    if let Some(first_name) = &update.first_name {
        employee.first_name = first_name.clone();
    }
    if let Some(last_name) = &update.last_name {
        employee.last_name = last_name.clone();
    }
    if let Some(email) = &update.email {
        employee.email = normalize_email(email);
    }
    if let Some(phone) = &update.phone {
        employee.phone = Some(phone.clone());
    }
    if let Some(department) = &update.department {
        employee.department = Some(department.clone());
    }
    if let Some(position) = &update.position {
        employee.position = Some(position.clone());
    }
    if let Some(user_id) = &update.user_id {
        employee.user_id = Some(user_id.clone());
    }
    employee.updated_at = Utc::now().naive_utc();

    diesel::update(employees::table.find(id))
        .set(&employee)
        .execute(conn)?;

    info!("Updated employee");
    Ok(employee)
}

/// Deletes an employee
///
/// ### Errors
///
/// Returns `DomainError::NotFound` if the employee does not exist, or a
/// foreign key violation while checkouts still reference them.
#[instrument(skip(pool), fields(employee_id = %id))]
pub fn delete_employee(pool: &DbPool, id: &str) -> Result<()> {
    let conn = &mut pool.get()?;
    let deleted = diesel::delete(employees::table.find(id)).execute(conn)?;
    if deleted == 0 {
        return Err(DomainError::not_found("Employee", id).into());
    }
    info!("Deleted employee");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    fn dto(first: &str, last: &str, email: &str) -> CreateEmployeeDto {
        CreateEmployeeDto {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: email.to_string(),
            phone: None,
            department: Some("Operations".to_string()),
            position: None,
            user_id: None,
        }
    }

    #[test]
    fn test_employee_crud() {
        let pool = setup_test_db();

        let created = create_employee(&pool, &dto("Grace", "Hopper", "Grace@Navy.mil")).unwrap();
        assert_eq!(created.email, "grace@navy.mil");
        assert_eq!(get_employee(&pool, &created.id).unwrap().unwrap(), created);

        let update = UpdateEmployeeDto { position: Some("Rear Admiral".into()), ..Default::default() };
        let updated = update_employee(&pool, &created.id, &update).unwrap();
        assert_eq!(updated.position.as_deref(), Some("Rear Admiral"));
        assert_eq!(updated.department.as_deref(), Some("Operations"));

        delete_employee(&pool, &created.id).unwrap();
        assert!(get_employee(&pool, &created.id).unwrap().is_none());
    }

    #[test]
    fn test_list_is_sorted_by_name() {
        let pool = setup_test_db();
        create_employee(&pool, &dto("Alan", "Turing", "alan@example.com")).unwrap();
        create_employee(&pool, &dto("Ada", "Lovelace", "ada@example.com")).unwrap();

        let names: Vec<String> = list_employees(&pool).unwrap().iter().map(Employee::full_name).collect();
        assert_eq!(names, vec!["Ada Lovelace", "Alan Turing"]);
    }

    #[test]
    fn test_unknown_linked_user_is_rejected() {
        let pool = setup_test_db();
        let mut with_user = dto("Ken", "Thompson", "ken@example.com");
        with_user.user_id = Some("no-such-user".to_string());
        assert!(create_employee(&pool, &with_user).is_err());
    }

    #[test]
    fn test_duplicate_email_is_rejected() {
        let pool = setup_test_db();
        create_employee(&pool, &dto("A", "One", "same@example.com")).unwrap();
        assert!(create_employee(&pool, &dto("B", "Two", "SAME@example.com")).is_err());
    }
}
