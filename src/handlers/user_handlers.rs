use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::auth::{CurrentUser, RequireAdmin};
use crate::db::DbPool;
use crate::dto::UpdateUserDto;
use crate::errors::ApiError;
use crate::models::{Role, User};
use crate::repo;

use super::common::record;

/// Handler for listing all users
///
/// This function handles GET requests to `/api/users`. Admins only.
#[instrument(skip_all)]
pub async fn list_users_handler(
    State(pool): State<Arc<DbPool>>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = repo::list_users(&pool)?;
    debug!("Listed {} users", users.len());
    Ok(Json(users))
}

/// Handler for retrieving a specific user
///
/// This function handles GET requests to `/api/users/{id}`. Admins only.
#[instrument(skip(pool, _admin), fields(user_id = %id))]
pub async fn get_user_handler(
    State(pool): State<Arc<DbPool>>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let user = repo::get_user(&pool, &id)?
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", id)))?;
    Ok(Json(user))
}

/// Handler for changing a user's name or role
///
/// This function handles PUT requests to `/api/users/{id}`. Admins only.
///
/// ### Arguments
///
/// * `pool` - The database connection pool
/// * `admin` - The admin making the change
/// * `id` - The user to change, extracted from the URL path
/// * `payload` - The new name and/or role
///
/// ### Returns
///
/// The updated user as JSON
#[instrument(skip(pool, admin, payload), fields(user_id = %id))]
pub async fn update_user_handler(
    State(pool): State<Arc<DbPool>>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserDto>,
) -> Result<Json<User>, ApiError> {
    if let Some(name) = &payload.name {
        if name.trim().is_empty() {
            return Err(ApiError::BadRequest("Name cannot be empty".to_string()));
        }
    }

    let user = repo::update_user(&pool, &id, &payload)?;
    record(&pool, &admin, "update", "user", &user.id, json!({ "name": payload.name, "role": payload.role }));

    info!("Updated user {}", user.id);
    Ok(Json(user))
}

/// Handler for deleting a user
///
/// This function handles DELETE requests to `/api/users/{id}`. Admins only,
/// and an admin cannot delete their own account.
#[instrument(skip(pool, admin), fields(user_id = %id))]
pub async fn delete_user_handler(
    State(pool): State<Arc<DbPool>>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if admin.id == id {
        return Err(ApiError::BadRequest("You cannot delete your own account".to_string()));
    }

    repo::delete_user(&pool, &id)?;
    record(&pool, &admin, "delete", "user", &id, json!({}));

    info!("Deleted user {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for listing the users maintenance can be assigned to
///
/// This function handles GET requests to `/api/mechanics`.
#[instrument(skip_all)]
pub async fn list_mechanics_handler(
    State(pool): State<Arc<DbPool>>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<Vec<User>>, ApiError> {
    let mechanics = repo::list_users_with_roles(&pool, &[Role::Mechanic])?;
    Ok(Json(mechanics))
}
