use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json
};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;
use tracing::{debug, error, warn};

/// Rule violations raised by the repository layer
///
/// Repository functions return `anyhow::Result`; these are wrapped inside the
/// `anyhow::Error` and recovered by `ApiError::from`.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("{0}")]
    InvalidState(String),
    #[error("{0}")]
    Validation(String),
    #[error("Insufficient stock for {sku}: requested {requested}, available {available}")]
    InsufficientStock { sku: String, requested: i32, available: i32 },
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: &str) -> Self {
        DomainError::NotFound { entity, id: id.to_string() }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(anyhow::Error),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Authentication required")]
    Unauthorized,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Insufficient permissions")]
    Forbidden,
    #[error("Method not allowed")]
    MethodNotAllowed,
}

impl ApiError {
    /// Generic 404 for a resource nobody needs to name
    pub fn not_found() -> Self {
        ApiError::NotFound("Resource not found".to_string())
    }
}

/// Human message for a unique constraint, keyed on the column SQLite reports
fn unique_violation_message(details: &str) -> String {
    let message = if details.contains("users.email") {
        "An account with this email address already exists"
    } else if details.contains("employees.email") {
        "An employee with this email address already exists"
    } else if details.contains("employees.user_id") {
        "This user is already linked to another employee"
    } else if details.contains("assets.serial_number") {
        "An asset with this serial number already exists"
    } else if details.contains("inventory.sku") {
        "An inventory item with this SKU already exists"
    } else if details.contains("asset_types.name") {
        "An asset type with this name already exists"
    } else if details.contains("locations.name") {
        "A location with this name already exists"
    } else {
        "Resource already exists"
    };
    message.to_string()
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(domain) = err.downcast_ref::<DomainError>() {
            return match domain {
                DomainError::NotFound { .. } => ApiError::NotFound(domain.to_string()),
                DomainError::InvalidState(_)
                | DomainError::Validation(_)
                | DomainError::InsufficientStock { .. } => ApiError::BadRequest(domain.to_string()),
            };
        }

        if let Some(db_err) = err.downcast_ref::<DieselError>() {
            match db_err {
                DieselError::NotFound => return ApiError::not_found(),
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                    return ApiError::Conflict(unique_violation_message(info.message()));
                }
                DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                    return ApiError::Conflict(
                        "Referenced record does not exist or is still in use".to_string(),
                    );
                }
                DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, _) => {
                    return ApiError::BadRequest("Invalid data provided".to_string());
                }
                _ => {}
            }
        }

        ApiError::Database(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Database(err) => {
                error!("Internal error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => {
                warn!("Conflict: {}", msg);
                (StatusCode::CONFLICT, msg)
            }
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Authentication required".to_string()),
            ApiError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid email or password".to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Insufficient permissions".to_string()),
            ApiError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string()),
        };

        if status.is_client_error() {
            debug!(status = %status, "Client error: {}", message);
        }

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
