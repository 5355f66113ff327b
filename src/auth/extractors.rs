//! Axum extractors for authentication and authorization

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use tracing::debug;

use crate::errors::ApiError;
use crate::models::{Role, User};
use crate::AppState;

use super::authenticate;

/// Any signed-in user
///
/// Rejects with 401 when no valid session token accompanies the request.
///
/// ```ignore
/// async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
///     Json(user)
/// }
/// ```
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let user = authenticate(&app_state, &parts.headers)?;
        Ok(CurrentUser(user))
    }
}

/// Fails with 403 unless `user` holds at least `required`
pub fn require_role(user: User, required: Role) -> Result<User, ApiError> {
    if user.role.at_least(required) {
        Ok(user)
    } else {
        debug!(user_id = %user.id, role = %user.role, required = %required, "Role check failed");
        Err(ApiError::Forbidden)
    }
}

/// Declares an extractor that admits users at or above a role
macro_rules! role_extractor {
    ($(#[$meta:meta])* $name:ident, $role:expr) => {
        $(#[$meta])*
        pub struct $name(pub User);

        impl<S> FromRequestParts<S> for $name
        where
            AppState: FromRef<S>,
            S: Send + Sync,
        {
            type Rejection = ApiError;

            async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
                let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
                require_role(user, $role).map($name)
            }
        }
    };
}

role_extractor!(
    /// A mechanic, manager or admin
    RequireMechanic,
    Role::Mechanic
);

role_extractor!(
    /// A manager or admin
    RequireManager,
    Role::Manager
);

role_extractor!(
    /// An admin
    RequireAdmin,
    Role::Admin
);
