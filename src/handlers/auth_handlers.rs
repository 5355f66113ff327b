use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;
use tracing::{debug, info, instrument};

use crate::auth::{self, CurrentUser};
use crate::dto::{LoginDto, LoginResponse, RegisterDto};
use crate::errors::ApiError;
use crate::models::User;
use crate::{repo, AppState};

use super::common::record;

/// Handler for registering a new account
///
/// This function handles POST requests to `/api/register`.
/// The first account ever registered becomes an admin.
///
/// ### Arguments
///
/// * `state` - The application state
/// * `jar` - The request's cookies, returned with the new session cookie added
/// * `payload` - The email, display name and password
///
/// ### Returns
///
/// The new user as JSON, with the session cookie set
#[instrument(skip(state, jar, payload), fields(email = %payload.email))]
pub async fn register_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<RegisterDto>,
) -> Result<(CookieJar, Json<User>), ApiError> {
    info!("Registering new account");

    let email = payload.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest("A valid email address is required".to_string()));
    }
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Name is required".to_string()));
    }
    auth::validate_password(&payload.password).map_err(ApiError::BadRequest)?;

    let password_hash = auth::hash_password_blocking(payload.password).await?;
    let user = repo::create_user(&state.pool, email, name.to_string(), password_hash)?;

    let token = auth::start_session(&state.pool, &user.id, state.config.session_ttl())?;
    record(&state.pool, &user, "register", "user", &user.id, json!({ "role": user.role }));

    info!("Registered user {} as {}", user.id, user.role);
    Ok((jar.add(auth::session_cookie(token)), Json(user)))
}

/// Handler for signing in
///
/// This function handles POST requests to `/api/login`.
///
/// ### Returns
///
/// The user and the session token as JSON, with the session cookie set.
/// An unknown email and a wrong password get the same 401.
#[instrument(skip(state, jar, payload), fields(email = %payload.email))]
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginDto>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    debug!("Login attempt");

    let user = repo::get_user_by_email(&state.pool, &payload.email)?
        .ok_or(ApiError::InvalidCredentials)?;

    if !auth::verify_password_blocking(payload.password, user.password_hash.clone()).await? {
        debug!("Wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = auth::start_session(&state.pool, &user.id, state.config.session_ttl())?;
    record(&state.pool, &user, "login", "user", &user.id, json!({}));

    info!("User {} signed in", user.id);
    Ok((
        jar.add(auth::session_cookie(token.clone())),
        Json(LoginResponse { user, token }),
    ))
}

/// Handler for signing out
///
/// This function handles POST requests to `/api/logout`. The session is
/// deleted, so the token stops working everywhere, and the cookie is cleared.
#[instrument(skip_all)]
pub async fn logout_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), ApiError> {
    if let Some(token) = auth::request_token(&headers) {
        repo::delete_session(&state.pool, &auth::digest_token(&token))?;
    }
    record(&state.pool, &user, "logout", "user", &user.id, json!({}));

    info!("User signed out");
    Ok((jar.remove(auth::removal_cookie()), StatusCode::NO_CONTENT))
}

/// Handler for retrieving the signed-in user
///
/// This function handles GET requests to `/api/me`.
pub async fn me_handler(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}
