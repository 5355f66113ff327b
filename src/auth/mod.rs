//! Session authentication and role checks
//!
//! A request is authenticated by a session token, sent either as the
//! `assetdesk_session` cookie (browsers) or as `Authorization: Bearer`
//! (the CLI). Roles are ordered, see [`Role::at_least`](crate::models::Role::at_least).

mod extractors;
mod password;
mod session;

pub use extractors::{require_role, CurrentUser, RequireAdmin, RequireManager, RequireMechanic};
pub use password::{
    hash_password, hash_password_blocking, validate_password, verify_password, verify_password_blocking,
    MIN_PASSWORD_LENGTH,
};
pub use session::{digest_token, generate_session_token, removal_cookie, session_cookie, SESSION_COOKIE};

use axum::http::{header::AUTHORIZATION, HeaderMap};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::db::DbPool;
use crate::errors::ApiError;
use crate::models::{Role, Session, User};
use crate::{repo, AppState};

/// Pulls the session token out of the request, bearer header first
pub fn request_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = bearer_token(headers) {
        return Some(token.to_string());
    }
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolves the request's session token to its user
///
/// ### Errors
///
/// `Unauthorized` when there is no token, the token is unknown, or its
/// session has expired.
pub fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let token = request_token(headers).ok_or(ApiError::Unauthorized)?;
    let digest = digest_token(&token);
    match repo::find_session_user(&state.pool, &digest, Utc::now().naive_utc())? {
        Some(user) => Ok(user),
        None => {
            debug!("Rejected unknown or expired session token");
            Err(ApiError::Unauthorized)
        }
    }
}

/// Opens a session for `user_id` and returns the token to hand to the client
///
/// ### Errors
///
/// Returns an error if the session row cannot be written.
pub fn start_session(pool: &DbPool, user_id: &str, ttl: chrono::Duration) -> anyhow::Result<String> {
    let token = generate_session_token();
    let session = Session::new(digest_token(&token), user_id.to_string(), ttl);
    repo::create_session(pool, session)?;
    Ok(token)
}

/// Admits a caller of the cron endpoint
///
/// A bearer token equal to the configured cron secret is accepted; so is an
/// admin session, which lets operators trigger the sweep by hand.
pub fn authorize_cron(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    if let (Some(secret), Some(presented)) = (state.config.cron_secret.as_deref(), bearer_token(headers)) {
        if bool::from(secret.as_bytes().ct_eq(presented.as_bytes())) {
            return Ok(());
        }
    }

    match authenticate(state, headers) {
        Ok(user) => require_role(user, Role::Admin).map(|_| ()),
        Err(e) => {
            if state.config.cron_secret.is_some() {
                warn!("Cron endpoint called without a valid secret");
            }
            Err(e)
        }
    }
}
