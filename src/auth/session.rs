//! Opaque session tokens
//!
//! The client holds a random token; the database only ever sees its SHA-256
//! digest, so a leaked sessions table cannot be replayed.

use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use sha2::{Digest, Sha256};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "assetdesk_session";

/// Generates a new random session token (32 bytes, base64url without padding)
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Digest under which a token's session is stored
pub fn digest_token(token: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()))
}

/// Builds the cookie that hands a token to a browser
pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

/// Builds the cookie used to clear the session cookie
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}
