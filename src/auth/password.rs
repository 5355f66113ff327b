//! Password hashing with Argon2id

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::Rng;

/// Shortest password accepted at registration
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Hashes a password using Argon2id
///
/// ### Returns
///
/// The password hash as a PHC string, salt and parameters included.
///
/// ### Errors
///
/// Returns an error if the hasher rejects its input.
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    rand::rng().fill(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| anyhow!("Failed to encode salt: {}", e))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow!("Failed to hash password: {}", e))
}

/// Verifies a password against a stored PHC hash
///
/// ### Returns
///
/// `true` if the password matches, `false` otherwise.
///
/// ### Errors
///
/// Returns an error if the stored hash is not a valid PHC string.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| anyhow!("Invalid password hash format: {}", e))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow!("Failed to verify password: {}", e)),
    }
}

/// Hashes a password on tokio's blocking pool, off the async worker threads
pub async fn hash_password_blocking(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| anyhow!("Password hashing task failed: {}", e))?
}

/// Verifies a password on tokio's blocking pool
pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| anyhow!("Password verification task failed: {}", e))?
}

/// Checks a new password against the minimum requirements
///
/// ### Errors
///
/// Returns the message to show the user when the password is rejected.
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }
    Ok(())
}
