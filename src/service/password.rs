use crate::error::SiteError;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand_core::OsRng;

/// Hash with Argon2id and a fresh random salt, returning the PHC string.
pub fn hash_password(password: &str) -> Result<String, SiteError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| SiteError::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, SiteError> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|e| SiteError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Hash of a random secret nobody knows. Verifying against it costs the same
/// as a real check and never matches.
pub fn decoy_hash() -> Result<String, SiteError> {
    hash_password(&crate::service::session_token::new_session_id())
}

/// Argon2 is deliberately slow; keep it off the async workers.
pub async fn hash_password_blocking(password: String) -> Result<String, SiteError> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

pub async fn verify_password_blocking(
    password: String,
    stored_hash: String,
) -> Result<bool, SiteError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash)).await?
}
