//! bcrypt password hashing, run off the async workers.

use crate::models::Password;

use super::AuthError;

/// Hash a password with the given bcrypt cost.
pub async fn hash_password(password: &Password, cost: u32) -> Result<String, AuthError> {
    let plain = password.expose().to_owned();
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost)).await??;
    Ok(hash)
}

/// Check a password against a stored hash.
///
/// A malformed stored hash counts as a mismatch so login failures stay
/// indistinguishable to the caller.
pub async fn verify_password(password: &Password, hash: &str) -> Result<bool, AuthError> {
    let plain = password.expose().to_owned();
    let hash = hash.to_owned();
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hash)).await?;
    match matches {
        Ok(matches) => Ok(matches),
        Err(err) => {
            tracing::warn!(error = %err, "stored password hash is unreadable");
            Ok(false)
        }
    }
}
