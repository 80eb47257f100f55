//! Signed bearer tokens (HS256 JWT).

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AuthError;
use crate::config::AuthConfig;

/// JWT claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at (Unix timestamp)
    pub iat: u64,
}

/// Issue a token identifying `user_id`, valid for `config.token_ttl`.
pub fn issue_token(config: &AuthConfig, user_id: Uuid) -> Result<String, AuthError> {
    let now = Utc::now().timestamp().max(0) as u64;
    let exp = now
        .checked_add(config.token_ttl.as_secs())
        .ok_or(AuthError::ExpiryOverflow)?;
    let claims = Claims {
        sub: user_id.to_string(),
        exp,
        iat: now,
    };

    let key = EncodingKey::from_secret(config.secret());
    Ok(encode(&Header::default(), &claims, &key)?)
}

/// Verify signature and expiry, returning the user id the token names.
pub fn verify_token(config: &AuthConfig, token: &str) -> Result<Uuid, AuthError> {
    let key = DecodingKey::from_secret(config.secret());
    let data = decode::<Claims>(token, &key, &Validation::default())?;
    Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::InvalidSubject)
}
