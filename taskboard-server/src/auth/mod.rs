//! Authentication: bcrypt password hashes and signed bearer tokens.

pub mod password;
pub mod tokens;

pub use password::{hash_password, verify_password};
pub use tokens::{issue_token, verify_token, Claims};

/// Authentication error
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("token subject is not a user id")]
    InvalidSubject,

    #[error("token expiry does not fit in a timestamp")]
    ExpiryOverflow,

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("password hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
