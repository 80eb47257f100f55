//! Email and password validation

use once_cell::sync::Lazy;
use regex::Regex;

use super::ValidationError;

/// Minimum password length on registration
const MIN_PASSWORD_LEN: usize = 8;

/// bcrypt only looks at the first 72 bytes
const MAX_PASSWORD_BYTES: usize = 72;

const MAX_EMAIL_LEN: usize = 254;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

/// Normalized (trimmed, lowercase) email address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email(String);

impl Email {
    /// Parse and normalize an email address.
    ///
    /// # Example
    /// ```
    /// use taskboard_server::models::Email;
    ///
    /// assert_eq!(Email::new(" Ada@Example.com ").unwrap().as_str(), "ada@example.com");
    /// assert!(Email::new("not-an-email").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let normalized = s.trim().to_lowercase();

        if normalized.is_empty() {
            return Err(ValidationError::Empty { field: "email" });
        }

        if normalized.len() > MAX_EMAIL_LEN {
            return Err(ValidationError::TooLong {
                field: "email",
                max: MAX_EMAIL_LEN,
            });
        }

        if !EMAIL_PATTERN.is_match(&normalized) {
            return Err(ValidationError::InvalidFormat {
                field: "email",
                reason: "must look like name@domain.tld",
            });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Plaintext password, only held long enough to hash or verify it.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    /// Password for a new account: at least 8 characters.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::TooShort {
                field: "password",
                min: MIN_PASSWORD_LEN,
            });
        }
        Self::login(s)
    }

    /// Password presented at login. Only emptiness and the bcrypt limit are
    /// checked, so accounts never lock out over a changed length rule.
    pub fn login(s: &str) -> Result<Self, ValidationError> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "password" });
        }
        if s.len() > MAX_PASSWORD_BYTES {
            return Err(ValidationError::TooLong {
                field: "password",
                max: MAX_PASSWORD_BYTES,
            });
        }
        Ok(Self(s.to_owned()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}
