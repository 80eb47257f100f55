//! Title and description validation

use super::ValidationError;

/// Maximum length for board, list and card titles
const MAX_TITLE_LEN: usize = 255;

/// Maximum length for card descriptions
const MAX_DESCRIPTION_LEN: usize = 10_000;

/// Validated title of a board, list or card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title(String);

impl Title {
    /// Create a new title.
    ///
    /// # Rules
    /// - Non-empty (after trimming whitespace)
    /// - Max 255 characters
    ///
    /// # Example
    /// ```
    /// use taskboard_server::models::Title;
    ///
    /// assert!(Title::new("Backlog").is_ok());
    /// assert!(Title::new("").is_err());
    /// assert!(Title::new("   ").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Empty { field: "title" });
        }

        if trimmed.chars().count() > MAX_TITLE_LEN {
            return Err(ValidationError::TooLong {
                field: "title",
                max: MAX_TITLE_LEN,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for Title {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Card description. Free text, may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description(String);

impl Description {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        if s.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(ValidationError::TooLong {
                field: "description",
                max: MAX_DESCRIPTION_LEN,
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Validate an optional description.
    pub fn optional(s: Option<&str>) -> Result<Option<Self>, ValidationError> {
        s.map(Self::new).transpose()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
