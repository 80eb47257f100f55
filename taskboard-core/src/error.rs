//! Structured error types for taskboard-core.
//!
//! The core crate performs no I/O, so every error here is a rejected input.
//! Server code maps these onto validation responses; the CLI wraps them with
//! `anyhow` context.

use thiserror::Error;

use crate::position::Position;

/// Main error type for taskboard-core operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Position outside `1..=Position::MAX`
    #[error("position must be between 1 and {max}, got {value}")]
    InvalidPosition { value: i64, max: u32 },

    /// Appending past the largest representable position
    #[error("parent is full: no position after {last}")]
    PositionOverflow { last: Position },
}

/// Result type alias for taskboard-core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Create an invalid position error for a raw value
    pub fn invalid_position(value: i64) -> Self {
        Self::InvalidPosition {
            value,
            max: Position::MAX,
        }
    }
}
