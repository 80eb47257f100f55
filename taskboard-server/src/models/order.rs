//! Requested positions from request bodies

use taskboard_core::Position;

use super::ValidationError;

/// A requested 1-based position, validated before any lookup happens.
///
/// Values larger than the parent's append slot are accepted here and
/// clamped by the reorder engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestedOrder(Position);

impl RequestedOrder {
    /// # Example
    /// ```
    /// use taskboard_server::models::RequestedOrder;
    ///
    /// assert_eq!(RequestedOrder::new("newOrder", 2).unwrap().position().get(), 2);
    /// assert!(RequestedOrder::new("newOrder", 0).is_err());
    /// ```
    pub fn new(field: &'static str, value: i64) -> Result<Self, ValidationError> {
        Position::new(value)
            .map(Self)
            .map_err(|_| ValidationError::InvalidPosition { field, value })
    }

    pub fn position(self) -> Position {
        self.0
    }
}
