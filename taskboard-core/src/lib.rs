//! taskboard-core: ordering engine for boards, lists and cards
//!
//! Pure domain logic with no storage dependency. The server crate applies the
//! plans computed here inside database transactions.

pub mod error;
pub mod layout;
pub mod position;
pub mod retry;

pub use error::{CoreError, Result};
pub use layout::{check_dense, compact, DensityViolation, Layout};
pub use position::{
    next_position, plan_move, plan_removal, MovePlan, Position, PositionRange, RangeShift, Slot,
};
#[cfg(feature = "rt")]
pub use retry::retry;
pub use retry::{RetryPolicy, Transient};
