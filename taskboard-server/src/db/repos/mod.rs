//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Reads go straight to the pool, one JOIN per ownership check
//! - Anything touching positions runs in `Store::with_transaction`
//! - Constraint violations are mapped, never pre-checked

pub mod boards;
pub mod cards;
pub mod lists;
pub mod users;

pub use boards::{Board, BoardRepo, BoardTree, ListWithCards};
pub use cards::{Card, CardPatch, CardRepo};
pub use lists::{List, ListPatch, ListRepo};
pub use users::{User, UserRepo};
