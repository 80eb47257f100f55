//! Database layer - connection pool, collection store and repositories
//!
//! # Design Principles
//!
//! - Connection pool with an explicit cap - no Arc<Mutex<Connection>>
//! - Ownership is one JOIN per lookup - no walking the hierarchy in Rust
//! - Positions change only inside `Store::with_transaction`, after the
//!   affected parent rows are locked
//! - Rely on DB constraints (deferred unique positions, unique email)

pub mod audit;
pub mod error;
pub mod ownership;
pub mod pool;
pub mod repos;
pub mod store;

pub use audit::DensityReport;
pub use error::DbError;
pub use ownership::Ownership;
pub use pool::{connect, pool_options};
pub use repos::*;
pub use store::{Collection, Store};
