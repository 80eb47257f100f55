//! Domain models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod credentials;
pub mod order;
pub mod text;
pub mod validation;

pub use credentials::{Email, Password};
pub use order::RequestedOrder;
pub use text::{Description, Title};
pub use validation::ValidationError;
