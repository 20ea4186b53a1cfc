//! Domain module
//!
//! Core catalog types, lending errors and the time source.

pub mod clock;
pub mod error;
pub mod model;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::LendingError;
pub use model::{Book, Member};
