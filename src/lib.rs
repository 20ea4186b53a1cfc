//! library_lending Library
//!
//! Re-exports modules for integration testing and the server binary.

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
mod error;
pub mod lending;
pub mod store;

pub use config::Config;
pub use domain::{Book, Clock, LendingError, ManualClock, Member, SystemClock};
pub use error::{AppError, AppResult, ErrorResponse};
pub use lending::{LendingEngine, PenaltyWorker};
pub use store::{CatalogStore, InMemoryCatalog, PgCatalogStore, StoreError};
