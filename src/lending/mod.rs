//! Lending module
//!
//! Borrow/return rules, commands, and the penalty expiry worker.

mod commands;
mod engine;
pub mod penalty;


pub use commands::*;
pub use engine::{
    penalty_duration, LendingEngine, LATE_RETURN_GRACE_DAYS, MAX_BORROWED_BOOKS,
    PENALTY_DURATION_DAYS,
};
pub use penalty::{PenaltyWorker, PenaltyWorkerConfig};
