//! Command definitions
//!
//! Requests to change lending state, and their results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Command to lend one copy of a book to a member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowCommand {
    pub member_code: String,
    pub book_code: String,
}

impl BorrowCommand {
    pub fn new(member_code: impl Into<String>, book_code: impl Into<String>) -> Self {
        Self {
            member_code: member_code.into(),
            book_code: book_code.into(),
        }
    }
}

/// Command to take back one copy of a book from a member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnCommand {
    pub member_code: String,
    pub book_code: String,
    /// Days past the due date; anything above the grace period is penalized
    pub days_late: i64,
}

impl ReturnCommand {
    pub fn new(member_code: impl Into<String>, book_code: impl Into<String>) -> Self {
        Self {
            member_code: member_code.into(),
            book_code: book_code.into(),
            days_late: 0,
        }
    }

    pub fn with_days_late(mut self, days_late: i64) -> Self {
        self.days_late = days_late;
        self
    }
}

/// Result of a successful return
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnResult {
    /// Set when the return was late enough to penalize the member
    pub penalty_expires_at: Option<DateTime<Utc>>,
}

impl ReturnResult {
    pub fn penalized(&self) -> bool {
        self.penalty_expires_at.is_some()
    }
}
