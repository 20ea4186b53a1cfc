//! Domain Error Types
//!
//! Outcomes of a rejected borrow or return.

use thiserror::Error;

use crate::store::StoreError;

/// Errors produced by the lending rules.
///
/// Display strings are the client-facing messages.
#[derive(Debug, Error)]
pub enum LendingError {
    #[error("Member not found")]
    MemberNotFound { code: String },

    #[error("Book not found")]
    BookNotFound { code: String },

    #[error("Member cannot borrow more than 2 books")]
    BorrowLimitExceeded { member_code: String },

    #[error("Book is out of stock")]
    OutOfStock { book_code: String },

    #[error("Member is currently penalized and cannot borrow books")]
    MemberPenalized { member_code: String },

    #[error("Member has not borrowed this book")]
    BookNotBorrowed {
        member_code: String,
        book_code: String,
    },

    /// Storage or I/O fault; the cause is never shown to clients
    #[error("Internal server error")]
    PersistenceFailure(#[from] StoreError),
}

impl LendingError {
    pub fn member_not_found(code: impl Into<String>) -> Self {
        Self::MemberNotFound { code: code.into() }
    }

    pub fn book_not_found(code: impl Into<String>) -> Self {
        Self::BookNotFound { code: code.into() }
    }

    /// Check if this error names a record that does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::MemberNotFound { .. } | Self::BookNotFound { .. })
    }

    /// Check if this is a client error (the request broke a lending rule)
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::PersistenceFailure(_))
    }
}
