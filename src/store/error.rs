//! Catalog Store Errors

/// Errors that can occur in a catalog store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No book with this code
    #[error("Book not found: {0}")]
    BookNotFound(String),

    /// No member with this code
    #[error("Member not found: {0}")]
    MemberNotFound(String),

    /// Stock update would leave a negative count
    #[error("Stock of {code} cannot go below zero: current {current}, delta {delta}")]
    NegativeStock {
        code: String,
        current: i64,
        delta: i64,
    },

    /// Member holds no copy of the book
    #[error("Member {member_code} has no loan of {book_code}")]
    LoanNotFound {
        member_code: String,
        book_code: String,
    },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored data violates a model invariant
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Store-wide Result type
pub type StoreResult<T> = Result<T, StoreError>;
