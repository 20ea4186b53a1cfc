//! Catalog Store module
//!
//! Authoritative holder of Book and Member records.
//! The lending engine only talks to the `CatalogStore` trait, so the
//! backing (in-memory or PostgreSQL) is chosen at startup.

mod error;
mod memory;
mod postgres;
pub mod seed;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Book, Member};

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryCatalog;
pub use postgres::PgCatalogStore;

/// Storage contract for the catalog.
///
/// The single-field primitives each touch one record. `record_loan`,
/// `record_return` and `release_expired_penalties` change several records
/// and must apply all of their writes or none.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_book(&self, code: &str) -> StoreResult<Option<Book>>;

    async fn find_member(&self, code: &str) -> StoreResult<Option<Member>>;

    /// All books in insertion order
    async fn list_books(&self) -> StoreResult<Vec<Book>>;

    /// All members in insertion order
    async fn list_members(&self) -> StoreResult<Vec<Member>>;

    /// Add `delta` to the stock of a book and return the updated record.
    /// Fails with `NegativeStock` instead of going below zero.
    async fn update_book_stock(&self, code: &str, delta: i64) -> StoreResult<Book>;

    async fn add_borrowed_book(&self, member_code: &str, book_code: &str) -> StoreResult<()>;

    /// Remove one loan of `book_code`; `LoanNotFound` if the member has none
    async fn remove_borrowed_book(&self, member_code: &str, book_code: &str) -> StoreResult<()>;

    async fn set_penalty(&self, member_code: &str, penalty: bool) -> StoreResult<()>;

    /// Lend one copy: decrement stock and append the loan
    async fn record_loan(&self, member_code: &str, book_code: &str) -> StoreResult<()>;

    /// Take back one copy: remove the oldest matching loan and increment stock.
    /// With `penalty_until`, also flag the member and add a hold expiring then.
    async fn record_return(
        &self,
        member_code: &str,
        book_code: &str,
        penalty_until: Option<DateTime<Utc>>,
    ) -> StoreResult<()>;

    /// Drop every hold with `expires_at <= now` and clear the flag of each
    /// member left without a hold. Returns those members.
    async fn release_expired_penalties(&self, now: DateTime<Utc>) -> StoreResult<Vec<String>>;

    /// Earliest pending hold expiry, if any
    async fn next_hold_expiry(&self) -> StoreResult<Option<DateTime<Utc>>>;
}
