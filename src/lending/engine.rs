//! Lending Engine
//!
//! Enforces the borrow and return rules against a `CatalogStore` and owns
//! the penalty schedule.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, Notify};

use crate::domain::{Book, Clock, LendingError, Member, SystemClock};
use crate::store::CatalogStore;

use super::{BorrowCommand, ReturnCommand, ReturnResult};

/// Maximum number of books a member may hold at once
pub const MAX_BORROWED_BOOKS: usize = 2;

/// Returns later than this many days are penalized
pub const LATE_RETURN_GRACE_DAYS: i64 = 7;

/// How long a late-return penalty bars a member from borrowing
pub const PENALTY_DURATION_DAYS: i64 = 3;

pub fn penalty_duration() -> Duration {
    Duration::days(PENALTY_DURATION_DAYS)
}

/// Borrow/return rules over an injected store.
///
/// Every state-changing operation runs under one gate, so the checks and the
/// writes that follow them see a consistent catalog.
pub struct LendingEngine {
    store: Arc<dyn CatalogStore>,
    clock: Arc<dyn Clock>,
    gate: Mutex<()>,
    penalty_scheduled: Notify,
}

impl LendingEngine {
    /// Create an engine reading wall-clock time
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn CatalogStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            gate: Mutex::new(()),
            penalty_scheduled: Notify::new(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Woken whenever a new penalty is scheduled
    pub(crate) fn penalty_scheduled(&self) -> &Notify {
        &self.penalty_scheduled
    }

    // =========================================================================
    // Borrow
    // =========================================================================

    /// Lend one copy of a book.
    ///
    /// Checks run in a fixed order and the first failure wins: member, book,
    /// borrow limit, stock, penalty.
    pub async fn borrow(&self, command: BorrowCommand) -> Result<(), LendingError> {
        let _gate = self.gate.lock().await;

        let member = self.load_member(&command.member_code).await?;
        let book = self.load_book(&command.book_code).await?;

        if member.borrowed_count() >= MAX_BORROWED_BOOKS {
            return Err(LendingError::BorrowLimitExceeded {
                member_code: member.code,
            });
        }

        if !book.is_available() {
            return Err(LendingError::OutOfStock { book_code: book.code });
        }

        if member.penalty {
            return Err(LendingError::MemberPenalized {
                member_code: member.code,
            });
        }

        self.store.record_loan(&member.code, &book.code).await?;

        tracing::info!(
            member_code = %member.code,
            book_code = %book.code,
            stock_left = book.stock - 1,
            "Book borrowed"
        );

        Ok(())
    }

    // =========================================================================
    // Return
    // =========================================================================

    /// Take back one copy of a book, penalizing the member if it is overdue
    /// beyond the grace period.
    pub async fn return_book(&self, command: ReturnCommand) -> Result<ReturnResult, LendingError> {
        let _gate = self.gate.lock().await;

        let member = self.load_member(&command.member_code).await?;
        let book = self.load_book(&command.book_code).await?;

        if !member.holds(&book.code) {
            return Err(LendingError::BookNotBorrowed {
                member_code: member.code,
                book_code: book.code,
            });
        }

        let penalty_expires_at = if command.days_late > LATE_RETURN_GRACE_DAYS {
            Some(self.clock.now() + penalty_duration())
        } else {
            None
        };

        self.store
            .record_return(&member.code, &book.code, penalty_expires_at)
            .await?;

        if let Some(expires_at) = penalty_expires_at {
            self.penalty_scheduled.notify_one();
            tracing::info!(member_code = %member.code, %expires_at, "Penalty imposed");
        }

        tracing::info!(
            member_code = %member.code,
            book_code = %book.code,
            days_late = command.days_late,
            penalized = penalty_expires_at.is_some(),
            "Book returned"
        );

        Ok(ReturnResult { penalty_expires_at })
    }

    // =========================================================================
    // Penalty expiry
    // =========================================================================

    /// Clear the penalty of every member whose last pending hold has expired.
    /// Returns the codes of the members released.
    pub async fn release_expired_penalties(&self) -> Result<Vec<String>, LendingError> {
        let _gate = self.gate.lock().await;

        let now = self.clock.now();
        let released = self.store.release_expired_penalties(now).await?;
        for member_code in &released {
            tracing::info!(member_code = %member_code, "Penalty lifted");
        }

        Ok(released)
    }

    /// Earliest moment a pending penalty is due to be lifted
    pub async fn next_penalty_expiry(&self) -> Result<Option<DateTime<Utc>>, LendingError> {
        Ok(self.store.next_hold_expiry().await?)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn list_books(&self) -> Result<Vec<Book>, LendingError> {
        Ok(self.store.list_books().await?)
    }

    pub async fn list_members(&self) -> Result<Vec<Member>, LendingError> {
        Ok(self.store.list_members().await?)
    }

    async fn load_member(&self, code: &str) -> Result<Member, LendingError> {
        self.store
            .find_member(code)
            .await?
            .ok_or_else(|| LendingError::member_not_found(code))
    }

    async fn load_book(&self, code: &str) -> Result<Book, LendingError> {
        self.store
            .find_book(code)
            .await?
            .ok_or_else(|| LendingError::book_not_found(code))
    }
}
