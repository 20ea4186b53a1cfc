//! In-memory catalog
//!
//! Process-local store. State (including pending penalty holds) is lost on restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::{Book, Member};

use super::seed::{seed_books, seed_members};
use super::{CatalogStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct CatalogState {
    books: Vec<Book>,
    members: Vec<Member>,
    /// (member code, expires at)
    holds: Vec<(String, DateTime<Utc>)>,
}

impl CatalogState {
    fn book_mut(&mut self, code: &str) -> StoreResult<&mut Book> {
        self.books
            .iter_mut()
            .find(|b| b.code == code)
            .ok_or_else(|| StoreError::BookNotFound(code.to_string()))
    }

    fn member_mut(&mut self, code: &str) -> StoreResult<&mut Member> {
        self.members
            .iter_mut()
            .find(|m| m.code == code)
            .ok_or_else(|| StoreError::MemberNotFound(code.to_string()))
    }

    fn apply_stock_delta(&mut self, code: &str, delta: i64) -> StoreResult<Book> {
        let book = self.book_mut(code)?;
        let current = i64::from(book.stock);
        let next = current + delta;
        if next < 0 {
            return Err(StoreError::NegativeStock {
                code: code.to_string(),
                current,
                delta,
            });
        }
        book.stock = u32::try_from(next)
            .map_err(|_| StoreError::Corrupt(format!("stock of {} overflows", code)))?;
        Ok(book.clone())
    }
}

/// Catalog held in process memory behind a single lock
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    state: RwLock<CatalogState>,
}

impl InMemoryCatalog {
    /// Create a catalog with the given records
    pub fn new(books: Vec<Book>, members: Vec<Member>) -> Self {
        Self {
            state: RwLock::new(CatalogState {
                books,
                members,
                holds: Vec::new(),
            }),
        }
    }

    /// Create a catalog holding the startup seed set
    pub fn seeded() -> Self {
        Self::new(seed_books(), seed_members())
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn find_book(&self, code: &str) -> StoreResult<Option<Book>> {
        let state = self.state.read().await;
        Ok(state.books.iter().find(|b| b.code == code).cloned())
    }

    async fn find_member(&self, code: &str) -> StoreResult<Option<Member>> {
        let state = self.state.read().await;
        Ok(state.members.iter().find(|m| m.code == code).cloned())
    }

    async fn list_books(&self) -> StoreResult<Vec<Book>> {
        Ok(self.state.read().await.books.clone())
    }

    async fn list_members(&self) -> StoreResult<Vec<Member>> {
        Ok(self.state.read().await.members.clone())
    }

    async fn update_book_stock(&self, code: &str, delta: i64) -> StoreResult<Book> {
        self.state.write().await.apply_stock_delta(code, delta)
    }

    async fn add_borrowed_book(&self, member_code: &str, book_code: &str) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state
            .member_mut(member_code)?
            .borrowed_books
            .push(book_code.to_string());
        Ok(())
    }

    async fn remove_borrowed_book(&self, member_code: &str, book_code: &str) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.member_mut(member_code)?.release(book_code) {
            Ok(())
        } else {
            Err(StoreError::LoanNotFound {
                member_code: member_code.to_string(),
                book_code: book_code.to_string(),
            })
        }
    }

    async fn set_penalty(&self, member_code: &str, penalty: bool) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.member_mut(member_code)?.penalty = penalty;
        Ok(())
    }

    async fn record_loan(&self, member_code: &str, book_code: &str) -> StoreResult<()> {
        let mut state = self.state.write().await;
        // Validate the member before touching stock so a failure leaves no trace
        state.member_mut(member_code)?;
        state.apply_stock_delta(book_code, -1)?;
        state
            .member_mut(member_code)?
            .borrowed_books
            .push(book_code.to_string());
        Ok(())
    }

    async fn record_return(
        &self,
        member_code: &str,
        book_code: &str,
        penalty_until: Option<DateTime<Utc>>,
    ) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.book_mut(book_code)?;
        if !state.member_mut(member_code)?.holds(book_code) {
            return Err(StoreError::LoanNotFound {
                member_code: member_code.to_string(),
                book_code: book_code.to_string(),
            });
        }

        // Stock is the only write that can fail, so it goes first
        state.apply_stock_delta(book_code, 1)?;
        let member = state.member_mut(member_code)?;
        member.release(book_code);
        if let Some(expires_at) = penalty_until {
            member.penalty = true;
            state.holds.push((member_code.to_string(), expires_at));
        }
        Ok(())
    }

    async fn release_expired_penalties(&self, now: DateTime<Utc>) -> StoreResult<Vec<String>> {
        let mut state = self.state.write().await;

        let mut expired: Vec<String> = Vec::new();
        state.holds.retain(|(member_code, expires_at)| {
            if *expires_at <= now {
                if !expired.contains(member_code) {
                    expired.push(member_code.clone());
                }
                false
            } else {
                true
            }
        });

        let released: Vec<String> = expired
            .into_iter()
            .filter(|code| !state.holds.iter().any(|(held, _)| held == code))
            .collect();

        for member in state.members.iter_mut() {
            if released.contains(&member.code) {
                member.penalty = false;
            }
        }
        Ok(released)
    }

    async fn next_hold_expiry(&self) -> StoreResult<Option<DateTime<Utc>>> {
        let state = self.state.read().await;
        Ok(state.holds.iter().map(|(_, expires_at)| *expires_at).min())
    }
}
