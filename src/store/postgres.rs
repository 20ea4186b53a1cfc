//! PostgreSQL catalog
//!
//! Books and members live in their own tables; loans are rows of the ordered
//! `member_loans` join table and pending penalty clears are rows of
//! `penalty_holds`, so both survive a restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::domain::{Book, Member};

use super::{CatalogStore, StoreError, StoreResult};

type BookRow = (String, String, String, i32);
type MemberRow = (String, String, bool);

fn book_from_row((code, title, author, stock): BookRow) -> StoreResult<Book> {
    let stock = u32::try_from(stock)
        .map_err(|_| StoreError::Corrupt(format!("book {} has negative stock {}", code, stock)))?;
    Ok(Book {
        code,
        title,
        author,
        stock,
    })
}

fn member_from_row((code, name, penalty): MemberRow, borrowed_books: Vec<String>) -> Member {
    Member {
        code,
        name,
        borrowed_books,
        penalty,
    }
}

/// Catalog backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    /// Create a store over an already migrated pool (see `db::prepare_schema`)
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Conditional stock update; never lets `stock` drop below zero
    async fn adjust_stock(conn: &mut PgConnection, code: &str, delta: i64) -> StoreResult<Book> {
        let updated: Option<BookRow> = sqlx::query_as(
            r#"
            UPDATE books
            SET stock = stock + $2::BIGINT
            WHERE code = $1 AND stock + $2::BIGINT >= 0
            RETURNING code, title, author, stock
            "#,
        )
        .bind(code)
        .bind(delta)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(row) = updated {
            return book_from_row(row);
        }

        let current: Option<i32> = sqlx::query_scalar("SELECT stock FROM books WHERE code = $1")
            .bind(code)
            .fetch_optional(&mut *conn)
            .await?;

        match current {
            Some(current) => Err(StoreError::NegativeStock {
                code: code.to_string(),
                current: i64::from(current),
                delta,
            }),
            None => Err(StoreError::BookNotFound(code.to_string())),
        }
    }

    async fn member_exists(conn: &mut PgConnection, code: &str) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM members WHERE code = $1)")
            .bind(code)
            .fetch_one(&mut *conn)
            .await?;
        Ok(exists)
    }

    async fn insert_loan(conn: &mut PgConnection, member_code: &str, book_code: &str) -> StoreResult<()> {
        if !Self::member_exists(conn, member_code).await? {
            return Err(StoreError::MemberNotFound(member_code.to_string()));
        }

        sqlx::query("INSERT INTO member_loans (member_code, book_code) VALUES ($1, $2)")
            .bind(member_code)
            .bind(book_code)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Delete the oldest loan row for this member/book pair
    async fn delete_loan(conn: &mut PgConnection, member_code: &str, book_code: &str) -> StoreResult<()> {
        let rows_deleted = sqlx::query(
            r#"
            DELETE FROM member_loans
            WHERE id = (
                SELECT id FROM member_loans
                WHERE member_code = $1 AND book_code = $2
                ORDER BY id
                LIMIT 1
            )
            "#,
        )
        .bind(member_code)
        .bind(book_code)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        if rows_deleted == 0 {
            if !Self::member_exists(conn, member_code).await? {
                return Err(StoreError::MemberNotFound(member_code.to_string()));
            }
            return Err(StoreError::LoanNotFound {
                member_code: member_code.to_string(),
                book_code: book_code.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn find_book(&self, code: &str) -> StoreResult<Option<Book>> {
        let row: Option<BookRow> =
            sqlx::query_as("SELECT code, title, author, stock FROM books WHERE code = $1")
                .bind(code)
                .fetch_optional(&self.pool)
                .await?;

        row.map(book_from_row).transpose()
    }

    async fn find_member(&self, code: &str) -> StoreResult<Option<Member>> {
        let row: Option<MemberRow> =
            sqlx::query_as("SELECT code, name, penalty FROM members WHERE code = $1")
                .bind(code)
                .fetch_optional(&self.pool)
                .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let borrowed_books: Vec<String> = sqlx::query_scalar(
            "SELECT book_code FROM member_loans WHERE member_code = $1 ORDER BY id",
        )
        .bind(code)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(member_from_row(row, borrowed_books)))
    }

    async fn list_books(&self) -> StoreResult<Vec<Book>> {
        let rows: Vec<BookRow> =
            sqlx::query_as("SELECT code, title, author, stock FROM books ORDER BY seq")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter().map(book_from_row).collect()
    }

    async fn list_members(&self) -> StoreResult<Vec<Member>> {
        let rows: Vec<MemberRow> =
            sqlx::query_as("SELECT code, name, penalty FROM members ORDER BY seq")
                .fetch_all(&self.pool)
                .await?;

        let loans: Vec<(String, String)> =
            sqlx::query_as("SELECT member_code, book_code FROM member_loans ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        let mut loans_by_member: HashMap<String, Vec<String>> = HashMap::new();
        for (member_code, book_code) in loans {
            loans_by_member.entry(member_code).or_default().push(book_code);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let borrowed = loans_by_member.remove(&row.0).unwrap_or_default();
                member_from_row(row, borrowed)
            })
            .collect())
    }

    async fn update_book_stock(&self, code: &str, delta: i64) -> StoreResult<Book> {
        let mut conn = self.pool.acquire().await?;
        Self::adjust_stock(&mut conn, code, delta).await
    }

    async fn add_borrowed_book(&self, member_code: &str, book_code: &str) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;
        Self::insert_loan(&mut conn, member_code, book_code).await
    }

    async fn remove_borrowed_book(&self, member_code: &str, book_code: &str) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await?;
        Self::delete_loan(&mut conn, member_code, book_code).await
    }

    async fn set_penalty(&self, member_code: &str, penalty: bool) -> StoreResult<()> {
        let rows_affected = sqlx::query("UPDATE members SET penalty = $2 WHERE code = $1")
            .bind(member_code)
            .bind(penalty)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Err(StoreError::MemberNotFound(member_code.to_string()));
        }
        Ok(())
    }

    async fn record_loan(&self, member_code: &str, book_code: &str) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::adjust_stock(&mut tx, book_code, -1).await?;
        Self::insert_loan(&mut tx, member_code, book_code).await?;
        tx.commit().await?;

        tracing::debug!(member_code, book_code, "Loan recorded");
        Ok(())
    }

    async fn record_return(
        &self,
        member_code: &str,
        book_code: &str,
        penalty_until: Option<DateTime<Utc>>,
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        Self::delete_loan(&mut tx, member_code, book_code).await?;
        Self::adjust_stock(&mut tx, book_code, 1).await?;

        if let Some(expires_at) = penalty_until {
            sqlx::query("UPDATE members SET penalty = TRUE WHERE code = $1")
                .bind(member_code)
                .execute(&mut *tx)
                .await?;
            sqlx::query("INSERT INTO penalty_holds (member_code, expires_at) VALUES ($1, $2)")
                .bind(member_code)
                .bind(expires_at)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        tracing::debug!(member_code, book_code, penalized = penalty_until.is_some(), "Return recorded");
        Ok(())
    }

    async fn release_expired_penalties(&self, now: DateTime<Utc>) -> StoreResult<Vec<String>> {
        let mut tx = self.pool.begin().await?;

        let expired: Vec<String> = sqlx::query_scalar(
            "DELETE FROM penalty_holds WHERE expires_at <= $1 RETURNING member_code",
        )
        .bind(now)
        .fetch_all(&mut *tx)
        .await?;

        let mut released = Vec::new();
        for member_code in expired {
            if released.contains(&member_code) {
                continue;
            }
            let still_held: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM penalty_holds WHERE member_code = $1)",
            )
            .bind(&member_code)
            .fetch_one(&mut *tx)
            .await?;

            if !still_held {
                released.push(member_code);
            }
        }

        if !released.is_empty() {
            sqlx::query("UPDATE members SET penalty = FALSE WHERE code = ANY($1)")
                .bind(released.as_slice())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(released)
    }

    async fn next_hold_expiry(&self) -> StoreResult<Option<DateTime<Utc>>> {
        let next: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT MIN(expires_at) FROM penalty_holds")
                .fetch_one(&self.pool)
                .await?;
        Ok(next)
    }
}
