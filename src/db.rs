//! Database module
//!
//! Connection, schema creation and seeding for the PostgreSQL catalog.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::store::seed::{seed_books, seed_members};

/// Tables the catalog store needs, in creation order
const REQUIRED_TABLES: &[&str] = &["books", "members", "member_loans", "penalty_holds"];

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS books (
        seq BIGSERIAL,
        code TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        author TEXT NOT NULL,
        stock INTEGER NOT NULL CHECK (stock >= 0)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS members (
        seq BIGSERIAL,
        code TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        penalty BOOLEAN NOT NULL DEFAULT FALSE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS member_loans (
        id BIGSERIAL PRIMARY KEY,
        member_code TEXT NOT NULL REFERENCES members (code),
        book_code TEXT NOT NULL REFERENCES books (code),
        borrowed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_member_loans_member ON member_loans (member_code)",
    r#"
    CREATE TABLE IF NOT EXISTS penalty_holds (
        id BIGSERIAL PRIMARY KEY,
        member_code TEXT NOT NULL REFERENCES members (code),
        expires_at TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_penalty_holds_expires_at ON penalty_holds (expires_at)",
];

/// Open a connection pool
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Simple connectivity check
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Create the catalog tables if missing
pub async fn prepare_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for &statement in SCHEMA {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    Ok(())
}

/// Insert the seed catalog. Existing rows are left untouched, so state
/// survives a restart.
pub async fn seed_catalog(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    for book in seed_books() {
        sqlx::query(
            r#"
            INSERT INTO books (code, title, author, stock)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(&book.code)
        .bind(&book.title)
        .bind(&book.author)
        .bind(i64::from(book.stock))
        .execute(&mut *tx)
        .await?;
    }

    for member in seed_members() {
        sqlx::query(
            r#"
            INSERT INTO members (code, name, penalty)
            VALUES ($1, $2, $3)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(&member.code)
        .bind(&member.name)
        .bind(member.penalty)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    for &table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = current_schema() AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_creates_every_required_table() {
        for table in REQUIRED_TABLES {
            let needle = format!("CREATE TABLE IF NOT EXISTS {} (", table);
            assert!(
                SCHEMA.iter().any(|s| s.contains(&needle)),
                "missing DDL for {}",
                table
            );
        }
    }
}
