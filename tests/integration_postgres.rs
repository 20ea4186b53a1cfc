//! Integration tests for the PostgreSQL catalog
//!
//! Need a reachable DATABASE_URL; skipped otherwise. Everything runs in one
//! test because each phase resets the shared database.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};

use library_lending::lending::{BorrowCommand, ReturnCommand};
use library_lending::{CatalogStore, LendingEngine, LendingError, ManualClock, PgCatalogStore, StoreError};

mod common;

#[tokio::test]
async fn test_postgres_catalog_lifecycle() {
    let Some(pool) = common::setup_test_db().await else {
        eprintln!("DATABASE_URL not set; skipping PostgreSQL integration test");
        return;
    };

    let store = Arc::new(PgCatalogStore::new(pool.clone()));
    let start = Utc.with_ymd_and_hms(2026, 4, 1, 10, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::new(start));
    let engine = LendingEngine::with_clock(store.clone(), clock.clone());

    // Seeded in insertion order
    let books = store.list_books().await.unwrap();
    let codes: Vec<_> = books.iter().map(|b| b.code.as_str()).collect();
    assert_eq!(codes, vec!["JK-45", "SHR-1", "TW-11", "HOB-83", "NRN-7"]);

    // Conditional stock update refuses to go negative
    let err = store.update_book_stock("JK-45", -2).await.unwrap_err();
    assert!(matches!(err, StoreError::NegativeStock { current: 1, delta: -2, .. }));
    let err = store.update_book_stock("NOPE", 1).await.unwrap_err();
    assert!(matches!(err, StoreError::BookNotFound(_)));

    // Borrow / out of stock / return / not borrowed
    engine.borrow(BorrowCommand::new("M001", "JK-45")).await.unwrap();
    engine.borrow(BorrowCommand::new("M001", "TW-11")).await.unwrap();
    let err = engine.borrow(BorrowCommand::new("M002", "JK-45")).await.unwrap_err();
    assert!(matches!(err, LendingError::OutOfStock { .. }));
    let err = engine.borrow(BorrowCommand::new("M001", "SHR-1")).await.unwrap_err();
    assert!(matches!(err, LendingError::BorrowLimitExceeded { .. }));

    let member = store.find_member("M001").await.unwrap().unwrap();
    assert_eq!(member.borrowed_books, vec!["JK-45", "TW-11"]);

    engine
        .return_book(ReturnCommand::new("M001", "JK-45").with_days_late(5))
        .await
        .unwrap();
    assert_eq!(store.find_book("JK-45").await.unwrap().unwrap().stock, 1);
    let err = engine
        .return_book(ReturnCommand::new("M001", "JK-45"))
        .await
        .unwrap_err();
    assert!(matches!(err, LendingError::BookNotBorrowed { .. }));

    // Late return: penalty persisted as a hold and lifted after three days
    engine
        .return_book(ReturnCommand::new("M001", "TW-11").with_days_late(8))
        .await
        .unwrap();
    assert!(store.find_member("M001").await.unwrap().unwrap().penalty);
    assert_eq!(
        engine.next_penalty_expiry().await.unwrap(),
        Some(start + Duration::days(3))
    );

    clock.advance(Duration::days(3) - Duration::seconds(1));
    assert!(engine.release_expired_penalties().await.unwrap().is_empty());

    // A second engine over the same database sees the pending hold (restart)
    let restarted = LendingEngine::with_clock(Arc::new(PgCatalogStore::new(pool.clone())), clock.clone());
    clock.advance(Duration::seconds(1));
    assert_eq!(restarted.release_expired_penalties().await.unwrap(), vec!["M001"]);
    assert!(!store.find_member("M001").await.unwrap().unwrap().penalty);

    let members = store.list_members().await.unwrap();
    assert!(members.iter().all(|m| m.borrowed_books.is_empty()));

    pool.close().await;
}
