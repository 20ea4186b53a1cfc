//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::PgPool;
use tower::util::ServiceExt;

use library_lending::api::{self, AppState};
use library_lending::{db, CatalogStore, InMemoryCatalog, LendingEngine, ManualClock};

/// Router over a freshly seeded in-memory catalog, with a hand-driven clock
pub fn memory_app() -> (Router, Arc<LendingEngine>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let store: Arc<dyn CatalogStore> = Arc::new(InMemoryCatalog::seeded());
    let engine = Arc::new(LendingEngine::with_clock(store, clock.clone()));
    let app = api::build_router(AppState::new(engine.clone()));
    (app, engine, clock)
}

/// Connect to the test database and reset it to the seed catalog.
/// Returns None (and the test should return early) when DATABASE_URL is unset.
pub async fn setup_test_db() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").ok()?;

    let pool = db::connect(&database_url, 5)
        .await
        .expect("Failed to connect to DB");

    db::prepare_schema(&pool).await.expect("Failed to create schema");
    sqlx::query("TRUNCATE TABLE penalty_holds, member_loans, members, books CASCADE")
        .execute(&pool)
        .await
        .expect("Failed to clean up DB");
    db::seed_catalog(&pool).await.expect("Failed to seed catalog");

    Some(pool)
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, req).await
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}
