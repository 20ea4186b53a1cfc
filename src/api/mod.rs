//! API module
//!
//! HTTP endpoints, shared state and middleware.

pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::lending::LendingEngine;

pub use routes::create_router;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<LendingEngine>,
}

impl AppState {
    pub fn new(engine: Arc<LendingEngine>) -> Self {
        Self { engine }
    }
}

/// Build the application router with its middleware stack
pub fn build_router(state: AppState) -> Router {
    // Order: request id -> trace -> propagate id -> logging -> handler
    Router::new()
        .route("/health", get(health_check))
        .merge(create_router())
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(axum::middleware::from_fn(middleware::logging_middleware)),
        )
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
