//! library_lending - Library Lending REST API
//!
//! Tracks book stock and member loans, enforces the borrowing rules and
//! lifts late-return penalties in the background.

use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use library_lending::api::{self, AppState};
use library_lending::config::{LogFormat, StoreBackend};
use library_lending::lending::{PenaltyWorker, PenaltyWorkerConfig};
use library_lending::{db, CatalogStore, Config, InMemoryCatalog, LendingEngine, PgCatalogStore};

/// Initialize tracing/logging
fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "library_lending=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }
}

/// Open the configured catalog store.
/// Returns the pool too when one was opened, so it can be closed on shutdown.
async fn open_store(config: &Config) -> anyhow::Result<(Arc<dyn CatalogStore>, Option<PgPool>)> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory catalog");
            let store: Arc<dyn CatalogStore> = Arc::new(InMemoryCatalog::seeded());
            Ok((store, None))
        }
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for the postgres store"))?;

            tracing::info!("Connecting to database...");
            let pool = db::connect(database_url, config.database_max_connections).await?;
            db::verify_connection(&pool).await?;

            db::prepare_schema(&pool).await?;
            db::seed_catalog(&pool).await?;
            if !db::check_schema(&pool).await? {
                return Err(anyhow::anyhow!("Database schema incomplete"));
            }

            tracing::info!("Database connected successfully");
            let store: Arc<dyn CatalogStore> = Arc::new(PgCatalogStore::new(pool.clone()));
            Ok((store, Some(pool)))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.log_format);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!(environment = %config.environment, "Starting library_lending server");

    let (store, pool) = open_store(&config).await?;
    let engine = Arc::new(LendingEngine::new(store));

    let worker = PenaltyWorker::with_config(
        engine.clone(),
        PenaltyWorkerConfig {
            sweep_interval: config.penalty_sweep_interval,
            ..PenaltyWorkerConfig::default()
        },
    )
    .start();

    let app = api::build_router(AppState::new(engine));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Cleanup
    tracing::info!("Server shutting down...");
    worker.abort();
    if let Some(pool) = pool {
        pool.close().await;
        tracing::info!("Database connections closed");
    }
    tracing::info!("Goodbye!");

    Ok(())
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
