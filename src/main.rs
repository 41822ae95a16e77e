//! Bookswap Server - book swapping and trade matching
//!
//! REST API server over a PostgreSQL or in-memory catalog store.

use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookswap_server::{
    api,
    config::{AppConfig, LoggingConfig, StoreBackend},
    repository::{CatalogStore, MemoryCatalogStore, Repository},
    services::Services,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;

    init_tracing(&config.logging);

    tracing::info!("Starting Bookswap Server v{}", env!("CARGO_PKG_VERSION"));

    let store: Arc<dyn CatalogStore> = match config.store.backend {
        StoreBackend::Postgres => {
            // Create database connection pool
            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .acquire_timeout(config.store.timeout())
                .connect(&config.database.url)
                .await?;

            tracing::info!("Connected to database");

            // Run migrations
            sqlx::migrate!("./migrations").run(&pool).await?;

            tracing::info!("Database migrations completed");

            Arc::new(Repository::new(pool))
        }
        StoreBackend::Memory => {
            let store = match &config.store.seed_file {
                Some(path) => MemoryCatalogStore::from_seed_file(path)?,
                None => MemoryCatalogStore::new(),
            };
            tracing::warn!("Using in-memory catalog store; data is lost on shutdown");
            Arc::new(store)
        }
    };

    // Server address
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    // Create services and application state
    let services = Services::new(store, &config.store);
    let state = AppState {
        services: Arc::new(services),
    };

    // Build router
    let app = api::create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Install the global subscriber, pretty or JSON depending on configuration
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("bookswap_server={},tower_http=debug", logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
