pub mod api;
pub mod config;
pub mod logic;
pub mod model;
pub mod seed;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;

pub use logic::{CollectionError, SeriesRow};

// Export all model types
pub use model::*;

// Export store types
pub use store::{MemoryStore, PostgresStore, Store};

use std::sync::Arc;

/// Build the full application router over `store`
pub fn app<S: Store + 'static>(store: Arc<S>, config: config::AppConfig) -> axum::Router {
    api::routes::create_router(Arc::new(config)).with_state(store)
}

/// Serve `app` on an already bound listener
pub async fn serve(listener: tokio::net::TcpListener, app: axum::Router) -> anyhow::Result<()> {
    let address = listener.local_addr()?;
    log::info!("Marketplace API listening on http://{}", address);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Load configuration, connect the configured store and serve until shutdown
pub async fn run_server() -> anyhow::Result<()> {
    let config = config::AppConfig::load()?;
    log::info!(
        "Configuration loaded: server={}:{}",
        config.server.host,
        config.server.port
    );

    let listener = tokio::net::TcpListener::bind(config.server_address()).await?;
    let load_seed = std::env::var("LOAD_SEED_DATA").unwrap_or_default() == "true";

    if config.database.in_memory {
        log::info!("Using in-memory store");
        let store = Arc::new(MemoryStore::new());
        if load_seed {
            seed::load_seed_data(&*store).await?;
        }
        return serve(listener, app(store, config)).await;
    }

    log::info!("Connecting to PostgreSQL...");
    let database_url = config.database_url()?;
    let postgres_store =
        PostgresStore::new(&database_url, config.database.max_connections.unwrap_or(20)).await?;

    log::info!("Running database migrations...");
    postgres_store.migrate().await?;

    let store = Arc::new(postgres_store);
    if load_seed {
        log::info!("Loading seed data...");
        seed::load_seed_data(&*store).await?;
    }

    serve(listener, app(store, config)).await
}
