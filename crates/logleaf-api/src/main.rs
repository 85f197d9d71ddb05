mod error;
mod routes;

use std::sync::Arc;

use logleaf_core::config::LogleafConfig;
use logleaf_core::db::LibSqlLeafStore;
use logleaf_core::services::LeafService;
use routes::{app_router, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Only load .env in development; production uses platform-native env injection.
    #[cfg(debug_assertions)]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("logleaf_api=info,logleaf_core=info")),
        )
        .init();

    let config = LogleafConfig::from_env()?;
    tracing::info!("Starting logleaf-api with config: {:?}", config);

    let db = config.open_database().await?;
    let store = LibSqlLeafStore::new(Arc::new(db));
    let state = AppState::new(LeafService::new(Arc::new(store)));
    let router = app_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("logleaf-api listening on {}", config.bind_addr);
    axum::serve(listener, router).await?;
    Ok(())
}
