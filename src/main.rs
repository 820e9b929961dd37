use std::sync::Arc;

use judgeboard_api::api::{self, AppState};
use judgeboard_api::config::{AppConfig, StoreBackend};
use judgeboard_api::domain::repositories::RecordStore;
use judgeboard_api::infrastructure::repositories::{MemoryRecordStore, PostgresRecordStore};
use judgeboard_api::services::Dashboard;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env()?;

    let store: Arc<dyn RecordStore> = match &config.backend {
        StoreBackend::Postgres {
            database_url,
            max_connections,
        } => {
            tracing::info!("Connecting to database...");
            let store = PostgresRecordStore::connect(database_url, *max_connections).await?;
            tracing::info!("Database connected successfully");
            Arc::new(store)
        }
        StoreBackend::File(path) => Arc::new(MemoryRecordStore::open(path.clone()).await?),
        StoreBackend::Memory => {
            tracing::warn!("Neither DATABASE_URL nor DATA_FILE set, data will not survive a restart");
            Arc::new(MemoryRecordStore::new())
        }
    };

    let dashboard = Arc::new(Dashboard::new(store));
    if config.seed_defaults {
        dashboard.initialize_default_data().await?;
    }

    let app = api::router(AppState::new(dashboard.clone()));

    tracing::info!("Server listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    dashboard.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
