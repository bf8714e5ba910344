use plant_buddy::{
    api::{AppState, create_router},
    config::{
        database::{create_connection, create_tables},
        settings::Settings,
    },
    errors::Result,
    gateway::GeminiGateway,
    storage::LocalObjectStorage,
};
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also be set externally
    dotenv().ok();

    // 3. Load settings
    let settings = Settings::load()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    info!("Configuration loaded");

    // 4. Initialize database
    let db = create_connection(&settings.database.url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    create_tables(&db)
        .await
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Storage and model backends
    let storage =
        LocalObjectStorage::new(&settings.storage.root, &settings.storage.public_base_url).await?;
    let gateway = GeminiGateway::new(settings.gateway.clone())
        .inspect_err(|e| error!("Failed to configure AI gateway: {}", e))?;

    // 6. Serve
    let address = format!("{}:{}", settings.server.host, settings.server.port);
    let state = AppState {
        db,
        gateway: Arc::new(gateway),
        storage: Arc::new(storage),
        settings: Arc::new(settings),
    };
    let listener = TcpListener::bind(&address).await?;
    info!("Listening on {}", address);
    axum::serve(listener, create_router(state)).await?;

    Ok(())
}
