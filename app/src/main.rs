use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cinescope::{
    api,
    config::Config,
    storage::SqliteStorage,
    store::Store,
    tmdb::TmdbClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting CineScope...");

    let config = Config::new()?;
    info!("Configuration loaded");

    let storage = SqliteStorage::connect(&config.database_url).await?;
    info!("Storage initialized");

    let tmdb_client = TmdbClient::with_options(
        &config.tmdb_api_key,
        &config.tmdb_base_url,
        config.tmdb_timeout(),
    )?;
    info!("TMDB client initialized");

    let store = Store::rehydrate(Arc::new(tmdb_client), Arc::new(storage)).await?;
    let app = api::router(Arc::new(store));

    let addr: SocketAddr = format!("127.0.0.1:{}", config.port).parse()?;
    info!("Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
