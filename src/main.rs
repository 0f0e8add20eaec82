use anyhow::Context;
use tokio::net::TcpListener;

use exodia::config::ServerConfig;
use exodia::http::{self, AppState};
use exodia::store::CardStore;
use exodia::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init()?;
    let config = ServerConfig::from_env();

    let store = CardStore::new(&config.data_dir);
    let catalog = store
        .catalog()
        .await
        .with_context(|| format!("loading catalog from {}", config.data_dir.display()))?;
    tracing::info!(cards = catalog.len(), data_dir = %config.data_dir.display(), "catalog loaded");

    let state = AppState::new(store).with_catalog_delay(config.catalog_delay);
    let app = http::router(state, &config.images_dir);

    let listener = TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding {}", config.addr))?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
