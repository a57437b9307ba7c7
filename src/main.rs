//! storefront-auth server - main entry point.

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use storefront_auth::server::{router, AppState};
use storefront_auth::{AppConfig, InMemorySessionStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_auth=info,tower_http=debug".into()),
        )
        .json()
        .init();

    dotenvy::dotenv().ok();
    let config = Arc::new(AppConfig::from_env()?);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.host().as_ref(),
        scopes = %config.scopes(),
        "Starting storefront-auth"
    );

    let state = AppState::new(Arc::clone(&config), Arc::new(InMemorySessionStore::new()))?;
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port()));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        info!("Received shutdown signal");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
