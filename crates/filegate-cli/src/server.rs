//! Server startup and lifecycle

use crate::{AppState, GatewayConfig, routes};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Run the gateway server
pub async fn run_server(config: GatewayConfig) -> anyhow::Result<()> {
    run_server_with_shutdown(config, std::future::pending()).await
}

/// Run server with graceful shutdown
pub async fn run_server_with_shutdown(
    config: GatewayConfig,
    shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    // Create application state
    let addr = config.bind_addr();
    let state = Arc::new(AppState::new(config)?);

    // Create router
    let app = routes::create_router(state);

    // Bind to address
    let listener = TcpListener::bind(&addr).await?;
    info!("Filegate gateway listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Gateway shutdown complete");

    Ok(())
}

/// Serve on an already bound listener, e.g. an ephemeral port in tests
pub async fn serve_on(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = routes::create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;
    Ok(())
}
