//! Guestbook Server - shared visitor guestbook with live push updates
//!
//! Endpoints:
//! - GET    /api/guestbook/photos       - List entries, newest first
//! - POST   /api/guestbook/upload       - Add an entry (compressed JPEG data URL)
//! - DELETE /api/guestbook/delete/{id}  - Delete an own entry
//! - GET    /api/guestbook/images/{id}  - Stored image bytes
//! - GET    /api/guestbook/stream       - Push stream (text/event-stream)
//! - GET    /health, /ready             - Monitoring

use std::net::SocketAddr;

use guestbook_server::{create_router_with_config, Config};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("guestbook_server=info,tower_http=info")),
        )
        .with_target(true)
        .init();

    let config = Config::from_env();
    let addr = config.socket_addr();
    let app = create_router_with_config(&config);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, version = env!("CARGO_PKG_VERSION"), "Guestbook server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
