//! InkDesk WebSocket Relay Server
//!
//! Relays text-surface changes between clients in the same room.

use inkdesk_server::{app, AppState, ServerConfig};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkdesk_server=info,tower_http=info".into()),
        )
        .init();

    if let Err(e) = run().await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env()?;
    let state = Arc::new(AppState::new());

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!("InkDesk relay server listening on {}", config.bind);
    info!("WebSocket endpoint: ws://{}/ws", config.bind);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
