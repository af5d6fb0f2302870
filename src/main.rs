//! Townsync Server
//!
//! Authoritative position-synchronization server for small multiplayer
//! sessions, speaking JSON events over WebSocket.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use townsync::config::ServerConfig;
use townsync::state::AppState;
use townsync::VERSION;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    info!("Townsync server v{}", VERSION);

    let config = ServerConfig::load().await?;
    info!(
        "Configuration loaded from: {}",
        config.config_path.display()
    );

    // Create shutdown channel
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let state = Arc::new(AppState::new(config.clone(), shutdown_tx.clone()));
    info!("Application state initialized");

    let addr: SocketAddr = format!("0.0.0.0:{}", config.listen_port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on: {}", addr);

    // Spawn the connection acceptor
    let accept_state = state.clone();
    let mut accept_shutdown_rx = shutdown_tx.subscribe();
    let accept_handle = tokio::spawn(async move {
        townsync::net::run(listener, accept_state, &mut accept_shutdown_rx).await;
    });

    info!(
        server_name = %config.server_name,
        max_players = config.max_players,
        "Server startup complete"
    );

    wait_for_shutdown(shutdown_tx.clone()).await;

    info!("Shutting down server...");
    let _ = accept_handle.await;

    info!(
        sessions = state.sessions.count(),
        "Server shutdown complete. Goodbye!"
    );
    Ok(())
}

/// Initialize the logging/tracing system
fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,townsync=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .init();
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn wait_for_shutdown(shutdown_tx: broadcast::Sender<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    // Signal all tasks to shut down
    let _ = shutdown_tx.send(());
}
