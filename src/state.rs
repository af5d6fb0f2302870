//! Application state module
//!
//! Contains the shared state used across all server connections.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::ServerConfig;
use crate::net::session::SessionManager;
use crate::server::broadcast::Broadcaster;
use crate::server::registry::PlayerRegistry;

/// Application state shared across all connections
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,
    /// Session manager for tracking connected clients
    pub sessions: SessionManager,
    /// Authoritative player records
    pub registry: Arc<PlayerRegistry>,
    /// Event dispatch over the registry
    pub broadcaster: Broadcaster,
    /// Shutdown signal sender
    pub shutdown_tx: broadcast::Sender<()>,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: ServerConfig, shutdown_tx: broadcast::Sender<()>) -> Self {
        let registry = Arc::new(PlayerRegistry::new());
        let sessions = SessionManager::new(config.max_players);

        Self {
            config,
            sessions,
            broadcaster: Broadcaster::new(registry.clone()),
            registry,
            shutdown_tx,
        }
    }
}
