//! Townsync Library
//!
//! Real-time position synchronization for small top-down multiplayer worlds.
//! The server holds the authoritative record for every connected player and
//! rebroadcasts state changes; the client library turns those sparse,
//! irregular updates into smooth interpolated motion for a rendering layer.
//!
//! ## Modules
//!
//! - `client` - Client-side movement intent, remote-player interpolation and session
//! - `config` - Server configuration management
//! - `error` - Error types and result definitions
//! - `net` - Connection handling and session management
//! - `protocol` - Wire events and the JSON codec
//! - `server` - Authoritative player registry and state broadcaster

pub mod client;
pub mod config;
pub mod error;
pub mod net;
pub mod protocol;
pub mod server;
pub mod state;

// Re-export commonly used types
pub use config::ServerConfig;
pub use error::{Result, TownsyncError};
pub use state::AppState;

/// Server version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
