//! Server configuration module
//!
//! Handles loading and parsing of server configuration from a TOML file and
//! environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the configuration file
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Server name shown in logs
    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// WebSocket listen port
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Maximum number of simultaneous connections
    #[serde(default = "default_max_players")]
    pub max_players: usize,

    /// Per-connection outbound event buffer capacity
    #[serde(default = "default_outbound_capacity")]
    pub outbound_capacity: usize,

    /// Enable debug logging
    #[serde(default)]
    pub debug: bool,
}

// Default value functions
fn default_server_name() -> String {
    "Townsync".to_string()
}

fn default_listen_port() -> u16 {
    3000
}

fn default_max_players() -> usize {
    64
}

fn default_outbound_capacity() -> usize {
    256
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("config/server.toml"),
            server_name: default_server_name(),
            listen_port: default_listen_port(),
            max_players: default_max_players(),
            outbound_capacity: default_outbound_capacity(),
            debug: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from file and environment variables
    pub async fn load() -> Result<Self> {
        // Determine config path from environment or use default
        let config_path = env::var("TOWNSYNC_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config/server.toml"));

        // Try to load from file
        let mut config = if config_path.exists() {
            let content = tokio::fs::read_to_string(&config_path)
                .await
                .with_context(|| {
                    format!("Failed to read config file: {}", config_path.display())
                })?;

            toml::from_str(&content).with_context(|| {
                format!("Failed to parse config file: {}", config_path.display())
            })?
        } else {
            tracing::warn!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };

        config.config_path = config_path;

        // Override with environment variables
        config.apply_env_overrides();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("TOWNSYNC_SERVER_NAME") {
            self.server_name = val;
        }
        if let Ok(val) = env::var("TOWNSYNC_LISTEN_PORT") {
            if let Ok(port) = val.parse() {
                self.listen_port = port;
            }
        }
        if let Ok(val) = env::var("TOWNSYNC_MAX_PLAYERS") {
            if let Ok(max) = val.parse() {
                self.max_players = max;
            }
        }
        if let Ok(val) = env::var("TOWNSYNC_DEBUG") {
            self.debug = val.to_lowercase() == "true" || val == "1";
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.listen_port == 0 {
            anyhow::bail!("Listen port must be non-zero");
        }

        if self.max_players == 0 || self.max_players > 1024 {
            anyhow::bail!("Max players must be between 1 and 1024");
        }

        if self.outbound_capacity == 0 {
            anyhow::bail!("Outbound capacity must be non-zero");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.server_name, "Townsync");
        assert_eq!(config.listen_port, 3000);
        assert_eq!(config.max_players, 64);
        assert_eq!(config.outbound_capacity, 256);
        assert!(!config.debug);
    }

    #[test]
    fn test_validation() {
        let mut config = ServerConfig::default();

        // Valid config should pass
        assert!(config.validate().is_ok());

        // Invalid port
        config.listen_port = 0;
        assert!(config.validate().is_err());
        config.listen_port = 3000;

        // Invalid player cap
        config.max_players = 0;
        assert!(config.validate().is_err());
        config.max_players = 2000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: ServerConfig = toml::from_str("listen_port = 4000").unwrap();
        assert_eq!(config.listen_port, 4000);
        // Unspecified fields fall back to defaults
        assert_eq!(config.server_name, "Townsync");
        assert_eq!(config.max_players, 64);
    }
}
