//! Error handling module
//!
//! Defines custom error types for the Townsync server and client.

use std::io;

use thiserror::Error;

/// Main error type for Townsync
#[derive(Error, Debug)]
pub enum TownsyncError {
    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Protocol-related errors
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Network-specific errors
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Connection closed")]
    ConnectionClosed,

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Server full: {0} players connected")]
    ServerFull(usize),

    #[error("Session not found: {0}")]
    SessionNotFound(u64),

    #[error("Outbound buffer full")]
    WriteBufferFull,
}

/// Protocol-specific errors
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Unexpected binary frame ({0} bytes)")]
    UnexpectedBinaryFrame(usize),

    #[error("Event encoding failed: {0}")]
    EncodingFailed(String),
}

/// Result type alias for Townsync operations
pub type Result<T> = std::result::Result<T, TownsyncError>;

impl From<serde_json::Error> for TownsyncError {
    fn from(err: serde_json::Error) -> Self {
        TownsyncError::Protocol(ProtocolError::MalformedEvent(err.to_string()))
    }
}
