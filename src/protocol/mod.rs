//! Wire protocol module
//!
//! Defines the events exchanged between clients and the server and the JSON
//! codec for them. Every WebSocket text frame carries one event of the form
//! `{"event": <name>, "data": <payload>}`.
//!
//! The server is the single writer of [`ServerEvent`] frames, clients the
//! single writers of [`ClientEvent`] frames. Payload fields use camelCase
//! on the wire (`playerId`, `isMoving`).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Unique player identifier, assigned at connect and stable for the
/// lifetime of the connection.
pub type PlayerId = u64;

/// Facing/walking direction. `Front` faces the camera (down on screen),
/// `Back` faces away (up).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Front,
    Back,
}

impl Direction {
    /// Wire name of the direction
    pub fn name(&self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Front => "front",
            Direction::Back => "back",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Authoritative server-side record for one connected player.
///
/// Exactly one exists per live connection; it is created when the player
/// announces itself and destroyed atomically with the connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub player_id: PlayerId,
    pub x: f32,
    pub y: f32,
    /// Unset until the player has moved at least once
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(default)]
    pub is_moving: bool,
}

impl PlayerState {
    /// Create the initial record for a freshly announced player
    pub fn new(player_id: PlayerId, x: f32, y: f32) -> Self {
        Self {
            player_id,
            x,
            y,
            direction: None,
            is_moving: false,
        }
    }
}

/// Partial update applied to a [`PlayerState`]. Fields left `None` keep
/// their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatePatch {
    pub x: f32,
    pub y: f32,
    pub direction: Option<Direction>,
    pub is_moving: Option<bool>,
}

/// Events sent from a client to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    /// Announce this connection's initial position, sent once after connect
    #[serde(rename = "new player")]
    NewPlayer { x: f32, y: f32 },

    /// Position or facing changed while walking
    #[serde(rename = "player movement")]
    #[serde(rename_all = "camelCase")]
    Movement {
        x: f32,
        y: f32,
        direction: Direction,
        is_moving: bool,
    },

    /// Player came to rest at the given position
    #[serde(rename = "player stopped")]
    Stopped {
        x: f32,
        y: f32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        direction: Option<Direction>,
    },

    /// Greet nearby players
    #[serde(rename = "player greeting")]
    Greeting { message: String },
}

/// Events sent from the server to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// Full snapshot of all players connected before the recipient,
    /// unicast to a newly announced player
    #[serde(rename = "current players")]
    CurrentPlayers(HashMap<PlayerId, PlayerState>),

    /// A new player joined, broadcast to everyone else
    #[serde(rename = "new player")]
    NewPlayer(PlayerState),

    /// A player's authoritative record changed while walking
    #[serde(rename = "player moved")]
    PlayerMoved(PlayerState),

    /// A player came to rest
    #[serde(rename = "player stopped")]
    PlayerStopped(PlayerState),

    /// A greeting relayed with the sender's current position
    #[serde(rename = "player greeted")]
    #[serde(rename_all = "camelCase")]
    PlayerGreeted {
        player_id: PlayerId,
        x: f32,
        y: f32,
        message: String,
    },

    /// A player's connection closed, broadcast to all remaining connections
    #[serde(rename = "player disconnected")]
    PlayerDisconnected(PlayerId),
}

impl ClientEvent {
    /// Encode the event as a JSON text frame
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode an event from a JSON text frame
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

impl ServerEvent {
    /// Encode the event as a JSON text frame
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode an event from a JSON text frame
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
