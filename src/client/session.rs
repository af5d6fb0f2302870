//! Client session module
//!
//! Owns the WebSocket connection for one client and wires the movement
//! controller and proxy world into a single per-frame tick. The rendering
//! layer constructs a session, then calls [`ClientSession::tick`] once per
//! frame with sampled input and the frame delta.

use std::time::Instant;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::client::input::{CursorInput, MovementController};
use crate::client::proxy::ProxyWorld;
use crate::error::{NetworkError, Result};
use crate::protocol::{ClientEvent, PlayerId, ServerEvent};

/// Client-side tunables
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// WebSocket URL of the server
    pub server_url: String,
    /// Initial position announced to the server
    pub spawn_x: f32,
    pub spawn_y: f32,
    /// Walk speed in world units per second
    pub walk_speed: f32,
    /// Maximum distance at which a greeting is shown
    pub greeting_range: f32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "ws://localhost:3000".to_string(),
            spawn_x: 100.0,
            spawn_y: 100.0,
            walk_speed: 135.0,
            greeting_range: 100.0,
        }
    }
}

/// A greeting that passed the distance gate, ready for the UI
#[derive(Debug, Clone, PartialEq)]
pub struct GreetingNotice {
    pub player_id: PlayerId,
    pub message: String,
}

/// One connected client: local movement, remote proxies and the socket
pub struct ClientSession {
    settings: ClientSettings,
    controller: MovementController,
    world: ProxyWorld,
    started: Instant,
    inbound_rx: mpsc::UnboundedReceiver<ServerEvent>,
    outbound_tx: mpsc::UnboundedSender<ClientEvent>,
    greetings: Vec<GreetingNotice>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl ClientSession {
    /// Connect to the server and announce the spawn position.
    ///
    /// Spawns one reader and one writer task; both end when the connection
    /// or the session is dropped.
    pub async fn connect(settings: ClientSettings) -> Result<Self> {
        let (ws, _) = connect_async(&settings.server_url)
            .await
            .map_err(|e| NetworkError::WebSocket(e.to_string()))?;
        info!(url = %settings.server_url, "Connected to server");

        let (mut sink, mut stream) = ws.split();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ClientEvent>();

        let reader = tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => match ServerEvent::from_json(&text) {
                        Ok(event) => {
                            if inbound_tx.send(event).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Dropping malformed server frame: {}", e),
                    },
                    Ok(Message::Close(_)) => {
                        debug!("Server closed the connection");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("WebSocket read error: {}", e);
                        break;
                    }
                }
            }
        });

        let writer = tokio::spawn(async move {
            while let Some(event) = outbound_rx.recv().await {
                let text = match event.to_json() {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Failed to encode event: {}", e);
                        continue;
                    }
                };
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let controller =
            MovementController::new(settings.spawn_x, settings.spawn_y, settings.walk_speed);
        let session = Self {
            controller,
            world: ProxyWorld::new(),
            started: Instant::now(),
            inbound_rx,
            outbound_tx,
            greetings: Vec::new(),
            reader,
            writer,
            settings,
        };

        session.send(ClientEvent::NewPlayer {
            x: session.settings.spawn_x,
            y: session.settings.spawn_y,
        })?;
        Ok(session)
    }

    /// Advance the session by one frame.
    ///
    /// Moves the local player from `input`, sends whatever the controller
    /// decides to emit, applies all queued server events and advances the
    /// remote interpolations.
    pub fn tick(&mut self, input: &CursorInput, dt: f32) -> Result<()> {
        if let Some(event) = self.controller.tick(input, dt) {
            self.send(event)?;
        }

        let now = self.clock();
        while let Ok(event) = self.inbound_rx.try_recv() {
            self.apply_event(event, now);
        }
        self.world.advance(now);
        Ok(())
    }

    /// Send a greeting. The server relays it to everyone; recipients apply
    /// their own distance gate.
    pub fn greet(&self, message: impl Into<String>) -> Result<()> {
        self.send(ClientEvent::Greeting {
            message: message.into(),
        })
    }

    /// Take the greetings that passed the distance gate since the last call
    pub fn drain_greetings(&mut self) -> Vec<GreetingNotice> {
        std::mem::take(&mut self.greetings)
    }

    /// Local player state, for the rendering layer
    pub fn local(&self) -> &MovementController {
        &self.controller
    }

    /// Remote player proxies, for the rendering layer
    pub fn world(&self) -> &ProxyWorld {
        &self.world
    }

    /// Seconds since the session started, the clock all interpolations use
    pub fn clock(&self) -> f32 {
        self.started.elapsed().as_secs_f32()
    }

    fn apply_event(&mut self, event: ServerEvent, now: f32) {
        if let ServerEvent::PlayerGreeted {
            player_id,
            x,
            y,
            message,
        } = event
        {
            let (lx, ly) = self.controller.position();
            let distance = ((x - lx).powi(2) + (y - ly).powi(2)).sqrt();
            if distance <= self.settings.greeting_range {
                debug!(player_id, distance, "Greeting received");
                self.greetings.push(GreetingNotice { player_id, message });
            }
            return;
        }
        self.world.handle_event(&event, now);
    }

    fn send(&self, event: ClientEvent) -> Result<()> {
        self.outbound_tx
            .send(event)
            .map_err(|_| NetworkError::ConnectionClosed)?;
        Ok(())
    }
}

impl Drop for ClientSession {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // Build a session around local channels, no socket involved
    fn offline_session(
        settings: ClientSettings,
    ) -> (
        ClientSession,
        mpsc::UnboundedSender<ServerEvent>,
        mpsc::UnboundedReceiver<ClientEvent>,
    ) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let controller =
            MovementController::new(settings.spawn_x, settings.spawn_y, settings.walk_speed);
        let session = ClientSession {
            controller,
            world: ProxyWorld::new(),
            started: Instant::now(),
            inbound_rx,
            outbound_tx,
            greetings: Vec::new(),
            reader: tokio::spawn(async {}),
            writer: tokio::spawn(async {}),
            settings,
        };
        (session, inbound_tx, outbound_rx)
    }

    #[tokio::test]
    async fn test_tick_sends_movement_and_applies_inbound() {
        let (mut session, inbound_tx, mut outbound_rx) = offline_session(ClientSettings {
            walk_speed: 10.0,
            ..ClientSettings::default()
        });

        inbound_tx
            .send(ServerEvent::NewPlayer(crate::protocol::PlayerState::new(
                2, 50.0, 50.0,
            )))
            .unwrap();

        session
            .tick(&CursorInput::held(crate::protocol::Direction::Right), 0.1)
            .unwrap();

        assert_eq!(session.world().count(), 1);
        match outbound_rx.try_recv().unwrap() {
            ClientEvent::Movement { x, is_moving, .. } => {
                assert_eq!(x, 101.0);
                assert!(is_moving);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_greeting_gate_by_distance() {
        let (mut session, inbound_tx, _outbound_rx) = offline_session(ClientSettings {
            spawn_x: 0.0,
            spawn_y: 0.0,
            greeting_range: 100.0,
            ..ClientSettings::default()
        });

        // In range
        inbound_tx
            .send(ServerEvent::PlayerGreeted {
                player_id: 2,
                x: 60.0,
                y: 80.0,
                message: "hello".to_string(),
            })
            .unwrap();
        // Out of range
        inbound_tx
            .send(ServerEvent::PlayerGreeted {
                player_id: 3,
                x: 200.0,
                y: 0.0,
                message: "too far".to_string(),
            })
            .unwrap();

        session.tick(&CursorInput::idle(), 0.016).unwrap();

        let notices = session.drain_greetings();
        assert_eq!(
            notices,
            vec![GreetingNotice {
                player_id: 2,
                message: "hello".to_string(),
            }]
        );
        assert!(session.drain_greetings().is_empty());
    }

    #[tokio::test]
    async fn test_send_after_writer_gone_reports_closed() {
        let (session, _inbound_tx, outbound_rx) = offline_session(ClientSettings::default());
        drop(outbound_rx);
        assert!(session.greet("hi").is_err());
    }
}
