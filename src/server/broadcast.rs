//! State broadcaster module
//!
//! Turns inbound client events into registry mutations plus a list of
//! outbound deliveries. Handlers are pure with respect to the transport:
//! `(sender, event) -> Vec<Outbound>`, which keeps the whole message flow
//! unit-testable without a live connection.
//!
//! Delivery rules mirror the protocol contract: state changes go to every
//! *other* connection (never echoed to the sender), disconnects go to all.

use std::sync::Arc;

use tracing::{debug, info};

use crate::protocol::{ClientEvent, PlayerId, ServerEvent, StatePatch};
use crate::server::registry::PlayerRegistry;

/// A single outbound delivery decided by the broadcaster
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Deliver to exactly one connection
    Unicast { to: PlayerId, event: ServerEvent },
    /// Deliver to every connection, optionally skipping one
    Broadcast {
        except: Option<PlayerId>,
        event: ServerEvent,
    },
}

impl Outbound {
    /// Check whether this delivery applies to the given connection
    pub fn applies_to(&self, id: PlayerId) -> bool {
        match self {
            Outbound::Unicast { to, .. } => *to == id,
            Outbound::Broadcast { except, .. } => *except != Some(id),
        }
    }

    /// The event being delivered
    pub fn event(&self) -> &ServerEvent {
        match self {
            Outbound::Unicast { event, .. } => event,
            Outbound::Broadcast { event, .. } => event,
        }
    }
}

/// Validates and applies client events against the registry and decides
/// who is told about them
pub struct Broadcaster {
    registry: Arc<PlayerRegistry>,
}

impl Broadcaster {
    /// Create a broadcaster over the given registry
    pub fn new(registry: Arc<PlayerRegistry>) -> Self {
        Self { registry }
    }

    /// The registry this broadcaster mutates
    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    /// Handle one inbound event from `sender`.
    ///
    /// Events referencing an id without a record are dropped silently — the
    /// connection may have just closed and a stale message is expected, not
    /// an error.
    pub fn handle(&self, sender: PlayerId, event: ClientEvent) -> Vec<Outbound> {
        match event {
            ClientEvent::NewPlayer { x, y } => self.handle_new_player(sender, x, y),
            ClientEvent::Movement {
                x,
                y,
                direction,
                is_moving,
            } => {
                let patch = StatePatch {
                    x,
                    y,
                    direction: Some(direction),
                    is_moving: Some(is_moving),
                };
                self.handle_patch(sender, patch, false)
            }
            ClientEvent::Stopped { x, y, direction } => {
                let patch = StatePatch {
                    x,
                    y,
                    direction,
                    is_moving: Some(false),
                };
                self.handle_patch(sender, patch, true)
            }
            ClientEvent::Greeting { message } => self.handle_greeting(sender, message),
        }
    }

    /// Handle a closed connection. Removal is idempotent; the notice goes to
    /// every remaining connection so stale proxies are torn down even if a
    /// concurrent broadcast raced with the removal.
    pub fn handle_disconnect(&self, sender: PlayerId) -> Vec<Outbound> {
        self.registry.remove(sender);
        vec![Outbound::Broadcast {
            except: None,
            event: ServerEvent::PlayerDisconnected(sender),
        }]
    }

    fn handle_new_player(&self, sender: PlayerId, x: f32, y: f32) -> Vec<Outbound> {
        // Snapshot is captured before registration so the new player never
        // sees a half-initialized entry for itself.
        let snapshot = self.registry.snapshot();
        let state = self.registry.insert(sender, x, y);

        info!(
            player_id = sender,
            known_players = snapshot.len(),
            "New player announced"
        );

        vec![
            Outbound::Unicast {
                to: sender,
                event: ServerEvent::CurrentPlayers(snapshot),
            },
            Outbound::Broadcast {
                except: Some(sender),
                event: ServerEvent::NewPlayer(state),
            },
        ]
    }

    fn handle_patch(&self, sender: PlayerId, patch: StatePatch, stopped: bool) -> Vec<Outbound> {
        // No plausibility checks on the reported position: each player is
        // the sole writer of its own record.
        match self.registry.apply(sender, patch) {
            Some(state) => {
                let event = if stopped {
                    ServerEvent::PlayerStopped(state)
                } else {
                    ServerEvent::PlayerMoved(state)
                };
                vec![Outbound::Broadcast {
                    except: Some(sender),
                    event,
                }]
            }
            None => {
                debug!(player_id = sender, "Dropped update for unknown player");
                Vec::new()
            }
        }
    }

    fn handle_greeting(&self, sender: PlayerId, message: String) -> Vec<Outbound> {
        // Stateless relay stamped with the sender's current position
        match self.registry.get(sender) {
            Some(state) => vec![Outbound::Broadcast {
                except: Some(sender),
                event: ServerEvent::PlayerGreeted {
                    player_id: sender,
                    x: state.x,
                    y: state.y,
                    message,
                },
            }],
            None => {
                debug!(player_id = sender, "Dropped greeting from unknown player");
                Vec::new()
            }
        }
    }
}
