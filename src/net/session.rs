//! Session management module
//!
//! Tracks one session per live connection and owns the outbound path to it.
//! Session ids double as player ids: assigned at connect, unique for the
//! process lifetime, stable until disconnect.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{NetworkError, Result, TownsyncError};
use crate::protocol::{PlayerId, ServerEvent};
use crate::server::broadcast::Outbound;

/// A connected client session
pub struct Session {
    /// Unique session identifier, also the player id on the wire
    pub id: PlayerId,
    /// Remote address of the client
    pub address: SocketAddr,
    /// Time of session creation
    pub created_at: Instant,
    /// Outbound event channel, consumed by the connection's writer task
    outbound_tx: mpsc::Sender<ServerEvent>,
}

impl Session {
    /// Create a new session with its outbound channel
    pub fn new(id: PlayerId, address: SocketAddr, outbound_tx: mpsc::Sender<ServerEvent>) -> Self {
        Self {
            id,
            address,
            created_at: Instant::now(),
            outbound_tx,
        }
    }

    /// Queue an event for delivery without blocking. A full buffer drops
    /// the event: a lost update is superseded by the next one.
    pub fn try_send(&self, event: ServerEvent) -> Result<()> {
        self.outbound_tx
            .try_send(event)
            .map_err(|_| TownsyncError::Network(NetworkError::WriteBufferFull))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("address", &self.address)
            .field("uptime", &self.created_at.elapsed())
            .finish()
    }
}

/// Thread-safe session manager
pub struct SessionManager {
    /// Map of session ID to session
    sessions: DashMap<PlayerId, Arc<Session>>,
    /// Next session ID to assign
    next_id: AtomicU64,
    /// Maximum simultaneous sessions
    max_sessions: usize,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            next_id: AtomicU64::new(1),
            max_sessions,
        }
    }

    /// Create and register a session for a fresh connection
    pub fn create_session(
        &self,
        address: SocketAddr,
        outbound_tx: mpsc::Sender<ServerEvent>,
    ) -> Result<Arc<Session>> {
        let current = self.sessions.len();
        if current >= self.max_sessions {
            warn!(count = current, max = self.max_sessions, "Server full");
            return Err(TownsyncError::Network(NetworkError::ServerFull(current)));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let session = Arc::new(Session::new(id, address, outbound_tx));
        self.sessions.insert(id, session.clone());

        info!(session_id = id, address = %address, "Session created");
        Ok(session)
    }

    /// Get a session by ID
    pub fn get(&self, id: PlayerId) -> Option<Arc<Session>> {
        self.sessions.get(&id).map(|r| r.clone())
    }

    /// Remove a session. Idempotent.
    pub fn remove(&self, id: PlayerId) {
        if self.sessions.remove(&id).is_some() {
            info!(session_id = id, "Session removed");
        }
    }

    /// Get the count of active sessions
    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    /// Get list of all session IDs
    pub fn session_ids(&self) -> Vec<PlayerId> {
        self.sessions.iter().map(|r| *r.key()).collect()
    }

    /// Queue an event for one session. Unknown sessions are ignored — the
    /// connection may have just closed.
    pub fn send_to(&self, id: PlayerId, event: ServerEvent) {
        if let Some(session) = self.get(id) {
            if let Err(e) = session.try_send(event) {
                warn!(session_id = id, error = %e, "Dropped outbound event");
            }
        }
    }

    /// Queue an event for every session, optionally skipping one
    pub fn broadcast(&self, except: Option<PlayerId>, event: ServerEvent) {
        for entry in self.sessions.iter() {
            let id = *entry.key();
            if Some(id) == except {
                continue;
            }
            if let Err(e) = entry.value().try_send(event.clone()) {
                warn!(session_id = id, error = %e, "Dropped outbound event");
            }
        }
    }

    /// Deliver a batch of broadcaster decisions
    pub fn dispatch(&self, outbound: Vec<Outbound>) {
        for delivery in outbound {
            match delivery {
                Outbound::Unicast { to, event } => self.send_to(to, event),
                Outbound::Broadcast { except, event } => self.broadcast(except, event),
            }
        }
        debug!(sessions = self.count(), "Dispatched outbound batch");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PlayerState;

    fn test_address() -> SocketAddr {
        "127.0.0.1:12345".parse().unwrap()
    }

    fn manager_with_sessions(
        max: usize,
        count: usize,
    ) -> (SessionManager, Vec<mpsc::Receiver<ServerEvent>>) {
        let manager = SessionManager::new(max);
        let mut receivers = Vec::new();
        for _ in 0..count {
            let (tx, rx) = mpsc::channel(8);
            manager.create_session(test_address(), tx).unwrap();
            receivers.push(rx);
        }
        (manager, receivers)
    }

    #[test]
    fn test_session_ids_are_unique_and_sequential() {
        let (manager, _rx) = manager_with_sessions(10, 3);
        let mut ids = manager.session_ids();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_session_limit() {
        let (manager, _rx) = manager_with_sessions(2, 2);

        let (tx, _rx2) = mpsc::channel(8);
        let result = manager.create_session(test_address(), tx);
        assert!(result.is_err());
        assert_eq!(manager.count(), 2);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (manager, _rx) = manager_with_sessions(10, 1);
        manager.remove(1);
        manager.remove(1);
        assert_eq!(manager.count(), 0);
        assert!(manager.get(1).is_none());
    }

    #[test]
    fn test_broadcast_skips_excluded_session() {
        let (manager, mut receivers) = manager_with_sessions(10, 3);

        manager.broadcast(Some(2), ServerEvent::PlayerDisconnected(2));

        assert!(receivers[0].try_recv().is_ok());
        assert!(receivers[1].try_recv().is_err());
        assert!(receivers[2].try_recv().is_ok());
    }

    #[test]
    fn test_dispatch_unicast_and_broadcast() {
        let (manager, mut receivers) = manager_with_sessions(10, 2);

        let state = PlayerState::new(2, 5.0, 5.0);
        manager.dispatch(vec![
            Outbound::Unicast {
                to: 1,
                event: ServerEvent::NewPlayer(state.clone()),
            },
            Outbound::Broadcast {
                except: None,
                event: ServerEvent::PlayerDisconnected(9),
            },
        ]);

        assert_eq!(receivers[0].try_recv().unwrap(), ServerEvent::NewPlayer(state));
        assert_eq!(
            receivers[0].try_recv().unwrap(),
            ServerEvent::PlayerDisconnected(9)
        );
        assert_eq!(
            receivers[1].try_recv().unwrap(),
            ServerEvent::PlayerDisconnected(9)
        );
    }

    #[test]
    fn test_send_to_unknown_session_is_ignored() {
        let (manager, _rx) = manager_with_sessions(10, 1);
        // Must not panic
        manager.send_to(42, ServerEvent::PlayerDisconnected(42));
    }

    #[test]
    fn test_full_buffer_drops_event() {
        let manager = SessionManager::new(10);
        let (tx, mut rx) = mpsc::channel(1);
        manager.create_session(test_address(), tx).unwrap();

        manager.send_to(1, ServerEvent::PlayerDisconnected(7));
        manager.send_to(1, ServerEvent::PlayerDisconnected(8));

        // First event delivered, second dropped on the full buffer
        assert_eq!(rx.try_recv().unwrap(), ServerEvent::PlayerDisconnected(7));
        assert!(rx.try_recv().is_err());
    }
}
