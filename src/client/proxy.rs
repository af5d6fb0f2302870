//! Remote player interpolation module
//!
//! One [`RemoteProxy`] exists per known remote player. Network updates only
//! move the proxy's *target*; the rendered position eases toward it over a
//! fixed short window each frame, so sparse coarse updates come out as
//! smooth motion. Stops snap instead of easing to avoid lag accumulating at
//! rest. The rendering layer reads proxies but never writes them.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::protocol::{Direction, PlayerId, PlayerState, ServerEvent};

/// Fixed interpolation window in seconds, sized to roughly one network
/// update interval
pub const INTERPOLATION_WINDOW: f32 = 0.06;

/// Positional delta below which an update is treated as standing still
pub const MOVE_EPSILON: f32 = 0.1;

/// An in-flight interpolation from a captured start position
#[derive(Debug, Clone, Copy)]
struct Easing {
    from_x: f32,
    from_y: f32,
    started_at: f32,
}

/// Client-local, smoothed representation of one remote player
#[derive(Debug)]
pub struct RemoteProxy {
    pub id: PlayerId,
    rendered_x: f32,
    rendered_y: f32,
    target_x: f32,
    target_y: f32,
    /// Facing reported by the server
    pub direction: Option<Direction>,
    /// Whether the walk animation should play
    pub walking: bool,
    easing: Option<Easing>,
}

impl RemoteProxy {
    /// Materialize a proxy at a reported state, rendered exactly there
    pub fn from_state(state: &PlayerState) -> Self {
        Self {
            id: state.player_id,
            rendered_x: state.x,
            rendered_y: state.y,
            target_x: state.x,
            target_y: state.y,
            direction: state.direction,
            walking: false,
            easing: None,
        }
    }

    /// Position the rendering layer should draw this frame
    pub fn rendered_position(&self) -> (f32, f32) {
        (self.rendered_x, self.rendered_y)
    }

    /// Latest reported position
    pub fn target_position(&self) -> (f32, f32) {
        (self.target_x, self.target_y)
    }

    /// Whether an interpolation is currently in flight
    pub fn is_interpolating(&self) -> bool {
        self.easing.is_some()
    }

    /// Apply a position update received while the remote player walks.
    ///
    /// A fresh easing always starts from the *current rendered* position,
    /// even mid-flight — restarting from the previous target would make the
    /// sprite rubber-band.
    pub fn apply_update(&mut self, state: &PlayerState, now: f32) {
        if let Some(direction) = state.direction {
            self.direction = Some(direction);
        }

        let dx = state.x - self.target_x;
        let dy = state.y - self.target_y;
        let negligible = dx.abs() <= MOVE_EPSILON && dy.abs() <= MOVE_EPSILON;

        if !state.is_moving || negligible {
            self.snap_to(state.x, state.y);
            return;
        }

        self.easing = Some(Easing {
            from_x: self.rendered_x,
            from_y: self.rendered_y,
            started_at: now,
        });
        self.target_x = state.x;
        self.target_y = state.y;
        self.walking = true;

        trace!(
            player_id = self.id,
            target_x = state.x,
            target_y = state.y,
            "Interpolation started"
        );
    }

    /// Apply a stop: snap directly to the reported rest position and halt
    /// the walk animation
    pub fn apply_stop(&mut self, state: &PlayerState) {
        if let Some(direction) = state.direction {
            self.direction = Some(direction);
        }
        self.snap_to(state.x, state.y);
    }

    /// Advance the easing for this frame. Time-driven and independent of
    /// message arrival; ends exactly on the target.
    pub fn advance(&mut self, now: f32) {
        let Some(easing) = self.easing else {
            return;
        };

        let t = ((now - easing.started_at) / INTERPOLATION_WINDOW).clamp(0.0, 1.0);
        self.rendered_x = easing.from_x + (self.target_x - easing.from_x) * t;
        self.rendered_y = easing.from_y + (self.target_y - easing.from_y) * t;

        if t >= 1.0 {
            self.rendered_x = self.target_x;
            self.rendered_y = self.target_y;
            self.easing = None;
            self.walking = false;
        }
    }

    fn snap_to(&mut self, x: f32, y: f32) {
        self.rendered_x = x;
        self.rendered_y = y;
        self.target_x = x;
        self.target_y = y;
        self.easing = None;
        self.walking = false;
    }
}

/// Owns every remote proxy known to this client
#[derive(Debug, Default)]
pub struct ProxyWorld {
    proxies: HashMap<PlayerId, RemoteProxy>,
}

impl ProxyWorld {
    /// Create an empty proxy store
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one server event. Duplicate sightings of a known id are
    /// ignored; updates for unknown ids are stale and dropped.
    pub fn handle_event(&mut self, event: &ServerEvent, now: f32) {
        match event {
            ServerEvent::CurrentPlayers(players) => {
                for state in players.values() {
                    self.materialize(state);
                }
            }
            ServerEvent::NewPlayer(state) => {
                self.materialize(state);
            }
            ServerEvent::PlayerMoved(state) => {
                if let Some(proxy) = self.proxies.get_mut(&state.player_id) {
                    proxy.apply_update(state, now);
                }
            }
            ServerEvent::PlayerStopped(state) => {
                if let Some(proxy) = self.proxies.get_mut(&state.player_id) {
                    proxy.apply_stop(state);
                }
            }
            ServerEvent::PlayerDisconnected(id) => {
                // Destroys the proxy and cancels any in-flight easing.
                // Also absorbs the echo of our own disconnect id.
                if self.proxies.remove(id).is_some() {
                    debug!(player_id = id, "Proxy removed");
                }
            }
            // Greetings are a UI concern handled by the session
            ServerEvent::PlayerGreeted { .. } => {}
        }
    }

    /// Advance all in-flight interpolations for this frame
    pub fn advance(&mut self, now: f32) {
        for proxy in self.proxies.values_mut() {
            proxy.advance(now);
        }
    }

    /// Get a proxy by id
    pub fn get(&self, id: PlayerId) -> Option<&RemoteProxy> {
        self.proxies.get(&id)
    }

    /// Number of known remote players
    pub fn count(&self) -> usize {
        self.proxies.len()
    }

    /// Iterate over all proxies, for the rendering layer
    pub fn iter(&self) -> impl Iterator<Item = &RemoteProxy> {
        self.proxies.values()
    }

    fn materialize(&mut self, state: &PlayerState) {
        if self.proxies.contains_key(&state.player_id) {
            debug!(player_id = state.player_id, "Duplicate sighting ignored");
            return;
        }
        self.proxies
            .insert(state.player_id, RemoteProxy::from_state(state));
        debug!(
            player_id = state.player_id,
            x = state.x,
            y = state.y,
            "Proxy created"
        );
    }
}
