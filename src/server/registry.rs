//! Player registry module
//!
//! Tracks the authoritative [`PlayerState`] for every connected player.
//! Records live exactly as long as their connection: created when the player
//! announces itself, destroyed on disconnect. Each player is the sole writer
//! of its own record, so updates are last-write-wins by construction.

use std::collections::HashMap;

use dashmap::DashMap;
use tracing::{debug, info};

use crate::protocol::{PlayerId, PlayerState, StatePatch};

/// Thread-safe registry of authoritative player records
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    /// Map of player ID to authoritative state
    players: DashMap<PlayerId, PlayerState>,
}

impl PlayerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            players: DashMap::new(),
        }
    }

    /// Register a new player record with its initial position.
    ///
    /// Replaces any previous record for the same id; with ids assigned
    /// uniquely per connection that only happens on a duplicate announce
    /// from the same connection.
    pub fn insert(&self, id: PlayerId, x: f32, y: f32) -> PlayerState {
        let state = PlayerState::new(id, x, y);
        self.players.insert(id, state.clone());

        info!(player_id = id, x = x, y = y, "Player registered");
        state
    }

    /// Apply a partial update to an existing record, returning the updated
    /// state. Returns `None` without side effects for unknown ids — stale
    /// messages arriving after a disconnect are silently dropped.
    pub fn apply(&self, id: PlayerId, patch: StatePatch) -> Option<PlayerState> {
        let mut entry = self.players.get_mut(&id)?;

        entry.x = patch.x;
        entry.y = patch.y;
        if let Some(direction) = patch.direction {
            entry.direction = Some(direction);
        }
        if let Some(is_moving) = patch.is_moving {
            entry.is_moving = is_moving;
        }

        Some(entry.clone())
    }

    /// Remove a player record, returning it if it existed. Idempotent.
    pub fn remove(&self, id: PlayerId) -> Option<PlayerState> {
        let removed = self.players.remove(&id).map(|(_, state)| state);
        if removed.is_some() {
            info!(player_id = id, "Player unregistered");
        } else {
            debug!(player_id = id, "Remove for unknown player ignored");
        }
        removed
    }

    /// Get a copy of a player's current state
    pub fn get(&self, id: PlayerId) -> Option<PlayerState> {
        self.players.get(&id).map(|r| r.clone())
    }

    /// Check whether a record exists for the given id
    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    /// Get the number of registered players
    pub fn count(&self) -> usize {
        self.players.len()
    }

    /// Capture a full snapshot of all current records, keyed by id.
    /// Used to bring late joiners up to date.
    pub fn snapshot(&self) -> HashMap<PlayerId, PlayerState> {
        self.players
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Direction;

    #[test]
    fn test_insert_and_get() {
        let registry = PlayerRegistry::new();
        registry.insert(1, 100.0, 100.0);

        let state = registry.get(1).unwrap();
        assert_eq!(state.player_id, 1);
        assert_eq!(state.x, 100.0);
        assert_eq!(state.y, 100.0);
        assert_eq!(state.direction, None);
        assert!(!state.is_moving);
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_apply_updates_fields() {
        let registry = PlayerRegistry::new();
        registry.insert(1, 0.0, 0.0);

        let updated = registry
            .apply(
                1,
                StatePatch {
                    x: 10.0,
                    y: 5.0,
                    direction: Some(Direction::Right),
                    is_moving: Some(true),
                },
            )
            .unwrap();

        assert_eq!(updated.x, 10.0);
        assert_eq!(updated.y, 5.0);
        assert_eq!(updated.direction, Some(Direction::Right));
        assert!(updated.is_moving);
    }

    #[test]
    fn test_apply_keeps_unpatched_fields() {
        let registry = PlayerRegistry::new();
        registry.insert(1, 0.0, 0.0);
        registry.apply(
            1,
            StatePatch {
                x: 1.0,
                y: 1.0,
                direction: Some(Direction::Left),
                is_moving: Some(true),
            },
        );

        // A stop without a direction keeps the last facing
        let updated = registry
            .apply(
                1,
                StatePatch {
                    x: 2.0,
                    y: 1.0,
                    direction: None,
                    is_moving: Some(false),
                },
            )
            .unwrap();

        assert_eq!(updated.direction, Some(Direction::Left));
        assert!(!updated.is_moving);
    }

    #[test]
    fn test_last_write_wins() {
        let registry = PlayerRegistry::new();
        registry.insert(1, 0.0, 0.0);

        let patches = [
            (10.0, 0.0, Direction::Right, true),
            (10.0, 8.0, Direction::Front, true),
            (4.0, 8.0, Direction::Left, false),
        ];
        for (x, y, direction, is_moving) in patches {
            registry.apply(
                1,
                StatePatch {
                    x,
                    y,
                    direction: Some(direction),
                    is_moving: Some(is_moving),
                },
            );
        }

        // Registry state equals the last patch exactly
        let state = registry.get(1).unwrap();
        assert_eq!(state.x, 4.0);
        assert_eq!(state.y, 8.0);
        assert_eq!(state.direction, Some(Direction::Left));
        assert!(!state.is_moving);
    }

    #[test]
    fn test_apply_unknown_id_is_noop() {
        let registry = PlayerRegistry::new();
        let result = registry.apply(
            99,
            StatePatch {
                x: 1.0,
                y: 1.0,
                direction: None,
                is_moving: None,
            },
        );

        assert!(result.is_none());
        assert_eq!(registry.count(), 0);
        // No record was resurrected
        assert!(!registry.contains(99));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = PlayerRegistry::new();
        registry.insert(1, 0.0, 0.0);

        assert!(registry.remove(1).is_some());
        assert!(registry.remove(1).is_none());
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_snapshot() {
        let registry = PlayerRegistry::new();
        registry.insert(1, 100.0, 100.0);
        registry.insert(2, 200.0, 200.0);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[&1].x, 100.0);
        assert_eq!(snapshot[&2].x, 200.0);

        registry.remove(1);
        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert!(!snapshot.contains_key(&1));
    }
}
