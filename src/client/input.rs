//! Local movement module
//!
//! Samples directional input each tick, moves the local player immediately
//! (never waiting on the network) and decides which events to emit.
//! Movement is edge-triggered: a `player movement` event goes out only when
//! position or facing changed since the last emission. The idle message is
//! deliberately emitted every tick while at rest.

use tracing::trace;

use crate::protocol::{ClientEvent, Direction};

/// Directional input sampled from the rendering layer's input system
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorInput {
    pub left: bool,
    pub right: bool,
    pub down: bool,
    pub up: bool,
}

impl CursorInput {
    /// No keys held
    pub const fn idle() -> Self {
        Self {
            left: false,
            right: false,
            down: false,
            up: false,
        }
    }

    /// Input with exactly one direction held
    pub fn held(direction: Direction) -> Self {
        let mut input = Self::idle();
        match direction {
            Direction::Left => input.left = true,
            Direction::Right => input.right = true,
            Direction::Front => input.down = true,
            Direction::Back => input.up = true,
        }
        input
    }

    /// Derive at most one active direction. Movement is single-direction:
    /// fixed priority left, right, front (down), back (up), first match wins.
    pub fn active_direction(&self) -> Option<Direction> {
        if self.left {
            Some(Direction::Left)
        } else if self.right {
            Some(Direction::Right)
        } else if self.down {
            Some(Direction::Front)
        } else if self.up {
            Some(Direction::Back)
        } else {
            None
        }
    }
}

/// Drives the local player from sampled input
#[derive(Debug)]
pub struct MovementController {
    x: f32,
    y: f32,
    /// Last facing, kept while idle so the sprite keeps its orientation
    facing: Option<Direction>,
    /// Walk speed in world units per second
    walk_speed: f32,
    /// Position and facing of the last movement emission
    last_sent: Option<(f32, f32, Direction)>,
}

impl MovementController {
    /// Create a controller at the spawn position
    pub fn new(x: f32, y: f32, walk_speed: f32) -> Self {
        Self {
            x,
            y,
            facing: None,
            walk_speed,
            last_sent: None,
        }
    }

    /// Current local position
    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    /// Current facing, `None` until the player has moved
    pub fn facing(&self) -> Option<Direction> {
        self.facing
    }

    /// Whether input is currently driving the player
    pub fn is_moving(&self, input: &CursorInput) -> bool {
        input.active_direction().is_some()
    }

    /// Advance one simulation tick.
    ///
    /// Local position always updates immediately; the returned event (if
    /// any) is what should be sent to the server this tick.
    pub fn tick(&mut self, input: &CursorInput, dt: f32) -> Option<ClientEvent> {
        match input.active_direction() {
            Some(direction) => {
                let step = self.walk_speed * dt;
                match direction {
                    Direction::Left => self.x -= step,
                    Direction::Right => self.x += step,
                    Direction::Front => self.y += step,
                    Direction::Back => self.y -= step,
                }
                self.facing = Some(direction);

                // Edge-triggered: only emit when something changed
                if self.last_sent == Some((self.x, self.y, direction)) {
                    return None;
                }
                self.last_sent = Some((self.x, self.y, direction));

                trace!(x = self.x, y = self.y, direction = %direction, "Movement emitted");
                Some(ClientEvent::Movement {
                    x: self.x,
                    y: self.y,
                    direction,
                    is_moving: true,
                })
            }
            None => {
                // Idle is emitted every tick so late or lossy delivery still
                // converges on the rest position.
                Some(ClientEvent::Stopped {
                    x: self.x,
                    y: self.y,
                    direction: self.facing,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DT: f32 = 0.1;

    #[test]
    fn test_direction_priority() {
        let input = CursorInput {
            left: true,
            right: true,
            down: true,
            up: true,
        };
        assert_eq!(input.active_direction(), Some(Direction::Left));

        let input = CursorInput {
            left: false,
            right: true,
            down: true,
            up: true,
        };
        assert_eq!(input.active_direction(), Some(Direction::Right));

        let input = CursorInput {
            left: false,
            right: false,
            down: true,
            up: true,
        };
        assert_eq!(input.active_direction(), Some(Direction::Front));

        let input = CursorInput {
            left: false,
            right: false,
            down: false,
            up: true,
        };
        assert_eq!(input.active_direction(), Some(Direction::Back));

        assert_eq!(CursorInput::idle().active_direction(), None);
    }

    #[test]
    fn test_movement_updates_position_immediately() {
        let mut controller = MovementController::new(100.0, 100.0, 10.0);

        let event = controller.tick(&CursorInput::held(Direction::Right), DT);
        assert_eq!(controller.position(), (101.0, 100.0));
        assert_eq!(controller.facing(), Some(Direction::Right));
        assert_eq!(
            event,
            Some(ClientEvent::Movement {
                x: 101.0,
                y: 100.0,
                direction: Direction::Right,
                is_moving: true,
            })
        );
    }

    #[test]
    fn test_each_axis_moves_the_right_way() {
        let mut controller = MovementController::new(0.0, 0.0, 10.0);
        controller.tick(&CursorInput::held(Direction::Left), DT);
        assert_eq!(controller.position(), (-1.0, 0.0));
        controller.tick(&CursorInput::held(Direction::Front), DT);
        assert_eq!(controller.position(), (-1.0, 1.0));
        controller.tick(&CursorInput::held(Direction::Back), DT);
        assert_eq!(controller.position(), (-1.0, 0.0));
    }

    #[test]
    fn test_movement_is_edge_triggered() {
        let mut controller = MovementController::new(0.0, 0.0, 10.0);
        let input = CursorInput::held(Direction::Right);

        // A zero-length step changes nothing, so nothing is emitted twice
        assert!(controller.tick(&input, DT).is_some());
        assert!(controller.tick(&input, 0.0).is_none());

        // Any actual movement emits again
        assert!(controller.tick(&input, DT).is_some());
    }

    #[test]
    fn test_idle_emits_stop_every_tick() {
        let mut controller = MovementController::new(0.0, 0.0, 10.0);
        controller.tick(&CursorInput::held(Direction::Front), DT);

        for _ in 0..3 {
            let event = controller.tick(&CursorInput::idle(), DT);
            assert_eq!(
                event,
                Some(ClientEvent::Stopped {
                    x: 0.0,
                    y: 1.0,
                    direction: Some(Direction::Front),
                })
            );
        }
        // Position untouched while idle
        assert_eq!(controller.position(), (0.0, 1.0));
    }

    #[test]
    fn test_stop_before_any_movement_has_no_facing() {
        let mut controller = MovementController::new(5.0, 5.0, 10.0);
        let event = controller.tick(&CursorInput::idle(), DT);
        assert_eq!(
            event,
            Some(ClientEvent::Stopped {
                x: 5.0,
                y: 5.0,
                direction: None,
            })
        );
    }

    #[test]
    fn test_direction_change_emits_even_at_same_position() {
        let mut controller = MovementController::new(0.0, 0.0, 10.0);
        controller.tick(&CursorInput::held(Direction::Right), DT);

        // Turning without covering ground still counts as a change
        let event = controller.tick(&CursorInput::held(Direction::Back), 0.0);
        assert_eq!(
            event,
            Some(ClientEvent::Movement {
                x: 1.0,
                y: 0.0,
                direction: Direction::Back,
                is_moving: true,
            })
        );
    }
}
