//! Linear Motion
//!
//! Continuous-position movement shared by every actor kind.

use serde::{Serialize, Deserialize};
use crate::core::vec2::Vec2;

/// Moves a position at constant speed along a fixed direction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mover {
    position: Vec2,
    direction: Vec2,
    speed: f32,
    paused: bool,
}

impl Mover {
    /// Create a mover heading along `direction` (normalized here).
    pub fn new(position: Vec2, direction: Vec2, speed: f32) -> Self {
        Self {
            position,
            direction: direction.normalize(),
            speed,
            paused: false,
        }
    }

    /// A mover that never moves on its own.
    pub fn stationary(position: Vec2) -> Self {
        Self::new(position, Vec2::ZERO, 0.0)
    }

    /// Current position.
    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Teleport to `position`.
    #[inline]
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Unit heading.
    #[inline]
    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    /// Speed in units per second.
    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Velocity, zero while paused.
    pub fn velocity(&self) -> Vec2 {
        if self.paused {
            Vec2::ZERO
        } else {
            self.direction * self.speed
        }
    }

    /// Is motion suspended?
    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Suspend or resume motion. Position is kept either way.
    #[inline]
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Integrate one tick: `position += direction * speed * dt`.
    pub fn advance(&mut self, dt: f32) {
        if self.paused {
            return;
        }
        self.position = self.position + self.direction * (self.speed * dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_motion() {
        let mut mover = Mover::new(Vec2::new(10.0, 2.0), Vec2::LEFT, 4.0);

        for _ in 0..4 {
            mover.advance(0.25);
        }

        assert_eq!(mover.position(), Vec2::new(6.0, 2.0));
        assert_eq!(mover.velocity(), Vec2::new(-4.0, 0.0));
    }

    #[test]
    fn test_pause_keeps_position() {
        let mut mover = Mover::new(Vec2::ZERO, Vec2::new(5.0, 0.0), 2.0);

        mover.advance(1.0);
        mover.set_paused(true);
        mover.advance(1.0);
        mover.advance(1.0);
        assert_eq!(mover.position(), Vec2::new(2.0, 0.0));
        assert_eq!(mover.velocity(), Vec2::ZERO);

        mover.set_paused(false);
        mover.advance(0.5);
        assert_eq!(mover.position(), Vec2::new(3.0, 0.0));
    }

    #[test]
    fn test_stationary_never_moves() {
        let mut mover = Mover::stationary(Vec2::new(1.0, 1.0));
        mover.advance(100.0);
        assert_eq!(mover.position(), Vec2::new(1.0, 1.0));
    }
}
