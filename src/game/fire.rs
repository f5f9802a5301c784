//! Fire Control
//!
//! Cooldown-gated shooting. Holding the trigger latches `wants_to_fire`, so
//! the shooter re-fires the moment each cooldown ends until released.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::timer::{Timer, MAX_PERIODS_PER_TICK};
use crate::core::vec2::Vec2;
use crate::game::state::PrefabId;

/// Shooter tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FireConfig {
    /// Minimum seconds between shots
    pub cooldown: f32,
    /// Launch speed in units per second
    pub projectile_speed: f32,
    /// Prefab instantiated for each shot
    pub projectile: PrefabId,
    /// Barrel position relative to the shooter
    #[serde(default)]
    pub muzzle_offset: Vec2,
}

impl Default for FireConfig {
    fn default() -> Self {
        Self {
            cooldown: 0.5,
            projectile_speed: 12.0,
            projectile: PrefabId::new("bullet"),
            muzzle_offset: Vec2::new(0.75, 0.0),
        }
    }
}

/// Whether the shooter may fire.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum CooldownState {
    /// A shot can be fired now
    Ready,
    /// Waiting for the timer to run out
    OnCooldown(Timer),
}

/// A projectile the world should instantiate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShotRequest {
    /// Prefab to instantiate
    pub prefab: PrefabId,
    /// Spawn point
    pub position: Vec2,
    /// Facing in radians
    pub rotation: f32,
    /// Launch velocity
    pub velocity: Vec2,
}

/// Cooldown state machine for one shooter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FireController {
    config: FireConfig,
    state: CooldownState,
    wants_to_fire: bool,
    shots_fired: u32,
}

impl FireController {
    /// Create a ready shooter.
    pub fn new(config: FireConfig) -> Self {
        Self {
            config,
            state: CooldownState::Ready,
            wants_to_fire: false,
            shots_fired: 0,
        }
    }

    /// Current cooldown state.
    #[inline]
    pub fn state(&self) -> CooldownState {
        self.state
    }

    /// Is the trigger held?
    #[inline]
    pub fn wants_to_fire(&self) -> bool {
        self.wants_to_fire
    }

    /// Total shots fired.
    #[inline]
    pub fn shots_fired(&self) -> u32 {
        self.shots_fired
    }

    /// Trigger pressed: latch and try to fire right away.
    pub fn hold_start(&mut self, origin: Vec2, facing: f32) -> Option<ShotRequest> {
        self.wants_to_fire = true;
        self.request_fire(origin, facing)
    }

    /// Trigger released. A running cooldown keeps running.
    pub fn hold_end(&mut self) {
        self.wants_to_fire = false;
    }

    /// One fire attempt. Dropped while on cooldown.
    pub fn request_fire(&mut self, origin: Vec2, facing: f32) -> Option<ShotRequest> {
        match self.state {
            CooldownState::Ready => Some(self.fire(origin, facing)),
            CooldownState::OnCooldown(_) => None,
        }
    }

    /// Advance the cooldown, auto-firing on expiry while the trigger is held.
    ///
    /// A long `dt` can cover several cooldown periods and yield several shots,
    /// at most `MAX_PERIODS_PER_TICK`.
    pub fn tick(&mut self, dt: f32, origin: Vec2, facing: f32) -> Vec<ShotRequest> {
        let mut shots = Vec::new();

        let CooldownState::OnCooldown(mut timer) = self.state else {
            return shots;
        };
        timer.advance(dt);
        if !timer.is_finished() {
            self.state = CooldownState::OnCooldown(timer);
            return shots;
        }

        while self.wants_to_fire && timer.is_finished() {
            if shots.len() as u32 == MAX_PERIODS_PER_TICK {
                debug!(dt, "cooldown backlog dropped");
                timer.restart();
                break;
            }
            shots.push(self.make_shot(origin, facing));
            timer.restart_carrying();
            // Zero-length cooldowns fire once per tick
            if timer.duration() <= 0.0 {
                break;
            }
        }

        self.state = if shots.is_empty() {
            CooldownState::Ready
        } else {
            CooldownState::OnCooldown(timer)
        };
        shots
    }

    fn fire(&mut self, origin: Vec2, facing: f32) -> ShotRequest {
        let shot = self.make_shot(origin, facing);
        self.state = CooldownState::OnCooldown(Timer::new(self.config.cooldown));
        shot
    }

    fn make_shot(&mut self, origin: Vec2, facing: f32) -> ShotRequest {
        self.shots_fired += 1;
        ShotRequest {
            prefab: self.config.projectile.clone(),
            position: origin + self.config.muzzle_offset,
            rotation: facing,
            velocity: Vec2::from_angle(facing).scale(self.config.projectile_speed),
        }
    }
}
