//! Health and Hurt Windows
//!
//! Per-actor hit/hurt/death state machine driven by tagged collisions.
//!
//! A hit puts the actor in a timed hurt window during which further hits are
//! ignored. Death is only declared once that window ends, so the hurt and
//! death feedback never overlap.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::timer::Timer;
use crate::game::collision::{CollisionEvent, CollisionTag};
use crate::game::events::{Signal, SignalSink};
use crate::game::state::ActorId;

/// Health tuning for one actor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Starting health
    pub health: i32,
    /// Length of the hurt window in seconds
    pub hurt_time: f32,
    /// Colliders with this tag deal damage
    pub damage_tag: CollisionTag,
    /// Damage per hit
    #[serde(default = "default_damage")]
    pub damage: i32,
    /// Destroy the collider that dealt the damage
    #[serde(default)]
    pub destroy_assailant: bool,
    /// Hold the actor's motion for the length of the hurt window
    #[serde(default)]
    pub pause_when_hurt: bool,
}

fn default_damage() -> i32 {
    1
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            health: 1,
            hurt_time: 0.25,
            damage_tag: CollisionTag::Projectile,
            damage: default_damage(),
            destroy_assailant: false,
            pause_when_hurt: false,
        }
    }
}

/// Damage state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum HurtState {
    /// Can take damage
    Alive,
    /// Invulnerable until the timer runs out; `lethal` when health hit zero
    Hurt { timer: Timer, lethal: bool },
    /// Terminal
    Dead,
}

/// Result of a collision reaching the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitOutcome {
    /// Wrong tag
    Ignored,
    /// Damage applied
    Damaged {
        /// The collider should be destroyed
        destroy_assailant: bool,
    },
    /// Damage tag matched during the hurt window or after death. No damage,
    /// but the collider is still consumed when configured.
    Absorbed {
        /// The collider should be destroyed
        destroy_assailant: bool,
    },
}

/// What a tick of the hurt timer produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HealthTransition {
    /// Nothing changed
    None,
    /// Hurt window over, back to Alive
    Recovered,
    /// Hurt window over with no health left; the actor must be destroyed
    Died,
}

/// Hit/hurt/death state machine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthController {
    config: HealthConfig,
    health: i32,
    state: HurtState,
}

impl HealthController {
    /// Create an Alive controller with the configured health.
    pub fn new(config: HealthConfig) -> Self {
        Self {
            health: config.health,
            state: HurtState::Alive,
            config,
        }
    }

    /// Remaining health (may be negative after a lethal hit).
    #[inline]
    pub fn health(&self) -> i32 {
        self.health
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> HurtState {
        self.state
    }

    /// Tag that deals damage to this actor.
    #[inline]
    pub fn damage_tag(&self) -> CollisionTag {
        self.config.damage_tag
    }

    /// In a hurt window?
    #[inline]
    pub fn is_hurt(&self) -> bool {
        matches!(self.state, HurtState::Hurt { .. })
    }

    /// Dead?
    #[inline]
    pub fn is_dead(&self) -> bool {
        matches!(self.state, HurtState::Dead)
    }

    /// Motion is held while hurt?
    #[inline]
    pub fn pauses_when_hurt(&self) -> bool {
        self.config.pause_when_hurt
    }

    /// React to a collision. Only the configured damage tag hurts.
    ///
    /// A matching collider is consumed (when `destroy_assailant` is set) even
    /// if the hit itself is ignored, so it cannot pass through.
    pub fn on_collision(&mut self, actor: ActorId, event: &CollisionEvent, sink: &mut dyn SignalSink) -> HitOutcome {
        if event.tag != self.config.damage_tag {
            return HitOutcome::Ignored;
        }

        let destroy_assailant = self.config.destroy_assailant;
        if self.take_damage(actor, self.config.damage, sink) {
            HitOutcome::Damaged { destroy_assailant }
        } else {
            HitOutcome::Absorbed { destroy_assailant }
        }
    }

    /// Apply `amount` damage. Returns `false` when it was ignored.
    ///
    /// Ignored while hurt or dead, and for non-positive amounts.
    pub fn take_damage(&mut self, actor: ActorId, amount: i32, sink: &mut dyn SignalSink) -> bool {
        if amount <= 0 {
            return false;
        }
        match self.state {
            HurtState::Alive => {}
            HurtState::Hurt { .. } => {
                debug!(actor = actor.0, "hit ignored during hurt window");
                return false;
            }
            HurtState::Dead => return false,
        }

        self.health = self.health.saturating_sub(amount);
        sink.emit(Signal::DamageTaken { actor, amount });

        // Always enter the hurt window, even on a lethal hit
        self.state = HurtState::Hurt {
            timer: Timer::new(self.config.hurt_time),
            lethal: self.health <= 0,
        };
        debug!(actor = actor.0, health = self.health, "damage taken");
        true
    }

    /// Advance the hurt timer.
    pub fn tick(&mut self, actor: ActorId, dt: f32, sink: &mut dyn SignalSink) -> HealthTransition {
        let HurtState::Hurt { mut timer, lethal } = self.state else {
            return HealthTransition::None;
        };

        timer.advance(dt);
        if !timer.is_finished() {
            self.state = HurtState::Hurt { timer, lethal };
            return HealthTransition::None;
        }

        if lethal {
            self.state = HurtState::Dead;
            sink.emit(Signal::Death { actor });
            sink.emit(Signal::HurtFinished { actor });
            HealthTransition::Died
        } else {
            self.state = HurtState::Alive;
            sink.emit(Signal::HurtFinished { actor });
            HealthTransition::Recovered
        }
    }
}
