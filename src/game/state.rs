//! World State
//!
//! Actors, the player rig and everything else a session owns.
//! Uses BTreeMap for deterministic iteration order.

use std::collections::BTreeMap;
use std::fmt;
use serde::{Serialize, Deserialize};
use tracing::{debug, warn};

use crate::config::{GameConfig, SoundConfig};
use crate::core::hash::{compute_state_hash, StateHash, StateHasher};
use crate::core::rng::DeterministicRng;
use crate::core::timer::Timer;
use crate::core::vec2::Vec2;
use crate::game::collision::{CollisionTag, ContactTracker, KillZone};
use crate::game::events::{Signal, SignalBus, SignalSink};
use crate::game::fire::FireController;
use crate::game::health::{HealthConfig, HealthController, HurtState};
use crate::game::lane::{LaneRegistry, LaneSet, LevelId};
use crate::game::lane_snap::LaneSnapController;
use crate::game::mover::Mover;
use crate::game::score::ScoreLedger;
use crate::game::spawn::SpawnDirector;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Actor identifier, allocated monotonically per world.
///
/// Implements Ord for deterministic BTreeMap ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ActorId(pub u32);

/// Name of an entry in the prefab catalog.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrefabId(String);

impl PrefabId {
    /// Create from a name.
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    /// Prefab name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrefabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Actor role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ActorKind {
    /// The lane-bound vehicle
    Player = 0,
    /// Advances toward the player
    Enemy = 1,
    /// Fired by the player
    Projectile = 2,
    /// Visual-only, removed when its lifetime runs out
    Effect = 3,
}

// =============================================================================
// PREFABS
// =============================================================================

/// Template the world instantiates actors from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrefabSpec {
    /// Actor role
    pub kind: ActorKind,
    /// Collision tag; `None` never collides
    #[serde(default)]
    pub tag: Option<CollisionTag>,
    /// Contact radius
    #[serde(default)]
    pub radius: f32,
    /// Movement speed in units per second
    #[serde(default)]
    pub speed: f32,
    /// Fixed heading; `None` moves along the spawn rotation
    #[serde(default)]
    pub direction: Option<Vec2>,
    /// Health, for actors that can be damaged
    #[serde(default)]
    pub health: Option<HealthConfig>,
    /// Score awarded when this actor dies
    #[serde(default)]
    pub score_value: i64,
    /// Effect spawned where this actor is hit
    #[serde(default)]
    pub impact_effect: Option<PrefabId>,
    /// Seconds until automatic removal
    #[serde(default)]
    pub lifetime: Option<f32>,
}

impl PrefabSpec {
    /// Prefabs this one refers to.
    pub fn references(&self) -> impl Iterator<Item = &PrefabId> {
        self.impact_effect.iter()
    }
}

// =============================================================================
// ACTORS
// =============================================================================

/// A live entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    /// Unique id
    pub id: ActorId,
    /// Role
    pub kind: ActorKind,
    /// Prefab it was built from
    pub prefab: PrefabId,
    /// Collision tag; `None` never collides
    pub tag: Option<CollisionTag>,
    /// Position and motion
    pub mover: Mover,
    /// Facing in radians
    pub rotation: f32,
    /// Visual tilt in degrees (player only)
    pub tilt: f32,
    /// Contact radius
    pub radius: f32,
    /// Damage state
    pub health: Option<HealthController>,
    /// Score awarded on death
    pub score_value: i64,
    /// Effect spawned at the point of impact
    pub impact_effect: Option<PrefabId>,
    /// Automatic removal timer
    pub lifetime: Option<Timer>,
}

impl Actor {
    /// Current position.
    #[inline]
    pub fn position(&self) -> Vec2 {
        self.mover.position()
    }

    /// Is the actor dead or dying?
    pub fn is_dead(&self) -> bool {
        self.health.as_ref().is_some_and(|h| h.is_dead())
    }

    /// Add actor state to hasher.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.id.0);
        hasher.update_u8(self.kind as u8);
        hasher.update_str(self.prefab.as_str());
        hasher.update_vec2(self.mover.position());
        hasher.update_vec2(self.mover.velocity());
        hasher.update_f32(self.rotation);
        hasher.update_f32(self.tilt);
        if let Some(health) = &self.health {
            hasher.update_i32(health.health());
            let state = match health.state() {
                HurtState::Alive => 0,
                HurtState::Hurt { lethal: false, .. } => 1,
                HurtState::Hurt { lethal: true, .. } => 2,
                HurtState::Dead => 3,
            };
            hasher.update_u8(state);
        }
        if let Some(lifetime) = &self.lifetime {
            hasher.update_f32(lifetime.remaining());
        }
    }
}

/// Player-only controllers. The player's actor lives in `World::actors`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerRig {
    /// The player's actor
    pub actor: ActorId,
    /// Lane index and transition
    pub lane_snap: LaneSnapController,
    /// Shooting
    pub fire: FireController,
}

// =============================================================================
// SESSION PHASE
// =============================================================================

/// Current phase of the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Built, not ticked yet
    #[default]
    Waiting,
    /// Active gameplay
    Playing,
    /// The player died
    Ended,
}

// =============================================================================
// SPAWN PRIMITIVE
// =============================================================================

/// Creates and removes actors.
pub trait EntityFactory {
    /// Instantiate `prefab` at `position` facing `rotation` radians.
    ///
    /// Returns `None` for unknown prefabs.
    fn instantiate(&mut self, prefab: &PrefabId, position: Vec2, rotation: f32) -> Option<ActorId>;

    /// Remove an actor. Returns `false` if it did not exist.
    fn destroy(&mut self, id: ActorId) -> bool;
}

// =============================================================================
// WORLD
// =============================================================================

/// Complete state of a session.
#[derive(Debug)]
pub struct World {
    /// Current tick
    pub tick: u32,

    /// Current session phase
    pub phase: SessionPhase,

    /// Level that owns the lanes
    pub level: LevelId,

    /// Lane registration
    pub lanes: LaneRegistry,

    /// All actors (BTreeMap for deterministic iteration)
    pub actors: BTreeMap<ActorId, Actor>,

    /// Next actor ID (monotonic counter)
    pub next_actor_id: u32,

    /// Player controllers
    pub player: PlayerRig,

    /// Enemy spawner
    pub spawner: SpawnDirector,

    /// Score and best score
    pub score: ScoreLedger,

    /// RNG seed (for verification)
    pub rng_seed: u64,

    /// Deterministic RNG state
    pub rng: DeterministicRng,

    /// Prefab catalog
    pub prefabs: BTreeMap<PrefabId, PrefabSpec>,

    /// Off-screen removal band
    pub kill_zone: KillZone,

    /// Sound names for requests
    pub sounds: SoundConfig,

    /// Signal bus
    pub bus: SignalBus,

    /// Collision-enter tracking
    pub contacts: ContactTracker,
}

impl World {
    /// Build a world from configuration: registers the lanes and places the
    /// player on its start lane.
    pub fn new(config: &GameConfig) -> Self {
        let level = config.level.id;
        let mut lanes = LaneRegistry::new();
        if let Err(e) = lanes.build(level, &config.level.lanes) {
            warn!(error = %e, "lane registration failed");
        }

        let player_id = ActorId(0);
        let player = PlayerRig {
            actor: player_id,
            lane_snap: LaneSnapController::new(config.player.lane_snap, config.player.start_lane),
            fire: FireController::new(config.player.fire.clone()),
        };

        let mut world = Self {
            tick: 0,
            phase: SessionPhase::Waiting,
            level,
            lanes,
            actors: BTreeMap::new(),
            next_actor_id: player_id.0 + 1,
            player,
            spawner: SpawnDirector::new(config.spawn.clone()),
            score: ScoreLedger::new(),
            rng_seed: config.rng_seed,
            rng: DeterministicRng::new(config.rng_seed),
            prefabs: config.prefabs.clone(),
            kill_zone: config.kill_zone,
            sounds: config.sounds.clone(),
            bus: SignalBus::new(),
            contacts: ContactTracker::new(),
        };

        let mut mover = Mover::stationary(Vec2::new(config.player.x, 0.0));
        world.player.lane_snap.snap_to_lane(world.lanes.current(), &mut mover);

        world.actors.insert(
            player_id,
            Actor {
                id: player_id,
                kind: ActorKind::Player,
                prefab: PrefabId::new("player"),
                tag: Some(CollisionTag::Player),
                mover,
                rotation: 0.0,
                tilt: 0.0,
                radius: config.player.radius,
                health: Some(HealthController::new(config.player.health.clone())),
                score_value: 0,
                impact_effect: config.player.impact_effect.clone(),
                lifetime: None,
            },
        );
        world.bus.emit(Signal::ActorSpawned {
            actor: player_id,
            kind: ActorKind::Player,
            prefab: PrefabId::new("player"),
        });

        world
    }

    /// Current lane set, if registered.
    pub fn lane_set(&self) -> Option<&LaneSet> {
        self.lanes.current()
    }

    /// The player's actor, while it exists.
    pub fn player_actor(&self) -> Option<&Actor> {
        self.actors.get(&self.player.actor)
    }

    /// Get an actor by ID.
    pub fn get_actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Get an actor mutably by ID.
    pub fn get_actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    /// Count live actors of a kind.
    pub fn count_kind(&self, kind: ActorKind) -> usize {
        self.actors.values().filter(|a| a.kind == kind).count()
    }

    /// Ask the audio layer to play `name`, when configured.
    pub fn request_sound(&mut self, name: Option<String>) {
        if let Some(name) = name {
            self.bus.emit(Signal::SoundRequest { name });
        }
    }

    /// Check if the session has ended.
    pub fn is_ended(&self) -> bool {
        matches!(self.phase, SessionPhase::Ended)
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, self.rng_seed, |hasher| {
            let phase = match self.phase {
                SessionPhase::Waiting => 0,
                SessionPhase::Playing => 1,
                SessionPhase::Ended => 2,
            };
            hasher.update_u8(phase);
            hasher.update_u32(self.next_actor_id);

            let [s0, s1] = self.rng.state();
            hasher.update_u64(s0);
            hasher.update_u64(s1);

            // Actors in sorted order (BTreeMap guarantees this)
            for actor in self.actors.values() {
                actor.hash_into(hasher);
            }

            hasher.update_u64(self.player.lane_snap.current_lane() as u64);
            hasher.update_u32(self.player.fire.shots_fired());
            hasher.update_u32(self.spawner.spawns_issued());
            hasher.update_i64(self.score.score());
            hasher.update_i64(self.score.high_score());
        })
    }
}

impl EntityFactory for World {
    fn instantiate(&mut self, prefab: &PrefabId, position: Vec2, rotation: f32) -> Option<ActorId> {
        let Some(spec) = self.prefabs.get(prefab) else {
            warn!(prefab = %prefab, "unknown prefab");
            return None;
        };

        let id = ActorId(self.next_actor_id);
        self.next_actor_id += 1;

        let direction = spec.direction.unwrap_or_else(|| Vec2::from_angle(rotation));
        let actor = Actor {
            id,
            kind: spec.kind,
            prefab: prefab.clone(),
            tag: spec.tag,
            mover: Mover::new(position, direction, spec.speed),
            rotation,
            tilt: 0.0,
            radius: spec.radius,
            health: spec.health.clone().map(HealthController::new),
            score_value: spec.score_value,
            impact_effect: spec.impact_effect.clone(),
            lifetime: spec.lifetime.map(Timer::new),
        };
        let kind = actor.kind;
        self.actors.insert(id, actor);

        debug!(actor = id.0, prefab = %prefab, x = position.x, y = position.y, "actor spawned");
        self.bus.emit(Signal::ActorSpawned {
            actor: id,
            kind,
            prefab: prefab.clone(),
        });
        Some(id)
    }

    fn destroy(&mut self, id: ActorId) -> bool {
        if self.actors.remove(&id).is_none() {
            return false;
        }
        self.contacts.forget(id);
        self.bus.emit(Signal::ActorDestroyed { actor: id });
        true
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        World::new(&GameConfig::default())
    }

    #[test]
    fn test_actor_id_ordering() {
        assert!(ActorId(1) < ActorId(2));
        assert!(PrefabId::new("a") < PrefabId::new("b"));
    }

    #[test]
    fn test_new_world_places_player_on_lane() {
        let config = GameConfig::default();
        let world = World::new(&config);

        let player = world.player_actor().unwrap();
        let lanes = world.lane_set().unwrap();
        let lane = world.player.lane_snap.current_lane();

        assert_eq!(player.kind, ActorKind::Player);
        assert_eq!(player.position().x, config.player.x);
        assert_eq!(Some(player.position().y), lanes.get(lane));
        assert_eq!(world.phase, SessionPhase::Waiting);
    }

    #[test]
    fn test_instantiate_and_destroy() {
        let mut world = world();
        world.bus.take_events();

        let id = world.instantiate(&PrefabId::new("grunt"), Vec2::new(5.0, 1.0), 0.0).unwrap();
        let grunt = world.get_actor(id).unwrap();
        assert_eq!(grunt.kind, ActorKind::Enemy);
        assert!(grunt.mover.velocity().x < 0.0, "enemies advance toward -x");
        assert!(grunt.health.is_some());

        assert!(world.destroy(id));
        assert!(!world.destroy(id));
        assert!(world.get_actor(id).is_none());

        let events = world.bus.take_events();
        assert!(matches!(events[0].signal, Signal::ActorSpawned { kind: ActorKind::Enemy, .. }));
        assert_eq!(events[1].signal, Signal::ActorDestroyed { actor: id });
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_unknown_prefab_returns_none() {
        let mut world = world();
        let before = world.next_actor_id;

        assert!(world.instantiate(&PrefabId::new("nope"), Vec2::ZERO, 0.0).is_none());
        assert_eq!(world.next_actor_id, before);
    }

    #[test]
    fn test_projectile_heading_follows_rotation() {
        let mut world = world();
        world.prefabs.insert(
            PrefabId::new("dart"),
            PrefabSpec {
                kind: ActorKind::Projectile,
                tag: Some(CollisionTag::Projectile),
                radius: 0.1,
                speed: 4.0,
                direction: None,
                health: None,
                score_value: 0,
                impact_effect: None,
                lifetime: None,
            },
        );

        let id = world
            .instantiate(&PrefabId::new("dart"), Vec2::ZERO, std::f32::consts::PI)
            .unwrap();
        let velocity = world.get_actor(id).unwrap().mover.velocity();
        assert!((velocity.x + 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_world_hash_determinism() {
        let mut a = world();
        let mut b = world();
        assert_eq!(a.compute_hash(), b.compute_hash());

        a.instantiate(&PrefabId::new("grunt"), Vec2::new(3.0, 0.0), 0.0);
        assert_ne!(a.compute_hash(), b.compute_hash());

        b.instantiate(&PrefabId::new("grunt"), Vec2::new(3.0, 0.0), 0.0);
        assert_eq!(a.compute_hash(), b.compute_hash());
    }
}
