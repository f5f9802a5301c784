//! Enemy Spawning
//!
//! Periodically picks a random prefab and a random lane and asks the world
//! to instantiate it at the spawn edge.
//!
//! # Lane Selection
//!
//! The lane index is drawn from `[0, count - 1)`, so the top lane never
//! receives a spawn. With a single lane, index 0 is used.

use serde::{Serialize, Deserialize};
use tracing::{debug, warn};

use crate::core::rng::DeterministicRng;
use crate::core::timer::{Timer, MAX_PERIODS_PER_TICK};
use crate::core::vec2::Vec2;
use crate::game::lane::LaneSet;
use crate::game::state::PrefabId;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Spawner tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnConfig {
    /// Candidate prefabs, picked uniformly
    pub prefabs: Vec<PrefabId>,
    /// Seconds between spawns
    pub spawn_delay: f32,
    /// X coordinate of the spawn edge
    pub spawn_x: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            prefabs: vec![PrefabId::new("grunt")],
            spawn_delay: 2.0,
            spawn_x: 12.0,
        }
    }
}

// =============================================================================
// SPAWN DIRECTOR
// =============================================================================

/// Spawner lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum SpawnPhase {
    /// The first tick is spent here
    Startup,
    /// Spawning when the timer runs out
    Running {
        /// Time until the next spawn
        next_spawn: Timer,
    },
    /// No more spawns
    Stopped,
}

/// An enemy the world should instantiate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnRequest {
    /// Prefab to instantiate
    pub prefab: PrefabId,
    /// Spawn point on the chosen lane
    pub position: Vec2,
    /// Chosen lane
    pub lane_index: usize,
}

/// Periodic random-prefab, random-lane spawner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnDirector {
    config: SpawnConfig,
    phase: SpawnPhase,
    spawns_issued: u32,
}

impl SpawnDirector {
    /// Create a spawner waiting for its startup tick.
    pub fn new(config: SpawnConfig) -> Self {
        Self {
            config,
            phase: SpawnPhase::Startup,
            spawns_issued: 0,
        }
    }

    /// Current phase.
    #[inline]
    pub fn phase(&self) -> SpawnPhase {
        self.phase
    }

    /// Still spawning (or about to)?
    #[inline]
    pub fn is_running(&self) -> bool {
        !matches!(self.phase, SpawnPhase::Stopped)
    }

    /// Total spawn requests issued.
    #[inline]
    pub fn spawns_issued(&self) -> u32 {
        self.spawns_issued
    }

    /// Halt future spawns. Already spawned actors are unaffected.
    pub fn stop(&mut self) {
        if self.is_running() {
            debug!(spawns = self.spawns_issued, "spawner stopped");
        }
        self.phase = SpawnPhase::Stopped;
    }

    /// Advance one tick and return the spawns that are due.
    ///
    /// Spawns immediately on the first tick after startup, then every
    /// `spawn_delay` seconds with the overshoot carried. At most
    /// `MAX_PERIODS_PER_TICK` slots are caught up in one tick.
    pub fn tick(&mut self, dt: f32, lanes: Option<&LaneSet>, rng: &mut DeterministicRng) -> Vec<SpawnRequest> {
        let mut requests = Vec::new();

        let mut next_spawn = match self.phase {
            SpawnPhase::Stopped => return requests,
            SpawnPhase::Startup => {
                self.phase = SpawnPhase::Running {
                    next_spawn: Timer::new(0.0),
                };
                return requests;
            }
            SpawnPhase::Running { next_spawn } => next_spawn,
        };

        let mut slots = 0;
        while next_spawn.is_finished() {
            if slots == MAX_PERIODS_PER_TICK {
                debug!(dt, "spawn backlog dropped");
                next_spawn = Timer::new(self.config.spawn_delay);
                break;
            }
            slots += 1;
            if let Some(request) = self.spawn_one(lanes, rng) {
                requests.push(request);
            }

            let delay = Timer::new(self.config.spawn_delay).duration();
            if delay <= 0.0 {
                // Zero delay: once per tick
                next_spawn = Timer::new(0.0);
                break;
            }
            next_spawn = carry(next_spawn, delay);
        }
        next_spawn.advance(dt);

        self.phase = SpawnPhase::Running { next_spawn };
        requests
    }

    /// Pick a prefab and a lane for one spawn slot.
    fn spawn_one(&mut self, lanes: Option<&LaneSet>, rng: &mut DeterministicRng) -> Option<SpawnRequest> {
        let lanes = match lanes {
            Some(lanes) if !lanes.is_empty() => lanes,
            _ => {
                warn!("spawn skipped: no lanes registered");
                return None;
            }
        };

        let Some(prefab) = rng.choose(&self.config.prefabs).cloned() else {
            warn!("spawn skipped: no prefabs configured");
            return None;
        };

        let lane_index = rng.next_index(lanes.len() - 1);
        let y = lanes.get(lane_index)?;

        self.spawns_issued += 1;
        debug!(prefab = %prefab, lane = lane_index, "spawn");

        Some(SpawnRequest {
            prefab,
            position: Vec2::new(self.config.spawn_x, y),
            lane_index,
        })
    }
}

/// Restart `timer` with period `delay`, keeping the overshoot.
fn carry(timer: Timer, delay: f32) -> Timer {
    let mut next = Timer::new(delay);
    next.advance(timer.overshoot());
    next
}

// =============================================================================
// TESTS
// =============================================================================
