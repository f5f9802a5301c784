//! Game Configuration
//!
//! Everything tunable about a session, loaded from JSON. Missing fields fall
//! back to `Default`, which is a playable setup on its own.
//!
//! Environment overrides (see [`GameConfig::from_env`]):
//! - `LANE_DEFENDER_CONFIG`: path to a JSON config file
//! - `LANE_DEFENDER_SEED`: RNG seed
//! - `LANE_DEFENDER_SAVE`: path of the high score file

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::info;

use crate::core::vec2::Vec2;
use crate::game::collision::{CollisionTag, KillZone};
use crate::game::fire::FireConfig;
use crate::game::health::HealthConfig;
use crate::game::lane::LevelId;
use crate::game::lane_snap::LaneSnapConfig;
use crate::game::spawn::SpawnConfig;
use crate::game::state::{ActorKind, PrefabId, PrefabSpec};

/// Env var naming the config file.
pub const ENV_CONFIG: &str = "LANE_DEFENDER_CONFIG";

/// Env var overriding the RNG seed.
pub const ENV_SEED: &str = "LANE_DEFENDER_SEED";

/// Env var overriding the save file path.
pub const ENV_SAVE: &str = "LANE_DEFENDER_SAVE";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config is not valid JSON for `GameConfig`
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range
    #[error("invalid config: {0}")]
    Invalid(String),

    /// A prefab reference has no catalog entry
    #[error("{referenced_by} refers to unknown prefab '{prefab}'")]
    UnknownPrefab {
        /// Where the reference was found
        referenced_by: String,
        /// The missing prefab
        prefab: PrefabId,
    },
}

// =============================================================================
// SECTIONS
// =============================================================================

/// Lane layout of the level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Level identifier (owner of the lane set)
    pub id: LevelId,
    /// Lane heights, in any order
    pub lanes: Vec<f32>,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            id: LevelId(1),
            lanes: vec![-3.0, -1.5, 0.0, 1.5, 3.0],
        }
    }
}

/// Player vehicle setup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Lane index at level start (clamped into the lane set)
    pub start_lane: usize,
    /// Fixed x coordinate
    pub x: f32,
    /// Contact radius
    pub radius: f32,
    /// Lane snapping
    pub lane_snap: LaneSnapConfig,
    /// Shooting
    pub fire: FireConfig,
    /// Damage handling
    pub health: HealthConfig,
    /// Effect spawned where the player is hit
    pub impact_effect: Option<PrefabId>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            start_lane: 2,
            x: -8.0,
            radius: 0.5,
            lane_snap: LaneSnapConfig::default(),
            fire: FireConfig::default(),
            health: HealthConfig {
                health: 3,
                hurt_time: 1.0,
                damage_tag: CollisionTag::Enemy,
                damage: 1,
                destroy_assailant: true,
                pause_when_hurt: false,
            },
            impact_effect: Some(PrefabId::new("explosion")),
        }
    }
}

/// Names of the sounds requested from the audio layer. `None` is silent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundConfig {
    /// Player shot
    pub shoot: Option<String>,
    /// Any actor damaged
    pub hurt: Option<String>,
    /// Any actor died
    pub death: Option<String>,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            shoot: Some("shoot".to_string()),
            hurt: Some("hurt".to_string()),
            death: Some("explosion".to_string()),
        }
    }
}

/// Default prefab catalog: a bullet, two enemies and an explosion effect.
pub fn default_prefabs() -> BTreeMap<PrefabId, PrefabSpec> {
    let mut prefabs = BTreeMap::new();

    prefabs.insert(
        PrefabId::new("bullet"),
        PrefabSpec {
            kind: ActorKind::Projectile,
            tag: Some(CollisionTag::Projectile),
            radius: 0.2,
            speed: 12.0,
            direction: None,
            health: None,
            score_value: 0,
            impact_effect: None,
            lifetime: Some(3.0),
        },
    );
    prefabs.insert(
        PrefabId::new("grunt"),
        PrefabSpec {
            kind: ActorKind::Enemy,
            tag: Some(CollisionTag::Enemy),
            radius: 0.5,
            speed: 2.0,
            direction: Some(Vec2::LEFT),
            health: Some(HealthConfig {
                health: 1,
                hurt_time: 0.1,
                damage_tag: CollisionTag::Projectile,
                damage: 1,
                destroy_assailant: true,
                pause_when_hurt: true,
            }),
            score_value: 10,
            impact_effect: Some(PrefabId::new("explosion")),
            lifetime: None,
        },
    );
    prefabs.insert(
        PrefabId::new("tank"),
        PrefabSpec {
            kind: ActorKind::Enemy,
            tag: Some(CollisionTag::Enemy),
            radius: 0.7,
            speed: 1.0,
            direction: Some(Vec2::LEFT),
            health: Some(HealthConfig {
                health: 3,
                hurt_time: 0.2,
                damage_tag: CollisionTag::Projectile,
                damage: 1,
                destroy_assailant: true,
                pause_when_hurt: true,
            }),
            score_value: 30,
            impact_effect: Some(PrefabId::new("explosion")),
            lifetime: None,
        },
    );
    prefabs.insert(
        PrefabId::new("explosion"),
        PrefabSpec {
            kind: ActorKind::Effect,
            tag: None,
            radius: 0.0,
            speed: 0.0,
            direction: None,
            health: None,
            score_value: 0,
            impact_effect: None,
            lifetime: Some(0.5),
        },
    );

    prefabs
}

// =============================================================================
// GAME CONFIG
// =============================================================================

/// Complete session configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Simulation tick rate (Hz)
    pub tick_rate: u32,
    /// Lane layout
    pub level: LevelConfig,
    /// Player vehicle
    pub player: PlayerConfig,
    /// Enemy spawner
    pub spawn: SpawnConfig,
    /// Prefab catalog
    pub prefabs: BTreeMap<PrefabId, PrefabSpec>,
    /// Off-screen removal band
    pub kill_zone: KillZone,
    /// Sound names
    pub sounds: SoundConfig,
    /// RNG seed
    pub rng_seed: u64,
    /// High score file; `None` keeps the score in memory
    pub save_path: Option<PathBuf>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_rate: crate::TICK_RATE,
            level: LevelConfig::default(),
            player: PlayerConfig::default(),
            spawn: SpawnConfig {
                prefabs: vec![PrefabId::new("grunt"), PrefabId::new("tank")],
                ..SpawnConfig::default()
            },
            prefabs: default_prefabs(),
            kill_zone: KillZone::default(),
            sounds: SoundConfig::default(),
            rng_seed: 0x1A2E_DEF3,
            save_path: None,
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Build from the environment: the config file named by
    /// `LANE_DEFENDER_CONFIG` (or defaults), then seed and save path
    /// overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(ENV_CONFIG) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };

        if let Ok(seed) = std::env::var(ENV_SEED) {
            config.rng_seed = seed
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("{ENV_SEED} is not a u64: {seed:?}")))?;
        }
        if let Ok(path) = std::env::var(ENV_SAVE) {
            config.save_path = Some(PathBuf::from(path));
        }

        config.validate()?;
        Ok(config)
    }

    /// Seconds per tick.
    pub fn tick_seconds(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Check ranges and prefab references.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(ConfigError::Invalid("tick_rate must be positive".into()));
        }

        let durations = [
            ("player.fire.cooldown", self.player.fire.cooldown),
            ("player.health.hurt_time", self.player.health.hurt_time),
            ("player.lane_snap.smooth_time", self.player.lane_snap.smooth_time),
            ("player.lane_snap.lerp_speed", self.player.lane_snap.lerp_speed),
            ("spawn.spawn_delay", self.spawn.spawn_delay),
        ];
        for (name, value) in durations {
            check_non_negative(name, value)?;
        }
        if self.kill_zone.min_x >= self.kill_zone.max_x {
            return Err(ConfigError::Invalid("kill_zone.min_x must be below max_x".into()));
        }

        for (id, spec) in &self.prefabs {
            if let Some(health) = &spec.health {
                check_non_negative(&format!("prefabs.{id}.health.hurt_time"), health.hurt_time)?;
            }
            if let Some(lifetime) = spec.lifetime {
                check_non_negative(&format!("prefabs.{id}.lifetime"), lifetime)?;
            }
            for reference in spec.references() {
                self.require_prefab(&format!("prefabs.{id}"), reference)?;
            }
        }

        self.require_prefab("player.fire.projectile", &self.player.fire.projectile)?;
        if let Some(effect) = &self.player.impact_effect {
            self.require_prefab("player.impact_effect", effect)?;
        }
        for prefab in &self.spawn.prefabs {
            self.require_prefab("spawn.prefabs", prefab)?;
        }

        Ok(())
    }

    fn require_prefab(&self, referenced_by: &str, prefab: &PrefabId) -> Result<(), ConfigError> {
        if self.prefabs.contains_key(prefab) {
            Ok(())
        } else {
            Err(ConfigError::UnknownPrefab {
                referenced_by: referenced_by.to_string(),
                prefab: prefab.clone(),
            })
        }
    }
}

fn check_non_negative(name: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{name} must be a non-negative number, got {value}")))
    }
}
