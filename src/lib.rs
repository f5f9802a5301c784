//! # Lane Defender
//!
//! Deterministic simulation core for a lane-based arcade defense game.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      LANE DEFENDER                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── vec2.rs     - 2D f32 vector                             │
//! │  ├── timer.rs    - Tick-driven countdown timers              │
//! │  ├── smoothing.rs- Exponential lerp, SmoothDamp              │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - State hashing for replay checks           │
//! │                                                              │
//! │  game/           - Game logic (deterministic)                │
//! │  ├── lane.rs     - Lane sets and registration                │
//! │  ├── lane_snap.rs- Player lane transitions and tilt          │
//! │  ├── fire.rs     - Cooldown-gated shooting                   │
//! │  ├── health.rs   - Hurt windows and death                    │
//! │  ├── spawn.rs    - Enemy spawner                             │
//! │  ├── score.rs    - Score and high score                      │
//! │  ├── collision.rs- Collision events, kill zone               │
//! │  ├── state.rs    - World and actors                          │
//! │  └── tick.rs     - Authoritative simulation loop             │
//! │                                                              │
//! │  config.rs       - JSON configuration                        │
//! │  persist.rs      - High score storage                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! Given the same config, seed and input frames, a session produces the
//! same events and the same state hash:
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies
//! - All randomness from seeded Xorshift128+
//! - Every timer advances once per tick by the given `dt`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod config;
pub mod persist;

// Re-export commonly used types
pub use core::rng::DeterministicRng;
pub use core::vec2::Vec2;
pub use config::{ConfigError, GameConfig};
pub use game::input::{InputFrame, InputRecording};
pub use game::state::{ActorId, World};
pub use game::tick::{replay_session, tick, TickResult};
pub use persist::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;
