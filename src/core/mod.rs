//! Core deterministic primitives.
//!
//! Vector math, timers, smoothing curves, the seeded RNG and state hashing.
//! Nothing in here knows about lanes, actors or the tick loop.

pub mod vec2;
pub mod timer;
pub mod smoothing;
pub mod rng;
pub mod hash;

// Re-export core types
pub use vec2::Vec2;
pub use timer::{Timer, TIMER_EPSILON};
pub use rng::DeterministicRng;
pub use hash::{compute_state_hash, StateHash, StateHasher};
