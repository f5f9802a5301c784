//! Game Logic Module
//!
//! All game simulation code. Deterministic for a given config, seed and
//! input recording.
//!
//! ## Module Structure
//!
//! - `lane`: Lane sets and first-writer-wins registration
//! - `mover`: Linear motion shared by all actors
//! - `lane_snap`: Player lane index, transition and tilt
//! - `fire`: Cooldown-gated shooting with hold-to-refire
//! - `health`: Hit/hurt/death state machine
//! - `spawn`: Periodic enemy spawner
//! - `score`: Score and persisted best score
//! - `events`: Signals for audio, UI and replay tooling
//! - `input`: Per-tick input frames and recordings
//! - `collision`: Collision events, contact detection, kill zone
//! - `state`: World, actors and the spawn primitive
//! - `tick`: Authoritative simulation loop

pub mod lane;
pub mod mover;
pub mod lane_snap;
pub mod fire;
pub mod health;
pub mod spawn;
pub mod score;
pub mod events;
pub mod input;
pub mod collision;
pub mod state;
pub mod tick;

// Re-export key types
pub use collision::{CollisionEvent, CollisionTag};
pub use events::{GameEvent, Signal, SignalBus, SignalSink};
pub use input::{InputFrame, InputRecording};
pub use lane::{LaneRegistry, LaneSet, LevelId};
pub use state::{ActorId, ActorKind, EntityFactory, PrefabId, SessionPhase, World};
pub use tick::{replay_session, tick, TickResult};
