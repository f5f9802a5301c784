//! Game Signals
//!
//! Everything the simulation tells the outside world (audio, UI, replay
//! tooling) goes through a `SignalSink`. Components receive the sink as a
//! parameter instead of publishing to process-wide subscriber lists.

use serde::{Serialize, Deserialize};
use crate::game::state::{ActorId, ActorKind, PrefabId};

/// Signal payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Signal {
    /// An actor lost health
    DamageTaken {
        actor: ActorId,
        amount: i32,
    },

    /// An actor's hurt window ran out
    HurtFinished {
        actor: ActorId,
    },

    /// An actor died; it is destroyed in the same tick
    Death {
        actor: ActorId,
    },

    /// An actor entered the world
    ActorSpawned {
        actor: ActorId,
        kind: ActorKind,
        prefab: PrefabId,
    },

    /// An actor left the world
    ActorDestroyed {
        actor: ActorId,
    },

    /// A shooter launched a projectile
    ShotFired {
        shooter: ActorId,
        projectile: ActorId,
    },

    /// The player switched lanes
    LaneChanged {
        actor: ActorId,
        lane: usize,
    },

    /// Current score changed
    ScoreChanged {
        score: i64,
    },

    /// The score passed the best score for the first time this session
    NewHighScore {
        score: i64,
    },

    /// Ask the audio layer to play a named sound
    SoundRequest {
        name: String,
    },

    /// The session is over
    SessionEnded {
        tick: u32,
    },
}

/// A signal stamped with the tick that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when the signal was emitted
    pub tick: u32,

    /// Signal payload
    pub signal: Signal,
}

/// Receiver of signals.
///
/// Listeners get every signal synchronously, inside the tick that produced it.
pub trait SignalSink {
    /// Deliver one signal.
    fn emit(&mut self, signal: Signal);
}

/// Collects signals in order. Handy as a mock sink.
impl SignalSink for Vec<Signal> {
    fn emit(&mut self, signal: Signal) {
        self.push(signal);
    }
}

/// Signal bus owned by the world.
///
/// Stamps each signal with the current tick, keeps it for the tick result
/// and forwards it to every registered listener.
#[derive(Default)]
pub struct SignalBus {
    tick: u32,
    pending: Vec<GameEvent>,
    listeners: Vec<Box<dyn SignalSink>>,
}

impl SignalBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Listeners are called in registration order.
    pub fn subscribe(&mut self, listener: Box<dyn SignalSink>) {
        self.listeners.push(listener);
    }

    /// Set the tick used to stamp subsequent signals.
    pub fn set_tick(&mut self, tick: u32) {
        self.tick = tick;
    }

    /// Drain the events emitted since the last call.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending)
    }
}

impl SignalSink for SignalBus {
    fn emit(&mut self, signal: Signal) {
        for listener in &mut self.listeners {
            listener.emit(signal.clone());
        }
        self.pending.push(GameEvent {
            tick: self.tick,
            signal,
        });
    }
}

impl std::fmt::Debug for SignalBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalBus")
            .field("tick", &self.tick)
            .field("pending", &self.pending.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
