//! Input Frames and Recordings
//!
//! Input arrives already resolved into discrete events: a lane move
//! direction and trigger press/release edges. One `InputFrame` per tick.

use serde::{Serialize, Deserialize};

// =============================================================================
// INPUT TYPES
// =============================================================================

/// Discrete input for a single tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFrame {
    /// Lane move: positive = up, negative = down, 0 = none.
    /// Only the sign is used.
    pub move_dir: i8,

    /// Action flags (packed bits):
    /// - Bit 0: Trigger pressed this tick
    /// - Bit 1: Trigger released this tick
    /// - Bit 2-7: Reserved
    pub flags: u8,
}

impl InputFrame {
    /// Trigger pressed flag bit
    pub const FLAG_FIRE_STARTED: u8 = 0x01;

    /// Trigger released flag bit
    pub const FLAG_FIRE_ENDED: u8 = 0x02;

    /// Create an idle frame.
    pub const fn new() -> Self {
        Self {
            move_dir: 0,
            flags: 0,
        }
    }

    /// Create a frame with a lane move.
    pub const fn with_move(move_dir: i8) -> Self {
        Self { move_dir, flags: 0 }
    }

    /// Create a frame that presses the trigger.
    pub const fn fire_start() -> Self {
        Self {
            move_dir: 0,
            flags: Self::FLAG_FIRE_STARTED,
        }
    }

    /// Create a frame that releases the trigger.
    pub const fn fire_end() -> Self {
        Self {
            move_dir: 0,
            flags: Self::FLAG_FIRE_ENDED,
        }
    }

    /// Lane move direction: -1, 0 or +1.
    #[inline]
    pub fn move_direction(&self) -> i32 {
        (self.move_dir as i32).signum()
    }

    /// Was the trigger pressed this tick?
    #[inline]
    pub fn fire_started(&self) -> bool {
        self.flags & Self::FLAG_FIRE_STARTED != 0
    }

    /// Was the trigger released this tick?
    #[inline]
    pub fn fire_ended(&self) -> bool {
        self.flags & Self::FLAG_FIRE_ENDED != 0
    }

    /// Check if this is an idle frame (no input).
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.move_dir == 0 && self.flags == 0
    }

    /// Set the trigger-pressed flag.
    #[inline]
    pub fn set_fire_started(&mut self, pressed: bool) {
        if pressed {
            self.flags |= Self::FLAG_FIRE_STARTED;
        } else {
            self.flags &= !Self::FLAG_FIRE_STARTED;
        }
    }

    /// Set the trigger-released flag.
    #[inline]
    pub fn set_fire_ended(&mut self, released: bool) {
        if released {
            self.flags |= Self::FLAG_FIRE_ENDED;
        } else {
            self.flags &= !Self::FLAG_FIRE_ENDED;
        }
    }
}

/// A non-idle frame and the tick it was captured on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEvent {
    /// Tick the frame applies to
    pub tick: u32,
    /// The input frame
    pub frame: InputFrame,
}

// =============================================================================
// INPUT RECORDING
// =============================================================================

/// Sparse input recording for one session.
///
/// Frames are edge events, so only non-idle ticks are stored and every
/// other tick replays as idle.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputRecording {
    /// RNG seed the session was played with
    pub rng_seed: u64,

    /// Last recorded tick
    pub end_tick: u32,

    /// Non-idle frames in tick order
    events: Vec<InputEvent>,
}

impl InputRecording {
    /// Create an empty recording.
    pub fn new(rng_seed: u64) -> Self {
        Self {
            rng_seed,
            end_tick: 0,
            events: Vec::new(),
        }
    }

    /// Record input for a tick. Ticks must be recorded in ascending order.
    pub fn record(&mut self, tick: u32, frame: InputFrame) {
        self.end_tick = self.end_tick.max(tick);
        if !frame.is_idle() {
            self.events.push(InputEvent { tick, frame });
        }
    }

    /// Input at a specific tick (idle when nothing was recorded).
    pub fn get_input_at(&self, tick: u32) -> InputFrame {
        match self.events.binary_search_by_key(&tick, |e| e.tick) {
            Ok(idx) => self.events[idx].frame,
            Err(_) => InputFrame::new(),
        }
    }

    /// Stored non-idle frames.
    pub fn events(&self) -> &[InputEvent] {
        &self.events
    }

    /// Expand into one frame per tick, `0..=end_tick`.
    pub fn frames(&self) -> Vec<InputFrame> {
        (0..=self.end_tick).map(|tick| self.get_input_at(tick)).collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================
