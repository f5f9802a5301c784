//! Tick-driven Timers
//!
//! Every timed behavior (hurt window, fire cooldown, spawn interval, effect
//! lifetime) is a `Timer` value advanced once per tick by its owner.
//! Cancelling a timer means replacing or clearing the value.

use serde::{Serialize, Deserialize};

/// Remaining time at or below this counts as elapsed.
///
/// Absorbs `f32` accumulation error so that e.g. ten ticks of 0.05s finish
/// a 0.5s timer on the tenth tick.
pub const TIMER_EPSILON: f32 = 1e-5;

/// Most periods a repeating timer may catch up on in a single tick.
///
/// Past this the backlog is dropped and a fresh period starts.
pub const MAX_PERIODS_PER_TICK: u32 = 16;

/// Countdown timer in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Timer {
    duration: f32,
    remaining: f32,
}

impl Timer {
    /// Create a timer that runs for `duration` seconds.
    ///
    /// Negative or non-finite durations are treated as zero.
    pub fn new(duration: f32) -> Self {
        let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        Self {
            duration,
            remaining: duration,
        }
    }

    /// Configured duration.
    #[inline]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Time left, never negative.
    #[inline]
    pub fn remaining(&self) -> f32 {
        self.remaining.max(0.0)
    }

    /// Has the timer run out?
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.remaining <= TIMER_EPSILON
    }

    /// Time that passed beyond the end of the timer on the last advance.
    #[inline]
    pub fn overshoot(&self) -> f32 {
        (-self.remaining).max(0.0)
    }

    /// Advance by `dt` seconds.
    ///
    /// Returns `true` only on the advance that makes the timer finish.
    pub fn advance(&mut self, dt: f32) -> bool {
        if self.is_finished() {
            return false;
        }
        self.remaining -= dt.max(0.0);
        self.is_finished()
    }

    /// Start another period, keeping the overshoot of the previous one.
    ///
    /// Keeps a repeating cadence exact when ticks do not divide the period.
    pub fn restart_carrying(&mut self) {
        self.remaining = self.remaining.min(0.0) + self.duration;
    }

    /// Start another full period, discarding any overshoot.
    pub fn restart(&mut self) {
        self.remaining = self.duration;
    }
}
