//! Score Ledger
//!
//! Current score plus a persisted best score. The best score is a
//! high-water mark: it never drops below any score reached this session or
//! the value loaded from the store.

use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::game::events::{Signal, SignalSink};
use crate::persist::{KeyValueStore, StoreError};

/// Store key holding the best score.
pub const SCORE_KEY: &str = "Score";

/// Score and best score for a session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreLedger {
    score: i64,
    high_score: i64,
    /// `NewHighScore` already emitted this session
    announced: bool,
}

impl ScoreLedger {
    /// Create a ledger at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current score.
    #[inline]
    pub fn score(&self) -> i64 {
        self.score
    }

    /// Best score.
    #[inline]
    pub fn high_score(&self) -> i64 {
        self.high_score
    }

    /// Add `delta` (may be negative) to the score.
    ///
    /// Emits `ScoreChanged`, and `NewHighScore` the first time this session
    /// the score passes the best score.
    pub fn change_score(&mut self, delta: i64, sink: &mut dyn SignalSink) {
        self.score = self.score.saturating_add(delta);
        sink.emit(Signal::ScoreChanged { score: self.score });

        if self.score > self.high_score {
            self.high_score = self.score;
            if !self.announced {
                self.announced = true;
                info!(score = self.score, "new high score");
                sink.emit(Signal::NewHighScore { score: self.score });
            }
        }
    }

    /// Load the best score from `store`.
    ///
    /// An absent key leaves the current value. Starts a new announcement
    /// window for `NewHighScore`.
    pub fn load_high_score(&mut self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        if let Some(stored) = store.get_int(SCORE_KEY)? {
            self.high_score = stored;
        }
        self.high_score = self.high_score.max(self.score);
        self.announced = false;
        debug!(high_score = self.high_score, "high score loaded");
        Ok(())
    }

    /// Write the best score to `store`.
    pub fn save_high_score(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        store.set_int(SCORE_KEY, self.high_score)?;
        debug!(high_score = self.high_score, "high score saved");
        Ok(())
    }

    /// Back to zero for a new run. The best score is kept.
    pub fn reset(&mut self) {
        self.score = 0;
        self.announced = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStore;

    fn high_score_signals(signals: &[Signal]) -> usize {
        signals
            .iter()
            .filter(|s| matches!(s, Signal::NewHighScore { .. }))
            .count()
    }

    #[test]
    fn test_new_high_score_announced_once() {
        let mut store = MemoryStore::new();
        store.set_int(SCORE_KEY, 80).unwrap();

        let mut ledger = ScoreLedger::new();
        ledger.load_high_score(&store).unwrap();
        assert_eq!(ledger.high_score(), 80);

        let mut signals: Vec<Signal> = Vec::new();
        ledger.change_score(50, &mut signals);
        ledger.change_score(50, &mut signals);

        assert_eq!(ledger.score(), 100);
        assert_eq!(ledger.high_score(), 100);
        assert_eq!(high_score_signals(&signals), 1);
        assert_eq!(signals[0], Signal::ScoreChanged { score: 50 });
        assert_eq!(signals.last(), Some(&Signal::ScoreChanged { score: 100 }));
    }

    #[test]
    fn test_below_high_score_is_silent() {
        let mut ledger = ScoreLedger::new();
        let mut store = MemoryStore::new();
        store.set_int(SCORE_KEY, 500).unwrap();
        ledger.load_high_score(&store).unwrap();

        let mut signals: Vec<Signal> = Vec::new();
        ledger.change_score(100, &mut signals);
        ledger.change_score(-30, &mut signals);

        assert_eq!(ledger.score(), 70);
        assert_eq!(ledger.high_score(), 500);
        assert_eq!(high_score_signals(&signals), 0);
    }

    #[test]
    fn test_save_then_load_on_fresh_ledger() {
        let mut store = MemoryStore::new();

        let mut ledger = ScoreLedger::new();
        ledger.change_score(250, &mut Vec::<Signal>::new());
        ledger.save_high_score(&mut store).unwrap();

        let mut fresh = ScoreLedger::new();
        fresh.load_high_score(&store).unwrap();
        assert_eq!(fresh.high_score(), 250);
        assert_eq!(fresh.score(), 0);
    }

    #[test]
    fn test_absent_key_keeps_value() {
        let store = MemoryStore::new();
        let mut ledger = ScoreLedger::new();
        ledger.change_score(30, &mut Vec::<Signal>::new());

        ledger.load_high_score(&store).unwrap();
        assert_eq!(ledger.high_score(), 30);
    }

    #[test]
    fn test_load_never_drops_below_current_score() {
        let mut store = MemoryStore::new();
        store.set_int(SCORE_KEY, 10).unwrap();

        let mut ledger = ScoreLedger::new();
        ledger.change_score(40, &mut Vec::<Signal>::new());
        ledger.load_high_score(&store).unwrap();
        assert_eq!(ledger.high_score(), 40);
    }

    #[test]
    fn test_reset_keeps_high_score() {
        let mut ledger = ScoreLedger::new();
        let mut signals: Vec<Signal> = Vec::new();
        ledger.change_score(60, &mut signals);
        ledger.reset();

        assert_eq!(ledger.score(), 0);
        assert_eq!(ledger.high_score(), 60);

        ledger.change_score(70, &mut signals);
        assert_eq!(high_score_signals(&signals), 2);
    }
}
