//! Lane Registry
//!
//! The ordered set of lane heights for the running level. The set is built
//! once per level, shared read-only with every consumer, and registered
//! first-writer-wins: a second level cannot replace a set it does not own.

use std::sync::Arc;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Identifier of the level that owns a lane set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct LevelId(pub u32);

/// Ascending, immutable lane y-coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneSet {
    owner: LevelId,
    lanes: Vec<f32>,
}

impl LaneSet {
    /// Build from an unordered list of heights.
    ///
    /// Non-finite heights are dropped. An empty result is valid.
    pub fn from_heights(owner: LevelId, heights: &[f32]) -> Self {
        let mut lanes: Vec<f32> = heights.iter().copied().filter(|h| h.is_finite()).collect();
        if lanes.len() != heights.len() {
            warn!(
                level = owner.0,
                dropped = heights.len() - lanes.len(),
                "ignoring non-finite lane heights"
            );
        }
        lanes.sort_by(f32::total_cmp);

        Self { owner, lanes }
    }

    /// Level that built this set.
    #[inline]
    pub fn owner(&self) -> LevelId {
        self.owner
    }

    /// Number of lanes.
    #[inline]
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    /// True when there are no lanes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Height of lane `index`, lowest lane first.
    #[inline]
    pub fn get(&self, index: usize) -> Option<f32> {
        self.lanes.get(index).copied()
    }

    /// Highest valid lane index.
    #[inline]
    pub fn max_index(&self) -> Option<usize> {
        self.lanes.len().checked_sub(1)
    }

    /// All heights, ascending.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.lanes
    }
}

/// Lane registration errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LaneError {
    /// Another level's lane set is still registered.
    #[error("lane set already registered by level {current:?}, rejected level {rejected:?}")]
    AlreadyRegistered {
        /// Owner of the registered set
        current: LevelId,
        /// Owner whose registration was rejected
        rejected: LevelId,
    },
}

/// Holds the lane set of the running level.
#[derive(Clone, Debug, Default)]
pub struct LaneRegistry {
    current: Option<Arc<LaneSet>>,
}

impl LaneRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort `heights` and register them as the current lane set.
    ///
    /// Replaces the current set only when there is none or `owner` already
    /// owns it. Otherwise the first registration stays authoritative.
    pub fn build(&mut self, owner: LevelId, heights: &[f32]) -> Result<Arc<LaneSet>, LaneError> {
        if let Some(current) = &self.current {
            if current.owner() != owner {
                warn!(
                    current = current.owner().0,
                    rejected = owner.0,
                    "multiple lane registries found, keeping the first"
                );
                return Err(LaneError::AlreadyRegistered {
                    current: current.owner(),
                    rejected: owner,
                });
            }
        }

        let set = Arc::new(LaneSet::from_heights(owner, heights));
        debug!(level = owner.0, lanes = ?set.as_slice(), "lane set registered");
        self.current = Some(set.clone());
        Ok(set)
    }

    /// Shared handle to the current lane set, if any.
    pub fn current_lane_set(&self) -> Option<Arc<LaneSet>> {
        self.current.clone()
    }

    /// Borrow the current lane set, if any.
    pub fn current(&self) -> Option<&LaneSet> {
        self.current.as_deref()
    }

    /// Clear the current set if `owner` owns it. Returns whether it was cleared.
    pub fn teardown(&mut self, owner: LevelId) -> bool {
        match &self.current {
            Some(current) if current.owner() == owner => {
                self.current = None;
                debug!(level = owner.0, "lane set torn down");
                true
            }
            _ => false,
        }
    }
}
