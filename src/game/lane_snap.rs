//! Lane Snapping
//!
//! Turns discrete up/down input into a lane index change and animates the
//! player toward the new lane: position eases in with a frame-rate
//! independent exponential step, and a visual tilt leans into the move.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::smoothing::{decay_step, lerp, smooth_damp_angle};
use crate::core::vec2::Vec2;
use crate::game::lane::LaneSet;
use crate::game::mover::Mover;

/// Distance at which a transition snaps onto its target.
pub const LANE_SNAP_RANGE: f32 = 0.01;

/// Lane snapping tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneSnapConfig {
    /// Halvings of the remaining distance per second
    pub lerp_speed: f32,
    /// Tilt at the start of a transition, in degrees
    pub max_angle: f32,
    /// Tilt smoothing time in seconds
    pub smooth_time: f32,
}

impl Default for LaneSnapConfig {
    fn default() -> Self {
        Self {
            lerp_speed: 12.0,
            max_angle: 15.0,
            smooth_time: 0.1,
        }
    }
}

/// An in-flight move toward a lane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneTransition {
    /// Where the transition ends
    pub target: Vec2,
    /// Distance to the target when the transition started
    pub starting_distance: f32,
    /// +1 moving up, -1 moving down, 0 when already level
    pub angle_dir: f32,
    /// Tilt smoothing velocity (degrees per second)
    pub angle_velocity: f32,
}

/// Player lane index and its animated transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneSnapController {
    config: LaneSnapConfig,
    current_lane: usize,
    transition: Option<LaneTransition>,
    tilt: f32,
}

impl LaneSnapController {
    /// Create a controller sitting on `start_lane`.
    pub fn new(config: LaneSnapConfig, start_lane: usize) -> Self {
        Self {
            config,
            current_lane: start_lane,
            transition: None,
            tilt: 0.0,
        }
    }

    /// Authoritative lane index.
    #[inline]
    pub fn current_lane(&self) -> usize {
        self.current_lane
    }

    /// Visual tilt in degrees.
    #[inline]
    pub fn tilt(&self) -> f32 {
        self.tilt
    }

    /// The in-flight transition, if any.
    #[inline]
    pub fn transition(&self) -> Option<&LaneTransition> {
        self.transition.as_ref()
    }

    /// Is a transition running?
    #[inline]
    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    /// Place `mover` exactly on the current lane, cancelling any transition.
    ///
    /// The lane index is clamped into the set first. No-op without lanes.
    pub fn snap_to_lane(&mut self, lanes: Option<&LaneSet>, mover: &mut Mover) {
        let Some(lanes) = lanes else { return };
        let Some(max_index) = lanes.max_index() else { return };

        self.current_lane = self.current_lane.min(max_index);
        if let Some(y) = lanes.get(self.current_lane) {
            mover.set_position(Vec2::new(mover.position().x, y));
        }
        self.transition = None;
        self.tilt = 0.0;
    }

    /// Handle a move input. `direction` is reduced to its sign.
    ///
    /// Returns `true` when the lane index changed and a transition started.
    /// Requests past the first or last lane are dropped. An index left past
    /// the end by a smaller rebuilt set is clamped before moving.
    pub fn handle_move_input(&mut self, direction: i32, lanes: Option<&LaneSet>, position: Vec2) -> bool {
        let direction = direction.signum();
        if direction == 0 {
            return false;
        }

        let Some(lanes) = lanes else {
            debug!("move ignored: no lane set");
            return false;
        };
        if let Some(max_index) = lanes.max_index() {
            if self.current_lane > max_index {
                debug!(lane = self.current_lane, max_index, "lane index clamped");
                self.current_lane = max_index;
            }
        }

        let new_index = self.current_lane as i64 + direction as i64;
        if new_index < 0 || new_index >= lanes.len() as i64 {
            debug!(lane = self.current_lane, direction, "move ignored: lane bound");
            return false;
        }
        let new_index = new_index as usize;
        let Some(target_y) = lanes.get(new_index) else {
            return false;
        };

        self.current_lane = new_index;
        self.start_transition(position, Vec2::new(position.x, target_y));
        true
    }

    /// Replace any running transition with one from `from` to `target`.
    fn start_transition(&mut self, from: Vec2, target: Vec2) {
        let to_target = target - from;
        let angle_dir = if to_target.y > 0.0 {
            1.0
        } else if to_target.y < 0.0 {
            -1.0
        } else {
            0.0
        };

        self.transition = Some(LaneTransition {
            target,
            starting_distance: to_target.length(),
            angle_dir,
            angle_velocity: 0.0,
        });
    }

    /// Advance the transition by one tick, writing the new position to `mover`.
    pub fn tick(&mut self, dt: f32, mover: &mut Mover) {
        let Some(mut transition) = self.transition else {
            return;
        };

        let position = mover.position();
        if position.distance(transition.target) <= LANE_SNAP_RANGE {
            mover.set_position(transition.target);
            self.tilt = 0.0;
            self.transition = None;
            return;
        }

        let step = decay_step(self.config.lerp_speed, dt);
        let position = position.lerp(transition.target, step);
        mover.set_position(position);

        // Tilt leans hardest at the start and levels out on arrival
        let normalized = if transition.starting_distance > 0.0 {
            position.distance(transition.target) / transition.starting_distance
        } else {
            0.0
        };
        let target_angle = lerp(0.0, self.config.max_angle * transition.angle_dir, normalized);
        self.tilt = smooth_damp_angle(
            self.tilt,
            target_angle,
            &mut transition.angle_velocity,
            self.config.smooth_time,
            dt,
        );

        self.transition = Some(transition);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::lane::LevelId;
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    fn lanes(heights: &[f32]) -> LaneSet {
        LaneSet::from_heights(LevelId(1), heights)
    }

    fn settle(controller: &mut LaneSnapController, mover: &mut Mover) -> usize {
        let mut ticks = 0;
        while controller.is_transitioning() && ticks < 10_000 {
            controller.tick(DT, mover);
            ticks += 1;
        }
        ticks
    }

    #[test]
    fn test_move_changes_lane_and_converges() {
        let lanes = lanes(&[-2.0, 0.0, 2.0]);
        let mut controller = LaneSnapController::new(LaneSnapConfig::default(), 1);
        let mut mover = Mover::stationary(Vec2::new(-6.0, 0.0));

        assert!(controller.handle_move_input(1, Some(&lanes), mover.position()));
        assert_eq!(controller.current_lane(), 2);

        controller.tick(DT, &mut mover);
        let y = mover.position().y;
        assert!(y > 0.0 && y < 2.0, "moves part of the way, got {y}");
        assert!(controller.tilt() > 0.0, "tilts toward travel direction");
        assert_eq!(mover.position().x, -6.0, "x is held fixed");

        settle(&mut controller, &mut mover);
        assert_eq!(mover.position(), Vec2::new(-6.0, 2.0));
        assert_eq!(controller.tilt(), 0.0);
    }

    #[test]
    fn test_move_after_shrinking_rebuild() {
        let five = lanes(&[-3.0, -1.5, 0.0, 1.5, 3.0]);
        let three = lanes(&[-2.0, 0.0, 2.0]);
        let mut mover = Mover::stationary(Vec2::ZERO);

        let mut controller = LaneSnapController::new(LaneSnapConfig::default(), 3);
        controller.snap_to_lane(Some(&five), &mut mover);
        assert!(controller.handle_move_input(1, Some(&five), mover.position()));
        settle(&mut controller, &mut mover);
        assert_eq!(controller.current_lane(), 4);

        // Down from the clamped top lane still works
        assert!(controller.handle_move_input(-1, Some(&three), mover.position()));
        assert_eq!(controller.current_lane(), 1);
        settle(&mut controller, &mut mover);
        assert_eq!(mover.position().y, 0.0);

        // Up past the clamped top lane is dropped, index stays in range
        let mut stale = LaneSnapController::new(LaneSnapConfig::default(), 4);
        assert!(!stale.handle_move_input(1, Some(&three), Vec2::ZERO));
        assert_eq!(stale.current_lane(), 2);
    }

    #[test]
    fn test_tilt_sign_follows_direction() {
        let lanes = lanes(&[-2.0, 0.0, 2.0]);
        let mut controller = LaneSnapController::new(LaneSnapConfig::default(), 1);
        let mut mover = Mover::stationary(Vec2::ZERO);

        controller.handle_move_input(-1, Some(&lanes), mover.position());
        controller.tick(DT, &mut mover);
        assert!(controller.tilt() < 0.0);
        assert!(controller.tilt() >= -LaneSnapConfig::default().max_angle);
    }

    #[test]
    fn test_bounds_drop_request() {
        let lanes = lanes(&[0.0, 1.0]);
        let mut controller = LaneSnapController::new(LaneSnapConfig::default(), 0);

        assert!(!controller.handle_move_input(-1, Some(&lanes), Vec2::ZERO));
        assert_eq!(controller.current_lane(), 0);
        assert!(!controller.is_transitioning());

        assert!(controller.handle_move_input(1, Some(&lanes), Vec2::ZERO));
        assert!(!controller.handle_move_input(1, Some(&lanes), Vec2::ZERO));
        assert_eq!(controller.current_lane(), 1);
    }

    #[test]
    fn test_no_lanes_or_zero_direction_is_noop() {
        let mut controller = LaneSnapController::new(LaneSnapConfig::default(), 0);
        assert!(!controller.handle_move_input(1, None, Vec2::ZERO));

        let empty = lanes(&[]);
        assert!(!controller.handle_move_input(1, Some(&empty), Vec2::ZERO));

        let some = lanes(&[0.0, 1.0]);
        assert!(!controller.handle_move_input(0, Some(&some), Vec2::ZERO));
        assert_eq!(controller.current_lane(), 0);
    }

    #[test]
    fn test_new_input_replaces_transition() {
        let lanes = lanes(&[0.0, 1.0, 2.0]);
        let mut controller = LaneSnapController::new(LaneSnapConfig::default(), 0);
        let mut mover = Mover::stationary(Vec2::ZERO);

        controller.handle_move_input(1, Some(&lanes), mover.position());
        controller.tick(DT, &mut mover);
        controller.handle_move_input(1, Some(&lanes), mover.position());

        let transition = controller.transition().copied().unwrap();
        assert_eq!(transition.target, Vec2::new(0.0, 2.0));
        assert_eq!(transition.angle_velocity, 0.0);

        settle(&mut controller, &mut mover);
        assert_eq!(mover.position().y, 2.0);
        assert_eq!(controller.current_lane(), 2);
    }

    #[test]
    fn test_idempotent_at_rest() {
        let lanes = lanes(&[0.0, 3.0]);
        let mut controller = LaneSnapController::new(LaneSnapConfig::default(), 0);
        let mut mover = Mover::stationary(Vec2::new(1.0, 0.0));

        controller.handle_move_input(1, Some(&lanes), mover.position());
        settle(&mut controller, &mut mover);

        let rest = mover.position();
        for _ in 0..100 {
            controller.tick(DT, &mut mover);
            assert_eq!(mover.position(), rest);
            assert_eq!(controller.tilt(), 0.0);
        }
    }

    #[test]
    fn test_snap_to_lane_clamps_index() {
        let lanes = lanes(&[-1.0, 4.0]);
        let mut controller = LaneSnapController::new(LaneSnapConfig::default(), 7);
        let mut mover = Mover::stationary(Vec2::new(2.0, 0.0));

        controller.snap_to_lane(Some(&lanes), &mut mover);
        assert_eq!(controller.current_lane(), 1);
        assert_eq!(mover.position(), Vec2::new(2.0, 4.0));
    }

    proptest! {
        #[test]
        fn prop_lane_index_stays_in_bounds(
            lane_count in 1usize..8,
            inputs in proptest::collection::vec(-2i32..=2, 0..200),
        ) {
            let heights: Vec<f32> = (0..lane_count).map(|i| i as f32 * 1.5).collect();
            let lanes = lanes(&heights);
            let mut controller = LaneSnapController::new(LaneSnapConfig::default(), 0);
            let mut mover = Mover::stationary(Vec2::ZERO);

            for direction in inputs {
                let before = controller.current_lane();
                let changed = controller.handle_move_input(direction, Some(&lanes), mover.position());
                let after = controller.current_lane();

                prop_assert!(after < lane_count);
                if changed {
                    prop_assert_eq!(after as i64 - before as i64, direction.signum() as i64);
                } else {
                    prop_assert_eq!(after, before);
                }
                controller.tick(DT, &mut mover);
            }
        }
    }
}
