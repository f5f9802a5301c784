//! Collision Events
//!
//! The combat state machines consume tagged collision events. They can come
//! from an external physics layer or from the circle-overlap detector here,
//! which reports a contact only on the tick it begins.

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::state::ActorId;

/// What a collider is, as seen by whoever it touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CollisionTag {
    /// The player's vehicle
    Player,
    /// An advancing enemy
    Enemy,
    /// A fired projectile
    Projectile,
}

/// "`target` collided with something tagged `tag`."
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    /// Actor receiving the notification
    pub target: ActorId,
    /// The colliding actor, when known
    pub other: Option<ActorId>,
    /// Tag of the colliding actor
    pub tag: CollisionTag,
    /// First contact point, when known
    pub contact: Option<Vec2>,
}

/// A collider considered by the detector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    /// Owning actor
    pub id: ActorId,
    /// Center
    pub position: Vec2,
    /// Circle radius; zero or less never collides
    pub radius: f32,
    /// Tag reported to the other side
    pub tag: CollisionTag,
}

/// Check if two circles overlap.
#[inline]
pub fn circles_overlap(pos_a: Vec2, radius_a: f32, pos_b: Vec2, radius_b: f32) -> bool {
    let combined_radius = radius_a + radius_b;
    pos_a.distance_squared(pos_b) <= combined_radius * combined_radius
}

/// Point on the segment between two circle centers where their edges meet.
fn contact_point(a: &Body, b: &Body) -> Vec2 {
    let total = a.radius + b.radius;
    if total <= 0.0 {
        return a.position.midpoint(b.position);
    }
    a.position.lerp(b.position, a.radius / total)
}

/// Pairwise overlap detector with collision-enter semantics.
///
/// Remembers which pairs touched last tick; only new contacts produce events.
#[derive(Clone, Debug, Default)]
pub struct ContactTracker {
    touching: BTreeSet<(ActorId, ActorId)>,
}

impl ContactTracker {
    /// Create a tracker with no remembered contacts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs in contact after the last `detect`.
    pub fn touching(&self) -> &BTreeSet<(ActorId, ActorId)> {
        &self.touching
    }

    /// Detect contacts that began since the last call.
    ///
    /// Each new contact yields one event per side. Pairs are visited in
    /// ascending id order so the output is deterministic.
    pub fn detect(&mut self, bodies: &[Body]) -> Vec<CollisionEvent> {
        let mut sorted: Vec<&Body> = bodies.iter().filter(|b| b.radius > 0.0).collect();
        sorted.sort_by_key(|b| b.id);

        let mut now_touching = BTreeSet::new();
        let mut events = Vec::new();

        for i in 0..sorted.len() {
            for j in (i + 1)..sorted.len() {
                let (a, b) = (sorted[i], sorted[j]);
                if !circles_overlap(a.position, a.radius, b.position, b.radius) {
                    continue;
                }

                let pair = (a.id, b.id);
                now_touching.insert(pair);
                if self.touching.contains(&pair) {
                    continue;
                }

                let contact = Some(contact_point(a, b));
                events.push(CollisionEvent {
                    target: a.id,
                    other: Some(b.id),
                    tag: b.tag,
                    contact,
                });
                events.push(CollisionEvent {
                    target: b.id,
                    other: Some(a.id),
                    tag: a.tag,
                    contact,
                });
            }
        }

        self.touching = now_touching;
        events
    }

    /// Forget contacts involving `id` (e.g. after it is destroyed).
    pub fn forget(&mut self, id: ActorId) {
        self.touching.retain(|(a, b)| *a != id && *b != id);
    }
}

/// Horizontal band outside of which non-player actors are removed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct KillZone {
    /// Left edge (enemies that got past the player)
    pub min_x: f32,
    /// Right edge (projectiles that left the screen)
    pub max_x: f32,
}

impl Default for KillZone {
    fn default() -> Self {
        Self {
            min_x: -14.0,
            max_x: 14.0,
        }
    }
}

impl KillZone {
    /// Is `position` outside the band?
    #[inline]
    pub fn is_outside(&self, position: Vec2) -> bool {
        position.x < self.min_x || position.x > self.max_x
    }
}
