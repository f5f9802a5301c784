//! Authoritative Simulation Tick
//!
//! The per-tick scheduler. Every timed behavior is advanced exactly once per
//! tick, in a fixed order, so a session is reproducible from its config and
//! input recording.

use tracing::{debug, info};

use crate::core::vec2::Vec2;
use crate::game::collision::{Body, CollisionEvent};
use crate::game::events::{GameEvent, Signal, SignalBus, SignalSink};
use crate::game::fire::ShotRequest;
use crate::game::health::{HealthTransition, HitOutcome};
use crate::game::input::InputFrame;
use crate::game::mover::Mover;
use crate::game::state::{ActorId, ActorKind, EntityFactory, PrefabId, SessionPhase, World};

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick
    pub events: Vec<GameEvent>,
    /// Whether the session is over
    pub session_ended: bool,
}

/// Run one simulation tick.
///
/// # Arguments
///
/// * `world` - The world (will be mutated)
/// * `input` - Player input for this tick
/// * `external_collisions` - Collision events from an outside physics layer,
///   handled together with the detected ones
/// * `dt` - Seconds covered by this tick
///
/// # Order
///
/// input, fire cooldown, motion, kill zone, collisions, hurt timers and
/// deaths, effect lifetimes, spawner.
pub fn tick(
    world: &mut World,
    input: &InputFrame,
    external_collisions: &[CollisionEvent],
    dt: f32,
) -> TickResult {
    let mut result = TickResult::default();

    // Phase-specific logic
    match world.phase {
        SessionPhase::Waiting => {
            world.phase = SessionPhase::Playing;
            info!(seed = world.rng_seed, "session started");
        }
        SessionPhase::Ended => {
            result.session_ended = true;
            return result;
        }
        SessionPhase::Playing => {}
    }

    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

    // 0. Advance tick counter
    world.tick += 1;
    world.bus.set_tick(world.tick);

    // 1. Apply player input
    apply_input(world, input);

    // 2. Fire cooldown (auto re-fire while held)
    update_fire(world, dt);

    // 3. Motion and lane transition
    update_motion(world, dt);

    // 4. Remove actors that left the play band
    apply_kill_zone(world);

    // 5. Collisions
    process_collisions(world, external_collisions);

    // 6. Hurt windows, deaths and score
    update_health(world, dt);

    // 7. Effect lifetimes
    update_lifetimes(world, dt);

    // 8. Spawn new enemies
    update_spawner(world, dt);

    result.session_ended = world.is_ended();
    result.events = world.bus.take_events();
    result
}

/// Emit a sound request when a name is configured.
fn play_sound(bus: &mut SignalBus, name: &Option<String>) {
    if let Some(name) = name {
        bus.emit(Signal::SoundRequest { name: name.clone() });
    }
}

/// Apply the input frame to the player rig.
fn apply_input(world: &mut World, input: &InputFrame) {
    let player_id = world.player.actor;
    let Some(player) = world.actors.get(&player_id) else {
        return;
    };
    let position = player.position();
    let rotation = player.rotation;

    // Lane move
    let direction = input.move_direction();
    if direction != 0
        && world.player.lane_snap.handle_move_input(direction, world.lanes.current(), position)
    {
        let lane = world.player.lane_snap.current_lane();
        debug!(lane, "lane changed");
        world.bus.emit(Signal::LaneChanged { actor: player_id, lane });
    }

    // Trigger: press before release
    if input.fire_started() {
        if let Some(shot) = world.player.fire.hold_start(position, rotation) {
            launch_shot(world, player_id, shot);
        }
    }
    if input.fire_ended() {
        world.player.fire.hold_end();
    }
}

/// Advance the player's cooldown, launching any shots it releases.
fn update_fire(world: &mut World, dt: f32) {
    let player_id = world.player.actor;
    let Some(player) = world.actors.get(&player_id) else {
        return;
    };
    let (position, rotation) = (player.position(), player.rotation);

    for shot in world.player.fire.tick(dt, position, rotation) {
        launch_shot(world, player_id, shot);
    }
}

/// Instantiate a projectile and give it the shot's launch velocity.
fn launch_shot(world: &mut World, shooter: ActorId, shot: ShotRequest) {
    let Some(projectile) = world.instantiate(&shot.prefab, shot.position, shot.rotation) else {
        return;
    };
    if let Some(actor) = world.actors.get_mut(&projectile) {
        actor.mover = Mover::new(shot.position, shot.velocity, shot.velocity.length());
    }

    world.bus.emit(Signal::ShotFired { shooter, projectile });
    world.request_sound(world.sounds.shoot.clone());
}

/// Move every actor. The player follows its lane transition instead.
fn update_motion(world: &mut World, dt: f32) {
    let player_id = world.player.actor;

    for actor in world.actors.values_mut() {
        if actor.id == player_id {
            // A paused player also holds its lane transition
            if !actor.mover.is_paused() {
                world.player.lane_snap.tick(dt, &mut actor.mover);
            }
            actor.tilt = world.player.lane_snap.tilt();
        } else {
            actor.mover.advance(dt);
        }
    }
}

/// Destroy non-player actors outside the kill zone.
fn apply_kill_zone(world: &mut World) {
    let zone = world.kill_zone;
    let outside: Vec<ActorId> = world
        .actors
        .values()
        .filter(|a| a.kind != ActorKind::Player && zone.is_outside(a.position()))
        .map(|a| a.id)
        .collect();

    for id in outside {
        debug!(actor = id.0, "left the play band");
        world.destroy(id);
    }
}

/// Route detected and external collisions to the health controllers.
fn process_collisions(world: &mut World, external: &[CollisionEvent]) {
    let bodies: Vec<Body> = world
        .actors
        .values()
        .filter_map(|a| {
            a.tag.map(|tag| Body {
                id: a.id,
                position: a.position(),
                radius: a.radius,
                tag,
            })
        })
        .collect();

    let mut events = world.contacts.detect(&bodies);
    events.extend_from_slice(external);

    // Collect actions, apply after the pass
    let mut to_destroy: Vec<ActorId> = Vec::new();
    let mut effects: Vec<(PrefabId, Vec2)> = Vec::new();

    for event in &events {
        let Some(actor) = world.actors.get_mut(&event.target) else {
            continue;
        };

        if let Some(effect) = &actor.impact_effect {
            effects.push((effect.clone(), event.contact.unwrap_or(actor.mover.position())));
        }

        let Some(health) = actor.health.as_mut() else {
            continue;
        };
        let destroy_assailant = match health.on_collision(event.target, event, &mut world.bus) {
            HitOutcome::Ignored => false,
            HitOutcome::Damaged { destroy_assailant } => {
                if health.pauses_when_hurt() {
                    actor.mover.set_paused(true);
                }
                play_sound(&mut world.bus, &world.sounds.hurt);
                destroy_assailant
            }
            HitOutcome::Absorbed { destroy_assailant } => destroy_assailant,
        };
        if destroy_assailant {
            if let Some(other) = event.other {
                to_destroy.push(other);
            }
        }
    }

    for (prefab, position) in effects {
        world.instantiate(&prefab, position, 0.0);
    }

    to_destroy.sort();
    to_destroy.dedup();
    for id in to_destroy {
        if id == world.player.actor {
            debug!("player is never destroyed as an assailant");
            continue;
        }
        world.destroy(id);
    }
}

/// Advance hurt windows. Deaths destroy the actor and pay out its score.
fn update_health(world: &mut World, dt: f32) {
    let mut deaths: Vec<(ActorId, ActorKind, i64)> = Vec::new();

    for actor in world.actors.values_mut() {
        let id = actor.id;
        let Some(health) = actor.health.as_mut() else {
            continue;
        };
        match health.tick(id, dt, &mut world.bus) {
            HealthTransition::Died => deaths.push((id, actor.kind, actor.score_value)),
            HealthTransition::Recovered if health.pauses_when_hurt() => actor.mover.set_paused(false),
            _ => {}
        }
    }

    for (id, kind, score_value) in deaths {
        debug!(actor = id.0, ?kind, "actor died");
        world.request_sound(world.sounds.death.clone());

        if kind == ActorKind::Player {
            end_session(world);
        } else if score_value != 0 {
            world.score.change_score(score_value, &mut world.bus);
        }
        world.destroy(id);
    }
}

/// The player died: stop spawning and close the session.
fn end_session(world: &mut World) {
    world.phase = SessionPhase::Ended;
    world.spawner.stop();
    info!(
        tick = world.tick,
        score = world.score.score(),
        high_score = world.score.high_score(),
        "session ended"
    );
    world.bus.emit(Signal::SessionEnded { tick: world.tick });
}

/// Remove actors whose lifetime ran out.
fn update_lifetimes(world: &mut World, dt: f32) {
    let mut expired: Vec<ActorId> = Vec::new();

    for actor in world.actors.values_mut() {
        if let Some(lifetime) = actor.lifetime.as_mut() {
            lifetime.advance(dt);
            if lifetime.is_finished() {
                expired.push(actor.id);
            }
        }
    }

    for id in expired {
        world.destroy(id);
    }
}

/// Fulfil the spawner's requests through the spawn primitive.
fn update_spawner(world: &mut World, dt: f32) {
    let requests = world.spawner.tick(dt, world.lanes.current(), &mut world.rng);
    for request in requests {
        world.instantiate(&request.prefab, request.position, 0.0);
    }
}

/// Replay a session from recorded inputs.
///
/// Runs one tick per frame on `initial_world`, stopping early when the
/// session ends. Returns the final world and all events.
pub fn replay_session(initial_world: World, frames: &[InputFrame], dt: f32) -> (World, Vec<GameEvent>) {
    let mut world = initial_world;
    let mut all_events = Vec::new();

    for frame in frames {
        let result = tick(&mut world, frame, &[], dt);
        all_events.extend(result.events);

        if result.session_ended {
            break;
        }
    }

    (world, all_events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::game::collision::CollisionTag;

    const DT: f32 = 1.0 / 60.0;

    /// Default config without random enemy spawns.
    fn quiet_config() -> GameConfig {
        let mut config = GameConfig::default();
        config.spawn.prefabs.clear();
        config
    }

    fn run(world: &mut World, ticks: u32) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..ticks {
            events.extend(tick(world, &InputFrame::new(), &[], DT).events);
        }
        events
    }

    fn scripted_frames(count: u32) -> Vec<InputFrame> {
        (0..count)
            .map(|t| match t % 90 {
                0 => InputFrame::fire_start(),
                30 => InputFrame::with_move(1),
                45 => InputFrame::fire_end(),
                60 => InputFrame::with_move(-1),
                _ => InputFrame::new(),
            })
            .collect()
    }

    #[test]
    fn test_tick_determinism() {
        let config = GameConfig::default();
        let mut world1 = World::new(&config);
        let mut world2 = World::new(&config);

        for frame in scripted_frames(600) {
            let r1 = tick(&mut world1, &frame, &[], DT);
            let r2 = tick(&mut world2, &frame, &[], DT);
            assert_eq!(r1.events, r2.events);
        }

        assert_eq!(world1.tick, world2.tick);
        assert_eq!(world1.compute_hash(), world2.compute_hash());
    }

    #[test]
    fn test_replay_determinism() {
        let config = GameConfig::default();
        let frames = scripted_frames(900);

        let (final1, events1) = replay_session(World::new(&config), &frames, DT);
        let (final2, events2) = replay_session(World::new(&config), &frames, DT);

        assert_eq!(final1.compute_hash(), final2.compute_hash());
        assert_eq!(events1, events2);
    }

    #[test]
    fn test_first_tick_starts_session() {
        let mut world = World::new(&quiet_config());
        assert_eq!(world.phase, SessionPhase::Waiting);

        let result = tick(&mut world, &InputFrame::new(), &[], DT);
        assert_eq!(world.phase, SessionPhase::Playing);
        assert_eq!(world.tick, 1);
        assert!(!result.session_ended);
        // Player spawn from construction is delivered with the first tick
        assert!(result
            .events
            .iter()
            .any(|e| matches!(e.signal, Signal::ActorSpawned { kind: ActorKind::Player, .. })));
    }

    #[test]
    fn test_spawn_schedule_in_world() {
        let mut config = GameConfig::default();
        config.spawn.spawn_delay = 2.0;
        let mut world = World::new(&config);

        // Startup tick, then 10 seconds
        let mut events = Vec::new();
        for _ in 0..41 {
            events.extend(tick(&mut world, &InputFrame::new(), &[], 0.25).events);
        }

        let spawned: Vec<_> = events
            .iter()
            .filter(|e| matches!(e.signal, Signal::ActorSpawned { kind: ActorKind::Enemy, .. }))
            .collect();
        assert_eq!(spawned.len(), 5);
        assert_eq!(world.spawner.spawns_issued(), 5);
    }

    #[test]
    fn test_move_input_changes_lane() {
        let config = quiet_config();
        let mut world = World::new(&config);
        let start = world.player.lane_snap.current_lane();

        let result = tick(&mut world, &InputFrame::with_move(1), &[], DT);
        assert!(result.events.iter().any(|e| e.signal
            == Signal::LaneChanged {
                actor: world.player.actor,
                lane: start + 1,
            }));

        run(&mut world, 120);
        let target = world.lane_set().unwrap().get(start + 1).unwrap();
        let player = world.player_actor().unwrap();
        assert_eq!(player.position().y, target);
        assert_eq!(player.position().x, config.player.x);
        assert_eq!(player.tilt, 0.0);
    }

    #[test]
    fn test_paused_player_holds_transition() {
        let mut world = World::new(&quiet_config());
        let start_y = world.player_actor().unwrap().position().y;

        let player_id = world.player.actor;
        world.get_actor_mut(player_id).unwrap().mover.set_paused(true);
        tick(&mut world, &InputFrame::with_move(-1), &[], DT);
        run(&mut world, 30);
        assert_eq!(world.player_actor().unwrap().position().y, start_y);

        world.get_actor_mut(player_id).unwrap().mover.set_paused(false);
        run(&mut world, 120);
        let lane = world.player.lane_snap.current_lane();
        let target = world.lane_set().unwrap().get(lane).unwrap();
        assert_eq!(world.player_actor().unwrap().position().y, target);
    }

    #[test]
    fn test_projectile_kills_enemy_and_scores() {
        let mut world = World::new(&quiet_config());
        let lane_y = world.player_actor().unwrap().position().y;
        let grunt = world
            .instantiate(&PrefabId::new("grunt"), Vec2::new(0.0, lane_y), 0.0)
            .unwrap();

        let mut events = tick(&mut world, &InputFrame::fire_start(), &[], DT).events;
        events.extend(tick(&mut world, &InputFrame::fire_end(), &[], DT).events);
        events.extend(run(&mut world, 120));

        let signals: Vec<&Signal> = events.iter().map(|e| &e.signal).collect();
        assert!(signals.iter().any(|s| matches!(s, Signal::ShotFired { .. })));
        assert!(signals.contains(&&Signal::DamageTaken { actor: grunt, amount: 1 }));
        assert!(signals.contains(&&Signal::Death { actor: grunt }));
        assert!(signals.contains(&&Signal::NewHighScore { score: 10 }));
        assert!(signals
            .iter()
            .any(|s| matches!(s, Signal::ActorSpawned { kind: ActorKind::Effect, .. })));

        assert!(world.get_actor(grunt).is_none());
        assert_eq!(world.score.score(), 10);
        assert_eq!(world.count_kind(ActorKind::Projectile), 0);
        assert_eq!(world.player.fire.shots_fired(), 1);
    }

    #[test]
    fn test_player_death_ends_session() {
        let mut config = quiet_config();
        config.player.health.health = 1;
        config.player.health.hurt_time = 0.1;
        let mut world = World::new(&config);

        let player = world.player_actor().unwrap().position();
        let grunt = world
            .instantiate(&PrefabId::new("grunt"), Vec2::new(player.x + 3.0, player.y), 0.0)
            .unwrap();

        let mut events = Vec::new();
        let mut ended = false;
        for _ in 0..300 {
            let result = tick(&mut world, &InputFrame::new(), &[], DT);
            events.extend(result.events);
            if result.session_ended {
                ended = true;
                break;
            }
        }

        assert!(ended);
        assert_eq!(world.phase, SessionPhase::Ended);
        assert!(world.player_actor().is_none());
        // The grunt was the assailant
        assert!(world.get_actor(grunt).is_none());
        assert_eq!(world.score.score(), 0);
        assert!(events
            .iter()
            .any(|e| matches!(e.signal, Signal::SessionEnded { .. })));

        // Ended sessions do nothing
        let after = tick(&mut world, &InputFrame::fire_start(), &[], DT);
        assert!(after.session_ended);
        assert!(after.events.is_empty());
        assert!(!world.spawner.is_running());
    }

    #[test]
    fn test_external_collision_damages_player() {
        let mut world = World::new(&quiet_config());
        let player_id = world.player.actor;

        let hit = CollisionEvent {
            target: player_id,
            other: None,
            tag: CollisionTag::Enemy,
            contact: None,
        };
        let result = tick(&mut world, &InputFrame::new(), &[hit], DT);

        assert!(result
            .events
            .iter()
            .any(|e| e.signal == Signal::DamageTaken { actor: player_id, amount: 1 }));
        let health = world.player_actor().unwrap().health.as_ref().unwrap();
        assert_eq!(health.health(), 2);
        assert!(health.is_hurt());
    }

    #[test]
    fn test_hit_during_hurt_window_consumes_projectile() {
        let mut world = World::new(&quiet_config());
        let tank = world
            .instantiate(&PrefabId::new("tank"), Vec2::new(0.0, 40.0), 0.0)
            .unwrap();
        let first = world
            .instantiate(&PrefabId::new("bullet"), Vec2::new(-6.0, -40.0), 0.0)
            .unwrap();
        let second = world
            .instantiate(&PrefabId::new("bullet"), Vec2::new(-3.0, -40.0), 0.0)
            .unwrap();

        let hit_by = |bullet| CollisionEvent {
            target: tank,
            other: Some(bullet),
            tag: CollisionTag::Projectile,
            contact: None,
        };

        tick(&mut world, &InputFrame::new(), &[hit_by(first)], DT);
        let result = tick(&mut world, &InputFrame::new(), &[hit_by(second)], DT);

        assert!(world.get_actor(first).is_none());
        assert!(world.get_actor(second).is_none());
        assert!(result.events.iter().any(|e| e.signal == Signal::ActorDestroyed { actor: second }));
        assert!(!result
            .events
            .iter()
            .any(|e| matches!(e.signal, Signal::DamageTaken { .. })));

        let health = world.get_actor(tank).unwrap().health.as_ref().unwrap();
        assert_eq!(health.health(), 2);
    }

    #[test]
    fn test_hurt_enemy_pauses_until_recovered() {
        let mut world = World::new(&quiet_config());
        let tank = world
            .instantiate(&PrefabId::new("tank"), Vec2::new(0.0, 40.0), 0.0)
            .unwrap();

        let hit = CollisionEvent {
            target: tank,
            other: None,
            tag: CollisionTag::Projectile,
            contact: None,
        };
        tick(&mut world, &InputFrame::new(), &[hit], DT);
        assert!(world.get_actor(tank).unwrap().mover.is_paused());
        let held_at = world.get_actor(tank).unwrap().position();

        // Hurt window is 0.2s
        run(&mut world, 6);
        assert_eq!(world.get_actor(tank).unwrap().position(), held_at);

        let events = run(&mut world, 12);
        assert!(events.iter().any(|e| e.signal == Signal::HurtFinished { actor: tank }));
        let actor = world.get_actor(tank).unwrap();
        assert!(!actor.mover.is_paused());
        assert!(actor.position().x < held_at.x);
    }

    #[test]
    fn test_projectiles_leave_through_kill_zone() {
        let mut world = World::new(&quiet_config());

        tick(&mut world, &InputFrame::fire_start(), &[], DT);
        tick(&mut world, &InputFrame::fire_end(), &[], DT);
        assert_eq!(world.count_kind(ActorKind::Projectile), 1);

        let events = run(&mut world, 150);
        assert_eq!(world.count_kind(ActorKind::Projectile), 0);
        assert!(events
            .iter()
            .any(|e| matches!(e.signal, Signal::ActorDestroyed { .. })));
    }

    #[test]
    fn test_effects_expire() {
        let mut world = World::new(&quiet_config());
        let effect = world
            .instantiate(&PrefabId::new("explosion"), Vec2::ZERO, 0.0)
            .unwrap();

        run(&mut world, 29);
        assert!(world.get_actor(effect).is_some());
        run(&mut world, 2);
        assert!(world.get_actor(effect).is_none());
    }
}
