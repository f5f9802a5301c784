//! Lane Defender Demo
//!
//! Runs a headless session driven by a simple autopilot, saves the high
//! score and replays the recorded input to verify determinism.

use anyhow::{bail, Context, Result};
use tracing::info;

use lane_defender::{
    VERSION,
    config::GameConfig,
    game::{
        events::Signal,
        input::{InputFrame, InputRecording},
        score::SCORE_KEY,
        state::{ActorKind, World},
        tick::{replay_session, tick},
    },
    persist::{JsonFileStore, KeyValueStore, MemoryStore},
};

/// Longest demo session in seconds.
const DEMO_SECONDS: u32 = 90;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> Result<()> {
    init_tracing();

    info!("Lane Defender v{}", VERSION);

    let config = GameConfig::from_env().context("failed to load configuration")?;
    info!(
        tick_rate = config.tick_rate,
        seed = config.rng_seed,
        lanes = config.level.lanes.len(),
        "configuration ready"
    );

    let mut store: Box<dyn KeyValueStore> = match &config.save_path {
        Some(path) => Box::new(
            JsonFileStore::open(path)
                .with_context(|| format!("failed to open save file {}", path.display()))?,
        ),
        None => Box::new(MemoryStore::new()),
    };

    demo_session(&config, store.as_mut())
}

/// Pick the input for this tick: line up with the closest enemy and keep
/// the trigger held.
fn autopilot(world: &World, tick_index: u32) -> InputFrame {
    if tick_index == 0 {
        return InputFrame::fire_start();
    }
    let (Some(player), Some(lanes)) = (world.player_actor(), world.lane_set()) else {
        return InputFrame::new();
    };
    if world.player.lane_snap.is_transitioning() {
        return InputFrame::new();
    }

    let player_x = player.position().x;
    let target = world
        .actors
        .values()
        .filter(|a| a.kind == ActorKind::Enemy && a.position().x > player_x)
        .min_by(|a, b| a.position().x.total_cmp(&b.position().x));
    let Some(target) = target else {
        return InputFrame::new();
    };

    let target_y = target.position().y;
    let Some(target_lane) = (0..lanes.len()).min_by(|&a, &b| {
        let da = (lanes.get(a).unwrap_or(0.0) - target_y).abs();
        let db = (lanes.get(b).unwrap_or(0.0) - target_y).abs();
        da.total_cmp(&db)
    }) else {
        return InputFrame::new();
    };

    let current = world.player.lane_snap.current_lane();
    InputFrame::with_move((target_lane as i64 - current as i64).signum() as i8)
}

/// Run a session, persist the high score and verify the replay.
fn demo_session(config: &GameConfig, store: &mut dyn KeyValueStore) -> Result<()> {
    info!("=== Starting Demo Session ===");

    let dt = config.tick_seconds();
    let max_ticks = DEMO_SECONDS * config.tick_rate;

    let mut world = World::new(config);
    world
        .score
        .load_high_score(store)
        .context("failed to load high score")?;
    let initial_high_score = world.score.high_score();
    info!(high_score = initial_high_score, "high score loaded");

    let mut recording = InputRecording::new(config.rng_seed);
    let mut total_events = 0;

    for t in 0..max_ticks {
        let frame = autopilot(&world, t);
        recording.record(t, frame);

        let result = tick(&mut world, &frame, &[], dt);
        total_events += result.events.len();

        // Log important events
        for event in &result.events {
            match &event.signal {
                Signal::Death { actor } => {
                    info!(tick = event.tick, actor = actor.0, "death");
                }
                Signal::NewHighScore { score } => {
                    info!(tick = event.tick, score, "new high score");
                }
                Signal::SessionEnded { tick } => {
                    info!(tick, "player destroyed");
                }
                _ => {}
            }
        }

        // Report every 10 seconds
        if t > 0 && t % (10 * config.tick_rate) == 0 {
            info!(
                tick = t,
                enemies = world.count_kind(ActorKind::Enemy),
                score = world.score.score(),
                "progress"
            );
        }

        if result.session_ended {
            break;
        }
    }

    info!("=== Session Results ===");
    let hash = world.compute_hash();
    info!(
        ticks = world.tick,
        score = world.score.score(),
        high_score = world.score.high_score(),
        shots = world.player.fire.shots_fired(),
        spawns = world.spawner.spawns_issued(),
        events = total_events,
        "final state"
    );
    info!("Final State Hash: {}", hex::encode(hash));

    world
        .score
        .save_high_score(store)
        .context("failed to save high score")?;

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let mut replay_store = MemoryStore::new();
    replay_store.set_int(SCORE_KEY, initial_high_score)?;
    let mut replay_world = World::new(config);
    replay_world.score.load_high_score(&replay_store)?;

    let (replay_final, _) = replay_session(replay_world, &recording.frames(), dt);
    let replay_hash = replay_final.compute_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash != replay_hash {
        bail!("determinism failure: replay hash differs");
    }
    info!("DETERMINISM VERIFIED: Hashes match!");
    Ok(())
}
