//! Enemy spawning policy
//!
//! A kill requests a refill up to the cap for the new kill count. Refills are
//! delayed tasks; spawns already in flight count toward the cap so concurrent
//! kills never over-schedule, and each spawn re-checks the cap when it fires.

use glam::Vec2;
use rand::Rng;

use super::entity::{Enemy, EnemyKind};
use super::state::{GameState, Task};
use crate::assets::ENEMY_SKIN_COUNT;
use crate::tuning::Tuning;

/// Difficulty of the single enemy that opens a round
pub const OPENING_DIFFICULTY: u32 = 1;

/// Spawns never land closer than this to the player
const MIN_PLAYER_DISTANCE: f32 = 300.0;
const PLACEMENT_ATTEMPTS: usize = 8;

/// Outcome of a refill request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnPlan {
    pub max_allowed: u32,
    /// Delayed spawns to queue now
    pub to_schedule: u32,
}

/// How many refills to queue, given live enemies and refills in flight
pub fn plan_spawns(tuning: &Tuning, live: u32, pending: u32, kill_count: u32) -> SpawnPlan {
    let max_allowed = tuning.max_enemies_allowed(kill_count);
    SpawnPlan {
        max_allowed,
        to_schedule: max_allowed.saturating_sub(live + pending),
    }
}

/// Fire-type with the configured probability, given a uniform roll in [0, 1)
pub fn roll_kind(tuning: &Tuning, roll: f32) -> EnemyKind {
    if roll < tuning.fire_enemy_chance {
        EnemyKind::Fire
    } else {
        EnemyKind::Default
    }
}

/// Adjusted difficulty: fire enemies scale by the fire multiplier
pub fn difficulty(tuning: &Tuning, kind: EnemyKind, kill_count: u32) -> u32 {
    let base = tuning.difficulty_for(kill_count);
    match kind {
        EnemyKind::Default => base,
        EnemyKind::Fire => base * tuning.fire_difficulty_multiplier,
    }
}

/// React to a new kill count.
///
/// Kill count 0 opens the round with exactly one default enemy, placed
/// immediately. Anything else queues delayed refills up to the cap.
pub fn request_spawns(state: &mut GameState, kill_count: u32) -> SpawnPlan {
    if kill_count == 0 {
        let pos = spawn_position(state);
        let skin = state.rng.random_range(0..ENEMY_SKIN_COUNT);
        spawn_enemy(state, EnemyKind::Default, pos, OPENING_DIFFICULTY, skin);
        return SpawnPlan {
            max_allowed: state.tuning.max_enemies_allowed(0),
            to_schedule: 0,
        };
    }

    let plan = plan_spawns(
        &state.tuning,
        state.live_enemy_count(),
        state.pending_spawns(),
        kill_count,
    );
    let (min, max) = (state.tuning.spawn_delay_min_ms, state.tuning.spawn_delay_max_ms);
    for _ in 0..plan.to_schedule {
        let delay = if max > min { state.rng.random_range(min..max) } else { min };
        state.schedule_round(delay, Task::SpawnEnemy { kill_count });
    }
    if plan.to_schedule > 0 {
        log::debug!(
            "Kill {}: queued {} spawns (cap {})",
            kill_count,
            plan.to_schedule,
            plan.max_allowed
        );
    }
    plan
}

/// Run a queued refill. Dropped silently if the field is already full.
pub fn fire_spawn(state: &mut GameState, kill_count: u32) -> bool {
    let cap = state
        .tuning
        .max_enemies_allowed(kill_count.max(state.session.stats.kills()));
    if state.live_enemy_count() >= cap {
        log::debug!("Spawn dropped: {} enemies already at cap {}", state.live_enemy_count(), cap);
        return false;
    }

    let kind = roll_kind(&state.tuning, state.rng.random::<f32>());
    let level = difficulty(&state.tuning, kind, kill_count);
    let skin = match kind {
        EnemyKind::Default => state.rng.random_range(0..ENEMY_SKIN_COUNT),
        EnemyKind::Fire => 0,
    };
    let pos = spawn_position(state);
    spawn_enemy(state, kind, pos, level, skin);
    true
}

/// Place a new enemy in the world
pub fn spawn_enemy(state: &mut GameState, kind: EnemyKind, pos: Vec2, difficulty: u32, skin: u8) -> u32 {
    let mut enemy = Enemy::new(kind, pos, difficulty, skin, state.now_ms, &state.tuning);
    enemy.id = state.next_entity_id();
    log::debug!("Spawned {:?} enemy {} at difficulty {}", kind, enemy.id, difficulty);
    let id = enemy.id;
    state.enemies.push(enemy);
    id
}

/// Random point just inside an arena edge, away from the player when possible
pub fn spawn_position(state: &mut GameState) -> Vec2 {
    let tuning = &state.tuning;
    let margin = tuning.arena_inset + tuning.enemy_width / 2.0;
    let (w, h) = (tuning.canvas_width, tuning.canvas_height);
    let player = state.player.as_ref().map(|p| p.pos);

    let mut pos = Vec2::new(w / 2.0, margin);
    for _ in 0..PLACEMENT_ATTEMPTS {
        let along: f32 = state.rng.random();
        pos = match state.rng.random_range(0..4u8) {
            0 => Vec2::new(margin + along * (w - 2.0 * margin), margin),
            1 => Vec2::new(w - margin, margin + along * (h - 2.0 * margin)),
            2 => Vec2::new(margin + along * (w - 2.0 * margin), h - margin),
            _ => Vec2::new(margin, margin + along * (h - 2.0 * margin)),
        };
        match player {
            Some(p) if p.distance(pos) < MIN_PLAYER_DISTANCE => continue,
            _ => break,
        }
    }
    pos
}
