//! Per-frame simulation step
//!
//! One call per display frame: deferred tasks, background, gameplay update
//! (only while playing), entity draw, explosion advance. All motion is scaled
//! by the frame multiplier.

use glam::Vec2;

use super::autopilot;
use super::collision;
use super::session::GamePhase;
use super::spawner;
use super::state::{GameEvent, GameState, Task};
use crate::audio::Cue;
use crate::consts::TIMER_TICK_MS;
use crate::render::{self, Surface};

/// WASD state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveKeys {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

/// Input snapshot for one frame
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Frame timestamp (ms)
    pub now_ms: f64,
    /// From `FrameClock`
    pub frame_multiplier: f32,
    pub keys: MoveKeys,
    /// Mouse position in logical canvas coordinates
    pub aim: Vec2,
    /// Mouse button held
    pub shooting: bool,
    /// Demo mode - the autopilot plays the round
    pub autopilot: bool,
}

/// Advance the world by one display frame and paint it
pub fn frame(state: &mut GameState, input: &FrameInput, surface: &mut impl Surface) {
    state.now_ms = input.now_ms;
    let fm = input.frame_multiplier;

    run_due_tasks(state);

    render::draw_background(state, surface);

    if state.session.is_playing() {
        let mut input = input.clone();
        if input.autopilot {
            autopilot::steer(state, &mut input);
        }

        update_player(state, &input);
        update_bullets(state, fm);
        collision::resolve(state);

        let now = state.now_ms;
        state.pickups.retain(|p| !p.is_expired(now));

        update_enemies(state, fm);
        apply_veteran_health(state);
    }

    render::draw_entities(state, surface);

    advance_explosions(state, fm);
}

/// Run every task due at the current clock, in due order
pub fn run_due_tasks(state: &mut GameState) {
    while let Some(scheduled) = state.scheduler.pop_due(state.now_ms) {
        if scheduled
            .round
            .is_some_and(|round| round != state.session.round())
        {
            log::debug!("Skipping stale {:?} from round {:?}", scheduled.task, scheduled.round);
            continue;
        }
        run_task(state, scheduled.task);
    }
}

fn run_task(state: &mut GameState, task: Task) {
    match task {
        Task::SpawnEnemy { kill_count } => {
            if state.session.is_playing() {
                spawner::fire_spawn(state, kill_count);
            }
        }
        Task::CountdownTick => {
            let Some(value) = state.session.tick_countdown() else {
                return;
            };
            state.emit(GameEvent::Countdown(value));
            if state.session.phase == GamePhase::Playing {
                log::info!("Round {} started", state.session.round());
                state.emit(GameEvent::PhaseChanged(GamePhase::Playing));
            } else {
                state.schedule_round(TIMER_TICK_MS, Task::CountdownTick);
            }
        }
        Task::BuffTick => {
            if state.session.buff_remaining() == 0 {
                return;
            }
            let remaining = state.session.tick_buff();
            state.emit(GameEvent::BuffTimer(remaining));
            if remaining == 0 {
                state.buff_task = None;
                if let Some(player) = state.player.as_mut() {
                    player.buffed = false;
                }
            } else {
                state.schedule_buff_tick();
            }
        }
        Task::GameOver => state.enter_game_over(),
        Task::SubmitScore => {
            let score = state.session.stats.score();
            state.emit(GameEvent::SubmitScore {
                score,
                is_death: false,
            });
        }
        Task::Mint => {
            let score = state.session.stats.score();
            state.emit(GameEvent::Mint { score });
        }
    }
}

fn update_player(state: &mut GameState, input: &FrameInput) {
    let tuning = &state.tuning;
    let Some(player) = state.player.as_mut() else {
        return;
    };
    if !player.is_alive() {
        return;
    }

    let step = player.speed * input.frame_multiplier;
    let mut next = player.pos;
    if input.keys.up {
        next.y -= step;
    }
    if input.keys.down {
        next.y += step;
    }
    if input.keys.left {
        next.x -= step;
    }
    if input.keys.right {
        next.x += step;
    }
    player.update_position(next.x, next.y, tuning);
    player.aim_at(input.aim);

    if !input.shooting {
        return;
    }
    if let Some(mut bullet) = player.try_fire(state.now_ms, tuning) {
        bullet.id = state.next_entity_id();
        state.bullets.push(bullet);
        state.cue(Cue::Shoot);
    }
}

fn update_bullets(state: &mut GameState, frame_multiplier: f32) {
    let (w, h) = (state.tuning.canvas_width, state.tuning.canvas_height);
    for bullet in &mut state.bullets {
        bullet.update(frame_multiplier);
    }
    state.bullets.retain(|b| !b.is_expired(w, h));
}

fn update_enemies(state: &mut GameState, frame_multiplier: f32) {
    let Some(target) = state.player.as_ref().map(|p| p.pos) else {
        return;
    };
    let now = state.now_ms;
    let mut fired = Vec::new();
    for enemy in state.enemies.iter_mut().filter(|e| e.alive) {
        if let Some(bullet) = enemy.update_ai(target, now, frame_multiplier, &state.tuning) {
            fired.push(bullet);
        }
    }
    for mut bullet in fired {
        bullet.id = state.next_entity_id();
        state.bullets.push(bullet);
    }

    let before = state.enemies.len();
    state.enemies.retain(|e| e.is_valid());
    if state.enemies.len() != before {
        log::warn!("Removed {} enemies in an invalid state", before - state.enemies.len());
    }
}

/// Past the kill threshold the player's health cap rises
fn apply_veteran_health(state: &mut GameState) {
    if state.session.stats.kills() <= state.tuning.veteran_kill_threshold {
        return;
    }
    let cap = state.tuning.veteran_max_health;
    if let Some(player) = state.player.as_mut() {
        player.raise_max_health(cap);
    }
}

fn advance_explosions(state: &mut GameState, frame_multiplier: f32) {
    let frames = state.tuning.explosion_frame_count;
    for explosion in &mut state.explosions {
        explosion.advance(frame_multiplier);
    }
    state.explosions.retain(|e| !e.is_finished(frames));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::DrawCmd;
    use crate::sim::entity::{Bullet, BulletStyle, Explosion, Owner, Pickup, PickupKind};

    fn input_at(now_ms: f64) -> FrameInput {
        FrameInput {
            now_ms,
            frame_multiplier: 1.0,
            ..Default::default()
        }
    }

    fn step(state: &mut GameState, input: &FrameInput) -> Vec<DrawCmd> {
        let mut cmds = Vec::new();
        frame(state, input, &mut cmds);
        cmds
    }

    /// Countdown finished, one enemy on the field
    fn playing(seed: u64) -> GameState {
        let mut state = GameState::new(seed);
        state.start_countdown();
        for t in 1..=3 {
            step(&mut state, &input_at(t as f64 * 1000.0));
        }
        assert_eq!(state.phase(), GamePhase::Playing);
        state.drain_events();
        state
    }

    #[test]
    fn test_countdown_shows_3_2_1_0_then_playing() {
        let mut state = GameState::new(1);
        state.start_countdown();

        let mut shown = Vec::new();
        let mut playing_at = None;
        for t in 0..=4 {
            step(&mut state, &input_at(t as f64 * 1000.0));
            for event in state.drain_events() {
                match event {
                    GameEvent::Countdown(v) => shown.push(v),
                    GameEvent::PhaseChanged(GamePhase::Playing) => playing_at = Some(t),
                    _ => {}
                }
            }
        }
        assert_eq!(shown, vec![3, 2, 1, 0]);
        assert_eq!(playing_at, Some(3));
    }

    #[test]
    fn test_no_gameplay_during_countdown() {
        let mut state = GameState::new(1);
        state.start_countdown();
        let start = state.player.as_ref().unwrap().pos;
        let input = FrameInput {
            keys: MoveKeys {
                right: true,
                ..Default::default()
            },
            shooting: true,
            ..input_at(500.0)
        };
        step(&mut state, &input);
        assert_eq!(state.player.as_ref().unwrap().pos, start);
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn test_movement_scales_with_frame_multiplier() {
        let mut state = playing(2);
        state.enemies.clear();
        let start = state.player.as_ref().unwrap().pos;
        let input = FrameInput {
            keys: MoveKeys {
                right: true,
                ..Default::default()
            },
            frame_multiplier: 2.0,
            ..input_at(3100.0)
        };
        step(&mut state, &input);
        let moved = state.player.as_ref().unwrap().pos.x - start.x;
        assert!((moved - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_shooting_spawns_player_bullet() {
        let mut state = playing(3);
        state.enemies.clear();
        let input = FrameInput {
            shooting: true,
            aim: Vec2::new(1100.0, 450.0),
            ..input_at(3100.0)
        };
        step(&mut state, &input);
        assert_eq!(state.bullets.len(), 1);
        assert_eq!(state.bullets[0].owner, Owner::Player);
        assert!(state.drain_events().contains(&GameEvent::Sound(Cue::Shoot)));
    }

    #[test]
    fn test_death_leads_to_single_game_over() {
        let mut state = playing(4);
        state.enemies.clear();
        state.player.as_mut().unwrap().health = 1;
        let pos = state.player.as_ref().unwrap().pos;
        state
            .bullets
            .push(Bullet::new(pos, 0.0, 0.0, Owner::Enemy, 2, 7.0, BulletStyle::Enemy, 300));

        step(&mut state, &input_at(3100.0));
        assert!(state.session.is_dead());
        assert_eq!(state.phase(), GamePhase::Playing);

        // Dead tank ignores input
        let input = FrameInput {
            shooting: true,
            keys: MoveKeys {
                up: true,
                ..Default::default()
            },
            ..input_at(3500.0)
        };
        step(&mut state, &input);
        assert_eq!(state.player.as_ref().unwrap().pos, pos);

        step(&mut state, &input_at(4100.0));
        assert_eq!(state.phase(), GamePhase::GameOver);
        assert!(state.player.is_none());

        let overs = state
            .drain_events()
            .into_iter()
            .filter(|e| *e == GameEvent::PhaseChanged(GamePhase::GameOver))
            .count();
        assert_eq!(overs, 1);
        assert!(state.scheduler.count(|t| *t == Task::GameOver) == 0);
    }

    #[test]
    fn test_stale_tasks_are_noops() {
        let mut state = playing(5);
        state.schedule_round(50.0, Task::SpawnEnemy { kill_count: 1 });
        let stale_round = state.session.round();
        state.session.end_round();
        assert_ne!(state.session.round(), stale_round);

        let before = state.enemies.len();
        step(&mut state, &input_at(3200.0));
        assert_eq!(state.enemies.len(), before);
    }

    #[test]
    fn test_buff_expires_after_ten_ticks() {
        let mut state = playing(6);
        state.enemies.clear();
        state.now_ms = 3000.0;
        state.activate_buff();
        for s in 1..=10 {
            step(&mut state, &input_at(3000.0 + s as f64 * 1000.0));
        }
        assert_eq!(state.session.buff_remaining(), 0);
        assert!(!state.player.as_ref().unwrap().buffed);
        assert_eq!(state.pending_buff_tick(), None);
    }

    #[test]
    fn test_pickups_expire_on_ttl() {
        let mut state = playing(7);
        state.enemies.clear();
        let far = Vec2::new(100.0, 100.0);
        state
            .pickups
            .push(Pickup::new(PickupKind::Heart, far, 3000.0, &state.tuning));

        step(&mut state, &input_at(9999.0));
        assert_eq!(state.pickups.len(), 1);
        step(&mut state, &input_at(10_000.0));
        assert!(state.pickups.is_empty());
    }

    /// Fly one player bullet for `frames` frames of `multiplier`; its x if still alive
    fn fly_bullet(multiplier: f32, frames: u32) -> Option<f32> {
        let mut state = playing(12);
        state.enemies.clear();
        state.bullets.push(Bullet::new(
            Vec2::new(100.0, 100.0),
            0.0,
            4.0,
            Owner::Player,
            1,
            7.0,
            BulletStyle::Player,
            20,
        ));
        for n in 0..frames {
            let input = FrameInput {
                frame_multiplier: multiplier,
                ..input_at(3100.0 + f64::from(n) * f64::from(multiplier) * crate::consts::REFERENCE_FRAME_MS)
            };
            step(&mut state, &input);
        }
        state.bullets.first().map(|b| b.pos.x)
    }

    #[test]
    fn test_bullet_flight_same_at_60_and_240_hz() {
        let slow = fly_bullet(1.0, 19).unwrap();
        let fast = fly_bullet(0.25, 76).unwrap();
        assert!((slow - fast).abs() < 1e-2);
        assert!((slow - 176.0).abs() < 1e-2);

        assert!(fly_bullet(1.0, 20).is_none());
        assert!(fly_bullet(0.25, 80).is_none());
    }

    #[test]
    fn test_explosions_retire_past_sheet() {
        let mut state = playing(8);
        let last = state.tuning.explosion_frame_count - 2;
        state
            .explosions
            .push(Explosion::new(Vec2::ZERO, Explosion::ENEMY_SIZE, last));
        step(&mut state, &input_at(3100.0));
        assert_eq!(state.explosions.len(), 1);
        step(&mut state, &input_at(3117.0));
        assert!(state.explosions.is_empty());
    }

    #[test]
    fn test_veteran_health_after_ten_kills() {
        let mut state = playing(9);
        state.enemies.clear();
        for _ in 0..11 {
            state.session.stats.record_kill(crate::sim::entity::EnemyKind::Default, 1);
        }
        step(&mut state, &input_at(3100.0));
        assert_eq!(state.player.as_ref().unwrap().max_health, 8);
    }

    #[test]
    fn test_determinism() {
        let mut a = playing(1234);
        let mut b = playing(1234);
        for i in 0..600 {
            let input = FrameInput {
                autopilot: true,
                ..input_at(3000.0 + i as f64 * 16.0)
            };
            step(&mut a, &input);
            step(&mut b, &input);
        }
        assert_eq!(a.session.stats, b.session.stats);
        assert_eq!(a.enemies.len(), b.enemies.len());
        assert_eq!(a.bullets.len(), b.bullets.len());
    }
}
