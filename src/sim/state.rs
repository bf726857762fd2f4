//! World state and round lifecycle
//!
//! `GameState` owns every entity collection, the seeded RNG, the deferred task
//! queue, and the event buffer the host drains after each frame.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::entity::{DropPolicy, Enemy, Explosion, Bullet, Pickup, Player};
use super::scheduler::{Scheduler, TaskId};
use super::session::{GamePhase, Session};
use super::spawner;
use crate::audio::Cue;
use crate::consts::TIMER_TICK_MS;
use crate::services::AuthContext;
use crate::tuning::Tuning;

/// Deferred work queued on the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Delayed refill spawn. `kill_count` is the count that requested it.
    SpawnEnemy { kill_count: u32 },
    /// One 1 Hz countdown step
    CountdownTick,
    /// One 1 Hz buff window step
    BuffTick,
    /// Delayed transition after the player's death
    GameOver,
    /// Per-kill score notification (reads the score when it fires)
    SubmitScore,
    /// Boss-kill mint notification (reads the score when it fires)
    Mint,
}

/// Notifications for the host, drained after each frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    Sound(Cue),
    SubmitScore { score: u64, is_death: bool },
    Mint { score: u64 },
    PhaseChanged(GamePhase),
    /// Countdown display value
    Countdown(u32),
    /// Buff window seconds left
    BuffTimer(u32),
}

/// Complete world state
#[derive(Debug, Clone)]
pub struct GameState {
    pub tuning: Tuning,
    /// Seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub drop_policy: DropPolicy,
    pub session: Session,
    /// Wallet snapshot provided by the host
    pub auth: AuthContext,
    /// Clock of the current frame (ms)
    pub now_ms: f64,
    pub player: Option<Player>,
    pub enemies: Vec<Enemy>,
    pub bullets: Vec<Bullet>,
    pub pickups: Vec<Pickup>,
    pub explosions: Vec<Explosion>,
    pub scheduler: Scheduler<Task>,
    /// Pending link of the buff countdown chain
    pub(super) buff_task: Option<TaskId>,
    events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Create a new game state with the given seed and default tuning
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(Tuning::default(), seed)
    }

    pub fn with_tuning(tuning: Tuning, seed: u64) -> Self {
        Self {
            tuning,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            drop_policy: DropPolicy::STANDARD,
            session: Session::default(),
            auth: AuthContext::default(),
            now_ms: 0.0,
            player: None,
            enemies: Vec::new(),
            bullets: Vec::new(),
            pickups: Vec::new(),
            explosions: Vec::new(),
            scheduler: Scheduler::new(),
            buff_task: None,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn phase(&self) -> GamePhase {
        self.session.phase
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn cue(&mut self, cue: Cue) {
        self.events.push(GameEvent::Sound(cue));
    }

    /// Take every event emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Queue a task tied to the current round
    pub fn schedule_round(&mut self, delay_ms: f64, task: Task) -> TaskId {
        let round = self.session.round();
        self.scheduler.schedule(self.now_ms + delay_ms, Some(round), task)
    }

    /// Queue a task that survives round teardown
    pub fn schedule_detached(&mut self, delay_ms: f64, task: Task) -> TaskId {
        self.scheduler.schedule(self.now_ms + delay_ms, None, task)
    }

    /// Enemies still alive (dead ones wait for compaction)
    pub fn live_enemy_count(&self) -> u32 {
        self.enemies.iter().filter(|e| e.alive).count() as u32
    }

    /// Refill spawns queued but not yet fired
    pub fn pending_spawns(&self) -> u32 {
        self.scheduler
            .count(|t| matches!(t, Task::SpawnEnemy { .. })) as u32
    }

    /// Start a new round: fresh player, one enemy, 3-2-1 countdown
    pub fn start_countdown(&mut self) {
        if let Some(prev) = self.live_round() {
            self.scheduler.cancel_round(prev);
        }
        let round = self.session.begin_round(self.tuning.countdown_secs);
        self.clear_world();

        let center = Vec2::new(self.tuning.canvas_width / 2.0, self.tuning.canvas_height / 2.0);
        self.player = Some(Player::new(center, &self.tuning));
        spawner::request_spawns(self, 0);

        log::info!("Round {} countdown started (seed {})", round, self.seed);
        self.emit(GameEvent::PhaseChanged(GamePhase::Countdown));
        self.emit(GameEvent::Countdown(self.session.countdown()));
        self.schedule_round(TIMER_TICK_MS, Task::CountdownTick);
    }

    /// End the round voluntarily. Only meaningful while playing.
    pub fn stop(&mut self) -> bool {
        if self.session.phase != GamePhase::Playing {
            return false;
        }
        log::info!("Round {} stopped by player", self.session.round());
        self.submit_final_score();
        self.enter_game_over();
        true
    }

    /// Emit the final (death) score once per round
    pub fn submit_final_score(&mut self) {
        if !self.session.claim_final_submission() {
            log::debug!("Final score already submitted this round");
            return;
        }
        let score = self.session.stats.score();
        self.emit(GameEvent::SubmitScore {
            score,
            is_death: true,
        });
    }

    /// Tear down the round and show the game-over screen. Stats are kept.
    pub fn enter_game_over(&mut self) {
        if self.session.phase == GamePhase::GameOver {
            return;
        }
        self.scheduler.cancel_round(self.session.round());
        self.clear_world();
        self.session.end_round();
        self.session.phase = GamePhase::GameOver;
        log::info!(
            "Game over: score {} kills {} boss kills {}",
            self.session.stats.score(),
            self.session.stats.kills(),
            self.session.stats.boss_kills()
        );
        self.emit(GameEvent::PhaseChanged(GamePhase::GameOver));
    }

    /// Back to the start screen from any phase
    pub fn return_to_menu(&mut self) {
        if self.session.phase == GamePhase::Menu {
            return;
        }
        if let Some(round) = self.live_round() {
            self.scheduler.cancel_round(round);
            self.session.end_round();
        }
        self.clear_world();
        self.session.phase = GamePhase::Menu;
        self.emit(GameEvent::PhaseChanged(GamePhase::Menu));
    }

    /// Grant or refresh the buff window at its full length
    pub fn activate_buff(&mut self) {
        let duration = self.tuning.buff_duration_secs;
        if let Some(id) = self.buff_task.take() {
            self.scheduler.cancel(id);
        }
        self.session.start_buff(duration);
        if let Some(player) = self.player.as_mut() {
            player.buffed = true;
        }
        self.emit(GameEvent::BuffTimer(duration));
        self.schedule_buff_tick();
    }

    /// Queue the next link of the buff countdown
    pub(super) fn schedule_buff_tick(&mut self) {
        self.buff_task = Some(self.schedule_round(TIMER_TICK_MS, Task::BuffTick));
    }

    /// Buff tick still waiting to run, if any
    pub fn pending_buff_tick(&self) -> Option<TaskId> {
        self.buff_task
    }

    /// Round currently in countdown or play, if any
    fn live_round(&self) -> Option<u32> {
        matches!(self.session.phase, GamePhase::Countdown | GamePhase::Playing)
            .then(|| self.session.round())
    }

    fn clear_world(&mut self) {
        self.buff_task = None;
        self.player = None;
        self.enemies.clear();
        self.bullets.clear();
        self.pickups.clear();
        self.explosions.clear();
    }
}
