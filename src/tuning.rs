//! Data-driven game balance
//!
//! Every gameplay number lives here so a round can be re-tuned from JSON
//! without touching the simulation.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Gameplay tuning values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Arena ===
    pub canvas_width: f32,
    pub canvas_height: f32,
    /// Player position is clamped this far from every edge
    pub arena_inset: f32,
    /// Static map cell size (px)
    pub cell_size: f32,

    // === Player ===
    pub player_speed: f32,
    pub player_width: f32,
    pub player_health: i32,
    /// Max health once the player has passed `veteran_kill_threshold` kills
    pub veteran_max_health: i32,
    pub veteran_kill_threshold: u32,
    /// Bullet hit radius against the player
    pub player_hit_radius: f32,
    pub barrel_length: f32,
    pub bullet_speed: f32,
    /// Minimum ms between player shots
    pub fire_rate_ms: f64,
    pub bullet_size: f32,
    pub buffed_bullet_size: f32,
    pub bullet_damage: i32,
    pub buffed_bullet_damage: i32,
    /// Reference (60 Hz) frames before any bullet expires regardless of position
    pub bullet_lifetime_frames: u32,

    // === Enemies ===
    /// Enemies allowed on the field at kill count 0 (BASE)
    pub base_enemies: u32,
    pub max_enemies: u32,
    pub spawn_delay_min_ms: f64,
    pub spawn_delay_max_ms: f64,
    /// Probability a spawned enemy is a fire (boss) enemy
    pub fire_enemy_chance: f32,
    pub max_difficulty: u32,
    pub fire_difficulty_multiplier: u32,
    pub enemy_width: f32,
    pub enemy_height: f32,
    pub fire_enemy_width: f32,
    pub fire_enemy_height: f32,

    // === Pickups ===
    pub heart_ttl_ms: f64,
    pub buff_ttl_ms: f64,
    /// Buff window length (whole seconds, counted down at 1 Hz)
    pub buff_duration_secs: u32,

    // === Session ===
    pub countdown_secs: u32,
    pub game_over_delay_ms: f64,
    pub default_kill_score: u64,
    pub fire_kill_score: u64,

    // === Effects ===
    pub explosion_start_frame: u32,
    pub explosion_frame_count: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            canvas_width: 1200.0,
            canvas_height: 900.0,
            arena_inset: 45.0,
            cell_size: 50.0,

            player_speed: 5.0,
            player_width: 70.0,
            player_health: 5,
            veteran_max_health: 8,
            veteran_kill_threshold: 10,
            player_hit_radius: 35.0,
            barrel_length: 40.0,
            bullet_speed: 10.0,
            fire_rate_ms: 200.0,
            bullet_size: 7.0,
            buffed_bullet_size: 18.0,
            bullet_damage: 1,
            buffed_bullet_damage: 2,
            bullet_lifetime_frames: 300,

            base_enemies: 5,
            max_enemies: 15,
            spawn_delay_min_ms: 150.0,
            spawn_delay_max_ms: 430.0,
            fire_enemy_chance: 0.05,
            max_difficulty: 10,
            fire_difficulty_multiplier: 10,
            enemy_width: 80.0,
            enemy_height: 80.0,
            fire_enemy_width: 120.0,
            fire_enemy_height: 120.0,

            heart_ttl_ms: 7000.0,
            buff_ttl_ms: 7000.0,
            buff_duration_secs: 10,

            countdown_secs: 3,
            game_over_delay_ms: 1000.0,
            default_kill_score: 1,
            fire_kill_score: 3,

            explosion_start_frame: 16,
            explosion_frame_count: 136,
        }
    }
}

impl Tuning {
    /// Parse tuning overrides from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), Error> {
        if self.canvas_width <= 2.0 * self.arena_inset || self.canvas_height <= 2.0 * self.arena_inset {
            return Err(Error::InvalidTuning("arena inset leaves no playable area"));
        }
        if self.spawn_delay_max_ms < self.spawn_delay_min_ms {
            return Err(Error::InvalidTuning("spawn delay window is inverted"));
        }
        if self.base_enemies == 0 || self.max_enemies < self.base_enemies {
            return Err(Error::InvalidTuning("enemy cap must be at least the base count"));
        }
        if !(0.0..=1.0).contains(&self.fire_enemy_chance) {
            return Err(Error::InvalidTuning("fire enemy chance must be a probability"));
        }
        if self.cell_size <= 0.0 {
            return Err(Error::InvalidTuning("cell size must be positive"));
        }
        Ok(())
    }

    /// Enemies allowed on the field for a given kill count
    pub fn max_enemies_allowed(&self, kill_count: u32) -> u32 {
        (self.base_enemies + kill_count / 10).min(self.max_enemies)
    }

    /// Difficulty level for a given kill count, before the fire multiplier
    pub fn difficulty_for(&self, kill_count: u32) -> u32 {
        (kill_count / 10).min(self.max_difficulty)
    }

    /// Static map tiles as (column, row) cells: a wall ring around the arena
    pub fn map_tiles(&self) -> Vec<(u32, u32)> {
        let cols = (self.canvas_width / self.cell_size).ceil() as u32;
        let rows = (self.canvas_height / self.cell_size).ceil() as u32;
        let mut tiles = Vec::new();
        for row in 0..rows {
            for col in 0..cols {
                if row == 0 || col == 0 || row == rows - 1 || col == cols - 1 {
                    tiles.push((col, row));
                }
            }
        }
        tiles
    }
}
