//! Entity model: player tank, enemies, bullets, pickups, explosions
//!
//! Each entity owns its own movement and damage rules. Anything that needs
//! the rest of the world (scoring, drops, spawning) is handled by the
//! resolution engine in `collision`.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;
use crate::{angle_between, direction};

/// Which side fired a bullet. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    Player,
    Enemy,
}

/// Bullet visual variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulletStyle {
    Player,
    PlayerBuffed,
    Enemy,
    Fire,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bullet {
    pub id: u32,
    pub pos: Vec2,
    /// Travel direction (radians)
    pub angle: f32,
    /// Pixels per reference frame
    pub speed: f32,
    pub owner: Owner,
    pub damage: i32,
    /// Visual radius
    pub size: f32,
    pub style: BulletStyle,
    /// Age in reference (60 Hz) frames, so range is the same at any refresh rate
    pub age_frames: f32,
    pub lifetime_frames: f32,
    /// Set when a collision consumed this bullet; compacted after the pass
    pub consumed: bool,
}

impl Bullet {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pos: Vec2,
        angle: f32,
        speed: f32,
        owner: Owner,
        damage: i32,
        size: f32,
        style: BulletStyle,
        lifetime_frames: u32,
    ) -> Self {
        Self {
            id: 0,
            pos,
            angle,
            speed,
            owner,
            damage,
            size,
            style,
            age_frames: 0.0,
            lifetime_frames: lifetime_frames as f32,
            consumed: false,
        }
    }

    pub fn update(&mut self, frame_multiplier: f32) {
        self.pos += direction(self.angle) * self.speed * frame_multiplier;
        self.age_frames += frame_multiplier;
    }

    /// Out of the arena, past its lifetime, or already consumed
    pub fn is_expired(&self, width: f32, height: f32) -> bool {
        self.consumed
            || self.age_frames >= self.lifetime_frames
            || self.pos.x < -self.size
            || self.pos.y < -self.size
            || self.pos.x > width + self.size
            || self.pos.y > height + self.size
    }
}

/// The player's tank
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub pos: Vec2,
    /// Barrel facing (radians)
    pub angle: f32,
    pub health: i32,
    pub max_health: i32,
    pub speed: f32,
    pub width: f32,
    pub bullet_speed: f32,
    pub fire_rate_ms: f64,
    pub buffed: bool,
    /// Timestamp of the last shot (ms), negative infinity before the first
    pub last_shot_ms: f64,
}

impl Player {
    pub fn new(pos: Vec2, tuning: &Tuning) -> Self {
        Self {
            pos,
            angle: 0.0,
            health: tuning.player_health,
            max_health: tuning.player_health,
            speed: tuning.player_speed,
            width: tuning.player_width,
            bullet_speed: tuning.bullet_speed,
            fire_rate_ms: tuning.fire_rate_ms,
            buffed: false,
            last_shot_ms: f64::NEG_INFINITY,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Radius inside which pickups are grabbed
    pub fn grab_radius(&self) -> f32 {
        self.width / 2.0
    }

    /// Move to (x, y), clamped to the arena minus the inset
    pub fn update_position(&mut self, x: f32, y: f32, tuning: &Tuning) {
        let inset = tuning.arena_inset;
        self.pos.x = x.clamp(inset, tuning.canvas_width - inset);
        self.pos.y = y.clamp(inset, tuning.canvas_height - inset);
    }

    pub fn aim_at(&mut self, target: Vec2) {
        if target != self.pos {
            self.angle = angle_between(self.pos, target);
        }
    }

    /// Apply damage; returns true if this hit left the tank at zero health
    pub fn take_damage(&mut self, amount: i32) -> bool {
        self.health = (self.health - amount.max(0)).clamp(0, self.max_health);
        self.health == 0
    }

    /// Restore one point of health. Returns false when already full.
    pub fn heal(&mut self) -> bool {
        if self.health >= self.max_health {
            return false;
        }
        self.health += 1;
        true
    }

    /// Raise the health cap (never lowers current health)
    pub fn raise_max_health(&mut self, max_health: i32) {
        if max_health > self.max_health {
            self.max_health = max_health;
        }
    }

    pub fn barrel_end(&self, tuning: &Tuning) -> Vec2 {
        self.pos + direction(self.angle) * tuning.barrel_length
    }

    /// Fire if the fire-rate window has elapsed
    pub fn try_fire(&mut self, now_ms: f64, tuning: &Tuning) -> Option<Bullet> {
        if now_ms - self.last_shot_ms <= self.fire_rate_ms {
            return None;
        }
        self.last_shot_ms = now_ms;
        let (damage, size, style) = if self.buffed {
            (tuning.buffed_bullet_damage, tuning.buffed_bullet_size, BulletStyle::PlayerBuffed)
        } else {
            (tuning.bullet_damage, tuning.bullet_size, BulletStyle::Player)
        };
        Some(Bullet::new(
            self.barrel_end(tuning),
            self.angle,
            self.bullet_speed,
            Owner::Player,
            damage,
            size,
            style,
            tuning.bullet_lifetime_frames,
        ))
    }
}

/// Enemy type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnemyKind {
    #[default]
    Default,
    /// Boss variant: tougher, drops buffs more often, worth more score
    Fire,
}

/// Result of damaging an enemy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Hit but still alive
    Damaged,
    /// Lethal hit, drops a heart
    DropHeart,
    /// Lethal hit, drops a buff
    DropBuff,
}

impl DamageOutcome {
    pub fn is_lethal(self) -> bool {
        !matches!(self, DamageOutcome::Damaged)
    }
}

/// Heart vs buff selection on a lethal hit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DropPolicy {
    /// Buff chance for a default enemy at difficulty 0
    pub base_buff_chance: f32,
    /// Added per difficulty level
    pub buff_chance_per_level: f32,
    pub max_buff_chance: f32,
    /// Fire enemies ignore difficulty and use this
    pub fire_buff_chance: f32,
}

impl DropPolicy {
    pub const STANDARD: DropPolicy = DropPolicy {
        base_buff_chance: 0.1,
        buff_chance_per_level: 0.02,
        max_buff_chance: 0.3,
        fire_buff_chance: 0.75,
    };

    pub fn buff_chance(&self, kind: EnemyKind, difficulty: u32) -> f32 {
        match kind {
            EnemyKind::Fire => self.fire_buff_chance,
            EnemyKind::Default => (self.base_buff_chance
                + self.buff_chance_per_level * difficulty as f32)
                .min(self.max_buff_chance),
        }
    }

    /// Pick the drop for a lethal hit given a uniform roll in [0, 1)
    pub fn choose(&self, kind: EnemyKind, difficulty: u32, roll: f32) -> DamageOutcome {
        if roll < self.buff_chance(kind, difficulty) {
            DamageOutcome::DropBuff
        } else {
            DamageOutcome::DropHeart
        }
    }
}

impl Default for DropPolicy {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Difficulty-derived combat parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackProfile {
    pub health: i32,
    pub speed: f32,
    pub fire_interval_ms: f64,
    pub bullet_speed: f32,
    pub bullet_damage: i32,
    /// Distance the enemy tries to hold from its target
    pub preferred_range: f32,
}

impl AttackProfile {
    /// `difficulty` already includes the fire multiplier (0..=100 for fire)
    pub fn for_enemy(kind: EnemyKind, difficulty: u32) -> Self {
        let d = difficulty as f32;
        match kind {
            EnemyKind::Default => Self {
                health: 2 + (difficulty / 2) as i32,
                speed: (1.5 + d * 0.1).min(2.5),
                fire_interval_ms: (2000.0 - f64::from(difficulty) * 100.0).max(700.0),
                bullet_speed: (4.0 + d * 0.25).min(6.5),
                bullet_damage: 1,
                preferred_range: 250.0,
            },
            EnemyKind::Fire => Self {
                health: 10 + (difficulty / 5) as i32,
                speed: (1.2 + d * 0.01).min(2.2),
                fire_interval_ms: (1500.0 - f64::from(difficulty) * 8.0).max(500.0),
                bullet_speed: (5.0 + d * 0.04).min(9.0),
                bullet_damage: 2,
                preferred_range: 320.0,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub health: i32,
    pub max_health: i32,
    pub width: f32,
    pub height: f32,
    /// Adjusted difficulty (fire multiplier applied)
    pub difficulty: u32,
    pub attack: AttackProfile,
    pub last_shot_ms: f64,
    /// +1 or -1: which way to circle the target
    pub strafe_dir: f32,
    /// Sprite skin index
    pub skin: u8,
    /// Cleared on a lethal hit; compacted after the resolution pass
    pub alive: bool,
}

impl Enemy {
    pub fn new(kind: EnemyKind, pos: Vec2, difficulty: u32, skin: u8, now_ms: f64, tuning: &Tuning) -> Self {
        let attack = AttackProfile::for_enemy(kind, difficulty);
        let (width, height) = match kind {
            EnemyKind::Default => (tuning.enemy_width, tuning.enemy_height),
            EnemyKind::Fire => (tuning.fire_enemy_width, tuning.fire_enemy_height),
        };
        Self {
            id: 0,
            kind,
            pos,
            vel: Vec2::ZERO,
            health: attack.health,
            max_health: attack.health,
            width,
            height,
            difficulty,
            attack,
            // First shot waits a full interval after spawning
            last_shot_ms: now_ms,
            strafe_dir: if skin % 2 == 0 { 1.0 } else { -1.0 },
            skin,
            alive: true,
        }
    }

    pub fn hit_radius(&self) -> f32 {
        self.width / 2.0
    }

    /// Finite position and still alive
    pub fn is_valid(&self) -> bool {
        self.alive && self.pos.is_finite() && self.vel.is_finite()
    }

    /// Apply damage. A lethal hit marks the enemy dead and picks its drop.
    pub fn take_damage<R: Rng>(&mut self, amount: i32, policy: &DropPolicy, rng: &mut R) -> DamageOutcome {
        if !self.alive {
            return DamageOutcome::Damaged;
        }
        self.health -= amount.max(0);
        if self.health > 0 {
            return DamageOutcome::Damaged;
        }
        self.alive = false;
        policy.choose(self.kind, self.difficulty, rng.random::<f32>())
    }

    /// Advance movement toward `target` and fire when the interval allows
    pub fn update_ai(&mut self, target: Vec2, now_ms: f64, frame_multiplier: f32, tuning: &Tuning) -> Option<Bullet> {
        let to_target = target - self.pos;
        let dist = to_target.length();
        let toward = to_target.normalize_or_zero();
        let range = self.attack.preferred_range;

        let heading = if dist > range + 40.0 {
            toward
        } else if dist < range - 40.0 {
            -toward
        } else {
            Vec2::new(-toward.y, toward.x) * self.strafe_dir
        };

        self.vel = heading * self.attack.speed;
        let next = self.pos + self.vel * frame_multiplier;
        let margin_x = self.width / 2.0;
        let margin_y = self.height / 2.0;
        let clamped = Vec2::new(
            next.x.clamp(margin_x, tuning.canvas_width - margin_x),
            next.y.clamp(margin_y, tuning.canvas_height - margin_y),
        );
        // Pinned against a wall while strafing: circle the other way
        if clamped != next && dist >= range - 40.0 && dist <= range + 40.0 {
            self.strafe_dir = -self.strafe_dir;
        }
        self.pos = clamped;

        if now_ms - self.last_shot_ms < self.attack.fire_interval_ms || dist <= f32::EPSILON {
            return None;
        }
        self.last_shot_ms = now_ms;

        let angle = angle_between(self.pos, target);
        let muzzle = self.pos + direction(angle) * self.hit_radius();
        let style = match self.kind {
            EnemyKind::Default => BulletStyle::Enemy,
            EnemyKind::Fire => BulletStyle::Fire,
        };
        let size = match self.kind {
            EnemyKind::Default => tuning.bullet_size,
            EnemyKind::Fire => tuning.bullet_size * 1.5,
        };
        Some(Bullet::new(
            muzzle,
            angle,
            self.attack.bullet_speed,
            Owner::Enemy,
            self.attack.bullet_damage,
            size,
            style,
            tuning.bullet_lifetime_frames,
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    Heart,
    Buff,
}

/// A heart or buff dropped by a dead enemy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pickup {
    pub id: u32,
    pub kind: PickupKind,
    pub pos: Vec2,
    pub spawned_ms: f64,
    pub ttl_ms: f64,
    pub consumed: bool,
}

impl Pickup {
    pub fn new(kind: PickupKind, pos: Vec2, now_ms: f64, tuning: &Tuning) -> Self {
        let ttl_ms = match kind {
            PickupKind::Heart => tuning.heart_ttl_ms,
            PickupKind::Buff => tuning.buff_ttl_ms,
        };
        Self {
            id: 0,
            kind,
            pos,
            spawned_ms: now_ms,
            ttl_ms,
            consumed: false,
        }
    }

    pub fn is_expired(&self, now_ms: f64) -> bool {
        now_ms - self.spawned_ms >= self.ttl_ms
    }
}

/// Death animation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Explosion {
    pub pos: Vec2,
    pub frame: u32,
    pub width: f32,
    pub height: f32,
}

impl Explosion {
    pub const ENEMY_SIZE: (f32, f32) = (100.0, 96.0);
    pub const PLAYER_SIZE: (f32, f32) = (400.0, 395.0);

    pub fn new(pos: Vec2, (width, height): (f32, f32), start_frame: u32) -> Self {
        Self {
            pos,
            frame: start_frame,
            width,
            height,
        }
    }

    /// Advance by `ceil(frame_multiplier)` frames
    pub fn advance(&mut self, frame_multiplier: f32) {
        self.frame += frame_multiplier.max(0.0).ceil() as u32;
    }

    pub fn is_finished(&self, frame_count: u32) -> bool {
        self.frame >= frame_count
    }
}
