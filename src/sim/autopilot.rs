//! Demo autopilot
//!
//! Plays a round without a human: aims at the nearest enemy, keeps its
//! distance, sidesteps incoming bullets and grabs pickups when it is safe.
//! Used by the headless runner and for soak tests.

use glam::Vec2;

use super::entity::Owner;
use super::state::GameState;
use super::tick::{FrameInput, MoveKeys};

const KEEP_AWAY: f32 = 220.0;
const DODGE_RADIUS: f32 = 120.0;

/// Overwrite `input` with the autopilot's choice for this frame
pub fn steer(state: &GameState, input: &mut FrameInput) {
    let Some(player) = state.player.as_ref() else {
        return;
    };
    let me = player.pos;

    let nearest_enemy = state
        .enemies
        .iter()
        .filter(|e| e.alive)
        .min_by(|a, b| {
            a.pos
                .distance_squared(me)
                .partial_cmp(&b.pos.distance_squared(me))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

    input.shooting = nearest_enemy.is_some();
    if let Some(enemy) = nearest_enemy {
        input.aim = enemy.pos;
    }

    // Closest incoming enemy bullet
    let threat = state
        .bullets
        .iter()
        .filter(|b| b.owner == Owner::Enemy && b.pos.distance(me) < DODGE_RADIUS)
        .min_by(|a, b| {
            a.pos
                .distance_squared(me)
                .partial_cmp(&b.pos.distance_squared(me))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

    let heading = if let Some(bullet) = threat {
        // Step sideways relative to the bullet's path
        let travel = crate::direction(bullet.angle);
        let side = Vec2::new(-travel.y, travel.x);
        if side.dot(me - bullet.pos) >= 0.0 { side } else { -side }
    } else if let Some(enemy) = nearest_enemy.filter(|e| e.pos.distance(me) < KEEP_AWAY) {
        (me - enemy.pos).normalize_or_zero()
    } else if let Some(pickup) = state.pickups.first() {
        (pickup.pos - me).normalize_or_zero()
    } else {
        // Drift back toward the middle of the arena
        let center = Vec2::new(state.tuning.canvas_width, state.tuning.canvas_height) / 2.0;
        let to_center = center - me;
        if to_center.length() > 100.0 {
            to_center.normalize_or_zero()
        } else {
            Vec2::ZERO
        }
    };

    input.keys = MoveKeys {
        up: heading.y < -0.3,
        down: heading.y > 0.3,
        left: heading.x < -0.3,
        right: heading.x > 0.3,
    };
}
