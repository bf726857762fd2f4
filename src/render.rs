//! Draw pass
//!
//! Turns world state into a flat list of draw commands. Never mutates the
//! simulation; the host decides how to paint each command.

use glam::Vec2;

use crate::assets::SpriteKey;
use crate::sim::entity::{BulletStyle, EnemyKind, PickupKind};
use crate::sim::state::GameState;

pub const BACKGROUND_COLOR: &str = "#ffccff";
pub const MAP_COLOR: &str = "#800080";

/// Explosion sprites are drawn slightly below-right of the death point
const EXPLOSION_OFFSET: Vec2 = Vec2::new(5.0, 10.0);
const PICKUP_RADIUS: f32 = 15.0;

/// One paint operation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCmd {
    /// Fill the whole canvas
    Fill { color: &'static str },
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: &'static str,
    },
    Circle {
        center: Vec2,
        radius: f32,
        color: &'static str,
    },
    Sprite {
        key: SpriteKey,
        center: Vec2,
        width: f32,
        height: f32,
        /// Radians, clockwise in canvas space
        rotation: f32,
    },
    /// Bar above an entity; `fraction` in [0, 1]
    HealthBar { center: Vec2, width: f32, fraction: f32 },
}

/// Paint target
pub trait Surface {
    fn draw(&mut self, cmd: DrawCmd);

    /// Whether a sprite is loaded; unloaded sprites fall back to shapes
    fn sprite_ready(&self, _key: SpriteKey) -> bool {
        false
    }
}

impl Surface for Vec<DrawCmd> {
    fn draw(&mut self, cmd: DrawCmd) {
        self.push(cmd);
    }
}

/// Background fill and the static wall ring
pub fn draw_background(state: &GameState, surface: &mut impl Surface) {
    surface.draw(DrawCmd::Fill {
        color: BACKGROUND_COLOR,
    });
    let cell = state.tuning.cell_size;
    for (col, row) in state.tuning.map_tiles() {
        surface.draw(DrawCmd::Rect {
            x: col as f32 * cell,
            y: row as f32 * cell,
            w: cell - 1.0,
            h: cell - 1.0,
            color: MAP_COLOR,
        });
    }
}

/// Player, enemies, bullets, pickups, then explosions
pub fn draw_entities(state: &GameState, surface: &mut impl Surface) {
    if let Some(player) = state.player.as_ref().filter(|p| p.is_alive()) {
        sprite_or_circle(
            surface,
            SpriteKey::Player,
            player.pos,
            player.width,
            player.width,
            player.angle,
            "#2255cc",
        );
        surface.draw(DrawCmd::HealthBar {
            center: player.pos - Vec2::new(0.0, player.width / 2.0 + 10.0),
            width: player.width,
            fraction: player.health as f32 / player.max_health.max(1) as f32,
        });
    }

    for enemy in state.enemies.iter().filter(|e| e.alive) {
        let (key, color) = match enemy.kind {
            EnemyKind::Default => (SpriteKey::Enemy(enemy.skin), "#444444"),
            EnemyKind::Fire => (SpriteKey::FireEnemy, "#dd4400"),
        };
        let facing = state
            .player
            .as_ref()
            .map_or(0.0, |p| crate::angle_between(enemy.pos, p.pos));
        sprite_or_circle(surface, key, enemy.pos, enemy.width, enemy.height, facing, color);
        surface.draw(DrawCmd::HealthBar {
            center: enemy.pos - Vec2::new(0.0, enemy.height / 2.0 + 8.0),
            width: enemy.width,
            fraction: enemy.health.max(0) as f32 / enemy.max_health.max(1) as f32,
        });
    }

    for bullet in state.bullets.iter().filter(|b| !b.consumed) {
        let color = match bullet.style {
            BulletStyle::Player => "#000000",
            BulletStyle::PlayerBuffed => "#ffaa00",
            BulletStyle::Enemy => "#cc0000",
            BulletStyle::Fire => "#ff5500",
        };
        surface.draw(DrawCmd::Circle {
            center: bullet.pos,
            radius: bullet.size,
            color,
        });
    }

    for pickup in &state.pickups {
        let (key, color) = match pickup.kind {
            PickupKind::Heart => (SpriteKey::Heart, "#ff2255"),
            PickupKind::Buff => (SpriteKey::Buff, "#ffd700"),
        };
        let size = PICKUP_RADIUS * 2.0;
        sprite_or_circle(surface, key, pickup.pos, size, size, 0.0, color);
    }

    for explosion in &state.explosions {
        if explosion.is_finished(state.tuning.explosion_frame_count) {
            continue;
        }
        let key = SpriteKey::Explosion(explosion.frame);
        if !surface.sprite_ready(key) {
            continue;
        }
        surface.draw(DrawCmd::Sprite {
            key,
            center: explosion.pos + EXPLOSION_OFFSET,
            width: explosion.height,
            height: explosion.height,
            rotation: 0.0,
        });
    }
}

fn sprite_or_circle(
    surface: &mut impl Surface,
    key: SpriteKey,
    center: Vec2,
    width: f32,
    height: f32,
    rotation: f32,
    fallback: &'static str,
) {
    if surface.sprite_ready(key) {
        surface.draw(DrawCmd::Sprite {
            key,
            center,
            width,
            height,
            rotation,
        });
    } else {
        surface.draw(DrawCmd::Circle {
            center,
            radius: width / 2.0,
            color: fallback,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{Bullet, Explosion, Owner};
    use crate::sim::session::GamePhase;

    /// Surface that reports every sprite as loaded
    struct Loaded(Vec<DrawCmd>);

    impl Surface for Loaded {
        fn draw(&mut self, cmd: DrawCmd) {
            self.0.push(cmd);
        }

        fn sprite_ready(&self, _key: SpriteKey) -> bool {
            true
        }
    }

    fn state() -> GameState {
        let mut state = GameState::new(3);
        state.start_countdown();
        state.session.phase = GamePhase::Playing;
        state
    }

    #[test]
    fn test_background_comes_first() {
        let state = state();
        let mut cmds = Vec::new();
        draw_background(&state, &mut cmds);
        assert_eq!(cmds[0], DrawCmd::Fill { color: BACKGROUND_COLOR });
        assert_eq!(cmds.len(), 1 + state.tuning.map_tiles().len());
    }

    #[test]
    fn test_missing_sprites_fall_back_and_skip_explosions() {
        let mut state = state();
        state
            .explosions
            .push(Explosion::new(Vec2::new(100.0, 100.0), Explosion::ENEMY_SIZE, 16));
        let mut cmds = Vec::new();
        draw_entities(&state, &mut cmds);

        assert!(cmds.iter().all(|c| !matches!(c, DrawCmd::Sprite { .. })));
        // Player circle + bar, enemy circle + bar
        assert_eq!(cmds.iter().filter(|c| matches!(c, DrawCmd::Circle { .. })).count(), 2);
    }

    #[test]
    fn test_draw_order_player_enemies_bullets_explosions() {
        let mut state = state();
        state.bullets.push(Bullet::new(
            Vec2::new(300.0, 300.0),
            0.0,
            1.0,
            Owner::Player,
            1,
            7.0,
            BulletStyle::Player,
            300,
        ));
        state
            .explosions
            .push(Explosion::new(Vec2::new(100.0, 100.0), Explosion::ENEMY_SIZE, 16));

        let mut surface = Loaded(Vec::new());
        draw_entities(&state, &mut surface);
        let cmds = surface.0;

        let pos = |pred: &dyn Fn(&DrawCmd) -> bool| cmds.iter().position(|c| pred(c)).unwrap();
        let player = pos(&|c| matches!(c, DrawCmd::Sprite { key: SpriteKey::Player, .. }));
        let enemy = pos(&|c| matches!(c, DrawCmd::Sprite { key: SpriteKey::Enemy(_), .. }));
        let bullet = pos(&|c| matches!(c, DrawCmd::Circle { .. }));
        let boom = pos(&|c| matches!(c, DrawCmd::Sprite { key: SpriteKey::Explosion(16), .. }));
        assert!(player < enemy && enemy < bullet && bullet < boom);
    }

    #[test]
    fn test_consumed_bullets_not_drawn() {
        let mut state = state();
        let mut bullet = Bullet::new(
            Vec2::new(300.0, 300.0),
            0.0,
            1.0,
            Owner::Enemy,
            1,
            7.0,
            BulletStyle::Enemy,
            300,
        );
        bullet.consumed = true;
        state.bullets.push(bullet);

        let mut surface = Loaded(Vec::new());
        draw_entities(&state, &mut surface);
        assert!(surface.0.iter().all(|c| !matches!(c, DrawCmd::Circle { .. })));
    }

    #[test]
    fn test_dead_player_not_drawn() {
        let mut state = state();
        state.player.as_mut().unwrap().health = 0;
        let mut surface = Loaded(Vec::new());
        draw_entities(&state, &mut surface);
        assert!(
            surface
                .0
                .iter()
                .all(|c| !matches!(c, DrawCmd::Sprite { key: SpriteKey::Player, .. }))
        );
    }
}
