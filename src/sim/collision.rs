//! Collision detection and outcome resolution
//!
//! Runs once per playing frame, after movement and before enemy AI. Each
//! bullet resolves against at most one target (first match wins) and is
//! flagged consumed; consumed bullets and dead enemies are compacted once the
//! pass is over.

use super::entity::{DamageOutcome, EnemyKind, Explosion, Owner, Pickup, PickupKind};
use super::spawner;
use super::state::{GameState, Task};
use crate::audio::Cue;
use crate::within;

/// What one resolution pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveReport {
    pub player_hits: u32,
    pub enemy_hits: u32,
    pub kills: u32,
    pub pickups_taken: u32,
}

/// Resolve every bullet and pickup against the world
pub fn resolve(state: &mut GameState) -> ResolveReport {
    let mut report = ResolveReport::default();

    for i in 0..state.bullets.len() {
        let bullet = state.bullets[i];
        if bullet.consumed {
            continue;
        }
        match bullet.owner {
            Owner::Enemy => {
                let Some(player) = state.player.as_ref() else {
                    continue;
                };
                if !within(bullet.pos, player.pos, state.tuning.player_hit_radius) {
                    continue;
                }
                state.bullets[i].consumed = true;
                player_hit(state, bullet.damage);
                report.player_hits += 1;
            }
            Owner::Player => {
                let target = state
                    .enemies
                    .iter()
                    .position(|e| e.alive && within(bullet.pos, e.pos, e.hit_radius()));
                let Some(idx) = target else {
                    continue;
                };
                state.bullets[i].consumed = true;
                report.enemy_hits += 1;
                if enemy_hit(state, idx, bullet.damage) {
                    report.kills += 1;
                }
            }
        }
    }

    state.bullets.retain(|b| !b.consumed);
    state.enemies.retain(|e| e.alive);

    report.pickups_taken = collect_pickups(state);
    report
}

/// An enemy bullet reached the player
fn player_hit(state: &mut GameState, damage: i32) {
    let Some(player) = state.player.as_mut() else {
        return;
    };
    // Already destroyed: absorb the bullet and nothing else
    if !player.is_alive() {
        return;
    }
    let lethal = player.take_damage(damage);
    let pos = player.pos;
    state.session.stats.add_damage_taken(damage);

    if !lethal {
        state.cue(Cue::Hurt);
        return;
    }
    if !state.session.mark_dead() {
        return;
    }

    log::info!("Player destroyed with score {}", state.session.stats.score());
    state.submit_final_score();
    state.explosions.push(Explosion::new(
        pos,
        Explosion::PLAYER_SIZE,
        state.tuning.explosion_start_frame,
    ));
    state.cue(Cue::Death);
    let delay = state.tuning.game_over_delay_ms;
    state.schedule_round(delay, Task::GameOver);
}

/// A player bullet reached `enemies[idx]`. Returns true on a kill.
fn enemy_hit(state: &mut GameState, idx: usize, damage: i32) -> bool {
    state.session.stats.add_damage_given(damage);
    let policy = state.drop_policy;
    let outcome = state.enemies[idx].take_damage(damage, &policy, &mut state.rng);
    match outcome {
        DamageOutcome::Damaged => {
            state.cue(Cue::Hit);
            false
        }
        DamageOutcome::DropHeart => {
            kill_enemy(state, idx, PickupKind::Heart);
            true
        }
        DamageOutcome::DropBuff => {
            kill_enemy(state, idx, PickupKind::Buff);
            true
        }
    }
}

/// Score the kill, drop its pickup, refill and notify
fn kill_enemy(state: &mut GameState, idx: usize, drop: PickupKind) {
    let (pos, kind) = {
        let enemy = &state.enemies[idx];
        (enemy.pos, enemy.kind)
    };

    state.explosions.push(Explosion::new(
        pos,
        Explosion::ENEMY_SIZE,
        state.tuning.explosion_start_frame,
    ));

    let points = match kind {
        EnemyKind::Default => state.tuning.default_kill_score,
        EnemyKind::Fire => state.tuning.fire_kill_score,
    };
    let kills = state.session.stats.record_kill(kind, points);
    state.cue(Cue::Kill);

    let mut pickup = Pickup::new(drop, pos, state.now_ms, &state.tuning);
    pickup.id = state.next_entity_id();
    state.pickups.push(pickup);

    spawner::request_spawns(state, kills);

    state.schedule_detached(0.0, Task::SubmitScore);
    if kind == EnemyKind::Fire && state.auth.authenticated {
        state.schedule_detached(0.0, Task::Mint);
    }
}

/// Hearts heal only when hurt; buffs are always taken
fn collect_pickups(state: &mut GameState) -> u32 {
    let Some(player) = state.player.as_ref() else {
        return 0;
    };
    if !player.is_alive() {
        return 0;
    }
    let (center, radius) = (player.pos, player.grab_radius());

    let mut taken = 0;
    for i in 0..state.pickups.len() {
        let pickup = state.pickups[i];
        if pickup.consumed || !within(pickup.pos, center, radius) {
            continue;
        }
        match pickup.kind {
            PickupKind::Heart => {
                let healed = state.player.as_mut().is_some_and(|p| p.heal());
                if !healed {
                    continue;
                }
                state.session.stats.add_heal();
                state.cue(Cue::Heal);
            }
            PickupKind::Buff => {
                state.session.stats.add_buff();
                state.activate_buff();
                state.cue(Cue::PowerUp);
            }
        }
        state.pickups[i].consumed = true;
        taken += 1;
    }
    state.pickups.retain(|p| !p.consumed);
    taken
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::sim::entity::{Bullet, BulletStyle, DropPolicy};
    use crate::sim::session::GamePhase;
    use crate::sim::state::GameEvent;

    fn playing_state() -> GameState {
        let mut state = GameState::new(5);
        state.start_countdown();
        state.session.phase = GamePhase::Playing;
        state.enemies.clear();
        state.drain_events();
        state
    }

    fn player_pos(state: &GameState) -> Vec2 {
        state.player.as_ref().unwrap().pos
    }

    fn enemy_bullet(pos: Vec2, damage: i32) -> Bullet {
        Bullet::new(pos, 0.0, 0.0, Owner::Enemy, damage, 7.0, BulletStyle::Enemy, 300)
    }

    fn player_bullet(pos: Vec2, damage: i32) -> Bullet {
        Bullet::new(pos, 0.0, 0.0, Owner::Player, damage, 7.0, BulletStyle::Player, 300)
    }

    fn add_enemy(state: &mut GameState, kind: EnemyKind, pos: Vec2) -> u32 {
        spawner::spawn_enemy(state, kind, pos, 0, 0)
    }

    #[test]
    fn test_lethal_player_hit_scenario() {
        let mut state = playing_state();
        state.player.as_mut().unwrap().health = 1;
        let pos = player_pos(&state);
        state.bullets.push(enemy_bullet(pos, 2));

        let report = resolve(&mut state);
        assert_eq!(report.player_hits, 1);
        assert!(state.session.is_dead());
        assert_eq!(state.player.as_ref().unwrap().health, 0);
        assert_eq!(state.explosions.len(), 1);
        assert_eq!(state.explosions[0].pos, pos);
        assert_eq!(state.explosions[0].width, 400.0);
        assert_eq!(state.scheduler.count(|t| *t == Task::GameOver), 1);

        // Second lethal bullet the same round changes nothing
        state.bullets.push(enemy_bullet(pos, 2));
        resolve(&mut state);
        assert_eq!(state.explosions.len(), 1);
        assert_eq!(state.scheduler.count(|t| *t == Task::GameOver), 1);
        assert!(state.bullets.is_empty());

        let finals = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::SubmitScore { is_death: true, .. }))
            .count();
        assert_eq!(finals, 1);
    }

    #[test]
    fn test_non_lethal_player_hit_plays_hurt() {
        let mut state = playing_state();
        let pos = player_pos(&state);
        state.bullets.push(enemy_bullet(pos + Vec2::new(20.0, 0.0), 1));
        resolve(&mut state);

        assert_eq!(state.player.as_ref().unwrap().health, 4);
        assert_eq!(state.session.stats.damage_taken(), 1);
        assert!(state.drain_events().contains(&GameEvent::Sound(Cue::Hurt)));
    }

    #[test]
    fn test_bullet_outside_radius_misses() {
        let mut state = playing_state();
        let pos = player_pos(&state);
        state.bullets.push(enemy_bullet(pos + Vec2::new(35.0, 0.0), 1));
        resolve(&mut state);
        assert_eq!(state.bullets.len(), 1);
        assert_eq!(state.player.as_ref().unwrap().health, 5);
    }

    #[test]
    fn test_bullet_hits_only_first_enemy() {
        let mut state = playing_state();
        let spot = Vec2::new(200.0, 200.0);
        add_enemy(&mut state, EnemyKind::Default, spot);
        add_enemy(&mut state, EnemyKind::Default, spot);
        state.bullets.push(player_bullet(spot, 1));

        let report = resolve(&mut state);
        assert_eq!(report.enemy_hits, 1);
        assert_eq!(state.enemies[0].health, 1);
        assert_eq!(state.enemies[1].health, 2);
        assert!(state.bullets.is_empty());
        assert_eq!(state.session.stats.damage_given(), 1);
    }

    #[test]
    fn test_kill_scores_drops_and_refills() {
        let mut state = playing_state();
        state.drop_policy = DropPolicy {
            fire_buff_chance: 0.0,
            base_buff_chance: 0.0,
            ..DropPolicy::STANDARD
        };
        let spot = Vec2::new(200.0, 200.0);
        add_enemy(&mut state, EnemyKind::Default, spot);
        state.bullets.push(player_bullet(spot, 2));

        let report = resolve(&mut state);
        assert_eq!(report.kills, 1);
        assert!(state.enemies.is_empty());
        assert_eq!(state.session.stats.kills(), 1);
        assert_eq!(state.session.stats.score(), 1);
        assert_eq!(state.pickups.len(), 1);
        assert_eq!(state.pickups[0].kind, PickupKind::Heart);
        assert_eq!(state.explosions.len(), 1);
        assert_eq!(state.pending_spawns(), 5);
        assert_eq!(state.scheduler.count(|t| *t == Task::SubmitScore), 1);
        assert_eq!(state.scheduler.count(|t| *t == Task::Mint), 0);
    }

    #[test]
    fn test_fire_kill_while_authenticated_queues_one_mint() {
        let mut state = playing_state();
        state.auth.authenticated = true;
        let spot = Vec2::new(300.0, 300.0);
        add_enemy(&mut state, EnemyKind::Fire, spot);
        state.enemies[0].health = 1;
        state.bullets.push(player_bullet(spot, 1));

        resolve(&mut state);
        assert_eq!(state.session.stats.score(), 3);
        assert_eq!(state.session.stats.boss_kills(), 1);
        assert_eq!(state.scheduler.count(|t| *t == Task::Mint), 1);
    }

    #[test]
    fn test_fire_kill_as_guest_does_not_mint() {
        let mut state = playing_state();
        let spot = Vec2::new(300.0, 300.0);
        add_enemy(&mut state, EnemyKind::Fire, spot);
        state.enemies[0].health = 1;
        state.bullets.push(player_bullet(spot, 1));

        resolve(&mut state);
        assert_eq!(state.scheduler.count(|t| *t == Task::Mint), 0);
    }

    #[test]
    fn test_heart_waits_while_health_full() {
        let mut state = playing_state();
        let pos = player_pos(&state);
        let heart = Pickup::new(PickupKind::Heart, pos, 0.0, &state.tuning);
        state.pickups.push(heart);

        assert_eq!(resolve(&mut state).pickups_taken, 0);
        assert_eq!(state.pickups.len(), 1);

        state.player.as_mut().unwrap().health = 3;
        assert_eq!(resolve(&mut state).pickups_taken, 1);
        assert!(state.pickups.is_empty());
        assert_eq!(state.player.as_ref().unwrap().health, 4);
        assert_eq!(state.session.stats.heals_used(), 1);
    }

    #[test]
    fn test_buff_pickup_starts_window() {
        let mut state = playing_state();
        let pos = player_pos(&state);
        state
            .pickups
            .push(Pickup::new(PickupKind::Buff, pos, 0.0, &state.tuning));

        resolve(&mut state);
        assert!(state.player.as_ref().unwrap().buffed);
        assert_eq!(state.session.buff_remaining(), 10);
        assert_eq!(state.session.stats.buffs_taken(), 1);
        assert_eq!(state.scheduler.count(|t| *t == Task::BuffTick), 1);
    }
}
