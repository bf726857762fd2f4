//! Session phase and per-round statistics

use serde::{Deserialize, Serialize};

use super::entity::EnemyKind;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting on the start screen
    #[default]
    Menu,
    /// Pre-round countdown; gameplay input is blocked
    Countdown,
    /// Active gameplay
    Playing,
    /// Round ended (death or stop)
    GameOver,
}

/// Round statistics. Only changed through the named increments below.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    score: u64,
    kills: u32,
    boss_kills: u32,
    damage_taken: u32,
    damage_given: u32,
    heals_used: u32,
    buffs_taken: u32,
}

impl GameStats {
    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn kills(&self) -> u32 {
        self.kills
    }

    pub fn boss_kills(&self) -> u32 {
        self.boss_kills
    }

    pub fn damage_taken(&self) -> u32 {
        self.damage_taken
    }

    pub fn damage_given(&self) -> u32 {
        self.damage_given
    }

    pub fn heals_used(&self) -> u32 {
        self.heals_used
    }

    pub fn buffs_taken(&self) -> u32 {
        self.buffs_taken
    }

    /// Count a kill worth `points`; returns the new kill count
    pub fn record_kill(&mut self, kind: EnemyKind, points: u64) -> u32 {
        self.kills += 1;
        if kind == EnemyKind::Fire {
            self.boss_kills += 1;
        }
        self.score += points;
        self.kills
    }

    pub fn add_damage_given(&mut self, amount: i32) {
        self.damage_given += amount.max(0) as u32;
    }

    pub fn add_damage_taken(&mut self, amount: i32) {
        self.damage_taken += amount.max(0) as u32;
    }

    pub fn add_heal(&mut self) {
        self.heals_used += 1;
    }

    pub fn add_buff(&mut self) {
        self.buffs_taken += 1;
    }
}

/// Authoritative phase plus round bookkeeping
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub phase: GamePhase,
    pub stats: GameStats,
    /// Round generation; bumped on every round start and teardown
    round: u32,
    dead: bool,
    final_submitted: bool,
    /// Seconds left on the countdown display
    countdown: u32,
    /// Seconds left in the buff window (0 = inactive)
    buff_remaining: u32,
}

impl Session {
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    pub fn buff_remaining(&self) -> u32 {
        self.buff_remaining
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    /// Reset stats and flags and enter the countdown. Returns the new round.
    pub fn begin_round(&mut self, countdown_secs: u32) -> u32 {
        self.round = self.round.wrapping_add(1);
        self.stats = GameStats::default();
        self.dead = false;
        self.final_submitted = false;
        self.buff_remaining = 0;
        self.countdown = countdown_secs;
        self.phase = GamePhase::Countdown;
        self.round
    }

    /// Invalidate the current round's deferred work. Stats are kept.
    pub fn end_round(&mut self) {
        self.round = self.round.wrapping_add(1);
        self.buff_remaining = 0;
        self.countdown = 0;
    }

    /// Flag the death. Returns false if it was already flagged this round.
    pub fn mark_dead(&mut self) -> bool {
        if self.dead {
            return false;
        }
        self.dead = true;
        true
    }

    /// Claim the single final-score submission for this round
    pub fn claim_final_submission(&mut self) -> bool {
        if self.final_submitted {
            return false;
        }
        self.final_submitted = true;
        true
    }

    /// One countdown step. Returns the value to show, switching to
    /// `Playing` once it reaches zero. None when not counting down.
    pub fn tick_countdown(&mut self) -> Option<u32> {
        if self.phase != GamePhase::Countdown {
            return None;
        }
        self.countdown = self.countdown.saturating_sub(1);
        if self.countdown == 0 {
            self.phase = GamePhase::Playing;
        }
        Some(self.countdown)
    }

    /// Start or restart the buff window at full length
    pub fn start_buff(&mut self, duration_secs: u32) {
        self.buff_remaining = duration_secs;
    }

    /// One buff step. Returns the seconds left.
    pub fn tick_buff(&mut self) -> u32 {
        self.buff_remaining = self.buff_remaining.saturating_sub(1);
        self.buff_remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_runs_down_to_playing() {
        let mut s = Session::default();
        s.begin_round(3);
        assert_eq!(s.phase, GamePhase::Countdown);
        assert_eq!(s.countdown(), 3);

        assert_eq!(s.tick_countdown(), Some(2));
        assert_eq!(s.tick_countdown(), Some(1));
        assert_eq!(s.phase, GamePhase::Countdown);
        assert_eq!(s.tick_countdown(), Some(0));
        assert_eq!(s.phase, GamePhase::Playing);
        assert_eq!(s.tick_countdown(), None);
    }

    #[test]
    fn test_death_flag_is_idempotent() {
        let mut s = Session::default();
        s.begin_round(3);
        assert!(s.mark_dead());
        assert!(!s.mark_dead());

        s.begin_round(3);
        assert!(!s.is_dead());
        assert!(s.mark_dead());
    }

    #[test]
    fn test_final_submission_claimed_once_per_round() {
        let mut s = Session::default();
        s.begin_round(3);
        assert!(s.claim_final_submission());
        assert!(!s.claim_final_submission());
        s.begin_round(3);
        assert!(s.claim_final_submission());
    }

    #[test]
    fn test_round_generation_changes_on_start_and_end() {
        let mut s = Session::default();
        let a = s.begin_round(3);
        s.end_round();
        assert_ne!(s.round(), a);
        let b = s.begin_round(3);
        assert_ne!(a, b);
    }

    #[test]
    fn test_stats_reset_on_round_start_but_kept_on_end() {
        let mut s = Session::default();
        s.begin_round(3);
        s.stats.record_kill(EnemyKind::Fire, 3);
        s.stats.add_damage_taken(2);
        s.end_round();
        assert_eq!(s.stats.score(), 3);
        assert_eq!(s.stats.boss_kills(), 1);

        s.begin_round(3);
        assert_eq!(s.stats, GameStats::default());
    }

    #[test]
    fn test_buff_restart_does_not_stack() {
        let mut s = Session::default();
        s.start_buff(10);
        s.tick_buff();
        s.tick_buff();
        assert_eq!(s.buff_remaining(), 8);
        s.start_buff(10);
        assert_eq!(s.buff_remaining(), 10);
    }

    #[test]
    fn test_negative_damage_is_ignored() {
        let mut stats = GameStats::default();
        stats.add_damage_given(-4);
        stats.add_damage_given(2);
        assert_eq!(stats.damage_given(), 2);
    }
}
