//! Tank Siege - A top-down tank arena shooter
//!
//! Core modules:
//! - `sim`: Simulation (entities, spawning, collisions, session state)
//! - `render`: Draw pass producing canvas commands
//! - `services`: Narrow interfaces to the score/mint/leaderboard backend
//! - `tuning`: Data-driven game balance

pub mod assets;
pub mod audio;
pub mod error;
pub mod leaderboard;
pub mod render;
pub mod services;
pub mod settings;
pub mod sim;
pub mod transactions;
pub mod tuning;

pub use error::Error;
pub use leaderboard::Leaderboard;
pub use settings::Settings;
pub use transactions::TransactionLog;
pub use tuning::Tuning;

use glam::Vec2;

/// Frame pacing constants
pub mod consts {
    /// Reference frame interval the tuning values were balanced at (60 Hz)
    pub const REFERENCE_FRAME_MS: f64 = 1000.0 / 60.0;
    /// Frame multiplier bounds (prevents teleporting after a stalled tab)
    pub const MIN_FRAME_MULTIPLIER: f32 = 0.25;
    pub const MAX_FRAME_MULTIPLIER: f32 = 4.0;
    /// Countdown and buff timers tick at 1 Hz
    pub const TIMER_TICK_MS: f64 = 1000.0;
}

/// Unit vector pointing along `angle` (radians, canvas coordinates)
#[inline]
pub fn direction(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Angle of the vector from `from` to `to`
#[inline]
pub fn angle_between(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Euclidean proximity test used by every collision check
#[inline]
pub fn within(a: Vec2, b: Vec2, radius: f32) -> bool {
    a.distance(b) < radius
}
