//! Game simulation
//!
//! All gameplay logic lives here:
//! - Seeded RNG only
//! - Deferred work goes through the `Scheduler`, never ambient timers
//! - No platform dependencies; drawing goes through the `Surface` trait

pub mod autopilot;
pub mod clock;
pub mod collision;
pub mod entity;
pub mod scheduler;
pub mod session;
pub mod spawner;
pub mod state;
pub mod tick;

pub use clock::FrameClock;
pub use collision::{ResolveReport, resolve};
pub use entity::{Bullet, DamageOutcome, DropPolicy, Enemy, EnemyKind, Explosion, Owner, Pickup, PickupKind, Player};
pub use scheduler::{Scheduler, TaskId};
pub use session::{GamePhase, GameStats, Session};
pub use state::{GameEvent, GameState, Task};
pub use tick::{FrameInput, MoveKeys, frame, run_due_tasks};
