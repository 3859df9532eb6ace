//! Round engine
//!
//! Clock, stage resolution, reward release, countdown and obstacles. Same
//! seed and same inputs always give the same run: time only moves through
//! `tick`, randomness only comes from the state's seeded RNG, and entity
//! vectors stay sorted by id.

pub mod accuracy;
pub mod clock;
pub mod contact;
pub mod countdown;
pub mod obstacle;
pub mod scheduler;
pub mod spawner;
pub mod state;
pub mod tick;

pub use accuracy::{AccuracyMatch, DigitMatch, MAX_STAGE, resolve, resolve_times};
pub use clock::{Clock, Millis};
pub use contact::{Contact, detect_contacts};
pub use countdown::{Countdown, CountdownStep};
pub use obstacle::{GrowthOutcome, Obstacle, resolve_obstacle_collision};
pub use scheduler::{Scheduler, TimerHandle};
pub use spawner::{RewardKind, RewardSpawn, RewardSpawnPlan, RewardSpawner};
pub use state::{
    EntityId, GameEvent, GamePhase, GameState, Player, Reward, Round, RoundOverReason,
    TimerAction,
};
pub use tick::{TickInput, tick};
