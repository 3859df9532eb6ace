//! Reward (candy) spawning
//!
//! Once a stage is resolved, a fixed number of rewards is released on a fixed
//! cadence. Each reward's kind is drawn independently from the stage's row of
//! the odds table; its launch comes from the configured profile.

use std::time::Duration;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::accuracy::MAX_STAGE;
use super::scheduler::{Scheduler, TimerHandle};
use crate::error::ConfigError;
use crate::velocity_from_angle;

/// Allowed drift when checking that a row of odds sums to one
pub const ODDS_EPSILON: f64 = 1e-6;

/// Reward quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RewardKind {
    Fail,
    Normal,
    Rare,
}

impl RewardKind {
    /// Texture key used by the presentation layer
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardKind::Fail => "candy_fail",
            RewardKind::Normal => "candy_normal",
            RewardKind::Rare => "candy_rare",
        }
    }
}

/// Points awarded per collected reward kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTable {
    pub fail: u64,
    pub normal: u64,
    pub rare: u64,
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self {
            fail: 1,
            normal: 10,
            rare: 30,
        }
    }
}

impl ScoreTable {
    pub fn score(&self, kind: RewardKind) -> u64 {
        match kind {
            RewardKind::Fail => self.fail,
            RewardKind::Normal => self.normal,
            RewardKind::Rare => self.rare,
        }
    }
}

/// Probability of each kind for one stage
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KindOdds {
    pub fail: f64,
    pub normal: f64,
    pub rare: f64,
}

impl KindOdds {
    pub const fn new(fail: f64, normal: f64, rare: f64) -> Self {
        Self { fail, normal, rare }
    }

    pub fn sum(&self) -> f64 {
        self.fail + self.normal + self.rare
    }

    /// Map a uniform sample `r ∈ [0, 1)` onto a kind
    pub fn pick(&self, r: f64) -> RewardKind {
        if r < self.fail {
            RewardKind::Fail
        } else if r < self.fail + self.normal {
            RewardKind::Normal
        } else {
            RewardKind::Rare
        }
    }

    pub fn validate(&self, stage: u8) -> Result<(), ConfigError> {
        for p in [self.fail, self.normal, self.rare] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::ProbabilityOutOfRange { stage, value: p });
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > ODDS_EPSILON {
            return Err(ConfigError::ProbabilitySum { stage, sum });
        }
        Ok(())
    }
}

/// Stage-indexed odds; mass moves from `fail` to `rare` as the stage rises
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OddsTable(pub [KindOdds; MAX_STAGE as usize + 1]);

impl Default for OddsTable {
    fn default() -> Self {
        Self([
            KindOdds::new(1.0, 0.0, 0.0),
            KindOdds::new(0.5, 0.4, 0.1),
            KindOdds::new(0.2, 0.5, 0.3),
            KindOdds::new(0.0, 0.3, 0.7),
            KindOdds::new(0.0, 0.0, 1.0),
        ])
    }
}

impl OddsTable {
    pub fn for_stage(&self, stage: u8) -> KindOdds {
        self.0[stage.min(MAX_STAGE) as usize]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.0
            .iter()
            .enumerate()
            .try_for_each(|(stage, odds)| odds.validate(stage as u8))
    }
}

/// How a freshly spawned reward enters the world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LaunchProfile {
    /// Appear somewhere in the upper field and fall with horizontal jitter
    Drop {
        x_range: (f32, f32),
        y_range: (f32, f32),
        vx_range: (f32, f32),
        fall_speed: f32,
    },
    /// Burst upward out of the stop button
    Burst {
        jitter_x: f32,
        lift: f32,
        /// Launch angle range in degrees (screen space, negative is up)
        angle_deg: (f32, f32),
        speed: (f32, f32),
    },
}

impl LaunchProfile {
    pub fn drop_default() -> Self {
        use crate::consts::{GAME_WIDTH, SPAWN_MARGIN};
        LaunchProfile::Drop {
            x_range: (SPAWN_MARGIN, GAME_WIDTH - SPAWN_MARGIN),
            y_range: (0.0, 300.0),
            vx_range: (-200.0, 200.0),
            fall_speed: 20.0,
        }
    }

    pub fn burst_default() -> Self {
        LaunchProfile::Burst {
            jitter_x: 20.0,
            lift: 30.0,
            angle_deg: (-140.0, -40.0),
            speed: (600.0, 800.0),
        }
    }

    /// Sample a spawn position and velocity; `origin` is the stop button
    pub fn sample<R: Rng>(&self, rng: &mut R, origin: Vec2) -> (Vec2, Vec2) {
        match *self {
            LaunchProfile::Drop {
                x_range,
                y_range,
                vx_range,
                fall_speed,
            } => {
                let pos = Vec2::new(uniform(rng, x_range), uniform(rng, y_range));
                let vel = Vec2::new(uniform(rng, vx_range), fall_speed);
                (pos, vel)
            }
            LaunchProfile::Burst {
                jitter_x,
                lift,
                angle_deg,
                speed,
            } => {
                let pos = Vec2::new(
                    origin.x + uniform(rng, (-jitter_x, jitter_x)),
                    origin.y - lift,
                );
                let vel = velocity_from_angle(uniform(rng, angle_deg), uniform(rng, speed));
                (pos, vel)
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ranges: Vec<(&'static str, (f32, f32))> = match *self {
            LaunchProfile::Drop {
                x_range,
                y_range,
                vx_range,
                ..
            } => vec![("x_range", x_range), ("y_range", y_range), ("vx_range", vx_range)],
            LaunchProfile::Burst {
                angle_deg, speed, ..
            } => vec![("angle_deg", angle_deg), ("speed", speed)],
        };
        for (name, (lo, hi)) in ranges {
            if lo.is_nan() || hi.is_nan() || lo > hi {
                return Err(ConfigError::InvertedRange { name, lo, hi });
            }
        }
        Ok(())
    }
}

/// Uniform sample from an inclusive range (degenerate ranges return `lo`)
pub(crate) fn uniform<R: Rng>(rng: &mut R, (lo, hi): (f32, f32)) -> f32 {
    if hi > lo { rng.random_range(lo..=hi) } else { lo }
}

/// Everything needed to release one stage's rewards
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardSpawnPlan {
    pub stage: u8,
    pub total_count: u32,
    pub odds: KindOdds,
    /// Delay between consecutive spawns (zero = all at once)
    pub inter_spawn_delay: Duration,
}

impl RewardSpawnPlan {
    /// Time from the first scheduled spawn slot to the last
    pub fn total_duration(&self) -> Duration {
        self.inter_spawn_delay * self.total_count
    }
}

/// A reward ready to be placed in the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardSpawn {
    pub kind: RewardKind,
    pub pos: Vec2,
    pub vel: Vec2,
}

/// Releases the rewards of one plan, one scheduler firing at a time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RewardSpawner {
    plan: Option<RewardSpawnPlan>,
    emitted: u32,
    handle: Option<TimerHandle>,
}

impl RewardSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `plan.total_count` firings of `action`, one per delay
    pub fn start<A: Clone>(
        &mut self,
        plan: RewardSpawnPlan,
        scheduler: &mut Scheduler<A>,
        now: Duration,
        action: A,
    ) {
        self.cancel(scheduler);
        self.handle = Some(scheduler.schedule_repeating(
            now + plan.inter_spawn_delay,
            plan.inter_spawn_delay,
            Some(plan.total_count),
            action,
        ));
        self.plan = Some(plan);
        self.emitted = 0;
    }

    /// Produce the next reward of the plan, or `None` once all are out
    pub fn next_spawn<R: Rng>(
        &mut self,
        rng: &mut R,
        launch: &LaunchProfile,
        origin: Vec2,
    ) -> Option<RewardSpawn> {
        let plan = self.plan.as_ref()?;
        if self.emitted >= plan.total_count {
            return None;
        }
        let kind = plan.odds.pick(rng.random::<f64>());
        let (pos, vel) = launch.sample(rng, origin);
        self.emitted += 1;
        Some(RewardSpawn { kind, pos, vel })
    }

    pub fn cancel<A: Clone>(&mut self, scheduler: &mut Scheduler<A>) {
        if let Some(handle) = self.handle.take() {
            scheduler.cancel(handle);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_finished(&self) -> bool {
        self.plan
            .as_ref()
            .is_some_and(|p| self.emitted >= p.total_count)
    }
}
