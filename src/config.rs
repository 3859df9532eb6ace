//! Game configuration
//!
//! One core, several variants. A `GameConfig` carries every knob the round
//! engine reads; `Variant` presets reproduce the shipped game modes.

use std::path::Path;
use std::time::Duration;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::sim::accuracy::MAX_STAGE;
use crate::sim::clock::Millis;
use crate::sim::spawner::{LaunchProfile, OddsTable, RewardSpawnPlan, ScoreTable, uniform};

/// Built-in game modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Variant {
    /// Single round: ten candies fall at once, countdown grows with the stage
    Classic,
    /// Endless stages: candy bursts from the button, monsters join each stage
    #[default]
    Survival,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Classic => "classic",
            Variant::Survival => "survival",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" | "single" => Some(Variant::Classic),
            "survival" | "multi" => Some(Variant::Survival),
            _ => None,
        }
    }

    /// Full configuration for this mode
    pub fn config(&self) -> GameConfig {
        match self {
            Variant::Classic => GameConfig {
                reward_count: 10,
                spawn_interval: Millis::ZERO,
                launch: LaunchProfile::drop_default(),
                reward_gravity: 500.0,
                countdown: CountdownMode::PerStage([
                    Millis::from_secs(10),
                    Millis::from_secs(11),
                    Millis::from_secs(12),
                    Millis::from_secs(13),
                    Millis::from_secs(20),
                ]),
                button: ButtonPlacement::Random {
                    x_range: (SPAWN_MARGIN, GAME_WIDTH - SPAWN_MARGIN),
                    y_range: (GAME_HEIGHT - 200.0, GAME_HEIGHT - 150.0),
                },
                has_obstacles: false,
                obstacle_growth: false,
                multi_round: false,
                ..GameConfig::base()
            },
            Variant::Survival => GameConfig::base(),
        }
    }
}

/// How long the post-stop countdown lasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownMode {
    /// Same duration whatever the stage
    Fixed(Millis),
    /// Better stages earn more time
    PerStage([Millis; MAX_STAGE as usize + 1]),
}

impl CountdownMode {
    pub fn initial(&self, stage: u8) -> Millis {
        match self {
            CountdownMode::Fixed(ms) => *ms,
            CountdownMode::PerStage(table) => table[stage.min(MAX_STAGE) as usize],
        }
    }
}

/// Where the stop button sits each round
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ButtonPlacement {
    Fixed { x: f32, y: f32 },
    Random {
        x_range: (f32, f32),
        y_range: (f32, f32),
    },
}

impl ButtonPlacement {
    pub fn place<R: Rng>(&self, rng: &mut R) -> Vec2 {
        match *self {
            ButtonPlacement::Fixed { x, y } => Vec2::new(x, y),
            ButtonPlacement::Random { x_range, y_range } => {
                Vec2::new(uniform(rng, x_range), uniform(rng, y_range))
            }
        }
    }
}

/// Everything the round engine is parameterized by
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // === Clock ===
    /// Target time is drawn uniformly from `[lo, hi)`
    pub target_range: (Millis, Millis),
    /// Running clock ends the round when it reaches this
    pub clock_limit: Millis,
    pub button: ButtonPlacement,

    // === Rewards ===
    /// Rewards released per resolved stage
    pub reward_count: u32,
    /// Delay between spawns (zero releases them all at once)
    pub spawn_interval: Millis,
    pub launch: LaunchProfile,
    /// Extra downward acceleration on rewards (on top of world gravity)
    pub reward_gravity: f32,
    pub odds: OddsTable,
    pub scores: ScoreTable,

    // === Countdown ===
    pub countdown: CountdownMode,
    pub countdown_step: Millis,
    pub countdown_interval: Millis,

    // === Obstacles ===
    pub has_obstacles: bool,
    pub obstacle_growth: bool,
    pub obstacle_growth_step: f32,
    /// Extra downward acceleration on obstacles (on top of world gravity)
    pub obstacle_gravity: f32,

    // === Flow ===
    /// Countdown expiry advances to the next stage instead of ending the run
    pub multi_round: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Variant::default().config()
    }
}

impl GameConfig {
    /// Survival settings; the other variants override from here
    fn base() -> Self {
        Self {
            target_range: (Millis::from_secs(3), Millis::from_secs(9)),
            clock_limit: Millis::from_secs(10),
            button: ButtonPlacement::Fixed {
                x: GAME_WIDTH / 2.0,
                y: BUTTON_Y,
            },

            reward_count: 20,
            spawn_interval: Millis(100),
            launch: LaunchProfile::burst_default(),
            reward_gravity: 300.0,
            odds: OddsTable::default(),
            scores: ScoreTable::default(),

            countdown: CountdownMode::Fixed(Millis::from_secs(10)),
            countdown_step: Millis(10),
            countdown_interval: Millis(10),

            has_obstacles: true,
            obstacle_growth: true,
            obstacle_growth_step: OBSTACLE_GROWTH,
            obstacle_gravity: 300.0,

            multi_round: true,
        }
    }

    /// Spawn plan for a resolved stage
    pub fn spawn_plan(&self, stage: u8) -> RewardSpawnPlan {
        RewardSpawnPlan {
            stage,
            total_count: self.reward_count,
            odds: self.odds.for_stage(stage),
            inter_spawn_delay: self.spawn_interval.as_duration(),
        }
    }

    /// Simulation time from the stop until the countdown for `stage` expires
    pub fn countdown_duration(&self, stage: u8) -> Duration {
        let ticks = self
            .countdown
            .initial(stage)
            .0
            .div_ceil(self.countdown_step.0.max(1));
        self.countdown_interval.as_duration() * ticks
    }

    /// Reject configurations the engine cannot run faithfully
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.odds.validate()?;
        self.launch.validate()?;

        if self.reward_count == 0 {
            return Err(ConfigError::NoRewards);
        }
        if self.countdown_step.is_zero() {
            return Err(ConfigError::ZeroDuration("countdown_step"));
        }
        if self.countdown_interval.is_zero() {
            return Err(ConfigError::ZeroDuration("countdown_interval"));
        }

        // Times must render as D.DDD for the digit comparison
        let (lo, hi) = self.target_range;
        if lo >= hi || hi > Millis::from_secs(10) {
            return Err(ConfigError::TargetRange { lo, hi });
        }
        if self.clock_limit <= lo || self.clock_limit > Millis::from_secs(10) {
            return Err(ConfigError::ClockLimit(self.clock_limit));
        }

        // Every spawn must land before the countdown expires
        for stage in 0..=MAX_STAGE {
            let countdown = self.countdown_duration(stage);
            let spawning = self.spawn_plan(stage).total_duration();
            if countdown < spawning {
                return Err(ConfigError::CountdownTooShort {
                    stage,
                    countdown: Millis::from_duration(countdown),
                    spawning: Millis::from_duration(spawning),
                });
            }
        }

        if self.obstacle_growth_step.is_nan() || self.obstacle_growth_step < 0.0 {
            return Err(ConfigError::NegativeGrowth(self.obstacle_growth_step));
        }
        if let ButtonPlacement::Random { x_range, y_range } = self.button {
            for (name, (lo, hi)) in [("button.x_range", x_range), ("button.y_range", y_range)] {
                if lo.is_nan() || hi.is_nan() || lo > hi {
                    return Err(ConfigError::InvertedRange { name, lo, hi });
                }
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration (missing keys take defaults)
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a JSON configuration from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Resolve a preset name or a JSON file path
    pub fn from_arg(arg: &str) -> Result<Self, ConfigError> {
        if let Some(variant) = Variant::from_str(arg) {
            return Ok(variant.config());
        }
        if arg.ends_with(".json") {
            return Self::load(arg);
        }
        Err(ConfigError::UnknownVariant(arg.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::spawner::KindOdds;

    #[test]
    fn test_presets_validate() {
        for variant in [Variant::Classic, Variant::Survival] {
            assert!(variant.config().validate().is_ok(), "{}", variant.as_str());
        }
    }

    #[test]
    fn test_variant_names_round_trip() {
        for variant in [Variant::Classic, Variant::Survival] {
            assert_eq!(Variant::from_str(variant.as_str()), Some(variant));
        }
        assert_eq!(Variant::from_str("MULTI"), Some(Variant::Survival));
        assert_eq!(Variant::from_str("arcade"), None);
    }

    #[test]
    fn test_countdown_modes() {
        let classic = Variant::Classic.config();
        assert_eq!(classic.countdown.initial(0), Millis::from_secs(10));
        assert_eq!(classic.countdown.initial(4), Millis::from_secs(20));
        let survival = Variant::Survival.config();
        assert_eq!(survival.countdown.initial(3), Millis::from_secs(10));
    }

    #[test]
    fn test_spawn_plan_reflects_variant() {
        let plan = Variant::Classic.config().spawn_plan(2);
        assert_eq!(plan.total_count, 10);
        assert!(plan.inter_spawn_delay.is_zero());
        assert_eq!(plan.odds, KindOdds::new(0.2, 0.5, 0.3));

        let plan = Variant::Survival.config().spawn_plan(4);
        assert_eq!(plan.total_count, 20);
        assert_eq!(plan.inter_spawn_delay.as_millis(), 100);
    }

    #[test]
    fn test_countdown_must_outlast_spawning() {
        // 20 rewards every 100 ms need 2 s
        let mut config = Variant::Survival.config();
        config.countdown = CountdownMode::Fixed(Millis(500));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CountdownTooShort {
                stage: 0,
                countdown: Millis(500),
                spawning: Millis(2000),
            })
        ));

        config.countdown = CountdownMode::Fixed(Millis(2000));
        assert!(config.validate().is_ok());
        assert_eq!(config.countdown_duration(3), Duration::from_secs(2));

        // Coarser ticks still count whole steps
        config.countdown_step = Millis(300);
        config.countdown_interval = Millis(100);
        assert_eq!(config.countdown_duration(0), Duration::from_millis(700));
        assert!(matches!(config.validate(), Err(ConfigError::CountdownTooShort { .. })));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = GameConfig::from_json(r#"{ "reward_count": 5, "multi_round": false }"#)
            .expect("partial config should load");
        assert_eq!(config.reward_count, 5);
        assert!(!config.multi_round);
        assert_eq!(config.spawn_interval, Millis(100));
    }

    #[test]
    fn test_json_round_trip() {
        let config = Variant::Classic.config();
        let json = config.to_json().expect("serializes");
        assert_eq!(GameConfig::from_json(&json).expect("parses"), config);
    }

    #[test]
    fn test_bad_configs_rejected() {
        let mut config = GameConfig::default();
        config.odds.0[1] = KindOdds::new(0.5, 0.4, 0.2);
        assert!(matches!(config.validate(), Err(ConfigError::ProbabilitySum { stage: 1, .. })));

        let mut config = GameConfig::default();
        config.target_range = (Millis(3000), Millis(12_000));
        assert!(matches!(config.validate(), Err(ConfigError::TargetRange { .. })));

        let mut config = GameConfig::default();
        config.clock_limit = Millis(15_000);
        assert!(matches!(config.validate(), Err(ConfigError::ClockLimit(_))));

        let mut config = GameConfig::default();
        config.clock_limit = Millis(3000);
        assert!(matches!(config.validate(), Err(ConfigError::ClockLimit(_))));

        let mut config = GameConfig::default();
        config.reward_count = 0;
        assert!(matches!(config.validate(), Err(ConfigError::NoRewards)));

        let mut config = GameConfig::default();
        config.countdown_interval = Millis::ZERO;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroDuration("countdown_interval"))));

        assert!(matches!(GameConfig::from_json("{ not json"), Err(ConfigError::Json(_))));
        assert!(matches!(GameConfig::from_arg("arcade"), Err(ConfigError::UnknownVariant(_))));
    }
}
