//! Error types
//!
//! The simulation itself has no recoverable failures; everything that can go
//! wrong comes from loading or validating a configuration.

use std::io;

use crate::sim::Millis;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Stage {stage}: probability {value} is outside [0, 1]")]
    ProbabilityOutOfRange { stage: u8, value: f64 },

    #[error("Stage {stage}: probabilities sum to {sum}, expected 1.0")]
    ProbabilitySum { stage: u8, sum: f64 },

    #[error("Range {name} is inverted: [{lo}, {hi}]")]
    InvertedRange { name: &'static str, lo: f32, hi: f32 },

    #[error("Reward count must be at least 1")]
    NoRewards,

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("Target range [{lo}, {hi}) must be non-empty and end at or below 10.000")]
    TargetRange { lo: Millis, hi: Millis },

    #[error("Clock limit {0} must be within (0.000, 10.000] and above the earliest target")]
    ClockLimit(Millis),

    #[error("Stage {stage}: countdown of {countdown} ends before {spawning} of reward spawns")]
    CountdownTooShort {
        stage: u8,
        countdown: Millis,
        spawning: Millis,
    },

    #[error("Obstacle growth step {0} must not be negative")]
    NegativeGrowth(f32),

    #[error("Unknown variant: {0}")]
    UnknownVariant(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
