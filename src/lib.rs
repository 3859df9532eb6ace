//! Candy Clock - stop the clock on the target time, collect the candy
//!
//! Core modules:
//! - `sim`: Deterministic simulation (clock, stage resolution, rewards, obstacles)
//! - `config`: Data-driven game variants and validation
//! - `display`: Presentation sink the simulation reports into
//! - `error`: Error types

pub mod config;
pub mod display;
pub mod error;
pub mod sim;

pub use config::{GameConfig, Variant};
pub use display::{DisplaySink, UiState};
pub use error::ConfigError;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep used by the native runner (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// World dimensions (screen space, y grows downward)
    pub const GAME_WIDTH: f32 = 1280.0;
    pub const GAME_HEIGHT: f32 = 720.0;
    /// Top surface of the ground platform
    pub const GROUND_Y: f32 = GAME_HEIGHT - 56.0;
    /// Horizontal spawn margin from either wall
    pub const SPAWN_MARGIN: f32 = 50.0;

    /// World gravity (pixels/s²)
    pub const WORLD_GRAVITY: f32 = 300.0;

    /// Player defaults
    pub const PLAYER_SPEED: f32 = 300.0;
    pub const JUMP_SPEED: f32 = -330.0;
    /// Fast-drop speed when holding down
    pub const DROP_SPEED: f32 = -JUMP_SPEED * 2.5;
    pub const PLAYER_RADIUS: f32 = 21.0; // 284x300 frame at 0.15 scale
    pub const PLAYER_BOUNCE: f32 = 0.2;

    /// Stop button (static)
    pub const BUTTON_RADIUS: f32 = 24.0;
    pub const BUTTON_Y: f32 = GAME_HEIGHT - 250.0;

    /// Reward (candy) defaults
    pub const REWARD_RADIUS: f32 = 16.0;
    pub const REWARD_BOUNCE: f32 = 1.0;

    /// Obstacle (monster) defaults
    pub const OBSTACLE_TEXTURE_WIDTH: f32 = 420.0;
    pub const OBSTACLE_TEXTURE_HEIGHT: f32 = 400.0;
    pub const OBSTACLE_BASE_SIZE: f32 = 0.1;
    pub const OBSTACLE_GROWTH: f32 = 0.1;
    pub const OBSTACLE_BOUNCE: f32 = 0.9;
    /// Obstacles drop in from (and are recycled to) this height
    pub const OBSTACLE_SPAWN_Y: f32 = -100.0;
    /// Obstacles below this line are recycled to the top
    pub const OBSTACLE_RECYCLE_Y: f32 = GAME_HEIGHT - 50.0;
}

/// Clamp a point to the playfield, reflecting velocity off the walls and ground
///
/// Returns true if the body is resting on (or bounced off) the ground.
#[inline]
pub fn confine_to_world(pos: &mut Vec2, vel: &mut Vec2, radius: f32, bounce: f32) -> bool {
    use consts::*;

    if pos.x - radius < 0.0 {
        pos.x = radius;
        vel.x = vel.x.abs() * bounce;
    } else if pos.x + radius > GAME_WIDTH {
        pos.x = GAME_WIDTH - radius;
        vel.x = -vel.x.abs() * bounce;
    }

    if pos.y + radius >= GROUND_Y {
        pos.y = GROUND_Y - radius;
        vel.y = -vel.y.abs() * bounce;
        // Settle instead of jittering forever on tiny bounces
        if vel.y.abs() < 1.0 {
            vel.y = 0.0;
        }
        return true;
    }
    false
}

/// Convert a direction (degrees, screen space) and speed into a velocity
#[inline]
pub fn velocity_from_angle(angle_deg: f32, speed: f32) -> Vec2 {
    let theta = angle_deg.to_radians();
    Vec2::new(theta.cos() * speed, theta.sin() * speed)
}
