//! Obstacles (monsters) and the grow-on-collision rule
//!
//! When two obstacles touch, the larger one swallows the smaller: the smaller
//! is destroyed and the survivor grows by a fixed increment. Sizes only ever
//! increase.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::EntityId;
use crate::consts::*;

/// An obstacle actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Scale factor relative to the texture (never shrinks)
    pub size: f32,
    /// Collision radius in world units
    pub radius: f32,
    /// Hit-circle offset in texture space, keeps the circle centered
    pub body_offset: Vec2,
    alive: bool,
}

impl Obstacle {
    pub fn new(id: EntityId, pos: Vec2, vel: Vec2) -> Self {
        let mut obstacle = Self {
            id,
            pos,
            vel,
            size: OBSTACLE_BASE_SIZE,
            radius: 0.0,
            body_offset: Vec2::ZERO,
            alive: true,
        };
        obstacle.refresh_body();
        obstacle
    }

    /// Recompute the hit circle from the texture bounds and current size
    pub fn refresh_body(&mut self) {
        let (w, h) = (OBSTACLE_TEXTURE_WIDTH, OBSTACLE_TEXTURE_HEIGHT);
        let base_radius = w.min(h) / 2.0;
        self.body_offset = Vec2::new((w - base_radius * 2.0) / 2.0, (h - base_radius * 2.0) / 2.0);
        self.radius = base_radius * self.size;
    }

    pub fn grow(&mut self, by: f32) {
        self.size += by.max(0.0);
        self.refresh_body();
    }

    /// Mark destroyed. Returns false if it already was.
    pub fn destroy(&mut self) -> bool {
        std::mem::replace(&mut self.alive, false)
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Send the obstacle back above the screen with no vertical speed
    pub fn drop_to_top(&mut self) {
        self.pos.y = OBSTACLE_SPAWN_Y;
        self.vel.y = 0.0;
    }

    /// Recycle an obstacle that fell below the playfield
    pub fn recycle_if_fallen(&mut self) -> bool {
        if self.pos.y > OBSTACLE_RECYCLE_Y {
            self.drop_to_top();
            return true;
        }
        false
    }
}

/// Result of an obstacle-obstacle contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GrowthOutcome {
    Grew {
        survivor: EntityId,
        destroyed: EntityId,
        size: f32,
    },
    /// One side was already gone (or both ids are the same)
    Ignored,
}

/// Apply the growth rule to obstacles `a` and `b`
///
/// Equal sizes resolve in favour of `a`.
pub fn resolve_obstacle_collision(
    obstacles: &mut [Obstacle],
    a: EntityId,
    b: EntityId,
    increment: f32,
) -> GrowthOutcome {
    if a == b {
        return GrowthOutcome::Ignored;
    }
    let find = |id: EntityId| obstacles.iter().position(|o| o.id == id && o.is_alive());
    let (Some(ia), Some(ib)) = (find(a), find(b)) else {
        return GrowthOutcome::Ignored;
    };

    let (bigger, smaller) = if obstacles[ia].size >= obstacles[ib].size {
        (ia, ib)
    } else {
        (ib, ia)
    };

    obstacles[smaller].destroy();
    obstacles[bigger].grow(increment);

    let survivor = &obstacles[bigger];
    log::debug!(
        "Obstacle {} swallowed {} (size {:.1})",
        survivor.id,
        obstacles[smaller].id,
        survivor.size
    );
    GrowthOutcome::Grew {
        survivor: survivor.id,
        destroyed: obstacles[smaller].id,
        size: survivor.size,
    }
}
