//! Contacts between round actors
//!
//! A host physics engine reports overlaps as `Contact` values in the tick
//! input. Headless hosts (the native runner, tests) can use
//! `detect_contacts`, which finds the same overlaps with plain circle tests.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{EntityId, GameState};
use crate::consts::{BUTTON_RADIUS, PLAYER_RADIUS};

/// An overlap reported for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Contact {
    /// Player touched the stop button
    PlayerButton,
    PlayerReward { reward: EntityId },
    PlayerObstacle { obstacle: EntityId },
    /// Two obstacles touched; `a` is the first operand of the growth rule
    ObstacleObstacle { a: EntityId, b: EntityId },
    ObstacleReward { obstacle: EntityId, reward: EntityId },
}

/// Check whether two circles overlap (touching does not count)
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let reach = ra + rb;
    a.distance_squared(b) < reach * reach
}

/// Find every overlap among live actors, in a stable order
///
/// Order: button, player-reward, player-obstacle, obstacle pairs (lower id
/// first), obstacle-reward.
pub fn detect_contacts(state: &GameState) -> Vec<Contact> {
    let mut contacts = Vec::new();
    let player = &state.player;

    if circles_overlap(player.pos, PLAYER_RADIUS, state.button_pos, BUTTON_RADIUS) {
        contacts.push(Contact::PlayerButton);
    }

    let rewards: Vec<_> = state.rewards.iter().filter(|r| r.is_alive()).collect();
    let obstacles: Vec<_> = state.obstacles.iter().filter(|o| o.is_alive()).collect();

    for reward in &rewards {
        if circles_overlap(player.pos, PLAYER_RADIUS, reward.pos, reward.radius) {
            contacts.push(Contact::PlayerReward { reward: reward.id });
        }
    }

    for obstacle in &obstacles {
        if circles_overlap(player.pos, PLAYER_RADIUS, obstacle.pos, obstacle.radius) {
            contacts.push(Contact::PlayerObstacle {
                obstacle: obstacle.id,
            });
        }
    }

    for (i, a) in obstacles.iter().enumerate() {
        for b in &obstacles[i + 1..] {
            if circles_overlap(a.pos, a.radius, b.pos, b.radius) {
                let (a, b) = if a.id < b.id { (a.id, b.id) } else { (b.id, a.id) };
                contacts.push(Contact::ObstacleObstacle { a, b });
            }
        }
    }

    for obstacle in &obstacles {
        for reward in &rewards {
            if circles_overlap(obstacle.pos, obstacle.radius, reward.pos, reward.radius) {
                contacts.push(Contact::ObstacleReward {
                    obstacle: obstacle.id,
                    reward: reward.id,
                });
            }
        }
    }

    contacts
}
