//! Game state and core simulation types
//!
//! Everything the round state machine reads or writes lives in `GameState`.

use std::time::Duration;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::accuracy::AccuracyMatch;
use super::clock::{Clock, Millis};
use super::countdown::Countdown;
use super::obstacle::Obstacle;
use super::scheduler::Scheduler;
use super::spawner::{RewardKind, RewardSpawn, RewardSpawner};
use crate::config::GameConfig;
use crate::consts::*;
use crate::error::ConfigError;

/// Stable identifier for rewards and obstacles
pub type EntityId = u32;

/// Round state machine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the start signal
    Idle,
    /// Clock counting, player free to move
    Running,
    /// Clock stopped, stage being resolved
    Resolving,
    /// Rewards dropping, countdown active
    CountingDown,
    /// Round lost or finished (retry available)
    RoundOver,
    /// Stage cleared in multi-round play (next available)
    NextStage,
}

impl GamePhase {
    /// Phases in which the world moves and contacts count
    pub fn is_live(&self) -> bool {
        matches!(self, GamePhase::Running | GamePhase::CountingDown)
    }
}

/// Why a round ended in `RoundOver`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOverReason {
    /// Countdown ran out (single-round play)
    CountdownExpired,
    /// Player touched an obstacle
    ObstacleContact,
    /// Clock reached its limit without a stop
    ClockLimit,
}

/// Deferred work kept on the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerAction {
    SpawnReward,
    CountdownTick,
}

/// The player avatar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub on_ground: bool,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            pos: Vec2::new(GAME_WIDTH / 2.0, GROUND_Y - PLAYER_RADIUS),
            vel: Vec2::ZERO,
            on_ground: true,
        }
    }
}

/// A collectible reward (candy)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reward {
    pub id: EntityId,
    pub kind: RewardKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    alive: bool,
}

impl Reward {
    pub fn new(id: EntityId, spawn: RewardSpawn) -> Self {
        Self {
            id,
            kind: spawn.kind,
            pos: spawn.pos,
            vel: spawn.vel,
            radius: REWARD_RADIUS,
            alive: true,
        }
    }

    /// Mark destroyed. Returns false if it already was.
    pub fn destroy(&mut self) -> bool {
        std::mem::replace(&mut self.alive, false)
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }
}

/// One attempt at the clock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    pub clock: Clock,
    /// Set once the stop has been resolved
    pub accuracy: Option<AccuracyMatch>,
    pub score: u64,
    /// Stages cleared in this run (multi-round play)
    pub level: u32,
}

impl Round {
    pub fn target_time(&self) -> Millis {
        self.clock.target()
    }

    pub fn elapsed(&self) -> Millis {
        self.clock.elapsed()
    }

    /// Resolved stage (0 until the stop is resolved)
    pub fn stage(&self) -> u8 {
        self.accuracy.as_ref().map_or(0, |a| a.stage)
    }

    pub fn running(&self) -> bool {
        self.clock.is_running()
    }
}

/// Things that happened during a tick, for presentation and hosts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    PhaseChanged { from: GamePhase, to: GamePhase },
    RoundStarted { level: u32, target: Millis, score: u64 },
    ClockAdvanced(Millis),
    StageResolved(AccuracyMatch),
    RewardSpawned { id: EntityId, kind: RewardKind },
    RewardCollected { id: EntityId, kind: RewardKind, points: u64 },
    /// Reward swallowed by an obstacle
    RewardLost { id: EntityId },
    ScoreChanged(u64),
    CountdownStarted(Millis),
    CountdownTick(Millis),
    CountdownExpired,
    ObstacleSpawned { id: EntityId },
    ObstacleGrew { survivor: EntityId, destroyed: EntityId, size: f32 },
    ObstacleRecycled { id: EntityId },
    RoundOver(RoundOverReason),
    NextStageReady { level: u32 },
}

/// Complete game state (deterministic for a given seed and input stream)
#[derive(Debug, Clone)]
pub struct GameState {
    pub config: GameConfig,
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    pub phase: GamePhase,
    pub round: Round,
    /// Simulation time since the run began
    pub time: Duration,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub player: Player,
    /// Center of the stop button
    pub button_pos: Vec2,
    /// Active rewards (sorted by id for determinism)
    pub rewards: Vec<Reward>,
    /// Active obstacles (sorted by id for determinism)
    pub obstacles: Vec<Obstacle>,
    pub scheduler: Scheduler<TimerAction>,
    pub countdown: Countdown,
    pub spawner: RewardSpawner,
    /// Events produced since the host last drained them
    pub events: Vec<GameEvent>,
    next_id: EntityId,
}

impl GameState {
    /// Create an idle game with the first round's target already drawn
    ///
    /// `config` is expected to be valid; see [`GameState::try_new`].
    pub fn new(config: GameConfig, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let (lo, hi) = config.target_range;
        let clock = Clock::draw(&mut rng, lo, hi);
        let button_pos = config.button.place(&mut rng);
        let countdown = Countdown::new(config.countdown_step, config.countdown_interval.as_duration());

        Self {
            config,
            seed,
            rng,
            phase: GamePhase::Idle,
            round: Round {
                clock,
                accuracy: None,
                score: 0,
                level: 0,
            },
            time: Duration::ZERO,
            time_ticks: 0,
            player: Player::default(),
            button_pos,
            rewards: Vec::new(),
            obstacles: Vec::new(),
            scheduler: Scheduler::new(),
            countdown,
            spawner: RewardSpawner::new(),
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Validate `config`, then create the game
    pub fn try_new(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config, seed))
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take every event produced so far
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Move to `to`, reporting the change
    pub fn set_phase(&mut self, to: GamePhase) {
        let from = self.phase;
        if from == to {
            return;
        }
        log::debug!("Phase {:?} -> {:?}", from, to);
        self.phase = to;
        self.emit(GameEvent::PhaseChanged { from, to });
    }

    /// Replace the current round with a fresh one
    ///
    /// Clears rewards and pending timers, resets the countdown and draws a new
    /// target. Obstacles are left alone; callers decide their fate.
    pub fn begin_round(&mut self, keep_score: bool, level: u32) {
        self.scheduler.clear();
        self.countdown.reset();
        self.spawner.reset();
        self.rewards.clear();

        let (lo, hi) = self.config.target_range;
        let clock = Clock::draw(&mut self.rng, lo, hi);
        let score = if keep_score { self.round.score } else { 0 };
        self.round = Round {
            clock,
            accuracy: None,
            score,
            level,
        };
        self.button_pos = self.config.button.place(&mut self.rng);
        self.player.vel = Vec2::ZERO;
    }

    /// Place a reward in the world
    pub fn spawn_reward(&mut self, spawn: RewardSpawn) -> EntityId {
        let id = self.next_entity_id();
        self.rewards.push(Reward::new(id, spawn));
        self.emit(GameEvent::RewardSpawned { id, kind: spawn.kind });
        id
    }

    /// Drop a new obstacle in from above; every obstacle restarts from the top
    pub fn spawn_obstacle(&mut self) -> EntityId {
        use super::spawner::uniform;

        let id = self.next_entity_id();
        let x = uniform(&mut self.rng, (SPAWN_MARGIN, GAME_WIDTH - SPAWN_MARGIN));
        let vx = uniform(&mut self.rng, (-100.0, 100.0));
        self.obstacles.push(Obstacle::new(
            id,
            Vec2::new(x, OBSTACLE_SPAWN_Y),
            Vec2::new(vx, 20.0),
        ));
        for obstacle in &mut self.obstacles {
            obstacle.pos.y = OBSTACLE_SPAWN_Y;
        }
        log::debug!("Spawned obstacle {} (total {})", id, self.obstacles.len());
        self.emit(GameEvent::ObstacleSpawned { id });
        id
    }

    /// Stop the player and rewards in place (round is no longer live)
    ///
    /// Obstacles keep their velocity and resume with it next stage; nothing
    /// is integrated outside a live phase anyway.
    pub fn freeze_world(&mut self) {
        self.player.vel = Vec2::ZERO;
        for reward in &mut self.rewards {
            reward.vel = Vec2::ZERO;
        }
    }

    pub fn reward(&self, id: EntityId) -> Option<&Reward> {
        self.rewards.iter().find(|r| r.id == id && r.is_alive())
    }

    pub fn obstacle(&self, id: EntityId) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| o.id == id && o.is_alive())
    }

    /// Drop destroyed entities and keep iteration order stable
    pub fn normalize_order(&mut self) {
        self.rewards.retain(|r| r.is_alive());
        self.obstacles.retain(|o| o.is_alive());
        self.rewards.sort_by_key(|r| r.id);
        self.obstacles.sort_by_key(|o| o.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Variant;

    #[test]
    fn test_new_state_is_idle_with_target() {
        let state = GameState::new(Variant::Classic.config(), 12345);
        assert_eq!(state.phase, GamePhase::Idle);
        assert!(state.round.target_time() >= Millis(3000));
        assert!(state.round.target_time() < Millis(9000));
        assert_eq!(state.round.elapsed(), Millis::ZERO);
        assert!(!state.round.running());
        assert_eq!(state.round.stage(), 0);
    }

    #[test]
    fn test_same_seed_same_target() {
        let a = GameState::new(Variant::Survival.config(), 99);
        let b = GameState::new(Variant::Survival.config(), 99);
        assert_eq!(a.round.target_time(), b.round.target_time());
        assert_eq!(a.button_pos, b.button_pos);
    }

    #[test]
    fn test_begin_round_keeps_or_resets_score() {
        let mut state = GameState::new(Variant::Survival.config(), 1);
        state.round.score = 120;

        state.begin_round(true, 1);
        assert_eq!(state.round.score, 120);
        assert_eq!(state.round.level, 1);

        state.begin_round(false, 0);
        assert_eq!(state.round.score, 0);
    }

    #[test]
    fn test_spawn_obstacle_resets_everyone_to_top() {
        let mut state = GameState::new(Variant::Survival.config(), 5);
        let first = state.spawn_obstacle();
        state.obstacles[0].pos.y = 400.0;
        let second = state.spawn_obstacle();

        assert_ne!(first, second);
        assert!(state.obstacles.iter().all(|o| o.pos.y == OBSTACLE_SPAWN_Y));
        assert!(state
            .obstacles
            .iter()
            .all(|o| (-100.0..=100.0).contains(&o.vel.x) && o.vel.y == 20.0));
    }

    #[test]
    fn test_reward_destroy_is_idempotent() {
        let mut reward = Reward::new(
            1,
            RewardSpawn {
                kind: RewardKind::Rare,
                pos: Vec2::ZERO,
                vel: Vec2::ZERO,
            },
        );
        assert!(reward.destroy());
        assert!(!reward.destroy());
        assert!(!reward.is_alive());
    }
}
