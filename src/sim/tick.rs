//! Simulation tick and round state machine
//!
//! `Idle → Running → Resolving → CountingDown → RoundOver | NextStage`
//!
//! Control signals are handled first, then (while the round is live) the
//! clock, motion, reported contacts and due timers, in that order.

use std::time::Duration;

use super::accuracy::resolve_times;
use super::clock::Millis;
use super::contact::Contact;
use super::countdown::CountdownStep;
use super::obstacle::{GrowthOutcome, resolve_obstacle_collision};
use super::state::{GameEvent, GamePhase, GameState, RoundOverReason, TimerAction};
use crate::confine_to_world;
use crate::consts::*;

/// Input for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Directional keys held this tick
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    /// Start the first round (from Idle)
    pub start: bool,
    /// Stop the clock (same as touching the stop button)
    pub stop: bool,
    /// Start over after RoundOver
    pub retry: bool,
    /// Continue after NextStage
    pub next: bool,
    /// Overlaps reported by the physics host for this tick
    pub contacts: Vec<Contact>,
}

/// Advance the game state by `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    handle_controls(state, input);

    // Nothing moves outside a live round
    if !state.phase.is_live() {
        return;
    }

    if input.stop {
        stop_clock(state);
    }

    let step = Duration::from_secs_f32(dt.max(0.0));
    state.time += step;
    state.time_ticks += 1;

    if state.phase == GamePhase::Running {
        state.round.clock.advance(step);
        let elapsed = state.round.elapsed();
        state.emit(GameEvent::ClockAdvanced(elapsed));
        if elapsed >= state.config.clock_limit {
            log::info!("Clock ran out at {}", elapsed);
            end_round(state, RoundOverReason::ClockLimit);
            return;
        }
    }

    move_player(state, input, dt);
    move_actors(state, dt);

    for contact in &input.contacts {
        if !state.phase.is_live() {
            break;
        }
        apply_contact(state, *contact);
    }

    run_timers(state);

    // Ensure deterministic ordering
    state.normalize_order();
}

/// Start / retry / next signals
fn handle_controls(state: &mut GameState, input: &TickInput) {
    if input.start {
        if state.phase == GamePhase::Idle {
            enter_running(state);
        } else {
            log::warn!("Start ignored in {:?}", state.phase);
        }
    }

    if input.retry {
        if state.phase == GamePhase::RoundOver {
            state.obstacles.clear();
            state.begin_round(false, 0);
            enter_running(state);
        } else {
            log::warn!("Retry ignored in {:?}", state.phase);
        }
    }

    if input.next {
        if state.phase == GamePhase::NextStage {
            let level = state.round.level + 1;
            state.begin_round(true, level);
            if state.config.has_obstacles {
                state.spawn_obstacle();
            }
            enter_running(state);
        } else {
            log::warn!("Next ignored in {:?}", state.phase);
        }
    }
}

fn enter_running(state: &mut GameState) {
    state.round.clock.start();
    let round = &state.round;
    log::info!(
        "Round started: level {}, target {}, score {}",
        round.level,
        round.target_time(),
        round.score
    );
    let event = GameEvent::RoundStarted {
        level: round.level,
        target: round.target_time(),
        score: round.score,
    };
    state.set_phase(GamePhase::Running);
    state.emit(event);
}

/// Stop the clock, resolve the stage and release the rewards
///
/// Honoured once per round; later stop signals are no-ops.
fn stop_clock(state: &mut GameState) {
    if state.phase != GamePhase::Running {
        return;
    }
    let Some(elapsed) = state.round.clock.stop() else {
        return;
    };
    state.set_phase(GamePhase::Resolving);

    let accuracy = resolve_times(state.round.target_time(), elapsed);
    let stage = accuracy.stage;
    log::info!(
        "Stopped at {} (target {}): stage {}",
        elapsed,
        state.round.target_time(),
        stage
    );
    state.round.accuracy = Some(accuracy.clone());
    state.emit(GameEvent::StageResolved(accuracy));

    let now = state.time;
    let plan = state.config.spawn_plan(stage);
    state
        .spawner
        .start(plan, &mut state.scheduler, now, TimerAction::SpawnReward);

    let initial = state.config.countdown.initial(stage);
    state
        .countdown
        .start(initial, &mut state.scheduler, now, TimerAction::CountdownTick);
    state.emit(GameEvent::CountdownStarted(initial));

    state.set_phase(GamePhase::CountingDown);
}

fn move_player(state: &mut GameState, input: &TickInput, dt: f32) {
    let player = &mut state.player;

    player.vel.x = if input.left {
        -PLAYER_SPEED
    } else if input.right {
        PLAYER_SPEED
    } else {
        0.0
    };
    if input.up && player.on_ground {
        player.vel.y = JUMP_SPEED;
    }
    if input.down {
        player.vel.y = DROP_SPEED;
    }

    player.vel.y += WORLD_GRAVITY * dt;
    player.pos += player.vel * dt;
    player.on_ground = confine_to_world(&mut player.pos, &mut player.vel, PLAYER_RADIUS, PLAYER_BOUNCE);
}

/// Ballistic motion for rewards and obstacles, plus obstacle recycling
fn move_actors(state: &mut GameState, dt: f32) {
    let reward_gravity = WORLD_GRAVITY + state.config.reward_gravity;
    for reward in state.rewards.iter_mut().filter(|r| r.is_alive()) {
        reward.vel.y += reward_gravity * dt;
        reward.pos += reward.vel * dt;
        confine_to_world(&mut reward.pos, &mut reward.vel, reward.radius, REWARD_BOUNCE);
    }

    let obstacle_gravity = WORLD_GRAVITY + state.config.obstacle_gravity;
    let mut recycled = Vec::new();
    for obstacle in state.obstacles.iter_mut().filter(|o| o.is_alive()) {
        obstacle.vel.y += obstacle_gravity * dt;
        obstacle.pos += obstacle.vel * dt;
        if obstacle.recycle_if_fallen() {
            recycled.push(obstacle.id);
            continue;
        }
        confine_to_world(&mut obstacle.pos, &mut obstacle.vel, obstacle.radius, OBSTACLE_BOUNCE);
    }
    for id in recycled {
        log::debug!("Obstacle {} recycled to the top", id);
        state.emit(GameEvent::ObstacleRecycled { id });
    }
}

fn apply_contact(state: &mut GameState, contact: Contact) {
    match contact {
        Contact::PlayerButton => stop_clock(state),

        Contact::PlayerReward { reward } => {
            // Rewards only count while the countdown runs
            if state.phase != GamePhase::CountingDown {
                return;
            }
            let Some(r) = state.rewards.iter_mut().find(|r| r.id == reward) else {
                return;
            };
            if !r.destroy() {
                return;
            }
            let kind = r.kind;
            let points = state.config.scores.score(kind);
            state.round.score += points;
            state.emit(GameEvent::RewardCollected {
                id: reward,
                kind,
                points,
            });
            state.emit(GameEvent::ScoreChanged(state.round.score));
        }

        Contact::PlayerObstacle { obstacle } => {
            if state.obstacle(obstacle).is_some() {
                log::info!("Player hit obstacle {}", obstacle);
                end_round(state, RoundOverReason::ObstacleContact);
            }
        }

        Contact::ObstacleObstacle { a, b } => {
            if !state.config.obstacle_growth {
                return;
            }
            let step = state.config.obstacle_growth_step;
            if let GrowthOutcome::Grew {
                survivor,
                destroyed,
                size,
            } = resolve_obstacle_collision(&mut state.obstacles, a, b, step)
            {
                state.emit(GameEvent::ObstacleGrew {
                    survivor,
                    destroyed,
                    size,
                });
            }
        }

        Contact::ObstacleReward { obstacle, reward } => {
            if state.obstacle(obstacle).is_none() {
                return;
            }
            if let Some(r) = state.rewards.iter_mut().find(|r| r.id == reward) {
                if r.destroy() {
                    state.emit(GameEvent::RewardLost { id: reward });
                }
            }
        }
    }
}

/// Fire every timer due by now, re-checking the phase before each firing
fn run_timers(state: &mut GameState) {
    while state.phase == GamePhase::CountingDown {
        let Some((_, action)) = state.scheduler.pop_due(state.time) else {
            break;
        };
        match action {
            TimerAction::SpawnReward => {
                let launch = state.config.launch;
                let origin = state.button_pos;
                if let Some(spawn) = state.spawner.next_spawn(&mut state.rng, &launch, origin) {
                    let id = state.spawn_reward(spawn);
                    log::debug!("Reward {} spawned: {:?}", id, spawn.kind);
                }
            }
            TimerAction::CountdownTick => match state.countdown.on_tick(&mut state.scheduler) {
                Some(CountdownStep::Running(remaining)) => {
                    state.emit(GameEvent::CountdownTick(remaining));
                }
                Some(CountdownStep::Expired) => {
                    state.emit(GameEvent::CountdownTick(Millis::ZERO));
                    state.emit(GameEvent::CountdownExpired);
                    finish_countdown(state);
                }
                None => {}
            },
        }
    }
}

/// Countdown ran out: next stage or round over, depending on the mode
fn finish_countdown(state: &mut GameState) {
    if state.config.multi_round {
        halt_round(state);
        let level = state.round.level;
        log::info!("Stage {} cleared with score {}", level, state.round.score);
        state.set_phase(GamePhase::NextStage);
        state.emit(GameEvent::NextStageReady { level });
    } else {
        end_round(state, RoundOverReason::CountdownExpired);
    }
}

/// End the round immediately, whatever was pending
fn end_round(state: &mut GameState, reason: RoundOverReason) {
    halt_round(state);
    log::info!("Round over ({:?}), score {}", reason, state.round.score);
    state.set_phase(GamePhase::RoundOver);
    state.emit(GameEvent::RoundOver(reason));
}

fn halt_round(state: &mut GameState) {
    state.countdown.cancel(&mut state.scheduler);
    state.spawner.cancel(&mut state.scheduler);
    state.scheduler.clear();
    state.round.clock.halt();
    state.freeze_world();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CountdownMode, GameConfig, Variant};
    use crate::sim::clock::Clock;
    use crate::sim::spawner::RewardKind;
    use crate::sim::state::EntityId;
    use glam::Vec2;

    const DT: f32 = 0.01;

    fn started(config: GameConfig, seed: u64) -> GameState {
        let mut state = GameState::new(config, seed);
        let input = TickInput {
            start: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        assert_eq!(state.phase, GamePhase::Running);
        state
    }

    fn stop(state: &mut GameState) {
        let input = TickInput {
            stop: true,
            ..Default::default()
        };
        tick(state, &input, DT);
    }

    /// Run idle ticks until the phase leaves CountingDown (or the budget ends)
    fn run_out_countdown(state: &mut GameState) -> u32 {
        let mut ticks = 0;
        while state.phase == GamePhase::CountingDown && ticks < 10_000 {
            tick(state, &TickInput::default(), DT);
            ticks += 1;
        }
        ticks
    }

    fn touch(state: &mut GameState, contacts: Vec<Contact>) {
        let input = TickInput {
            contacts,
            ..Default::default()
        };
        tick(state, &input, DT);
    }

    fn phases(state: &GameState) -> Vec<GamePhase> {
        state
            .events
            .iter()
            .filter_map(|e| match e {
                GameEvent::PhaseChanged { to, .. } => Some(*to),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_idle_ignores_time_and_stop() {
        let mut state = GameState::new(Variant::Classic.config(), 1);
        stop(&mut state);
        tick(&mut state, &TickInput::default(), 1.0);
        assert_eq!(state.phase, GamePhase::Idle);
        assert_eq!(state.round.elapsed(), Millis::ZERO);
        assert_eq!(state.time_ticks, 0);
    }

    #[test]
    fn test_stop_resolves_once_and_passes_through_resolving() {
        let mut state = started(Variant::Classic.config(), 7);
        for _ in 0..50 {
            tick(&mut state, &TickInput::default(), DT);
        }
        stop(&mut state);

        assert_eq!(state.phase, GamePhase::CountingDown);
        assert!(!state.round.running());
        let frozen = state.round.elapsed();
        assert_eq!(frozen, Millis(510));
        assert!(phases(&state).ends_with(&[GamePhase::Resolving, GamePhase::CountingDown]));

        let resolutions = |s: &GameState| {
            s.events
                .iter()
                .filter(|e| matches!(e, GameEvent::StageResolved(_)))
                .count()
        };
        assert_eq!(resolutions(&state), 1);

        // A second stop (signal or button) is a no-op
        stop(&mut state);
        touch(&mut state, vec![Contact::PlayerButton]);
        assert_eq!(resolutions(&state), 1);
        assert_eq!(state.round.elapsed(), frozen);
    }

    #[test]
    fn test_button_contact_stops_the_clock() {
        let mut state = started(Variant::Survival.config(), 3);
        touch(&mut state, vec![Contact::PlayerButton]);
        assert_eq!(state.phase, GamePhase::CountingDown);
        assert!(state.round.accuracy.is_some());
    }

    #[test]
    fn test_classic_spawns_all_rewards_at_once() {
        let mut state = started(Variant::Classic.config(), 11);
        stop(&mut state);
        assert_eq!(state.rewards.len(), 10);
        assert!(state.spawner.is_finished());
    }

    #[test]
    fn test_survival_spawns_on_cadence() {
        let mut state = started(Variant::Survival.config(), 11);
        stop(&mut state);
        assert!(state.rewards.is_empty());

        // 100 ms per reward, 20 rewards
        for _ in 0..10 {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert_eq!(state.rewards.len(), 1);
        for _ in 0..200 {
            tick(&mut state, &TickInput::default(), DT);
        }
        let spawned = state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::RewardSpawned { .. }))
            .count();
        assert_eq!(spawned, 20);
    }

    #[test]
    fn test_collecting_rewards_scores_by_kind() {
        let mut state = started(Variant::Classic.config(), 21);
        stop(&mut state);

        let targets: Vec<(EntityId, RewardKind)> =
            state.rewards.iter().map(|r| (r.id, r.kind)).collect();
        let expected: u64 = targets
            .iter()
            .map(|(_, kind)| state.config.scores.score(*kind))
            .sum();

        let mut contacts: Vec<Contact> = targets
            .iter()
            .map(|(id, _)| Contact::PlayerReward { reward: *id })
            .collect();
        // Near-simultaneous duplicate callback must not double count
        contacts.push(Contact::PlayerReward { reward: targets[0].0 });
        touch(&mut state, contacts);

        assert_eq!(state.round.score, expected);
        assert!(state.rewards.is_empty());
    }

    #[test]
    fn test_single_round_countdown_ends_round() {
        let mut config = Variant::Classic.config();
        config.countdown = CountdownMode::Fixed(Millis(500));
        let mut state = started(config, 5);
        stop(&mut state);

        let ticks = run_out_countdown(&mut state);
        assert_eq!(state.phase, GamePhase::RoundOver);
        assert!((49..=51).contains(&ticks));
        assert!(state.events.contains(&GameEvent::RoundOver(RoundOverReason::CountdownExpired)));
        let expiries = state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::CountdownExpired))
            .count();
        assert_eq!(expiries, 1);
        assert!(state.scheduler.is_empty());
    }

    #[test]
    fn test_multi_round_advances_and_keeps_score() {
        let mut config = Variant::Survival.config();
        config.countdown = CountdownMode::Fixed(Millis(300));
        config.spawn_interval = Millis(10);
        assert!(config.validate().is_ok());
        let mut state = started(config, 8);
        stop(&mut state);
        state.round.score = 77;
        run_out_countdown(&mut state);
        assert_eq!(state.phase, GamePhase::NextStage);

        let (lo, hi) = state.config.target_range;
        let expected = Clock::draw(&mut state.rng.clone(), lo, hi).target();
        let input = TickInput {
            next: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);

        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.round.score, 77);
        assert_eq!(state.round.level, 1);
        assert_eq!(state.obstacles.len(), 1);
        assert!(state.rewards.is_empty());
        assert!(state.round.accuracy.is_none());
        assert!(state.round.running());
        // Target comes from a fresh draw on the run's RNG
        assert_eq!(state.round.target_time(), expected);
        assert!(state.events.contains(&GameEvent::RoundStarted {
            level: 1,
            target: expected,
            score: 77,
        }));
    }

    #[test]
    fn test_obstacles_keep_moving_after_next() {
        let mut config = Variant::Survival.config();
        config.countdown = CountdownMode::Fixed(Millis::from_secs(3));
        let mut state = started(config, 12);
        let old = state.spawn_obstacle();
        state.obstacles[0].pos.x = GAME_WIDTH / 2.0;
        state.obstacles[0].vel.x = 80.0;

        stop(&mut state);
        run_out_countdown(&mut state);
        assert_eq!(state.phase, GamePhase::NextStage);
        assert_eq!(state.obstacle(old).map(|o| o.vel.x), Some(80.0));

        let input = TickInput {
            next: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        assert_eq!(state.obstacles.len(), 2);
        assert_eq!(state.obstacle(old).map(|o| o.vel.x), Some(80.0));
    }

    #[test]
    fn test_every_reward_spawns_before_expiry() {
        // Countdown exactly as long as the spawn schedule
        let mut config = Variant::Survival.config();
        config.countdown = CountdownMode::Fixed(Millis::from_secs(2));
        assert!(config.validate().is_ok());
        let mut state = started(config, 17);
        stop(&mut state);
        run_out_countdown(&mut state);

        assert_eq!(state.phase, GamePhase::NextStage);
        let spawned = state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::RewardSpawned { .. }))
            .count();
        assert_eq!(spawned, 20);
        assert!(state.spawner.is_finished());
    }

    #[test]
    fn test_obstacle_contact_preempts_countdown() {
        let mut state = started(Variant::Survival.config(), 4);
        let obstacle = state.spawn_obstacle();
        stop(&mut state);
        assert!(state.countdown.is_active());

        touch(&mut state, vec![Contact::PlayerObstacle { obstacle }]);
        assert_eq!(state.phase, GamePhase::RoundOver);
        assert!(!state.countdown.is_active());
        assert!(!state.countdown.has_expired());
        assert!(state.scheduler.is_empty());
        assert!(state.events.contains(&GameEvent::RoundOver(RoundOverReason::ObstacleContact)));

        // Frozen: nothing else happens
        let before = state.events.len();
        tick(&mut state, &TickInput::default(), DT);
        assert_eq!(state.events.len(), before);
    }

    #[test]
    fn test_obstacle_contact_while_running() {
        let mut state = started(Variant::Survival.config(), 4);
        let obstacle = state.spawn_obstacle();
        touch(&mut state, vec![Contact::PlayerObstacle { obstacle }]);
        assert_eq!(state.phase, GamePhase::RoundOver);
        assert!(state.round.accuracy.is_none());
    }

    #[test]
    fn test_retry_resets_score_and_obstacles() {
        let mut state = started(Variant::Survival.config(), 9);
        let obstacle = state.spawn_obstacle();
        state.round.score = 55;
        touch(&mut state, vec![Contact::PlayerObstacle { obstacle }]);

        // Next is not valid from RoundOver
        let next = TickInput {
            next: true,
            ..Default::default()
        };
        tick(&mut state, &next, DT);
        assert_eq!(state.phase, GamePhase::RoundOver);

        let (lo, hi) = state.config.target_range;
        let expected = Clock::draw(&mut state.rng.clone(), lo, hi).target();
        let retry = TickInput {
            retry: true,
            ..Default::default()
        };
        tick(&mut state, &retry, DT);
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.round.score, 0);
        assert!(state.obstacles.is_empty());
        assert!(state.round.running());
        assert_eq!(state.round.target_time(), expected);
        assert!(state.events.contains(&GameEvent::RoundStarted {
            level: 0,
            target: expected,
            score: 0,
        }));
    }

    #[test]
    fn test_clock_limit_ends_round() {
        let mut state = started(Variant::Classic.config(), 2);
        for _ in 0..1100 {
            tick(&mut state, &TickInput::default(), DT);
        }
        assert_eq!(state.phase, GamePhase::RoundOver);
        assert_eq!(state.round.elapsed(), Millis::from_secs(10));
        assert!(state.events.contains(&GameEvent::RoundOver(RoundOverReason::ClockLimit)));
        assert!(state.round.accuracy.is_none());
    }

    #[test]
    fn test_obstacles_grow_through_contacts() {
        let mut state = started(Variant::Survival.config(), 6);
        let a = state.spawn_obstacle();
        let b = state.spawn_obstacle();
        state.obstacles[0].size = 0.3;
        touch(&mut state, vec![Contact::ObstacleObstacle { a, b }]);

        assert_eq!(state.obstacles.len(), 1);
        assert_eq!(state.obstacles[0].id, a);
        assert!((state.obstacles[0].size - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_growth_disabled_leaves_obstacles_alone() {
        let mut config = Variant::Survival.config();
        config.obstacle_growth = false;
        let mut state = started(config, 6);
        let a = state.spawn_obstacle();
        let b = state.spawn_obstacle();
        touch(&mut state, vec![Contact::ObstacleObstacle { a, b }]);
        assert_eq!(state.obstacles.len(), 2);
    }

    #[test]
    fn test_obstacle_eats_reward_without_scoring() {
        let mut state = started(Variant::Classic.config(), 13);
        let obstacle = state.spawn_obstacle();
        stop(&mut state);
        let reward = state.rewards[0].id;

        touch(&mut state, vec![Contact::ObstacleReward { obstacle, reward }]);
        assert!(state.reward(reward).is_none());
        assert_eq!(state.round.score, 0);
        assert!(state.obstacle(obstacle).is_some());

        // Too late to collect it
        touch(&mut state, vec![Contact::PlayerReward { reward }]);
        assert_eq!(state.round.score, 0);
    }

    #[test]
    fn test_player_moves_and_jumps() {
        let mut state = started(Variant::Classic.config(), 1);
        let x0 = state.player.pos.x;
        let input = TickInput {
            right: true,
            ..Default::default()
        };
        tick(&mut state, &input, 0.1);
        assert!((state.player.pos.x - (x0 + 30.0)).abs() < 1e-3);

        let input = TickInput {
            up: true,
            ..Default::default()
        };
        tick(&mut state, &input, DT);
        assert!(state.player.vel.y < 0.0);
        assert!(!state.player.on_ground);
    }

    #[test]
    fn test_determinism() {
        // Two states with same seed should produce identical results
        let run = || {
            let mut state = started(Variant::Survival.config(), 99_999);
            for i in 0..400 {
                let input = TickInput {
                    stop: i == 120,
                    left: i % 7 == 0,
                    ..Default::default()
                };
                tick(&mut state, &input, DT);
                let contacts = crate::sim::detect_contacts(&state);
                touch(&mut state, contacts);
            }
            state
        };
        let (s1, s2) = (run(), run());
        assert_eq!(s1.time_ticks, s2.time_ticks);
        assert_eq!(s1.round.score, s2.round.score);
        assert_eq!(s1.events, s2.events);
        let positions = |s: &GameState| s.rewards.iter().map(|r| r.pos).collect::<Vec<Vec2>>();
        assert_eq!(positions(&s1), positions(&s2));
    }
}
