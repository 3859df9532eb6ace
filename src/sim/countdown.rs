//! Post-resolution countdown
//!
//! Counts `remaining` down by a fixed step on every scheduler tick, clamps at
//! zero and reports expiry exactly once. Cancelling removes the timer and
//! suppresses the expiry.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::clock::Millis;
use super::scheduler::{Scheduler, TimerHandle};

/// What a single countdown tick produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStep {
    /// Still counting; new remaining time
    Running(Millis),
    /// Reached zero on this tick (reported once)
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum CountdownState {
    Idle,
    Active,
    Expired,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Countdown {
    remaining: Millis,
    step: Millis,
    tick_interval: Duration,
    handle: Option<TimerHandle>,
    state: CountdownState,
}

impl Countdown {
    pub fn new(step: Millis, tick_interval: Duration) -> Self {
        Self {
            remaining: Millis::ZERO,
            step,
            tick_interval,
            handle: None,
            state: CountdownState::Idle,
        }
    }

    /// Begin counting down from `initial`, ticking via `action` on `scheduler`
    pub fn start<A: Clone>(
        &mut self,
        initial: Millis,
        scheduler: &mut Scheduler<A>,
        now: Duration,
        action: A,
    ) {
        self.cancel(scheduler);
        self.remaining = initial;
        self.state = CountdownState::Active;
        self.handle = Some(scheduler.schedule_repeating(
            now + self.tick_interval,
            self.tick_interval,
            None,
            action,
        ));
    }

    /// Apply one scheduled tick
    ///
    /// Returns `None` if the countdown is not active (already expired,
    /// cancelled, or never started).
    pub fn on_tick<A: Clone>(&mut self, scheduler: &mut Scheduler<A>) -> Option<CountdownStep> {
        if self.state != CountdownState::Active {
            return None;
        }

        self.remaining = self.remaining.saturating_sub(self.step);
        if self.remaining.is_zero() {
            self.state = CountdownState::Expired;
            if let Some(handle) = self.handle.take() {
                scheduler.cancel(handle);
            }
            return Some(CountdownStep::Expired);
        }
        Some(CountdownStep::Running(self.remaining))
    }

    /// Stop ticking without expiring
    pub fn cancel<A: Clone>(&mut self, scheduler: &mut Scheduler<A>) {
        if let Some(handle) = self.handle.take() {
            scheduler.cancel(handle);
        }
        if self.state == CountdownState::Active {
            self.state = CountdownState::Cancelled;
        }
    }

    /// Forget any previous run (the scheduler is assumed cleared by the caller)
    pub fn reset(&mut self) {
        self.remaining = Millis::ZERO;
        self.handle = None;
        self.state = CountdownState::Idle;
    }

    pub fn remaining(&self) -> Millis {
        self.remaining
    }

    pub fn is_active(&self) -> bool {
        self.state == CountdownState::Active
    }

    pub fn has_expired(&self) -> bool {
        self.state == CountdownState::Expired
    }
}
