//! Deterministic timer list
//!
//! Deferred work (reward spawns, countdown ticks) is kept as `(fire_at, action)`
//! entries on simulation time, advanced by the tick loop. Firing order is
//! `(fire_at, handle)`, so two runs with the same inputs replay identically.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Handle for cancelling a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerHandle(u32);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry<A> {
    handle: TimerHandle,
    fire_at: Duration,
    period: Duration,
    /// Firings left including the next one (`None` = until cancelled)
    remaining: Option<u32>,
    action: A,
}

/// A list of pending timers on simulation time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scheduler<A> {
    entries: Vec<Entry<A>>,
    next_handle: u32,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_handle: 1,
        }
    }
}

impl<A: Clone> Scheduler<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `action` once at `at`
    pub fn schedule_once(&mut self, at: Duration, action: A) -> TimerHandle {
        self.push(at, Duration::ZERO, Some(1), action)
    }

    /// Fire `action` at `first`, then every `period`
    ///
    /// `times` bounds the number of firings; `None` repeats until cancelled.
    ///
    /// # Panics
    ///
    /// An unbounded timer needs a non-zero period.
    pub fn schedule_repeating(
        &mut self,
        first: Duration,
        period: Duration,
        times: Option<u32>,
        action: A,
    ) -> TimerHandle {
        assert!(
            !period.is_zero() || times.is_some(),
            "unbounded timer with zero period would never yield"
        );
        self.push(first, period, times, action)
    }

    fn push(&mut self, at: Duration, period: Duration, times: Option<u32>, action: A) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        if times != Some(0) {
            self.entries.push(Entry {
                handle,
                fire_at: at,
                period,
                remaining: times,
                action,
            });
        }
        handle
    }

    /// Remove a timer. Returns false if it had already finished or been cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle != handle);
        self.entries.len() != before
    }

    pub fn is_scheduled(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    /// Pop the earliest firing due at or before `now`
    ///
    /// Call in a loop: a repeating timer that fell several periods behind
    /// yields once per missed period. Cancelling between calls takes effect
    /// immediately.
    pub fn pop_due(&mut self, now: Duration) -> Option<(TimerHandle, A)> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.fire_at <= now)
            .min_by_key(|(_, e)| (e.fire_at, e.handle.0))
            .map(|(i, _)| i)?;

        let entry = &mut self.entries[idx];
        let fired = (entry.handle, entry.action.clone());

        let finished = match entry.remaining {
            Some(n) if n <= 1 => true,
            Some(n) => {
                entry.remaining = Some(n - 1);
                entry.fire_at += entry.period;
                false
            }
            None => {
                entry.fire_at += entry.period;
                false
            }
        };
        if finished {
            self.entries.remove(idx);
        }

        Some(fired)
    }

    /// Drop every pending timer
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
