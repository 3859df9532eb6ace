//! Round clock and fixed-precision time values
//!
//! Times shown to the player always carry exactly three decimals, so they are
//! stored as whole milliseconds rather than floats.

use std::fmt;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A non-negative time with millisecond precision
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Millis(pub u32);

impl Millis {
    pub const ZERO: Millis = Millis(0);

    pub const fn from_secs(secs: u32) -> Self {
        Millis(secs * 1000)
    }

    /// Round a duration to the nearest millisecond (half rounds up)
    pub fn from_duration(d: Duration) -> Self {
        let ms = (d.as_micros() + 500) / 1000;
        Millis(u32::try_from(ms).unwrap_or(u32::MAX))
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_millis(u64::from(self.0))
    }

    pub fn saturating_sub(self, other: Millis) -> Millis {
        Millis(self.0.saturating_sub(other.0))
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Millis {
    /// Renders as `S.mmm`, e.g. `5.123` or `0.000`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.0 / 1000, self.0 % 1000)
    }
}

/// The round clock: counts up toward a hidden-until-start target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clock {
    target: Millis,
    elapsed: Duration,
    running: bool,
    /// Elapsed time frozen at the moment of the stop (set once)
    stopped_at: Option<Millis>,
}

impl Clock {
    /// A stopped-at-zero clock aiming for `target`
    pub fn new(target: Millis) -> Self {
        Self {
            target,
            elapsed: Duration::ZERO,
            running: false,
            stopped_at: None,
        }
    }

    /// Draw a target uniformly from `[lo, hi)`
    pub fn draw<R: Rng>(rng: &mut R, lo: Millis, hi: Millis) -> Self {
        let target = if hi > lo {
            Millis(rng.random_range(lo.0..hi.0))
        } else {
            lo
        };
        Self::new(target)
    }

    /// Start counting. A clock that has been stopped stays stopped.
    pub fn start(&mut self) {
        if self.stopped_at.is_none() {
            self.running = true;
        }
    }

    /// Advance by one tick (no-op unless running)
    pub fn advance(&mut self, dt: Duration) {
        if self.running {
            self.elapsed += dt;
        }
    }

    /// Freeze the elapsed time
    ///
    /// Returns the frozen value the first time it is called on a running
    /// clock and `None` on every later call.
    pub fn stop(&mut self) -> Option<Millis> {
        if !self.running {
            return None;
        }
        self.running = false;
        let frozen = Millis::from_duration(self.elapsed);
        self.stopped_at = Some(frozen);
        Some(frozen)
    }

    /// Halt without recording a stop (round ended some other way)
    pub fn halt(&mut self) {
        self.running = false;
    }

    pub fn target(&self) -> Millis {
        self.target
    }

    pub fn elapsed(&self) -> Millis {
        self.stopped_at
            .unwrap_or_else(|| Millis::from_duration(self.elapsed))
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}
