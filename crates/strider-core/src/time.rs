use std::fmt;
use std::ops::Sub;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SimTime
// ---------------------------------------------------------------------------

/// Integer-nanosecond controller clock.
///
/// The gait coordinator advances one of these by every frame delta and uses
/// it for the shared step-pacing timestamp. Counting whole nanoseconds keeps
/// interval comparisons stable over long sessions where an `f32` seconds
/// accumulator would lose resolution.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct SimTime {
    nanos: u64,
}

impl SimTime {
    /// Create a new `SimTime` at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self { nanos: 0 }
    }

    /// Create a `SimTime` from a raw nanosecond count.
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self { nanos }
    }

    /// Create a `SimTime` from seconds. Negative or NaN input maps to zero.
    #[must_use]
    pub fn from_secs(secs: f32) -> Self {
        Self {
            nanos: secs_to_nanos(secs),
        }
    }

    /// Raw nanosecond count.
    #[must_use]
    pub const fn nanos(&self) -> u64 {
        self.nanos
    }

    /// Elapsed seconds as `f32`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn secs_f32(&self) -> f32 {
        self.nanos as f32 / 1_000_000_000.0
    }

    /// Advance the clock by a frame delta in seconds.
    ///
    /// Negative deltas are ignored; the clock never runs backwards.
    pub fn advance_secs(&mut self, delta_secs: f32) {
        self.nanos = self.nanos.saturating_add(secs_to_nanos(delta_secs));
    }

    /// Seconds elapsed since `earlier`. Zero if `earlier` is ahead.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn secs_since(&self, earlier: Self) -> f32 {
        self.nanos.saturating_sub(earlier.nanos) as f32 / 1_000_000_000.0
    }

    /// Reset the clock to zero.
    pub const fn reset(&mut self) {
        self.nanos = 0;
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn secs_to_nanos(secs: f32) -> u64 {
    if secs.is_nan() || secs <= 0.0 {
        return 0;
    }
    (f64::from(secs) * 1_000_000_000.0).round() as u64
}

impl Sub for SimTime {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        Duration::from_nanos(self.nanos.saturating_sub(rhs.nanos))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_secs = self.nanos / 1_000_000_000;
        let millis = (self.nanos % 1_000_000_000) / 1_000_000;
        write!(f, "{total_secs}.{millis:03}s")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
