//! Global step pacing shared by all legs of a rig.
//!
//! A single timestamp records the last step request. In
//! [`PacingMode::Advisory`] it starts at time zero, the coordinator only
//! refreshes it while watching idle legs, and it never stops a leg from
//! stepping. In [`PacingMode::Gated`] it is the time of the last granted
//! step, and no leg may start another one until `min_interval` has passed.

use tracing::trace;

use strider_core::config::{PacingConfig, PacingMode};
use strider_core::time::SimTime;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pacing {
    mode: PacingMode,
    min_interval: f32,
    last_request: Option<SimTime>,
}

impl Default for Pacing {
    fn default() -> Self {
        Self::from_config(&PacingConfig::default())
    }
}

impl Pacing {
    #[must_use]
    pub const fn new(mode: PacingMode, min_interval: f32) -> Self {
        Self {
            mode,
            min_interval,
            last_request: Self::initial_request(mode),
        }
    }

    /// Advisory pacing counts from time zero; gated pacing has granted
    /// nothing yet.
    const fn initial_request(mode: PacingMode) -> Option<SimTime> {
        match mode {
            PacingMode::Advisory => Some(SimTime::new()),
            PacingMode::Gated => None,
        }
    }

    #[must_use]
    pub const fn from_config(cfg: &PacingConfig) -> Self {
        Self::new(cfg.mode, cfg.min_step_interval)
    }

    pub const fn mode(&self) -> PacingMode {
        self.mode
    }

    pub const fn min_interval(&self) -> f32 {
        self.min_interval
    }

    /// Time of the last recorded request, if any.
    pub const fn last_request(&self) -> Option<SimTime> {
        self.last_request
    }

    /// Whether `min_interval` has passed since the last request. True when
    /// there is none.
    pub fn interval_elapsed(&self, now: SimTime) -> bool {
        self.last_request
            .is_none_or(|last| now.secs_since(last) >= self.min_interval)
    }

    /// Advisory bookkeeping for one leg that is not stepping. Refreshes the
    /// timestamp when the interval has passed and returns whether it did.
    ///
    /// Has no effect in gated mode, where only grants move the timestamp.
    pub fn observe(&mut self, now: SimTime) -> bool {
        if self.mode != PacingMode::Advisory || !self.interval_elapsed(now) {
            return false;
        }
        trace!(%now, "step request window refreshed");
        self.last_request = Some(now);
        true
    }

    /// Whether a leg may start a step at `now`.
    pub fn permits_step(&self, now: SimTime) -> bool {
        match self.mode {
            PacingMode::Advisory => true,
            PacingMode::Gated => self.interval_elapsed(now),
        }
    }

    /// Record that a leg started a step at `now`.
    pub fn record_grant(&mut self, now: SimTime) {
        if self.mode == PacingMode::Gated {
            trace!(%now, "step granted");
            self.last_request = Some(now);
        }
    }

    /// Return to the initial request state.
    pub const fn reset(&mut self) {
        self.last_request = Self::initial_request(self.mode);
    }
}
