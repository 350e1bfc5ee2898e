//! Multi-leg gait coordinator.
//!
//! Owns the legs of one body, the shared step pacing and the balancing
//! strategy. One [`GaitCoordinator::tick`] per frame:
//!
//! 1. advance the controller clock,
//! 2. pacing bookkeeping for legs that are not stepping,
//! 3. tick every leg in order against the same body pose,
//! 4. ease the body toward the pose derived from the new foot targets.

use tracing::debug;

use strider_core::config::RigConfig;
use strider_core::error::ConfigError;
use strider_core::pose::{Pose, position};
use strider_core::sensor::GroundSensor;
use strider_core::time::SimTime;

use crate::balance::{BalanceStrategy, FootSample, SplitBalancer, strategy_from_config};
use crate::debug::LegDebug;
use crate::leg::{Leg, LegEvent, TickContext};
use crate::pacing::Pacing;

/// Summary of one coordinator tick.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TickReport {
    /// Controller time after this tick.
    pub now: SimTime,
    /// One event per leg, in leg order.
    pub events: Vec<LegEvent>,
    /// Whether the balancing strategy moved the body.
    pub balanced: bool,
}

impl TickReport {
    /// Number of legs that started a step this tick.
    pub fn started(&self) -> usize {
        self.count(LegEvent::StepStarted)
    }

    /// Number of legs whose step landed this tick.
    pub fn finished(&self) -> usize {
        self.count(LegEvent::StepFinished)
    }

    fn count(&self, event: LegEvent) -> usize {
        self.events.iter().filter(|e| **e == event).count()
    }
}

#[derive(Debug)]
pub struct GaitCoordinator {
    legs: Vec<Leg>,
    body: Pose,
    balance: Box<dyn BalanceStrategy>,
    pacing: Pacing,
    clock: SimTime,
    feet: Vec<FootSample>,
}

impl GaitCoordinator {
    /// Coordinator for a body at `body` with split balancing and default
    /// pacing. Add legs with [`add_leg`](Self::add_leg).
    pub fn new(body: Pose) -> Self {
        Self {
            legs: Vec::new(),
            body,
            balance: Box::new(SplitBalancer::default()),
            pacing: Pacing::default(),
            clock: SimTime::new(),
            feet: Vec::new(),
        }
    }

    /// Build a full rig from configuration. The configuration is validated
    /// first.
    pub fn from_config(cfg: &RigConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let mut coordinator = Self::new(cfg.body.to_pose())
            .with_balance(strategy_from_config(&cfg.balance))
            .with_pacing(Pacing::from_config(&cfg.pacing));
        for leg in &cfg.legs {
            coordinator.add_leg(Leg::from_config(leg));
        }
        debug!(
            legs = coordinator.legs.len(),
            balance = coordinator.balance.name(),
            "gait coordinator built"
        );
        Ok(coordinator)
    }

    #[must_use]
    pub fn with_balance(mut self, balance: Box<dyn BalanceStrategy>) -> Self {
        self.balance = balance;
        self
    }

    #[must_use]
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Append a leg. Legs tick in insertion order.
    pub fn add_leg(&mut self, leg: Leg) -> usize {
        self.legs.push(leg);
        self.legs.len() - 1
    }

    // ---- accessors ----

    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    pub fn leg(&self, index: usize) -> Option<&Leg> {
        self.legs.get(index)
    }

    pub fn leg_by_name(&self, name: &str) -> Option<&Leg> {
        self.legs.iter().find(|l| l.name() == name)
    }

    pub const fn body(&self) -> &Pose {
        &self.body
    }

    /// Mutable body pose, for drivers that move the body between ticks.
    pub const fn body_mut(&mut self) -> &mut Pose {
        &mut self.body
    }

    pub fn balance(&self) -> &dyn BalanceStrategy {
        self.balance.as_ref()
    }

    pub const fn pacing(&self) -> &Pacing {
        &self.pacing
    }

    pub const fn now(&self) -> SimTime {
        self.clock
    }

    /// Number of legs currently stepping.
    pub fn stepping_count(&self) -> usize {
        self.legs.iter().filter(|l| l.is_stepping()).count()
    }

    /// Foot samples for all enabled legs, in leg order.
    pub fn foot_samples(&self) -> Vec<FootSample> {
        let mut feet = Vec::with_capacity(self.legs.len());
        collect_feet(&self.legs, &mut feet);
        feet
    }

    /// Debug geometry for legs with `debug_draw` set.
    pub fn debug_shapes(&self) -> Vec<LegDebug> {
        self.legs
            .iter()
            .filter_map(|l| l.debug_shapes(&self.body))
            .collect()
    }

    // ---- update ----

    /// Advance the whole rig by `dt` seconds.
    pub fn tick(&mut self, dt: f32, sensor: &dyn GroundSensor) -> TickReport {
        self.clock.advance_secs(dt);
        let now = self.clock;

        for leg in &self.legs {
            if !leg.is_stepping() {
                self.pacing.observe(now);
            }
        }

        let mut events = Vec::with_capacity(self.legs.len());
        for leg in &mut self.legs {
            let ctx = TickContext {
                dt,
                body: self.body,
                step_allowed: self.pacing.permits_step(now),
            };
            let event = leg.tick(&ctx, sensor);
            if event == LegEvent::StepStarted {
                self.pacing.record_grant(now);
            }
            events.push(event);
        }

        collect_feet(&self.legs, &mut self.feet);
        let balanced = self.balance.balance(&mut self.body, &self.feet, dt);

        TickReport {
            now,
            events,
            balanced,
        }
    }

    /// Reset the clock and pacing. Legs and body keep their poses.
    pub fn reset_clock(&mut self) {
        self.clock.reset();
        self.pacing.reset();
    }
}

fn collect_feet(legs: &[Leg], out: &mut Vec<FootSample>) {
    out.clear();
    out.extend(legs.iter().filter_map(|leg| {
        leg.foot_target().map(|target| FootSample {
            position: position(target),
            side: leg.side(),
        })
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use strider_core::config::{LegConfig, PacingConfig, PacingMode};
    use strider_core::pose::pose_at;
    use strider_core::sensor::NoGround;
    use strider_core::terrain::PlaneSurface;

    fn quad_config() -> RigConfig {
        RigConfig {
            body: strider_core::config::PoseConfig::at([0.0, 0.6, 0.0]),
            legs: vec![
                LegConfig::new("front_left", [-0.5, 0.0, 0.5], [-0.8, 0.0, 0.8]),
                LegConfig::new("front_right", [0.5, 0.0, 0.5], [0.8, 0.0, 0.8]),
                LegConfig::new("rear_left", [-0.5, 0.0, -0.5], [-0.8, 0.0, -0.8]),
                LegConfig::new("rear_right", [0.5, 0.0, -0.5], [0.8, 0.0, -0.8]),
            ],
            ..RigConfig::default()
        }
    }

    #[test]
    fn from_config_builds_legs_in_order() {
        let coordinator = GaitCoordinator::from_config(&quad_config()).unwrap();
        let names: Vec<_> = coordinator.legs().iter().map(Leg::name).collect();
        assert_eq!(names, ["front_left", "front_right", "rear_left", "rear_right"]);
        assert_eq!(coordinator.balance().name(), "split");
        assert!(coordinator.leg_by_name("rear_left").is_some());
    }

    #[test]
    fn from_config_rejects_invalid() {
        let mut cfg = quad_config();
        cfg.legs[1].name = "front_left".into();
        assert!(matches!(
            GaitCoordinator::from_config(&cfg),
            Err(ConfigError::DuplicateLeg(_))
        ));
    }

    #[test]
    fn disabled_legs_are_skipped_by_balance() {
        let mut cfg = quad_config();
        cfg.legs[0].foot_target = None;
        let coordinator = GaitCoordinator::from_config(&cfg).unwrap();
        assert_eq!(coordinator.foot_samples().len(), 3);
    }

    #[test]
    fn no_enabled_legs_leaves_body_alone() {
        let mut coordinator = GaitCoordinator::new(pose_at(Vector3::new(0.0, 2.0, 0.0)));
        coordinator.add_leg(Leg::new("ghost", pose_at(Vector3::zeros()), None));
        let report = coordinator.tick(0.02, &NoGround);
        assert!(!report.balanced);
        assert_eq!(report.events, vec![LegEvent::Disabled]);
        assert_eq!(*coordinator.body(), pose_at(Vector3::new(0.0, 2.0, 0.0)));
    }

    #[test]
    fn clock_advances_per_tick() {
        let mut coordinator = GaitCoordinator::from_config(&quad_config()).unwrap();
        coordinator.tick(0.25, &NoGround);
        coordinator.tick(0.25, &NoGround);
        assert_relative_eq!(coordinator.now().secs_f32(), 0.5);
        coordinator.reset_clock();
        assert_eq!(coordinator.now(), SimTime::new());
    }

    #[test]
    fn advisory_pacing_does_not_limit_steps() {
        let mut coordinator = GaitCoordinator::from_config(&quad_config()).unwrap();
        // body far from every committed foothold
        coordinator.body_mut().translation.vector.z = 2.0;
        let report = coordinator.tick(0.02, &PlaneSurface::horizontal(0.0));
        assert_eq!(report.started(), 4);
        assert_eq!(coordinator.stepping_count(), 4);
        // inside the first interval the advisory timestamp stays at zero
        assert_eq!(coordinator.pacing().last_request(), Some(SimTime::new()));
    }

    #[test]
    fn advisory_pacing_refreshes_once_interval_passes() {
        let mut coordinator = GaitCoordinator::from_config(&quad_config()).unwrap();
        let floor = PlaneSurface::horizontal(0.0);
        coordinator.tick(0.04, &floor);
        assert_eq!(coordinator.pacing().last_request(), Some(SimTime::new()));
        let report = coordinator.tick(0.04, &floor);
        assert_eq!(coordinator.pacing().last_request(), Some(report.now));
    }

    #[test]
    fn gated_pacing_grants_one_step_per_interval() {
        let mut cfg = quad_config();
        cfg.pacing = PacingConfig {
            min_step_interval: 0.05,
            mode: PacingMode::Gated,
        };
        let mut coordinator = GaitCoordinator::from_config(&cfg).unwrap();
        coordinator.body_mut().translation.vector.z = 2.0;
        let floor = PlaneSurface::horizontal(0.0);

        let first = coordinator.tick(0.02, &floor);
        assert_eq!(first.started(), 1);
        assert_eq!(first.events[0], LegEvent::StepStarted);
        let second = coordinator.tick(0.02, &floor);
        assert_eq!(second.started(), 0);
        let _ = coordinator.tick(0.02, &floor);
        let fourth = coordinator.tick(0.02, &floor);
        assert_eq!(fourth.started(), 1);
    }

    #[test]
    fn debug_shapes_follow_flag() {
        let mut cfg = quad_config();
        cfg.legs[2].step.debug_draw = true;
        let coordinator = GaitCoordinator::from_config(&cfg).unwrap();
        let shapes = coordinator.debug_shapes();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].leg, "rear_left");
    }
}
