//! Per-leg ground sensing and step state machine.
//!
//! Each tick an idle leg casts a ray down from its emitter, predicts where the
//! foot should stand, and either starts a [`Step`] toward that pose (when the
//! committed foothold lags by more than `step_distance`) or keeps easing the
//! foot target toward its smoothing target. A stepping leg only advances its
//! step; it does not sense until the step has landed.

use nalgebra::UnitQuaternion;
use tracing::{debug, error};

use strider_core::config::{LegConfig, StepConfig};
use strider_core::error::LegError;
use strider_core::pose::{
    Pose, forward, from_to_rotation, look_rotation, pose_from, position, smooth_toward,
    smoothing_factor, world_up,
};
use strider_core::sensor::{GroundContact, GroundRay, GroundSensor};

use crate::debug::LegDebug;
use crate::step::Step;

/// Rate (1/s) at which an idle foot eases toward its smoothing target.
pub const FOOT_SMOOTHING_RATE: f32 = 10.0;

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// Which side of the body a leg is mounted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Side of a body-relative mount: negative X is left.
    #[must_use]
    pub fn of_mount(mount: &Pose) -> Self {
        if mount.translation.vector.x < 0.0 {
            Self::Left
        } else {
            Self::Right
        }
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Step machine phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepPhase {
    Idle,
    Stepping(Step),
}

/// Foot poses owned by an enabled leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootState {
    /// Pose the limb follows. Mutated every tick.
    pub target: Pose,
    /// Where the last step landed.
    pub committed: Pose,
    /// Pose the idle foot eases toward.
    pub smoothing_target: Pose,
    pub phase: StepPhase,
}

impl FootState {
    fn new(initial: Pose) -> Self {
        Self {
            target: initial,
            committed: initial,
            smoothing_target: initial,
            phase: StepPhase::Idle,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum LegState {
    Active(FootState),
    Disabled(LegError),
}

/// Per-tick inputs shared by every leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    /// Frame delta in seconds.
    pub dt: f32,
    /// Current body pose in world space.
    pub body: Pose,
    /// Whether an idle leg may start a new step this tick.
    pub step_allowed: bool,
}

impl TickContext {
    #[must_use]
    pub const fn new(dt: f32, body: Pose) -> Self {
        Self {
            dt,
            body,
            step_allowed: true,
        }
    }
}

/// What a leg did during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegEvent {
    /// The leg is disabled and did nothing.
    Disabled,
    /// The foot eased toward its smoothing target.
    Idle,
    /// A new step began this tick.
    StepStarted,
    /// An in-flight step advanced.
    Stepping,
    /// A step landed and the foot snapped to its destination.
    StepFinished,
}

// ---------------------------------------------------------------------------
// Leg
// ---------------------------------------------------------------------------

/// One limb's foot target and step machine.
#[derive(Debug, Clone, PartialEq)]
pub struct Leg {
    name: String,
    mount: Pose,
    rest: Option<Pose>,
    config: StepConfig,
    state: LegState,
}

impl Leg {
    /// Create a leg mounted at `mount` (relative to the body) whose foot
    /// starts at the world-space pose `foot_target`.
    ///
    /// Without a foot target the leg is disabled for its whole lifetime; the
    /// error is logged once here and kept on the leg.
    pub fn new(name: impl Into<String>, mount: Pose, foot_target: Option<Pose>) -> Self {
        let name = name.into();
        let state = match foot_target {
            Some(initial) => LegState::Active(FootState::new(initial)),
            None => {
                let err = LegError::MissingFootTarget { leg: name.clone() };
                error!("{err}; leg disabled");
                LegState::Disabled(err)
            }
        };
        Self {
            name,
            mount,
            rest: None,
            config: StepConfig::default(),
            state,
        }
    }

    /// Build a leg from its configuration section.
    pub fn from_config(cfg: &LegConfig) -> Self {
        let mut leg = Self::new(
            cfg.name.clone(),
            cfg.mount.to_pose(),
            cfg.foot_target.as_ref().map(|p| p.to_pose()),
        )
        .with_step_config(cfg.step);
        leg.rest = cfg.rest.as_ref().map(|p| p.to_pose());
        leg
    }

    /// Set the rest pose, relative to the body.
    #[must_use]
    pub fn with_rest(mut self, rest: Pose) -> Self {
        self.rest = Some(rest);
        self
    }

    #[must_use]
    pub fn with_step_config(mut self, config: StepConfig) -> Self {
        self.config = config;
        self
    }

    // ---- accessors ----

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn mount(&self) -> &Pose {
        &self.mount
    }

    pub const fn rest(&self) -> Option<&Pose> {
        self.rest.as_ref()
    }

    pub const fn config(&self) -> &StepConfig {
        &self.config
    }

    pub fn side(&self) -> Side {
        Side::of_mount(&self.mount)
    }

    pub const fn is_enabled(&self) -> bool {
        matches!(self.state, LegState::Active(_))
    }

    /// Why the leg is disabled, if it is.
    pub const fn error(&self) -> Option<&LegError> {
        match &self.state {
            LegState::Disabled(err) => Some(err),
            LegState::Active(_) => None,
        }
    }

    pub const fn foot(&self) -> Option<&FootState> {
        match &self.state {
            LegState::Active(foot) => Some(foot),
            LegState::Disabled(_) => None,
        }
    }

    /// Current foot target pose, `None` for a disabled leg.
    pub fn foot_target(&self) -> Option<&Pose> {
        self.foot().map(|f| &f.target)
    }

    /// Last committed foothold, `None` for a disabled leg.
    pub fn committed(&self) -> Option<&Pose> {
        self.foot().map(|f| &f.committed)
    }

    /// The step in flight, if any.
    pub fn step(&self) -> Option<&Step> {
        match self.foot().map(|f| &f.phase) {
            Some(StepPhase::Stepping(step)) => Some(step),
            _ => None,
        }
    }

    pub fn is_stepping(&self) -> bool {
        self.step().is_some()
    }

    /// Enabled and not stepping.
    pub fn is_idle(&self) -> bool {
        self.foot().is_some_and(|f| f.phase == StepPhase::Idle)
    }

    /// World pose of the emitter for the given body pose.
    pub fn emitter(&self, body: &Pose) -> Pose {
        body * self.mount
    }

    /// The ground ray this leg casts for the given body pose.
    pub fn ground_ray(&self, body: &Pose) -> GroundRay {
        ground_ray(&self.mount, &self.config, body)
    }

    /// Debug geometry, only when `debug_draw` is set and the leg is enabled.
    pub fn debug_shapes(&self, body: &Pose) -> Option<LegDebug> {
        if !self.config.debug_draw {
            return None;
        }
        let committed = self.committed()?;
        let ray = self.ground_ray(body);
        Some(LegDebug {
            leg: self.name.clone(),
            ray_start: ray.origin,
            ray_end: ray.end(),
            committed: position(committed),
        })
    }

    // ---- update ----

    /// Advance the leg by one frame.
    pub fn tick(&mut self, ctx: &TickContext, sensor: &dyn GroundSensor) -> LegEvent {
        let LegState::Active(foot) = &mut self.state else {
            return LegEvent::Disabled;
        };
        let cfg = &self.config;

        if let StepPhase::Stepping(step) = &mut foot.phase {
            if step.is_complete(cfg.step_duration) {
                let landed = step.destination;
                foot.target = landed;
                foot.committed = landed;
                foot.smoothing_target = landed;
                foot.phase = StepPhase::Idle;
                debug!(leg = %self.name, position = ?position(&landed), "step finished");
                return LegEvent::StepFinished;
            }
            foot.target = step.sample(cfg.step_height, cfg.step_duration);
            step.advance(ctx.dt);
            return LegEvent::Stepping;
        }

        let ray = ground_ray(&self.mount, cfg, &ctx.body);
        if let Some(contact) = sensor.probe(&ray) {
            let predicted = predicted_pose(&contact, &ctx.body);
            let lag = (position(&foot.committed) - contact.point).norm();
            if lag > cfg.step_distance && ctx.step_allowed {
                let mut step = Step::new(foot.target, predicted);
                foot.target = step.sample(cfg.step_height, cfg.step_duration);
                step.advance(ctx.dt);
                foot.phase = StepPhase::Stepping(step);
                debug!(leg = %self.name, lag, destination = ?contact.point, "step started");
                return LegEvent::StepStarted;
            }
            foot.smoothing_target = foot.committed;
        } else if let Some(rest) = &self.rest {
            foot.smoothing_target = ctx.body * rest;
        }

        let t = smoothing_factor(ctx.dt, FOOT_SMOOTHING_RATE);
        foot.target = smooth_toward(&foot.target, &foot.smoothing_target, t);
        LegEvent::Idle
    }
}

/// Ray from the emitter plus its rotated local offset, straight down.
fn ground_ray(mount: &Pose, cfg: &StepConfig, body: &Pose) -> GroundRay {
    let emitter = body * mount;
    let origin = position(&emitter) + emitter.rotation * cfg.ray_offset();
    GroundRay::downward(origin, cfg.ray_distance, cfg.surface_mask)
}

/// Where the foot should stand for a contact: on the point, tilted to the
/// surface normal, facing the body's forward.
fn predicted_pose(contact: &GroundContact, body: &Pose) -> Pose {
    let heading = look_rotation(&forward(body), &world_up()).unwrap_or_else(UnitQuaternion::identity);
    let tilt = from_to_rotation(&world_up(), &contact.normal);
    pose_from(contact.point, tilt * heading)
}
