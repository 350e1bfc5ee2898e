//! Procedural gait for multi-legged bodies.
//!
//! Feet are placed by sensing the ground under each leg rather than by
//! authored animation:
//!
//! 1. **Leg** casts a ray under its emitter and starts a [`Step`] when its
//!    committed foothold lags too far behind the sensed ground point
//! 2. **Step** carries the foot along an eased path with a half-sine lift
//! 3. **Pacing** spaces step starts across legs (advisory or gated)
//! 4. **Balancing** eases the body to a height and tilt derived from the feet,
//!    either from the left/right split or from a plane through three feet
//!
//! The output is a foot target pose per leg plus a body pose. Solving the
//! limb joints that reach those targets is left to the host.

pub mod aligner;
pub mod balance;
pub mod coordinator;
pub mod debug;
pub mod drive;
pub mod leg;
pub mod pacing;
#[cfg(feature = "bevy")]
pub mod plugin;
pub mod step;

pub use aligner::PlaneFitAligner;
pub use balance::{BalanceStrategy, BodyRates, BodyTarget, FootSample, SplitBalancer, strategy_from_config};
pub use coordinator::{GaitCoordinator, TickReport};
pub use debug::LegDebug;
pub use drive::{BodyDriver, DriveInput};
pub use leg::{FOOT_SMOOTHING_RATE, FootState, Leg, LegEvent, Side, StepPhase, TickContext};
pub use pacing::Pacing;
#[cfg(feature = "bevy")]
pub use plugin::{FootTarget, GaitRig, Ground, StriderPlugin};
pub use step::Step;

pub mod prelude {
    pub use crate::{
        BalanceStrategy, BodyDriver, DriveInput, GaitCoordinator, Leg, LegEvent, Pacing,
        PlaneFitAligner, Side, SplitBalancer, Step, TickReport,
    };
    pub use strider_core::prelude::*;
}
