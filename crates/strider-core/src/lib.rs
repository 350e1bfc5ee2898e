// strider-core: Pose math, clock, config, errors and ground sensing for Strider.
//
// Everything here is engine-agnostic. The gait crate builds the per-leg
// step machines and body balancing on top of these types; an engine
// integration only has to provide a `GroundSensor`.
//
// Conventions: Y is up, +Z is the body's forward axis, and a leg mounted at
// negative local X is on the body's left side.

pub mod config;
pub mod error;
pub mod pose;
pub mod sensor;
pub mod terrain;
pub mod time;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        config::{
            BalanceConfig, DriveConfig, LegConfig, PacingConfig, PacingMode, PlaneFitConfig,
            PoseConfig, RigConfig, SplitBalanceConfig, StepConfig,
        },
        error::{ConfigError, LegError, StriderError},
        pose::Pose,
        sensor::{GroundContact, GroundRay, GroundSensor, NoGround, SurfaceMask},
        terrain::{HeightField, PlaneSurface, Terrain},
        time::SimTime,
    };
}
