//! Directional body driver.
//!
//! Moves the body along its own forward axis and turns it about its local up
//! axis from a two-axis input. Used by the demo app and the Bevy plugin to
//! walk a rig; the gait itself does not depend on it.

use nalgebra::{UnitQuaternion, Vector3};

use strider_core::config::DriveConfig;
use strider_core::pose::{Pose, forward};

/// Two-axis drive input, each axis in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DriveInput {
    /// Positive moves forward.
    pub forward: f32,
    /// Positive turns right.
    pub turn: f32,
}

impl DriveInput {
    /// Input with both axes clamped to `[-1, 1]`. NaN reads as zero.
    #[must_use]
    pub fn new(forward: f32, turn: f32) -> Self {
        Self {
            forward: clamp_axis(forward),
            turn: clamp_axis(turn),
        }
    }
}

fn clamp_axis(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(-1.0, 1.0) }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodyDriver {
    config: DriveConfig,
}

impl BodyDriver {
    #[must_use]
    pub const fn new(config: DriveConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &DriveConfig {
        &self.config
    }

    /// Apply one frame of `input` to `body`.
    pub fn drive(&self, body: &mut Pose, input: DriveInput, dt: f32) {
        let input = DriveInput::new(input.forward, input.turn);
        let step: Vector3<f32> = forward(body) * (input.forward * self.config.move_speed * dt);
        body.translation.vector += step;

        let yaw = (input.turn * self.config.rotate_speed_deg * dt).to_radians();
        if yaw != 0.0 {
            body.rotation *= UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw);
        }
    }
}
