//! A single foot step in flight.
//!
//! A step carries the foot from its pose at lift-off to the sensed
//! destination along a smoothstep-eased path, raised by a half-sine arc so the
//! foot clears the ground in between. The arc peaks at exactly `height`
//! above the straight path at the midpoint of the step.

use std::f32::consts::PI;

use nalgebra::Vector3;
use strider_core::pose::{Pose, lerp, pose_from, position, slerp, smoothstep, world_up};

/// Start/destination pair plus the time spent so far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// Foot target pose at lift-off.
    pub start: Pose,
    /// Pose the foot lands on.
    pub destination: Pose,
    /// Seconds accumulated since lift-off.
    pub elapsed: f32,
}

impl Step {
    /// New step from `start` toward `destination`, with nothing elapsed.
    #[must_use]
    pub const fn new(start: Pose, destination: Pose) -> Self {
        Self {
            start,
            destination,
            elapsed: 0.0,
        }
    }

    /// Normalized progress `elapsed / duration`, clamped to `[0, 1]`.
    #[must_use]
    pub fn progress(&self, duration: f32) -> f32 {
        if duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / duration).clamp(0.0, 1.0)
    }

    /// Whether the step has run its full duration.
    #[must_use]
    pub fn is_complete(&self, duration: f32) -> bool {
        self.elapsed >= duration
    }

    /// Foot pose at the current elapsed time.
    #[must_use]
    pub fn sample(&self, height: f32, duration: f32) -> Pose {
        let t = self.progress(duration);
        let ease = smoothstep(t);
        let along = lerp(&position(&self.start), &position(&self.destination), ease);
        pose_from(
            along + arc_offset(t, height),
            slerp(&self.start.rotation, &self.destination.rotation, ease),
        )
    }

    /// Accumulate `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }
    }
}

/// Lift above the straight path at progress `t`.
fn arc_offset(t: f32, height: f32) -> Vector3<f32> {
    world_up() * ((PI * t).sin() * height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::UnitQuaternion;
    use strider_core::pose::pose_at;

    const DURATION: f32 = 0.2;
    const HEIGHT: f32 = 0.25;

    fn step_between(a: Vector3<f32>, b: Vector3<f32>) -> Step {
        Step::new(pose_at(a), pose_at(b))
    }

    #[test]
    fn starts_at_start_pose() {
        let step = step_between(Vector3::zeros(), Vector3::new(1.0, 0.0, 0.0));
        let pose = step.sample(HEIGHT, DURATION);
        assert_eq!(pose.translation.vector, Vector3::zeros());
    }

    #[test]
    fn midpoint_peaks_at_step_height() {
        let mut step = step_between(Vector3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.4, 0.0));
        step.elapsed = DURATION * 0.5;
        let pose = step.sample(HEIGHT, DURATION);
        // smoothstep(0.5) = 0.5, so the straight path is halfway up
        assert_relative_eq!(pose.translation.vector.y, 0.2 + HEIGHT, epsilon = 1e-6);
        assert_relative_eq!(pose.translation.vector.x, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn height_follows_eased_path_plus_arc() {
        let start_h = 0.3;
        let dest_h = -0.1;
        let mut step = step_between(Vector3::new(0.0, start_h, 0.0), Vector3::new(0.0, dest_h, 1.0));
        for i in 0..10 {
            #[allow(clippy::cast_precision_loss)]
            let t = i as f32 / 10.0;
            step.elapsed = t * DURATION;
            let y = step.sample(HEIGHT, DURATION).translation.vector.y;
            let expected = start_h + (dest_h - start_h) * smoothstep(t) + HEIGHT * (PI * t).sin();
            assert_relative_eq!(y, expected, epsilon = 1e-5);
        }
    }

    #[test]
    fn orientation_is_eased_slerp() {
        let end_rot = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 1.0);
        let mut step = Step::new(pose_at(Vector3::zeros()), pose_from(Vector3::zeros(), end_rot));
        step.elapsed = DURATION * 0.25;
        let pose = step.sample(HEIGHT, DURATION);
        assert_relative_eq!(pose.rotation.angle(), smoothstep(0.25), epsilon = 1e-5);
    }

    #[test]
    fn advance_and_completion() {
        let mut step = step_between(Vector3::zeros(), Vector3::x());
        step.advance(0.1);
        assert!(!step.is_complete(DURATION));
        step.advance(-1.0);
        step.advance(f32::NAN);
        assert_relative_eq!(step.elapsed, 0.1);
        step.advance(0.1);
        assert!(step.is_complete(DURATION));
    }

    #[test]
    fn zero_duration_is_immediately_complete() {
        let step = step_between(Vector3::zeros(), Vector3::x());
        assert!(step.is_complete(0.0));
        assert_relative_eq!(step.progress(0.0), 1.0);
    }
}
