//! Body balancing from foot positions.
//!
//! A [`BalanceStrategy`] turns the current foot targets into a desired body
//! pose, and the body is eased toward it at the strategy's rates. Two
//! strategies ship with the crate: [`SplitBalancer`], which levels height and
//! pitches the body from the left/right height difference, and
//! [`PlaneFitAligner`](crate::aligner::PlaneFitAligner), which tilts the body
//! onto the plane through three feet.

use std::fmt;

use nalgebra::{UnitQuaternion, Vector3};

use strider_core::config::{BalanceConfig, SplitBalanceConfig};
use strider_core::pose::{Pose, lerp, position, slerp, smoothing_factor, yaw_of};

use crate::aligner::PlaneFitAligner;
use crate::leg::Side;

/// One foot as seen by a balancing strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootSample {
    /// World-space foot target position.
    pub position: Vector3<f32>,
    pub side: Side,
}

/// Desired body pose. `orientation` is `None` when the feet do not
/// determine one this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyTarget {
    pub position: Vector3<f32>,
    pub orientation: Option<UnitQuaternion<f32>>,
}

/// Smoothing rates (1/s) for body position and orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyRates {
    pub position: f32,
    pub rotation: f32,
}

/// Derives the body pose from foot positions.
pub trait BalanceStrategy: fmt::Debug + Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &'static str;

    /// Desired body pose for `feet`, or `None` when there is nothing to do.
    fn target(&self, body: &Pose, feet: &[FootSample]) -> Option<BodyTarget>;

    fn rates(&self) -> BodyRates;

    /// Ease `body` toward [`target`](Self::target). Returns whether the body
    /// was adjusted.
    fn balance(&self, body: &mut Pose, feet: &[FootSample], dt: f32) -> bool {
        let Some(target) = self.target(body, feet) else {
            return false;
        };
        let rates = self.rates();
        body.translation.vector = lerp(
            &position(body),
            &target.position,
            smoothing_factor(dt, rates.position),
        );
        if let Some(orientation) = target.orientation {
            body.rotation = slerp(
                &body.rotation,
                &orientation,
                smoothing_factor(dt, rates.rotation),
            );
        }
        true
    }
}

/// Build the strategy named by the configuration.
pub fn strategy_from_config(cfg: &BalanceConfig) -> Box<dyn BalanceStrategy> {
    match cfg {
        BalanceConfig::Split(split) => Box::new(SplitBalancer::new(*split)),
        BalanceConfig::PlaneFit(fit) => Box::new(PlaneFitAligner::new(*fit)),
    }
}

/// Mean of the foot positions. `None` for no feet.
#[allow(clippy::cast_precision_loss)]
pub fn mean_position(feet: &[FootSample]) -> Option<Vector3<f32>> {
    if feet.is_empty() {
        return None;
    }
    let sum: Vector3<f32> = feet.iter().map(|f| f.position).sum();
    Some(sum / feet.len() as f32)
}

// ---------------------------------------------------------------------------
// SplitBalancer
// ---------------------------------------------------------------------------

/// Height from the mean foot height, pitch from the left/right split.
///
/// Roll is always zero and yaw is kept from the current body pose.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SplitBalancer {
    config: SplitBalanceConfig,
}

impl SplitBalancer {
    #[must_use]
    pub const fn new(config: SplitBalanceConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &SplitBalanceConfig {
        &self.config
    }

    /// Pitch in degrees for the given mean side heights, clamped to
    /// `±max_pitch_deg`.
    #[must_use]
    pub fn desired_pitch_deg(&self, left_mean_y: f32, right_mean_y: f32) -> f32 {
        let limit = self.config.max_pitch_deg;
        ((left_mean_y - right_mean_y) * self.config.pitch_gain).clamp(-limit, limit)
    }

    /// Mean foot height per side. A side with no feet takes `fallback`.
    #[allow(clippy::cast_precision_loss)]
    fn side_mean_y(feet: &[FootSample], side: Side, fallback: f32) -> f32 {
        let (sum, count) = feet
            .iter()
            .filter(|f| f.side == side)
            .fold((0.0_f32, 0_usize), |(s, n), f| (s + f.position.y, n + 1));
        if count == 0 { fallback } else { sum / count as f32 }
    }
}

impl BalanceStrategy for SplitBalancer {
    fn name(&self) -> &'static str {
        "split"
    }

    fn target(&self, body: &Pose, feet: &[FootSample]) -> Option<BodyTarget> {
        let mean = mean_position(feet)?;
        let body_pos = position(body);
        let left = Self::side_mean_y(feet, Side::Left, mean.y);
        let right = Self::side_mean_y(feet, Side::Right, mean.y);
        let pitch = self.desired_pitch_deg(left, right).to_radians();

        let orientation = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw_of(&body.rotation))
            * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), pitch);
        Some(BodyTarget {
            position: Vector3::new(body_pos.x, mean.y + self.config.height_offset, body_pos.z),
            orientation: Some(orientation),
        })
    }

    fn rates(&self) -> BodyRates {
        BodyRates {
            position: self.config.position_speed,
            rotation: self.config.rotation_speed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use strider_core::pose::{forward, pose_at, pose_from};

    fn foot(x: f32, y: f32, z: f32) -> FootSample {
        FootSample {
            position: Vector3::new(x, y, z),
            side: if x < 0.0 { Side::Left } else { Side::Right },
        }
    }

    fn quad(heights: [f32; 4]) -> Vec<FootSample> {
        vec![
            foot(-0.5, heights[0], 0.5),
            foot(-0.5, heights[1], -0.5),
            foot(0.5, heights[2], 0.5),
            foot(0.5, heights[3], -0.5),
        ]
    }

    #[test]
    fn pitch_from_left_right_split() {
        let balancer = SplitBalancer::default();
        let target = balancer.target(&pose_at(Vector3::zeros()), &quad([1.0, 1.0, 0.0, 0.0])).unwrap();
        let pitch = target.orientation.unwrap().angle();
        assert_relative_eq!(pitch, 2.0_f32.to_radians(), epsilon = 1e-6);
    }

    #[test]
    fn pitch_is_clamped() {
        let balancer = SplitBalancer::default();
        assert_relative_eq!(balancer.desired_pitch_deg(30.0, 0.0), 20.0);
        assert_relative_eq!(balancer.desired_pitch_deg(0.0, 30.0), -20.0);
    }

    #[test]
    fn height_keeps_body_xz() {
        let balancer = SplitBalancer::default();
        let body = pose_at(Vector3::new(3.0, 5.0, -2.0));
        let target = balancer.target(&body, &quad([0.2, 0.2, 0.2, 0.2])).unwrap();
        assert_relative_eq!(target.position, Vector3::new(3.0, 0.8, -2.0), epsilon = 1e-6);
    }

    #[test]
    fn empty_side_inherits_overall_mean() {
        let balancer = SplitBalancer::default();
        let feet = vec![foot(-0.5, 1.0, 0.0), foot(-0.5, 0.0, 0.0)];
        let target = balancer.target(&pose_at(Vector3::zeros()), &feet).unwrap();
        assert_relative_eq!(target.orientation.unwrap().angle(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn yaw_is_preserved_and_roll_removed() {
        let balancer = SplitBalancer::default();
        let body = pose_from(
            Vector3::zeros(),
            UnitQuaternion::from_euler_angles(0.0, 0.0, 0.3)
                * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.8),
        );
        let target = balancer.target(&body, &quad([0.0; 4])).unwrap();
        let rot = target.orientation.unwrap();
        assert_relative_eq!(yaw_of(&rot), yaw_of(&body.rotation), epsilon = 1e-5);
        assert_relative_eq!((rot * Vector3::y()).dot(&Vector3::y()), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn no_feet_no_target() {
        let balancer = SplitBalancer::default();
        let mut body = pose_at(Vector3::new(0.0, 2.0, 0.0));
        assert!(balancer.target(&body, &[]).is_none());
        assert!(!balancer.balance(&mut body, &[], 0.02));
        assert_eq!(body, pose_at(Vector3::new(0.0, 2.0, 0.0)));
    }

    #[test]
    fn balance_eases_at_configured_rate() {
        let balancer = SplitBalancer::default();
        let mut body = pose_at(Vector3::new(0.0, 2.0, 0.0));
        assert!(balancer.balance(&mut body, &quad([0.0; 4]), 0.02));
        // 10% of the way from 2.0 to 0.6
        assert_relative_eq!(body.translation.vector.y, 2.0 - 0.14, epsilon = 1e-5);
        assert_relative_eq!(forward(&body), Vector3::z(), epsilon = 1e-6);
    }

    #[test]
    fn strategy_from_config_picks_variant() {
        let split = strategy_from_config(&BalanceConfig::default());
        assert_eq!(split.name(), "split");
        let fit = strategy_from_config(&BalanceConfig::PlaneFit(Default::default()));
        assert_eq!(fit.name(), "plane_fit");
    }
}
