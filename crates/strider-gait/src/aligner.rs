//! Plane-fit body alignment.
//!
//! Needs at least three feet; with fewer the body is left alone. Height
//! follows the mean foot height like [`SplitBalancer`](crate::SplitBalancer)
//! and the body is tilted onto the plane through the first three feet,
//! keeping its heading as close to the current forward as the plane allows.
//!
//! The plane normal follows the winding of those three feet, so a clockwise
//! order seen from above turns the body over. Set `orient_normal_up` to flip
//! the normal to the body's up side instead.

use nalgebra::{Unit, Vector3};
use tracing::warn;

use strider_core::config::PlaneFitConfig;
use strider_core::pose::{Pose, forward, look_rotation, position, project_on_plane};

use crate::balance::{BalanceStrategy, BodyRates, BodyTarget, FootSample, mean_position};

const NORMAL_EPS: f32 = 1.0e-6;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaneFitAligner {
    config: PlaneFitConfig,
}

impl PlaneFitAligner {
    #[must_use]
    pub const fn new(config: PlaneFitConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &PlaneFitConfig {
        &self.config
    }

    /// Unit normal `(b - a) x (c - a)` of the plane through the first three
    /// feet. `None` with fewer than three feet or collinear feet.
    pub fn support_normal(&self, body: &Pose, feet: &[FootSample]) -> Option<Unit<Vector3<f32>>> {
        let [a, b, c, ..] = feet else {
            return None;
        };
        let n = (b.position - a.position).cross(&(c.position - a.position));
        let n = Unit::try_new(n, NORMAL_EPS)?;
        let body_up = body.rotation * Vector3::y();
        if self.config.orient_normal_up && n.dot(&body_up) < 0.0 {
            Some(Unit::new_unchecked(-n.into_inner()))
        } else {
            Some(n)
        }
    }
}

impl BalanceStrategy for PlaneFitAligner {
    fn name(&self) -> &'static str {
        "plane_fit"
    }

    fn target(&self, body: &Pose, feet: &[FootSample]) -> Option<BodyTarget> {
        if feet.len() < 3 {
            return None;
        }
        let mean = mean_position(feet)?;
        let body_pos = position(body);
        let mut target = BodyTarget {
            position: Vector3::new(body_pos.x, mean.y + self.config.height_offset, body_pos.z),
            orientation: None,
        };

        let Some(normal) = self.support_normal(body, feet) else {
            warn!("support feet are collinear; skipping body tilt");
            return Some(target);
        };
        let heading = project_on_plane(&forward(body), &normal);
        target.orientation = look_rotation(&heading, &normal);
        if target.orientation.is_none() {
            warn!("body forward is normal to the support plane; skipping body tilt");
        }
        Some(target)
    }

    fn rates(&self) -> BodyRates {
        BodyRates {
            position: self.config.smooth_speed,
            rotation: self.config.smooth_speed,
        }
    }
}
