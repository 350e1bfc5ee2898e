//! Pose helpers shared by legs and body balancing.
//!
//! A [`Pose`] is an `Isometry3<f32>`: a translation plus a unit quaternion.
//! Using `UnitQuaternion` keeps orientations normalized by construction, so
//! every interpolation below works on valid rotations.

use std::f32::consts::PI;

use nalgebra::{Isometry3, Translation3, Unit, UnitQuaternion, Vector3};

/// Position + orientation.
pub type Pose = Isometry3<f32>;

/// Below this squared length a direction is treated as degenerate.
const DEGENERATE_EPS: f32 = 1.0e-10;

/// World up (+Y).
#[must_use]
pub fn world_up() -> Vector3<f32> {
    Vector3::y()
}

/// Build a pose from a position and an orientation.
#[must_use]
pub fn pose_from(position: Vector3<f32>, orientation: UnitQuaternion<f32>) -> Pose {
    Isometry3::from_parts(Translation3::from(position), orientation)
}

/// Pose at `position` with identity orientation.
#[must_use]
pub fn pose_at(position: Vector3<f32>) -> Pose {
    pose_from(position, UnitQuaternion::identity())
}

/// World-space position of a pose.
#[must_use]
pub fn position(pose: &Pose) -> Vector3<f32> {
    pose.translation.vector
}

/// The pose's forward axis (+Z rotated into world space).
#[must_use]
pub fn forward(pose: &Pose) -> Vector3<f32> {
    pose.rotation * Vector3::z()
}

/// Yaw (rotation about world up) of an orientation, in radians.
///
/// Measured from +Z toward +X, so `from_axis_angle(Y, yaw_of(q))` reproduces
/// the heading of `q` with pitch and roll removed.
#[must_use]
pub fn yaw_of(rotation: &UnitQuaternion<f32>) -> f32 {
    let f = rotation * Vector3::z();
    f.x.atan2(f.z)
}

/// Frame-rate scaled interpolation factor `dt * rate`, clamped to `[0, 1]`.
#[must_use]
pub fn smoothing_factor(dt: f32, rate: f32) -> f32 {
    let t = dt * rate;
    if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) }
}

/// Hermite smoothstep on `[0, 1]`: zero slope at both ends.
#[must_use]
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Linear interpolation between two points.
#[must_use]
pub fn lerp(a: &Vector3<f32>, b: &Vector3<f32>, t: f32) -> Vector3<f32> {
    if a == b {
        return *a;
    }
    a + (b - a) * t
}

/// Spherical interpolation between two orientations.
///
/// Takes the short arc. Nearly parallel inputs fall back to normalized
/// linear interpolation, where slerp is numerically ill-conditioned.
#[must_use]
pub fn slerp(a: &UnitQuaternion<f32>, b: &UnitQuaternion<f32>, t: f32) -> UnitQuaternion<f32> {
    if a == b {
        return *a;
    }
    a.try_slerp(b, t, 1.0e-6).unwrap_or_else(|| a.nlerp(b, t))
}

/// Move `current` toward `target` by fraction `t` of the remaining gap, in
/// position and orientation.
#[must_use]
pub fn smooth_toward(current: &Pose, target: &Pose, t: f32) -> Pose {
    pose_from(
        lerp(&position(current), &position(target), t),
        slerp(&current.rotation, &target.rotation, t),
    )
}

/// Shortest rotation taking direction `from` onto direction `to`.
///
/// Opposite directions rotate half a turn about an axis perpendicular to
/// `from`. Zero-length input yields the identity.
#[must_use]
pub fn from_to_rotation(from: &Vector3<f32>, to: &Vector3<f32>) -> UnitQuaternion<f32> {
    UnitQuaternion::rotation_between(from, to).unwrap_or_else(|| {
        let perp = if from.x.abs() < 0.9 {
            from.cross(&Vector3::x())
        } else {
            from.cross(&Vector3::z())
        };
        Unit::try_new(perp, DEGENERATE_EPS).map_or_else(UnitQuaternion::identity, |axis| {
            UnitQuaternion::from_axis_angle(&axis, PI)
        })
    })
}

/// Orientation whose +Z looks along `forward` and whose +Y leans toward `up`.
///
/// Returns `None` when `forward` is zero or parallel to `up`.
#[must_use]
pub fn look_rotation(forward: &Vector3<f32>, up: &Vector3<f32>) -> Option<UnitQuaternion<f32>> {
    if forward.norm_squared() < DEGENERATE_EPS || up.cross(forward).norm_squared() < DEGENERATE_EPS
    {
        return None;
    }
    Some(UnitQuaternion::face_towards(forward, up))
}

/// Remove the component of `v` along the plane normal `normal`.
#[must_use]
pub fn project_on_plane(v: &Vector3<f32>, normal: &Vector3<f32>) -> Vector3<f32> {
    let n2 = normal.norm_squared();
    if n2 < DEGENERATE_EPS {
        return *v;
    }
    v - normal * (v.dot(normal) / n2)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
