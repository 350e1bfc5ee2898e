//! Ground-contact sensing interface.
//!
//! Legs never intersect geometry themselves. Each tick they build a
//! [`GroundRay`] and hand it to a [`GroundSensor`], which answers with an
//! optional [`GroundContact`]. Engine integrations implement the trait on top
//! of their physics queries; [`crate::terrain`] provides analytic surfaces.

use std::ops::{BitAnd, BitOr};
use std::sync::Arc;

use nalgebra::{Unit, Vector3};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SurfaceMask
// ---------------------------------------------------------------------------

/// Bit set of surface layers a ray may hit.
///
/// Surfaces live on one or more layers; a ray only reports contacts with
/// surfaces whose layers intersect its mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SurfaceMask(pub u32);

impl SurfaceMask {
    /// Every layer.
    pub const ALL: Self = Self(u32::MAX);
    /// No layer. Rays with this mask never hit anything.
    pub const NONE: Self = Self(0);
    /// The layer surfaces are placed on unless told otherwise.
    pub const DEFAULT: Self = Self(1);

    /// Mask containing only layer `index` (0..32). Out-of-range is empty.
    #[must_use]
    pub const fn layer(index: u32) -> Self {
        if index < 32 { Self(1 << index) } else { Self::NONE }
    }

    /// Whether the two masks share at least one layer.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Whether no layer is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for SurfaceMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl BitOr for SurfaceMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for SurfaceMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

// ---------------------------------------------------------------------------
// GroundRay / GroundContact
// ---------------------------------------------------------------------------

/// A bounded ray cast against the ground.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundRay {
    /// World-space start point.
    pub origin: Vector3<f32>,
    /// Unit direction of travel.
    pub direction: Unit<Vector3<f32>>,
    /// Contacts farther than this along the ray are ignored.
    pub max_distance: f32,
    /// Layers this ray can hit.
    pub mask: SurfaceMask,
}

impl GroundRay {
    /// Ray pointing straight down (−Y) from `origin`.
    #[must_use]
    pub fn downward(origin: Vector3<f32>, max_distance: f32, mask: SurfaceMask) -> Self {
        Self {
            origin,
            direction: Unit::new_unchecked(-Vector3::y()),
            max_distance,
            mask,
        }
    }

    /// Point at `distance` along the ray.
    #[must_use]
    pub fn point_at(&self, distance: f32) -> Vector3<f32> {
        self.origin + self.direction.into_inner() * distance
    }

    /// Far end of the ray.
    #[must_use]
    pub fn end(&self) -> Vector3<f32> {
        self.point_at(self.max_distance)
    }
}

/// Where a ground ray met a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundContact {
    /// World-space contact point.
    pub point: Vector3<f32>,
    /// Unit surface normal at the contact, facing the ray origin.
    pub normal: Vector3<f32>,
    /// Distance from the ray origin to `point`.
    pub distance: f32,
}

// ---------------------------------------------------------------------------
// GroundSensor
// ---------------------------------------------------------------------------

/// Answers ground queries for legs.
///
/// Implementations must be stateless per call from the caller's point of
/// view: the same ray against the same world gives the same answer.
pub trait GroundSensor {
    /// Cast `ray` and return the nearest contact within its range, if any.
    fn probe(&self, ray: &GroundRay) -> Option<GroundContact>;
}

impl<T: GroundSensor + ?Sized> GroundSensor for &T {
    fn probe(&self, ray: &GroundRay) -> Option<GroundContact> {
        (**self).probe(ray)
    }
}

impl<T: GroundSensor + ?Sized> GroundSensor for Box<T> {
    fn probe(&self, ray: &GroundRay) -> Option<GroundContact> {
        (**self).probe(ray)
    }
}

impl<T: GroundSensor + ?Sized> GroundSensor for Arc<T> {
    fn probe(&self, ray: &GroundRay) -> Option<GroundContact> {
        (**self).probe(ray)
    }
}

/// A world with nothing to stand on.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGround;

impl GroundSensor for NoGround {
    fn probe(&self, _ray: &GroundRay) -> Option<GroundContact> {
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
