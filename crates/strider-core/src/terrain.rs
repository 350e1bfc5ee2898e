//! Analytic ground surfaces.
//!
//! Enough geometry to walk a rig headless or in tests without a physics
//! engine: infinite planes, height fields given by a closure, and a
//! [`Terrain`] that layers several of them and reports the nearest hit.

use nalgebra::{Unit, Vector3};

use crate::sensor::{GroundContact, GroundRay, GroundSensor, SurfaceMask};

const PARALLEL_EPS: f32 = 1.0e-6;

// ---------------------------------------------------------------------------
// PlaneSurface
// ---------------------------------------------------------------------------

/// An infinite plane through `point` with normal `normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneSurface {
    pub point: Vector3<f32>,
    pub normal: Unit<Vector3<f32>>,
    pub layers: SurfaceMask,
}

impl PlaneSurface {
    /// Plane through `point` with the given (not necessarily unit) normal.
    ///
    /// A zero normal falls back to world up.
    #[must_use]
    pub fn new(point: Vector3<f32>, normal: Vector3<f32>) -> Self {
        Self {
            point,
            normal: Unit::try_new(normal, PARALLEL_EPS).unwrap_or_else(Vector3::y_axis),
            layers: SurfaceMask::DEFAULT,
        }
    }

    /// Flat floor at `height`.
    #[must_use]
    pub fn horizontal(height: f32) -> Self {
        Self::new(Vector3::new(0.0, height, 0.0), Vector3::y())
    }

    /// Place the surface on `layers`.
    #[must_use]
    pub const fn with_layers(mut self, layers: SurfaceMask) -> Self {
        self.layers = layers;
        self
    }
}

impl GroundSensor for PlaneSurface {
    fn probe(&self, ray: &GroundRay) -> Option<GroundContact> {
        if !ray.mask.intersects(self.layers) {
            return None;
        }
        let n = self.normal.into_inner();
        let denom = n.dot(&ray.direction.into_inner());
        if denom.abs() < PARALLEL_EPS {
            return None;
        }
        let distance = n.dot(&(self.point - ray.origin)) / denom;
        if !(0.0..=ray.max_distance).contains(&distance) {
            return None;
        }
        Some(GroundContact {
            point: ray.point_at(distance),
            normal: if denom > 0.0 { -n } else { n },
            distance,
        })
    }
}

// ---------------------------------------------------------------------------
// HeightField
// ---------------------------------------------------------------------------

/// Ground given by a height function `y = f(x, z)`.
///
/// Rays are marched in `march_step` increments until they pass below the
/// surface, then the crossing is refined by bisection. The normal comes
/// from central differences of `f`.
pub struct HeightField<F> {
    height: F,
    march_step: f32,
    layers: SurfaceMask,
}

impl<F: Fn(f32, f32) -> f32> HeightField<F> {
    /// Height field with a 5 cm march step.
    pub fn new(height: F) -> Self {
        Self {
            height,
            march_step: 0.05,
            layers: SurfaceMask::DEFAULT,
        }
    }

    /// Set the ray-march resolution. Non-positive values are ignored.
    #[must_use]
    pub fn with_march_step(mut self, step: f32) -> Self {
        if step > 0.0 {
            self.march_step = step;
        }
        self
    }

    /// Place the surface on `layers`.
    #[must_use]
    pub fn with_layers(mut self, layers: SurfaceMask) -> Self {
        self.layers = layers;
        self
    }

    /// Surface height at `(x, z)`.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        (self.height)(x, z)
    }

    /// Upward unit normal at `(x, z)`.
    pub fn normal_at(&self, x: f32, z: f32) -> Vector3<f32> {
        const H: f32 = 1.0e-3;
        let dx = (self.height_at(x + H, z) - self.height_at(x - H, z)) / (2.0 * H);
        let dz = (self.height_at(x, z + H) - self.height_at(x, z - H)) / (2.0 * H);
        Vector3::new(-dx, 1.0, -dz).normalize()
    }

    /// Signed height of a point above the surface.
    fn clearance(&self, p: &Vector3<f32>) -> f32 {
        p.y - self.height_at(p.x, p.z)
    }
}

impl<F: Fn(f32, f32) -> f32> GroundSensor for HeightField<F> {
    fn probe(&self, ray: &GroundRay) -> Option<GroundContact> {
        if !ray.mask.intersects(self.layers) || ray.max_distance <= 0.0 {
            return None;
        }
        // Starting underground is not a hit, the same as a ray that starts
        // inside a solid.
        if self.clearance(&ray.origin) < 0.0 {
            return None;
        }

        let mut d = 0.0_f32;
        let (mut lo, mut hi) = loop {
            if d >= ray.max_distance {
                return None;
            }
            let next = (d + self.march_step).min(ray.max_distance);
            if self.clearance(&ray.point_at(next)) <= 0.0 {
                break (d, next);
            }
            d = next;
        };

        for _ in 0..24 {
            let mid = 0.5 * (lo + hi);
            if self.clearance(&ray.point_at(mid)) > 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        let point = ray.point_at(hi);
        let mut normal = self.normal_at(point.x, point.z);
        if normal.dot(&ray.direction.into_inner()) > 0.0 {
            normal = -normal;
        }
        Some(GroundContact {
            point,
            normal,
            distance: hi,
        })
    }
}

// ---------------------------------------------------------------------------
// Terrain
// ---------------------------------------------------------------------------

/// An ordered set of surfaces queried together.
///
/// Reports the nearest contact among all surfaces the ray's mask can see.
#[derive(Default)]
pub struct Terrain {
    surfaces: Vec<Box<dyn GroundSensor + Send + Sync>>,
}

impl Terrain {
    /// Empty terrain (never hits).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a surface.
    #[must_use]
    pub fn with(mut self, surface: impl GroundSensor + Send + Sync + 'static) -> Self {
        self.push(surface);
        self
    }

    /// Add a surface in place.
    pub fn push(&mut self, surface: impl GroundSensor + Send + Sync + 'static) {
        self.surfaces.push(Box::new(surface));
    }

    /// Number of surfaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    /// Whether there are no surfaces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

impl GroundSensor for Terrain {
    fn probe(&self, ray: &GroundRay) -> Option<GroundContact> {
        let mut best: Option<GroundContact> = None;
        for surface in &self.surfaces {
            if let Some(hit) = surface.probe(ray) {
                if best.as_ref().is_none_or(|b| hit.distance < b.distance) {
                    best = Some(hit);
                }
            }
        }
        best
    }
}

impl std::fmt::Debug for Terrain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Terrain")
            .field("surfaces", &self.surfaces.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
