use nalgebra::Vector3;

/// Debug geometry for one leg: the ground ray and the committed foothold.
///
/// Purely observational. Produced only for legs with `debug_draw` set.
#[derive(Debug, Clone, PartialEq)]
pub struct LegDebug {
    pub leg: String,
    pub ray_start: Vector3<f32>,
    pub ray_end: Vector3<f32>,
    pub committed: Vector3<f32>,
}

impl LegDebug {
    /// Radius used when drawing the committed foothold marker.
    pub const MARKER_RADIUS: f32 = 0.05;
}
