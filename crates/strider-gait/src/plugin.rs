//! Bevy ECS plugin for procedural gait.
//!
//! Provides [`StriderPlugin`], which ticks every [`GaitRig`] once per frame
//! against the [`Ground`] resource, writes the body pose back to the rig
//! entity's `Transform`, moves [`FootTarget`] entities onto their legs' foot
//! targets and draws the debug surface with gizmos.

use bevy::prelude::*;
use nalgebra::{Quaternion, UnitQuaternion, Vector3};

use strider_core::pose::{Pose, pose_from};
use strider_core::sensor::{GroundSensor, NoGround};

use crate::coordinator::GaitCoordinator;
use crate::debug::LegDebug;
use crate::drive::{BodyDriver, DriveInput};

/// Bevy plugin for procedural gait.
///
/// Insert a [`Ground`] resource to give legs something to stand on; without
/// one every ray misses.
pub struct StriderPlugin;

impl Plugin for StriderPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (tick_rigs, sync_foot_targets, draw_leg_debug).chain(),
        );
    }
}

/// World geometry the legs sense.
#[derive(Resource)]
pub struct Ground(pub Box<dyn GroundSensor + Send + Sync>);

impl Ground {
    pub fn new(sensor: impl GroundSensor + Send + Sync + 'static) -> Self {
        Self(Box::new(sensor))
    }
}

/// A legged body driven by a [`GaitCoordinator`].
///
/// The entity's `Transform` is overwritten from the coordinator's body pose
/// every frame.
#[derive(Component, Debug)]
pub struct GaitRig {
    pub coordinator: GaitCoordinator,
    pub driver: BodyDriver,
    /// Drive input applied before each tick. Set by the host's input system.
    pub input: DriveInput,
}

impl GaitRig {
    pub fn new(coordinator: GaitCoordinator) -> Self {
        Self {
            coordinator,
            driver: BodyDriver::default(),
            input: DriveInput::default(),
        }
    }
}

/// Marks an entity that follows one leg's foot target.
#[derive(Component, Debug, Clone, Copy)]
pub struct FootTarget {
    pub rig: Entity,
    pub leg: usize,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Convert a pose to a Bevy transform (unit scale).
pub fn pose_to_transform(pose: &Pose) -> Transform {
    let t = pose.translation.vector;
    let q = pose.rotation.coords;
    Transform::from_translation(Vec3::new(t.x, t.y, t.z))
        .with_rotation(Quat::from_xyzw(q.x, q.y, q.z, q.w))
}

/// Convert a Bevy transform to a pose, ignoring scale.
pub fn transform_to_pose(transform: &Transform) -> Pose {
    let t = transform.translation;
    let q = transform.rotation;
    pose_from(
        Vector3::new(t.x, t.y, t.z),
        UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z)),
    )
}

fn to_vec3(v: &Vector3<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

#[allow(clippy::needless_pass_by_value)]
fn tick_rigs(
    time: Res<Time>,
    ground: Option<Res<Ground>>,
    mut rigs: Query<(&mut GaitRig, &mut Transform)>,
) {
    let dt = time.delta_secs();
    let sensor: &dyn GroundSensor = match &ground {
        Some(ground) => ground.0.as_ref(),
        None => &NoGround,
    };

    for (mut rig, mut transform) in &mut rigs {
        let rig = &mut *rig;
        rig.driver.drive(rig.coordinator.body_mut(), rig.input, dt);
        rig.coordinator.tick(dt, sensor);
        *transform = pose_to_transform(rig.coordinator.body()).with_scale(transform.scale);
    }
}

fn sync_foot_targets(
    rigs: Query<&GaitRig>,
    mut feet: Query<(&FootTarget, &mut Transform), Without<GaitRig>>,
) {
    for (foot, mut transform) in &mut feet {
        let Ok(rig) = rigs.get(foot.rig) else {
            continue;
        };
        let Some(target) = rig.coordinator.leg(foot.leg).and_then(|l| l.foot_target()) else {
            continue;
        };
        *transform = pose_to_transform(target).with_scale(transform.scale);
    }
}

fn draw_leg_debug(mut gizmos: Gizmos, rigs: Query<&GaitRig>) {
    let color = Color::srgb(0.0, 1.0, 1.0);
    for rig in &rigs {
        for shape in rig.coordinator.debug_shapes() {
            gizmos.line(to_vec3(&shape.ray_start), to_vec3(&shape.ray_end), color);
            gizmos.sphere(
                Isometry3d::from_translation(to_vec3(&shape.committed)),
                LegDebug::MARKER_RADIUS,
                color,
            );
        }
    }
}
