//! Leg and rig builders for tests.
//!
//! All rigs face +Z with the body 0.6 above level ground at y = 0 and every
//! foot planted under its mount, pushed outward.

use nalgebra::Vector3;
use strider_core::config::{LegConfig, PoseConfig, RigConfig};
use strider_core::pose::pose_at;
use strider_gait::{GaitCoordinator, Leg};

/// Leg with default stepping, mounted at `mount` and standing on `foot`.
pub fn leg_at(name: &str, mount: [f32; 3], foot: [f32; 3]) -> Leg {
    Leg::new(
        name,
        pose_at(Vector3::from(mount)),
        Some(pose_at(Vector3::from(foot))),
    )
}

fn leg_config(name: &str, x: f32, z: f32) -> LegConfig {
    LegConfig::new(name, [x, 0.0, z], [x * 1.6, 0.0, z * 1.6])
}

/// Four legs: front_left, front_right, rear_left, rear_right.
pub fn quadruped_config() -> RigConfig {
    RigConfig {
        body: PoseConfig::at([0.0, 0.6, 0.0]),
        legs: vec![
            leg_config("front_left", -0.5, 0.5),
            leg_config("front_right", 0.5, 0.5),
            leg_config("rear_left", -0.5, -0.5),
            leg_config("rear_right", 0.5, -0.5),
        ],
        ..RigConfig::default()
    }
}

/// Coordinator built from [`quadruped_config`].
pub fn quadruped_rig() -> GaitCoordinator {
    GaitCoordinator::from_config(&quadruped_config()).expect("quadruped fixture is valid")
}

/// Six legs, three per side. The first three span both sides
/// counter-clockwise seen from above, so a plane fit over them is upright.
pub fn hexapod_rig() -> GaitCoordinator {
    let cfg = RigConfig {
        body: PoseConfig::at([0.0, 0.6, 0.0]),
        legs: vec![
            leg_config("left_front", -0.5, 0.6),
            leg_config("right_front", 0.5, 0.6),
            leg_config("left_rear", -0.5, -0.6),
            leg_config("right_rear", 0.5, -0.6),
            leg_config("left_middle", -0.6, 0.0),
            leg_config("right_middle", 0.6, 0.0),
        ],
        ..RigConfig::default()
    };
    GaitCoordinator::from_config(&cfg).expect("hexapod fixture is valid")
}
