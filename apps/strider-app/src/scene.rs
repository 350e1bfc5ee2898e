//! Built-in rigs and terrains for the CLI.

use clap::ValueEnum;
use nalgebra::Vector3;

use strider_core::config::{
    BalanceConfig, LegConfig, PacingMode, PlaneFitConfig, PoseConfig, RigConfig,
    SplitBalanceConfig,
};
use strider_core::terrain::{HeightField, PlaneSurface, Terrain};

// ---------------------------------------------------------------------------
// Terrain
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TerrainKind {
    /// Level floor at y = 0.
    Flat,
    /// Plane rising 0.2 per metre along +Z.
    Slope,
    /// Rolling sine hills.
    Hills,
    /// Stairs 0.15 high every 0.6 along +Z.
    Steps,
}

pub fn build_terrain(kind: TerrainKind) -> Terrain {
    match kind {
        TerrainKind::Flat => Terrain::new().with(PlaneSurface::horizontal(0.0)),
        TerrainKind::Slope => Terrain::new().with(PlaneSurface::new(
            Vector3::zeros(),
            Vector3::new(0.0, 1.0, -0.2),
        )),
        TerrainKind::Hills => Terrain::new().with(HeightField::new(|x: f32, z: f32| {
            0.25 * (0.7 * x).sin() + 0.2 * (0.45 * z).cos() - 0.2
        })),
        TerrainKind::Steps => Terrain::new().with(
            HeightField::new(|_x: f32, z: f32| 0.15 * (z / 0.6).floor().max(0.0))
                .with_march_step(0.02),
        ),
    }
}

// ---------------------------------------------------------------------------
// Rigs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    Split,
    PlaneFit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Pacing {
    Advisory,
    Gated,
}

impl From<Pacing> for PacingMode {
    fn from(p: Pacing) -> Self {
        match p {
            Pacing::Advisory => Self::Advisory,
            Pacing::Gated => Self::Gated,
        }
    }
}

fn leg(name: &str, x: f32, z: f32) -> LegConfig {
    let mut cfg = LegConfig::new(name, [x, 0.0, z], [x * 1.6, 0.0, z * 1.6]);
    cfg.rest = Some(PoseConfig::at([x * 1.4, -0.6, z * 1.4]));
    cfg
}

/// A rig with `legs` legs (4 or 6) split evenly between the sides. The first
/// three legs wind counter-clockwise seen from above for the plane fit.
pub fn build_rig(legs: u8, strategy: Strategy, pacing: Pacing) -> RigConfig {
    let legs = if legs >= 6 {
        vec![
            leg("left_front", -0.5, 0.6),
            leg("right_front", 0.5, 0.6),
            leg("left_rear", -0.5, -0.6),
            leg("right_rear", 0.5, -0.6),
            leg("left_middle", -0.6, 0.0),
            leg("right_middle", 0.6, 0.0),
        ]
    } else {
        vec![
            leg("front_left", -0.5, 0.5),
            leg("front_right", 0.5, 0.5),
            leg("rear_left", -0.5, -0.5),
            leg("rear_right", 0.5, -0.5),
        ]
    };
    let mut cfg = RigConfig {
        body: PoseConfig::at([0.0, 0.6, 0.0]),
        legs,
        ..RigConfig::default()
    };
    cfg.balance = match strategy {
        Strategy::Split => BalanceConfig::Split(SplitBalanceConfig::default()),
        Strategy::PlaneFit => BalanceConfig::PlaneFit(PlaneFitConfig::default()),
    };
    cfg.pacing.mode = pacing.into();
    cfg
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use strider_core::sensor::{GroundRay, GroundSensor, SurfaceMask};
    use strider_gait::GaitCoordinator;

    fn height_under(terrain: &Terrain, x: f32, z: f32) -> Option<f32> {
        let ray = GroundRay::downward(Vector3::new(x, 5.0, z), 10.0, SurfaceMask::ALL);
        terrain.probe(&ray).map(|c| c.point.y)
    }

    #[test]
    fn every_terrain_has_ground_near_origin() {
        for kind in [TerrainKind::Flat, TerrainKind::Slope, TerrainKind::Hills, TerrainKind::Steps] {
            assert!(height_under(&build_terrain(kind), 0.3, 0.3).is_some(), "{kind:?}");
        }
    }

    #[test]
    fn steps_rise_along_z() {
        let terrain = build_terrain(TerrainKind::Steps);
        assert_relative_eq!(height_under(&terrain, 0.0, 0.3).unwrap(), 0.0, epsilon = 1e-4);
        assert_relative_eq!(height_under(&terrain, 0.0, 1.5).unwrap(), 0.3, epsilon = 1e-4);
    }

    #[test]
    fn built_rigs_validate() {
        for legs in [4, 6] {
            for strategy in [Strategy::Split, Strategy::PlaneFit] {
                let cfg = build_rig(legs, strategy, Pacing::Gated);
                assert!(cfg.validate().is_ok());
                assert_eq!(cfg.legs.len(), usize::from(legs));
                assert_eq!(cfg.pacing.mode, PacingMode::Gated);
            }
        }
    }

    #[test]
    fn plane_fit_rigs_start_level() {
        for legs in [4, 6] {
            let cfg = build_rig(legs, Strategy::PlaneFit, Pacing::Advisory);
            let mut rig = GaitCoordinator::from_config(&cfg).unwrap();
            let floor = build_terrain(TerrainKind::Flat);
            for _ in 0..30 {
                rig.tick(1.0 / 60.0, &floor);
            }
            let up = rig.body().rotation * Vector3::y();
            assert_relative_eq!(up, Vector3::y(), epsilon = 1e-4);
        }
    }
}
