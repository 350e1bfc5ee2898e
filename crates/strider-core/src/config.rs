use std::collections::HashSet;

use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::pose::{Pose, pose_from};
use crate::sensor::SurfaceMask;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_step_distance() -> f32 {
    0.8
}
const fn default_step_height() -> f32 {
    0.25
}
const fn default_step_duration() -> f32 {
    0.18
}
const fn default_ray_origin_offset() -> [f32; 3] {
    [0.0, 0.5, 0.0]
}
const fn default_ray_distance() -> f32 {
    3.0
}
const fn default_orientation() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}
const fn default_height_offset() -> f32 {
    0.6
}
const fn default_body_adjust_speed() -> f32 {
    5.0
}
const fn default_pitch_gain() -> f32 {
    2.0
}
const fn default_max_pitch_deg() -> f32 {
    20.0
}
const fn default_plane_fit_speed() -> f32 {
    6.0
}
const fn default_min_step_interval() -> f32 {
    0.06
}
const fn default_move_speed() -> f32 {
    3.0
}
const fn default_rotate_speed_deg() -> f32 {
    90.0
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn require_positive(field: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{value} (must be > 0)")))
    }
}

fn require_non_negative(field: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{value} (must be >= 0)")))
    }
}

fn require_finite(field: &str, values: &[f32]) -> Result<(), ConfigError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{values:?} (must be finite)")))
    }
}

// ---------------------------------------------------------------------------
// PoseConfig
// ---------------------------------------------------------------------------

/// Serializable pose: position `[x, y, z]` plus quaternion `[x, y, z, w]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseConfig {
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default = "default_orientation")]
    pub orientation: [f32; 4],
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            orientation: default_orientation(),
        }
    }
}

impl PoseConfig {
    /// Pose at `position` with identity orientation.
    #[must_use]
    pub const fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            orientation: default_orientation(),
        }
    }

    /// Check the values are finite and the quaternion is not zero.
    pub fn validate(&self, field: &str) -> Result<(), ConfigError> {
        require_finite(&format!("{field}.position"), &self.position)?;
        require_finite(&format!("{field}.orientation"), &self.orientation)?;
        let [x, y, z, w] = self.orientation;
        if x * x + y * y + z * z + w * w < 1.0e-12 {
            return Err(ConfigError::invalid(
                format!("{field}.orientation"),
                "zero quaternion",
            ));
        }
        Ok(())
    }

    /// Convert to a [`Pose`], normalizing the quaternion.
    #[must_use]
    pub fn to_pose(&self) -> Pose {
        let [px, py, pz] = self.position;
        let [x, y, z, w] = self.orientation;
        pose_from(
            Vector3::new(px, py, pz),
            UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z)),
        )
    }
}

// ---------------------------------------------------------------------------
// StepConfig
// ---------------------------------------------------------------------------

/// Per-leg stepping parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepConfig {
    /// Distance between the committed foothold and the sensed ground point
    /// that triggers a new step (default: 0.8).
    #[serde(default = "default_step_distance")]
    pub step_distance: f32,

    /// Peak height of the step arc above the straight path (default: 0.25).
    #[serde(default = "default_step_height")]
    pub step_height: f32,

    /// Step duration in seconds (default: 0.18).
    #[serde(default = "default_step_duration")]
    pub step_duration: f32,

    /// Ray origin offset in the emitter's local frame (default: `[0, 0.5, 0]`).
    #[serde(default = "default_ray_origin_offset")]
    pub ray_origin_offset: [f32; 3],

    /// Maximum ground ray length (default: 3.0).
    #[serde(default = "default_ray_distance")]
    pub ray_distance: f32,

    /// Surface layers counted as ground (default: all).
    #[serde(default)]
    pub surface_mask: SurfaceMask,

    /// Publish debug shapes for this leg.
    #[serde(default)]
    pub debug_draw: bool,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            step_distance: default_step_distance(),
            step_height: default_step_height(),
            step_duration: default_step_duration(),
            ray_origin_offset: default_ray_origin_offset(),
            ray_distance: default_ray_distance(),
            surface_mask: SurfaceMask::ALL,
            debug_draw: false,
        }
    }
}

impl StepConfig {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_negative("step_distance", self.step_distance)?;
        require_finite("step_height", &[self.step_height])?;
        require_positive("step_duration", self.step_duration)?;
        require_finite("ray_origin_offset", &self.ray_origin_offset)?;
        require_non_negative("ray_distance", self.ray_distance)?;
        Ok(())
    }

    /// Ray origin offset as a vector.
    #[must_use]
    pub fn ray_offset(&self) -> Vector3<f32> {
        let [x, y, z] = self.ray_origin_offset;
        Vector3::new(x, y, z)
    }
}

// ---------------------------------------------------------------------------
// LegConfig
// ---------------------------------------------------------------------------

/// One leg of a rig.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegConfig {
    pub name: String,

    /// Emitter pose relative to the body. Negative X puts the leg on the
    /// left side.
    #[serde(default)]
    pub mount: PoseConfig,

    /// Initial world-space foot target. A leg without one is disabled.
    #[serde(default)]
    pub foot_target: Option<PoseConfig>,

    /// Rest pose relative to the body, used when no ground is sensed.
    #[serde(default)]
    pub rest: Option<PoseConfig>,

    #[serde(default)]
    pub step: StepConfig,
}

impl LegConfig {
    /// Leg with default stepping, mounted at `mount` and standing on `foot`.
    pub fn new(name: impl Into<String>, mount: [f32; 3], foot: [f32; 3]) -> Self {
        Self {
            name: name.into(),
            mount: PoseConfig::at(mount),
            foot_target: Some(PoseConfig::at(foot)),
            rest: None,
            step: StepConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::MissingField("legs.name".into()));
        }
        self.mount.validate(&format!("{}.mount", self.name))?;
        if let Some(foot) = &self.foot_target {
            foot.validate(&format!("{}.foot_target", self.name))?;
        }
        if let Some(rest) = &self.rest {
            rest.validate(&format!("{}.rest", self.name))?;
        }
        self.step.validate()
    }
}

// ---------------------------------------------------------------------------
// BalanceConfig
// ---------------------------------------------------------------------------

/// Body balancing from the left/right split of foot heights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitBalanceConfig {
    /// Body height above the mean foot height (default: 0.6).
    #[serde(default = "default_height_offset")]
    pub height_offset: f32,
    /// Position smoothing rate, 1/s (default: 5).
    #[serde(default = "default_body_adjust_speed")]
    pub position_speed: f32,
    /// Orientation smoothing rate, 1/s (default: 5).
    #[serde(default = "default_body_adjust_speed")]
    pub rotation_speed: f32,
    /// Degrees of pitch per unit of left/right height difference (default: 2).
    #[serde(default = "default_pitch_gain")]
    pub pitch_gain: f32,
    /// Symmetric pitch limit in degrees (default: 20).
    #[serde(default = "default_max_pitch_deg")]
    pub max_pitch_deg: f32,
}

impl Default for SplitBalanceConfig {
    fn default() -> Self {
        Self {
            height_offset: default_height_offset(),
            position_speed: default_body_adjust_speed(),
            rotation_speed: default_body_adjust_speed(),
            pitch_gain: default_pitch_gain(),
            max_pitch_deg: default_max_pitch_deg(),
        }
    }
}

/// Body alignment to the plane through the first three feet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneFitConfig {
    /// Body height above the mean foot height (default: 0.6).
    #[serde(default = "default_height_offset")]
    pub height_offset: f32,
    /// Smoothing rate for position and orientation, 1/s (default: 6).
    #[serde(default = "default_plane_fit_speed")]
    pub smooth_speed: f32,
    /// Flip the support normal to the body's up side instead of following
    /// the winding of the first three feet (default: false).
    #[serde(default)]
    pub orient_normal_up: bool,
}

impl Default for PlaneFitConfig {
    fn default() -> Self {
        Self {
            height_offset: default_height_offset(),
            smooth_speed: default_plane_fit_speed(),
            orient_normal_up: false,
        }
    }
}

/// Which balancing strategy drives the body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum BalanceConfig {
    Split(SplitBalanceConfig),
    PlaneFit(PlaneFitConfig),
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self::Split(SplitBalanceConfig::default())
    }
}

impl BalanceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Split(cfg) => {
                require_finite("balance.height_offset", &[cfg.height_offset])?;
                require_non_negative("balance.position_speed", cfg.position_speed)?;
                require_non_negative("balance.rotation_speed", cfg.rotation_speed)?;
                require_finite("balance.pitch_gain", &[cfg.pitch_gain])?;
                require_non_negative("balance.max_pitch_deg", cfg.max_pitch_deg)
            }
            Self::PlaneFit(cfg) => {
                require_finite("balance.height_offset", &[cfg.height_offset])?;
                require_non_negative("balance.smooth_speed", cfg.smooth_speed)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// PacingConfig
// ---------------------------------------------------------------------------

/// How the shared step-request timestamp is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacingMode {
    /// The coordinator only observes and refreshes the timestamp; legs
    /// decide to step on their own.
    #[default]
    Advisory,
    /// Legs may only start a step when the minimum interval has passed since
    /// the last granted step of any leg.
    Gated,
}

/// Global step pacing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Minimum time between step requests across all legs (default: 0.06 s).
    #[serde(default = "default_min_step_interval")]
    pub min_step_interval: f32,
    #[serde(default)]
    pub mode: PacingMode,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_step_interval: default_min_step_interval(),
            mode: PacingMode::Advisory,
        }
    }
}

impl PacingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_negative("pacing.min_step_interval", self.min_step_interval)
    }
}

// ---------------------------------------------------------------------------
// DriveConfig
// ---------------------------------------------------------------------------

/// Directional body driver speeds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriveConfig {
    /// Forward speed at full input, m/s (default: 3).
    #[serde(default = "default_move_speed")]
    pub move_speed: f32,
    /// Turn rate at full input, degrees/s (default: 90).
    #[serde(default = "default_rotate_speed_deg")]
    pub rotate_speed_deg: f32,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            move_speed: default_move_speed(),
            rotate_speed_deg: default_rotate_speed_deg(),
        }
    }
}

impl DriveConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_finite("drive.move_speed", &[self.move_speed])?;
        require_finite("drive.rotate_speed_deg", &[self.rotate_speed_deg])
    }
}

// ---------------------------------------------------------------------------
// RigConfig
// ---------------------------------------------------------------------------

/// Complete rig description loaded from TOML.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RigConfig {
    /// Initial body pose in world space.
    #[serde(default)]
    pub body: PoseConfig,
    #[serde(default)]
    pub legs: Vec<LegConfig>,
    #[serde(default)]
    pub balance: BalanceConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub drive: DriveConfig,
}

impl RigConfig {
    /// Validate every section. Leg names must be unique.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.body.validate("body")?;
        let mut seen = HashSet::new();
        for leg in &self.legs {
            leg.validate()?;
            if !seen.insert(leg.name.as_str()) {
                return Err(ConfigError::DuplicateLeg(leg.name.clone()));
            }
        }
        self.balance.validate()?;
        self.pacing.validate()?;
        self.drive.validate()
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config
            .validate()
            .inspect_err(|err| warn!("rejected rig config: {err}"))?;
        debug!(legs = config.legs.len(), "rig config loaded");
        Ok(config)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "reading rig config");
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // ---- defaults ----

    #[test]
    fn step_config_default_values() {
        let cfg = StepConfig::default();
        assert!((cfg.step_distance - 0.8).abs() < f32::EPSILON);
        assert!((cfg.step_height - 0.25).abs() < f32::EPSILON);
        assert!((cfg.step_duration - 0.18).abs() < f32::EPSILON);
        assert_eq!(cfg.ray_origin_offset, [0.0, 0.5, 0.0]);
        assert!((cfg.ray_distance - 3.0).abs() < f32::EPSILON);
        assert_eq!(cfg.surface_mask, SurfaceMask::ALL);
        assert!(!cfg.debug_draw);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn balance_defaults_to_split() {
        let BalanceConfig::Split(split) = BalanceConfig::default() else {
            panic!("expected split balance");
        };
        assert!((split.height_offset - 0.6).abs() < f32::EPSILON);
        assert!((split.max_pitch_deg - 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn pacing_defaults_to_advisory() {
        let cfg = PacingConfig::default();
        assert_eq!(cfg.mode, PacingMode::Advisory);
        assert!((cfg.min_step_interval - 0.06).abs() < f32::EPSILON);
    }

    // ---- validation ----

    #[test]
    fn step_duration_must_be_positive() {
        let cfg = StepConfig {
            step_duration: 0.0,
            ..StepConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "step_duration"));
    }

    #[test]
    fn negative_ray_distance_rejected() {
        let cfg = StepConfig {
            ray_distance: -1.0,
            ..StepConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn nan_step_distance_rejected() {
        let cfg = StepConfig {
            step_distance: f32::NAN,
            ..StepConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_quaternion_rejected() {
        let pose = PoseConfig {
            position: [0.0; 3],
            orientation: [0.0; 4],
        };
        assert!(pose.validate("body").is_err());
    }

    #[test]
    fn empty_leg_name_rejected() {
        let leg = LegConfig::new("  ", [0.0; 3], [0.0; 3]);
        assert!(matches!(leg.validate(), Err(ConfigError::MissingField(_))));
    }

    #[test]
    fn duplicate_leg_names_rejected() {
        let cfg = RigConfig {
            legs: vec![
                LegConfig::new("a", [-0.5, 0.0, 0.5], [-1.0, 0.0, 1.0]),
                LegConfig::new("a", [0.5, 0.0, 0.5], [1.0, 0.0, 1.0]),
            ],
            ..RigConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::DuplicateLeg(name)) if name == "a"));
    }

    #[test]
    fn missing_foot_target_is_not_a_validation_error() {
        let mut leg = LegConfig::new("front_left", [-0.5, 0.0, 0.5], [0.0; 3]);
        leg.foot_target = None;
        assert!(leg.validate().is_ok());
    }

    // ---- conversion ----

    #[test]
    fn pose_config_normalizes_quaternion() {
        let pose = PoseConfig {
            position: [1.0, 2.0, 3.0],
            orientation: [0.0, 2.0, 0.0, 0.0],
        }
        .to_pose();
        assert_relative_eq!(pose.translation.vector, Vector3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(pose.rotation.quaternion().norm(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(pose.rotation.angle(), std::f32::consts::PI, epsilon = 1e-5);
    }

    // ---- TOML ----

    #[test]
    fn parse_minimal_rig() {
        let cfg = RigConfig::from_toml_str(
            r#"
            [[legs]]
            name = "front_left"
            mount = { position = [-0.4, 0.0, 0.5] }
            foot_target = { position = [-1.0, 0.0, 0.8] }
            "#,
        )
        .unwrap();
        assert_eq!(cfg.legs.len(), 1);
        assert_eq!(cfg.legs[0].step, StepConfig::default());
        assert_eq!(cfg.balance, BalanceConfig::default());
    }

    #[test]
    fn parse_plane_fit_and_gated_pacing() {
        let cfg = RigConfig::from_toml_str(
            r#"
            [balance]
            strategy = "plane_fit"
            smooth_speed = 4.0

            [pacing]
            mode = "gated"
            min_step_interval = 0.1

            [[legs]]
            name = "a"
            [legs.step]
            step_distance = 0.3
            surface_mask = 6
            debug_draw = true
            "#,
        )
        .unwrap();
        let BalanceConfig::PlaneFit(fit) = cfg.balance else {
            panic!("expected plane fit");
        };
        assert!((fit.smooth_speed - 4.0).abs() < f32::EPSILON);
        assert!((fit.height_offset - 0.6).abs() < f32::EPSILON);
        assert!(!fit.orient_normal_up);
        assert_eq!(cfg.pacing.mode, PacingMode::Gated);
        assert_eq!(cfg.legs[0].step.surface_mask, SurfaceMask(6));
        assert!(cfg.legs[0].step.debug_draw);
        assert!(cfg.legs[0].foot_target.is_none());
    }

    #[test]
    fn parse_rejects_invalid_values() {
        let err = RigConfig::from_toml_str(
            r#"
            [[legs]]
            name = "a"
            [legs.step]
            step_duration = -0.2
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn parse_rejects_malformed_toml() {
        let err = RigConfig::from_toml_str("legs = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn from_file_missing_is_io_error() {
        let err = RigConfig::from_file("/definitely/not/here/rig.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
