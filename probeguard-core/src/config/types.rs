//! Configuration type definitions
//!
//! These types represent the probe station setup. They are loaded once at
//! startup (see the `probeguard-config` crate for the TOML loader) and are
//! never mutated by planning.

use heapless::{String, Vec};

use crate::collision::BoundingBoxRegistry;
use crate::geometry::{BoundingPolygon, Point2D};
use crate::motion::{ManipulatorIndex, DEFAULT_EPSILON_UM, MAX_MANIPULATORS, MAX_TRAJECTORY_STEPS};
use crate::planner::MotionPlanner;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum label length
pub const MAX_LABEL_LEN: usize = 24;

/// Current setup format version
pub const SETUP_VERSION: u8 = 1;

/// Default number of samples per straight-line move
pub const DEFAULT_TRAJECTORY_STEPS: u16 = 10;

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SetupError {
    /// Two manipulator entries share an index
    DuplicateIndex(ManipulatorIndex),
    /// Trajectory step count is zero or above the supported maximum
    InvalidSteps,
    /// Epsilon is negative or not finite
    InvalidEpsilon,
    /// Sample spacing is not a positive finite distance
    InvalidSpacing,
    /// Setup version is not supported
    VersionMismatch,
    /// More manipulators than the bus supports
    TooManyManipulators,
}

/// Planner tuning
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlannerConfig {
    /// Samples per straight-line move (a trajectory has `steps + 1` points)
    pub trajectory_steps: u16,
    /// Distance below which two tip positions are considered equal (µm)
    pub epsilon_um: f64,
    /// Upper bound on per-axis distance between samples (µm)
    ///
    /// When set, long moves get more samples than `trajectory_steps`.
    pub max_sample_spacing_um: Option<f64>,
    /// Also check moving probes against stationary probes parked at their targets
    pub check_parked_targets: bool,
    /// Try axis-segmented legs when no direct order exists
    pub segmentation: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            trajectory_steps: DEFAULT_TRAJECTORY_STEPS,
            epsilon_um: DEFAULT_EPSILON_UM,
            max_sample_spacing_um: None,
            check_parked_targets: true,
            segmentation: true,
        }
    }
}

impl PlannerConfig {
    /// Check that all values are usable
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.trajectory_steps == 0 || self.trajectory_steps as usize > MAX_TRAJECTORY_STEPS {
            return Err(SetupError::InvalidSteps);
        }
        if !self.epsilon_um.is_finite() || self.epsilon_um < 0.0 {
            return Err(SetupError::InvalidEpsilon);
        }
        if let Some(spacing) = self.max_sample_spacing_um {
            if !spacing.is_finite() || spacing <= 0.0 {
                return Err(SetupError::InvalidSpacing);
            }
        }
        Ok(())
    }

    /// Number of trajectory steps for a move from `start` to `end`
    ///
    /// Always within `1..=MAX_TRAJECTORY_STEPS`.
    pub fn steps_for(&self, start: Point2D, end: Point2D) -> usize {
        let mut steps = (self.trajectory_steps as usize).max(1);

        if let Some(spacing) = self.max_sample_spacing_um {
            if spacing.is_finite() && spacing > 0.0 {
                let ratio = start.chebyshev_distance(end) / spacing;
                if ratio.is_finite() {
                    let mut needed = ratio as usize;
                    if (needed as f64) < ratio {
                        needed += 1;
                    }
                    steps = steps.max(needed);
                }
            }
        }

        steps.min(MAX_TRAJECTORY_STEPS)
    }
}

/// Static description of one manipulator's probe
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ManipulatorConfig {
    /// Bus index
    pub index: ManipulatorIndex,
    /// Display label (e.g. "SMU force")
    #[cfg_attr(feature = "serde", serde(default))]
    pub label: String<MAX_LABEL_LEN>,
    /// Probe silhouette relative to the tip
    pub polygon: BoundingPolygon,
    /// Tip position at setup, before any planned move
    #[cfg_attr(feature = "serde", serde(default))]
    pub tip: Point2D,
}

impl ManipulatorConfig {
    /// Create a manipulator entry with an empty label and the tip at the origin
    pub fn new(index: ManipulatorIndex, polygon: BoundingPolygon) -> Self {
        Self {
            index,
            label: String::new(),
            polygon,
            tip: Point2D::ORIGIN,
        }
    }
}

/// Complete probe station setup
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SetupConfig {
    /// Format version for compatibility checks
    #[cfg_attr(feature = "serde", serde(default = "default_version"))]
    pub version: u8,
    /// Planner tuning
    #[cfg_attr(feature = "serde", serde(default))]
    pub planner: PlannerConfig,
    /// Probe silhouettes
    #[cfg_attr(feature = "serde", serde(default, rename = "manipulator"))]
    pub manipulators: Vec<ManipulatorConfig, MAX_MANIPULATORS>,
}

#[cfg(feature = "serde")]
fn default_version() -> u8 {
    SETUP_VERSION
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            version: SETUP_VERSION,
            planner: PlannerConfig::default(),
            manipulators: Vec::new(),
        }
    }
}

impl SetupConfig {
    /// Create an empty setup
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a manipulator entry
    pub fn add_manipulator(&mut self, manipulator: ManipulatorConfig) -> Result<(), SetupError> {
        if self.find_manipulator(manipulator.index).is_some() {
            return Err(SetupError::DuplicateIndex(manipulator.index));
        }
        self.manipulators
            .push(manipulator)
            .map_err(|_| SetupError::TooManyManipulators)
    }

    /// Find a manipulator by index
    pub fn find_manipulator(&self, index: ManipulatorIndex) -> Option<&ManipulatorConfig> {
        self.manipulators.iter().find(|m| m.index == index)
    }

    /// Find a manipulator by label
    pub fn find_by_label(&self, label: &str) -> Option<&ManipulatorConfig> {
        self.manipulators.iter().find(|m| m.label.as_str() == label)
    }

    /// Check version, planner tuning and index uniqueness
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.version != SETUP_VERSION {
            return Err(SetupError::VersionMismatch);
        }
        self.planner.validate()?;

        for (i, m) in self.manipulators.iter().enumerate() {
            if self.manipulators[..i].iter().any(|o| o.index == m.index) {
                return Err(SetupError::DuplicateIndex(m.index));
            }
        }
        Ok(())
    }

    /// Registry with every configured probe at its setup tip
    pub fn build_registry(&self) -> Result<BoundingBoxRegistry, SetupError> {
        self.validate()?;

        let mut registry = BoundingBoxRegistry::new();
        for m in &self.manipulators {
            registry.set_bounding_box_at(m.index, m.polygon.clone(), m.tip);
        }
        Ok(registry)
    }

    /// Planner owning a registry built from this setup
    pub fn build_planner(&self) -> Result<MotionPlanner, SetupError> {
        let registry = self.build_registry()?;
        Ok(MotionPlanner::with_registry(self.planner, registry))
    }
}
