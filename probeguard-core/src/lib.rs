//! Board-agnostic planning core for micromanipulator probe stations
//!
//! This crate contains everything needed to move several probes toward a
//! sample without their silhouettes colliding, independent of the concrete
//! manipulator hardware:
//!
//! - Probe geometry (axis-aligned bounding boxes anchored to the tip)
//! - Bounding box registry (one box per manipulator)
//! - Straight-line trajectory sampling
//! - Pairwise collision matrix
//! - Dependency graph ordering and axis-segmentation fallback
//! - Sequential execution through a manipulator driver
//! - Planning state machine
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod macros;

pub mod collision;
pub mod config;
pub mod execution;
pub mod geometry;
pub mod motion;
pub mod planner;
pub mod state;
pub mod traits;

pub use collision::{BoundingBoxRegistry, CollisionMatrix, CollisionOutcome, StationaryPose};
pub use geometry::{Aabb, BoundingPolygon, Point2D};
pub use motion::{ManipulatorIndex, MoveSet, MoveStep, MAX_MANIPULATORS};
pub use planner::{MotionPlan, MotionPlanner, PlanError, SafeOrder};
