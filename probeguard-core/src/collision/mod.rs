//! Collision modelling
//!
//! The registry of probe boxes and the pairwise collision matrix built from
//! a set of sampled moves.

pub mod matrix;
pub mod registry;

pub use matrix::{CollisionDetail, CollisionMatrix, CollisionOutcome, StationaryPose, StepList};
pub use registry::{BoundingBoxRegistry, RegistryError};
