//! Manipulator moves
//!
//! Move requests for a planning call, the steps of a resulting plan, and
//! straight-line trajectory sampling.

pub mod position;
pub mod trajectory;

pub use position::{
    ManipulatorIndex, MoveRequest, MoveSet, MoveStep, TargetMap, MAX_MANIPULATORS,
};
pub use trajectory::{
    generate_trajectory, generate_trajectory_with_epsilon, Trajectory, TrajectorySet,
    DEFAULT_EPSILON_UM, MAX_TRAJECTORY_POINTS, MAX_TRAJECTORY_STEPS,
};
