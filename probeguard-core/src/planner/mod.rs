//! Safe ordering of manipulator moves
//!
//! Turns a move set into a plan that never lets two probe boxes overlap:
//! first as a plain ordering of straight-line moves (dependency graph and
//! topological sort), then, if that has a cycle, by splitting diagonal
//! moves into axis-aligned legs.

pub mod graph;
pub mod segment;
pub mod sequencer;

use heapless::Vec;

use crate::collision::RegistryError;
use crate::motion::{ManipulatorIndex, MoveStep, TargetMap, MAX_MANIPULATORS};

pub use graph::{Cycle, DependencyGraph, NodeOrder, MAX_NODES};
pub use segment::{AxisOrder, Candidates, Decomposition};
pub use sequencer::MotionPlanner;

/// Maximum steps in a plan (two legs per manipulator)
pub const MAX_MOVE_STEPS: usize = MAX_NODES;

/// Manipulators in the order they may move
pub type SafeOrder = Vec<ManipulatorIndex, MAX_MANIPULATORS>;

/// Steps of a plan, in execution order
pub type PlanSteps = Vec<MoveStep, MAX_MOVE_STEPS>;

// A direct plan holds one step per manipulator
const _: () = assert!(MAX_MANIPULATORS <= MAX_MOVE_STEPS);

/// Errors that fail a planning call
///
/// An infeasible move set is not an error; planning reports it as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlanError {
    /// A move names a manipulator with no bounding box
    UnregisteredManipulator(ManipulatorIndex),
    /// Nothing to plan
    EmptyMoveSet,
    /// A move's current or target position is NaN or infinite
    NonFinitePosition(ManipulatorIndex),
}

impl From<RegistryError> for PlanError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Unregistered(index) => PlanError::UnregisteredManipulator(index),
        }
    }
}

/// How a plan was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlanStrategy {
    /// One straight-line move per manipulator
    Direct,
    /// Some moves split into axis-aligned legs
    Segmented,
}

/// A collision-free sequence of moves
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionPlan {
    strategy: PlanStrategy,
    steps: PlanSteps,
}

impl MotionPlan {
    /// Plan that moves each manipulator straight to its target in `order`
    ///
    /// Manipulators without a target are skipped.
    pub fn direct(order: &SafeOrder, targets: &TargetMap) -> Self {
        let steps = order
            .iter()
            .filter_map(|&index| targets.get(index).map(|target| MoveStep::new(index, target)))
            .collect();
        Self {
            strategy: PlanStrategy::Direct,
            steps,
        }
    }

    /// Plan made of axis-aligned legs
    pub fn segmented(steps: PlanSteps) -> Self {
        Self {
            strategy: PlanStrategy::Segmented,
            steps,
        }
    }

    /// How the plan was obtained
    pub fn strategy(&self) -> PlanStrategy {
        self.strategy
    }

    /// Moves in execution order
    pub fn steps(&self) -> &[MoveStep] {
        &self.steps
    }

    /// Number of moves
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the plan moves nothing
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Manipulators in order of their first move
    pub fn order(&self) -> SafeOrder {
        let mut order = SafeOrder::new();
        for step in &self.steps {
            if !order.contains(&step.index) {
                let _ = order.push(step.index);
            }
        }
        order
    }
}
