//! State machine definition
//!
//! A planning call is a function of the current state and an event.

use super::events::PlanEvent;

/// Planning-call states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlanState {
    /// No call in progress
    #[default]
    Idle,
    /// Moves sampled into trajectories
    TrajectoriesBuilt,
    /// Pairwise collisions known
    MatrixBuilt,
    /// Direct order had a cycle, trying axis-aligned legs
    SegmentationRetry,
    /// A safe plan is ready to execute
    OrderFound,
    /// No safe plan exists under the allowed path shapes
    Infeasible,
    /// Every move of the plan ran
    Executed,
    /// Call ended by a fault
    Faulted(FaultKind),
}

/// Types of faults that end a planning call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultKind {
    /// Unregistered manipulator or invalid input
    Configuration,
    /// Driver reported a failure mid-execution
    Hardware,
}

impl PlanState {
    /// Check if a plan is ready to execute
    pub fn has_plan(&self) -> bool {
        matches!(self, PlanState::OrderFound)
    }

    /// Check if this is a fault state
    pub fn is_faulted(&self) -> bool {
        matches!(self, PlanState::Faulted(_))
    }

    /// Check if the call has finished, one way or another
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PlanState::Infeasible | PlanState::Executed | PlanState::Faulted(_)
        )
    }

    /// Process an event and return the next state
    pub fn transition(self, event: PlanEvent) -> Self {
        use PlanEvent::*;
        use PlanState::*;

        match (self, event) {
            // Any state
            (_, FaultDetected(kind)) => Faulted(kind),
            (_, Reset) => Idle,

            // Planning
            (Idle, TrajectoriesReady) => TrajectoriesBuilt,
            (TrajectoriesBuilt, MatrixReady) => MatrixBuilt,
            (MatrixBuilt, OrderResolved) => OrderFound,
            (MatrixBuilt, CycleDetected) => SegmentationRetry,
            (MatrixBuilt, CycleUnresolved) => Infeasible,

            // Fallback
            (SegmentationRetry, SegmentationResolved) => OrderFound,
            (SegmentationRetry, SegmentationExhausted) => Infeasible,

            // Execution
            (OrderFound, ExecutionComplete) => Executed,

            // Default: stay in current state
            _ => self,
        }
    }
}
