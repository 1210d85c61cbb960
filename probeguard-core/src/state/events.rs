//! Events that advance a planning call

use super::machine::FaultKind;

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlanEvent {
    // Planning events
    /// Every move has been sampled
    TrajectoriesReady,
    /// Collision matrix computed
    MatrixReady,
    /// A safe order was found
    OrderResolved,
    /// The dependency graph has a cycle, segmentation will be tried
    CycleDetected,
    /// The dependency graph has a cycle and no fallback will be tried
    CycleUnresolved,
    /// A segmented plan was found
    SegmentationResolved,
    /// No candidate decomposition worked, or segmentation is disabled
    SegmentationExhausted,

    // Execution events
    /// Every move of the plan was confirmed by the driver
    ExecutionComplete,

    // Control events
    /// Start over
    Reset,
    /// A configuration or hardware fault ended the call
    FaultDetected(FaultKind),
}

impl PlanEvent {
    /// Check if this event is produced while planning
    pub fn is_planning_event(&self) -> bool {
        matches!(
            self,
            PlanEvent::TrajectoriesReady
                | PlanEvent::MatrixReady
                | PlanEvent::OrderResolved
                | PlanEvent::CycleDetected
                | PlanEvent::CycleUnresolved
                | PlanEvent::SegmentationResolved
                | PlanEvent::SegmentationExhausted
        )
    }

    /// Check if this event indicates a fault
    pub fn is_fault_event(&self) -> bool {
        matches!(self, PlanEvent::FaultDetected(_))
    }
}
