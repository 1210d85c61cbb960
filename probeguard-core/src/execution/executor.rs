//! Sequential move executor
//!
//! Moves are applied strictly in order. For each one the device is made
//! active, the blocking move is issued, and only after the driver confirms
//! is the registry tip updated. A failed move stops the sequence; nothing
//! is retried and the remaining moves are not attempted.

use crate::collision::{BoundingBoxRegistry, RegistryError};
use crate::motion::{ManipulatorIndex, MoveStep, TargetMap};
use crate::planner::{MotionPlan, PlanSteps, MAX_MOVE_STEPS};
use crate::traits::{DriverError, ManipulatorDriver};

/// Errors that stop execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExecuteError {
    /// Nothing to execute
    EmptyOrder,
    /// A manipulator in the order has no target
    MissingTarget(ManipulatorIndex),
    /// A manipulator in the order has no bounding box
    Unregistered(ManipulatorIndex),
    /// More steps than a plan can hold
    TooManySteps,
    /// The driver failed a command
    HardwareFault {
        /// Manipulator being moved
        index: ManipulatorIndex,
        error: DriverError,
        /// Moves confirmed before the failure
        completed: usize,
    },
    /// The caller asked to stop between moves
    Aborted {
        /// Moves confirmed before stopping
        completed: usize,
    },
}

impl From<RegistryError> for ExecuteError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Unregistered(index) => ExecuteError::Unregistered(index),
        }
    }
}

impl ExecuteError {
    /// Number of moves that were confirmed before the error
    pub fn completed(&self) -> usize {
        match self {
            ExecuteError::HardwareFault { completed, .. } | ExecuteError::Aborted { completed } => {
                *completed
            }
            _ => 0,
        }
    }
}

/// Moves that were confirmed, in the order they ran
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExecutionSummary {
    completed: PlanSteps,
}

impl ExecutionSummary {
    /// Confirmed moves
    pub fn steps(&self) -> &[MoveStep] {
        &self.completed
    }

    /// Number of confirmed moves
    pub fn moves(&self) -> usize {
        self.completed.len()
    }
}

/// Applies moves through a manipulator driver
#[derive(Debug)]
pub struct SequenceExecutor<D> {
    driver: D,
}

impl<D: ManipulatorDriver> SequenceExecutor<D> {
    /// Create an executor around a driver
    pub fn new(driver: D) -> Self {
        Self { driver }
    }

    /// Get the driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get the driver mutably
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Release the driver
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Move each manipulator of `order` straight to its target
    ///
    /// Every manipulator must have a target and a registered box, and the
    /// order must fit in a plan. All of this is checked before the first
    /// move.
    pub fn execute(
        &mut self,
        registry: &mut BoundingBoxRegistry,
        order: &[ManipulatorIndex],
        targets: &TargetMap,
    ) -> Result<ExecutionSummary, ExecuteError> {
        if order.is_empty() {
            return Err(ExecuteError::EmptyOrder);
        }

        let mut steps = PlanSteps::new();
        for &index in order {
            let target = targets.get(index).ok_or(ExecuteError::MissingTarget(index))?;
            steps
                .push(MoveStep::new(index, target))
                .map_err(|_| ExecuteError::TooManySteps)?;
        }

        self.run(registry, &steps, |_| false)
    }

    /// Run every step of a plan
    pub fn execute_plan(
        &mut self,
        registry: &mut BoundingBoxRegistry,
        plan: &MotionPlan,
    ) -> Result<ExecutionSummary, ExecuteError> {
        self.run(registry, plan.steps(), |_| false)
    }

    /// Run steps, consulting `abort` before each one
    ///
    /// A move that has been issued is always allowed to finish.
    pub fn execute_steps_with_abort<F>(
        &mut self,
        registry: &mut BoundingBoxRegistry,
        steps: &[MoveStep],
        abort: F,
    ) -> Result<ExecutionSummary, ExecuteError>
    where
        F: FnMut(&MoveStep) -> bool,
    {
        self.run(registry, steps, abort)
    }

    fn run<F>(
        &mut self,
        registry: &mut BoundingBoxRegistry,
        steps: &[MoveStep],
        mut abort: F,
    ) -> Result<ExecutionSummary, ExecuteError>
    where
        F: FnMut(&MoveStep) -> bool,
    {
        if steps.is_empty() {
            return Err(ExecuteError::EmptyOrder);
        }
        if steps.len() > MAX_MOVE_STEPS {
            return Err(ExecuteError::TooManySteps);
        }
        if let Some(step) = steps.iter().find(|s| !registry.is_registered(s.index)) {
            return Err(ExecuteError::Unregistered(step.index));
        }

        let mut summary = ExecutionSummary::default();

        for step in steps {
            let completed = summary.moves();
            if abort(step) {
                warn!("execution aborted after {} moves", completed);
                return Err(ExecuteError::Aborted { completed });
            }

            let fault = |error: DriverError| {
                warn!("manipulator {} failed: {}", step.index, error);
                ExecuteError::HardwareFault {
                    index: step.index,
                    error,
                    completed,
                }
            };

            self.driver.change_active_device(step.index).map_err(fault)?;
            debug!(
                "moving manipulator {} to ({}, {})",
                step.index, step.target.x, step.target.y
            );
            self.driver
                .move_to(step.index, step.target.x, step.target.y, None)
                .map_err(fault)?;

            registry.update_tip_position(step.index, step.target)?;
            summary
                .completed
                .push(*step)
                .map_err(|_| ExecuteError::TooManySteps)?;
        }

        info!("executed {} moves", summary.moves());
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BoundingPolygon, Point2D};
    use crate::traits::StagePosition;
    use heapless::Vec;

    fn idx(raw: u8) -> ManipulatorIndex {
        ManipulatorIndex::new(raw).unwrap()
    }

    #[derive(Debug, PartialEq, Clone, Copy)]
    enum Call {
        Activate(ManipulatorIndex),
        Move(ManipulatorIndex, f64, f64),
    }

    /// Driver that records calls and fails on the n-th move
    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call, 32>,
        fail_on_move: Option<usize>,
        moves: usize,
    }

    impl ManipulatorDriver for Recorder {
        fn current_position(&mut self, _: ManipulatorIndex) -> Result<StagePosition, DriverError> {
            Ok(StagePosition::default())
        }

        fn change_active_device(&mut self, index: ManipulatorIndex) -> Result<(), DriverError> {
            let _ = self.calls.push(Call::Activate(index));
            Ok(())
        }

        fn move_to(
            &mut self,
            index: ManipulatorIndex,
            x: f64,
            y: f64,
            _z: Option<f64>,
        ) -> Result<(), DriverError> {
            if self.fail_on_move == Some(self.moves) {
                return Err(DriverError::Timeout);
            }
            self.moves += 1;
            let _ = self.calls.push(Call::Move(index, x, y));
            Ok(())
        }
    }

    fn registry() -> BoundingBoxRegistry {
        let mut registry = BoundingBoxRegistry::new();
        for raw in 1..=2 {
            registry.set_bounding_box_at(
                idx(raw),
                BoundingPolygon::rectangle(2.0, 2.0).unwrap(),
                Point2D::ORIGIN,
            );
        }
        registry
    }

    fn targets() -> TargetMap {
        let mut targets = TargetMap::new();
        targets.insert(idx(1), Point2D::new(10.0, 0.0));
        targets.insert(idx(2), Point2D::new(0.0, 10.0));
        targets
    }

    #[test]
    fn test_execute_in_order() {
        let mut registry = registry();
        let mut executor = SequenceExecutor::new(Recorder::default());

        let summary = executor
            .execute(&mut registry, &[idx(2), idx(1)], &targets())
            .unwrap();
        assert_eq!(summary.moves(), 2);
        assert_eq!(
            executor.driver().calls.as_slice(),
            &[
                Call::Activate(idx(2)),
                Call::Move(idx(2), 0.0, 10.0),
                Call::Activate(idx(1)),
                Call::Move(idx(1), 10.0, 0.0),
            ]
        );
        assert_eq!(registry.tip_position(idx(1)), Some(Point2D::new(10.0, 0.0)));
        assert_eq!(registry.tip_position(idx(2)), Some(Point2D::new(0.0, 10.0)));
    }

    #[test]
    fn test_empty_order() {
        let mut registry = registry();
        let mut executor = SequenceExecutor::new(Recorder::default());
        assert_eq!(
            executor.execute(&mut registry, &[], &targets()),
            Err(ExecuteError::EmptyOrder)
        );
        assert!(executor.driver().calls.is_empty());
    }

    #[test]
    fn test_missing_target_checked_before_moving() {
        let mut registry = registry();
        let mut executor = SequenceExecutor::new(Recorder::default());
        let mut targets = TargetMap::new();
        targets.insert(idx(1), Point2D::new(1.0, 1.0));

        assert_eq!(
            executor.execute(&mut registry, &[idx(1), idx(2)], &targets),
            Err(ExecuteError::MissingTarget(idx(2)))
        );
        assert!(executor.driver().calls.is_empty());
    }

    #[test]
    fn test_unregistered_checked_before_moving() {
        let mut registry = registry();
        let mut executor = SequenceExecutor::new(Recorder::default());
        let mut targets = targets();
        targets.insert(idx(3), Point2D::new(5.0, 5.0));

        assert_eq!(
            executor.execute(&mut registry, &[idx(1), idx(3)], &targets),
            Err(ExecuteError::Unregistered(idx(3)))
        );
        assert!(executor.driver().calls.is_empty());
    }

    #[test]
    fn test_oversized_sequence_rejected_before_moving() {
        let mut registry = registry();
        let mut executor = SequenceExecutor::new(Recorder::default());

        assert_eq!(
            executor.execute(&mut registry, &[idx(1); MAX_MOVE_STEPS + 2], &targets()),
            Err(ExecuteError::TooManySteps)
        );

        let steps = [MoveStep::new(idx(2), Point2D::new(1.0, 1.0)); MAX_MOVE_STEPS + 1];
        assert_eq!(
            executor.execute_steps_with_abort(&mut registry, &steps, |_| false),
            Err(ExecuteError::TooManySteps)
        );

        assert!(executor.driver().calls.is_empty());
        assert_eq!(registry.tip_position(idx(1)), Some(Point2D::ORIGIN));
        assert_eq!(registry.tip_position(idx(2)), Some(Point2D::ORIGIN));
    }

    #[test]
    fn test_full_sequence_runs() {
        let mut registry = registry();
        let mut executor = SequenceExecutor::new(Recorder::default());
        let steps = [MoveStep::new(idx(1), Point2D::new(2.0, 0.0)); MAX_MOVE_STEPS];

        let summary = executor
            .execute_steps_with_abort(&mut registry, &steps, |_| false)
            .unwrap();
        assert_eq!(summary.moves(), MAX_MOVE_STEPS);
        assert_eq!(executor.driver().moves, MAX_MOVE_STEPS);
    }

    #[test]
    fn test_hardware_fault_stops_sequence() {
        let mut registry = registry();
        let driver = Recorder {
            fail_on_move: Some(1),
            ..Default::default()
        };
        let mut executor = SequenceExecutor::new(driver);

        let err = executor
            .execute(&mut registry, &[idx(1), idx(2)], &targets())
            .unwrap_err();
        assert_eq!(
            err,
            ExecuteError::HardwareFault {
                index: idx(2),
                error: DriverError::Timeout,
                completed: 1,
            }
        );
        assert_eq!(err.completed(), 1);

        // First move stuck, second never happened
        assert_eq!(registry.tip_position(idx(1)), Some(Point2D::new(10.0, 0.0)));
        assert_eq!(registry.tip_position(idx(2)), Some(Point2D::ORIGIN));
    }

    #[test]
    fn test_abort_between_moves() {
        let mut registry = registry();
        let mut executor = SequenceExecutor::new(Recorder::default());
        let steps = [
            MoveStep::new(idx(1), Point2D::new(4.0, 0.0)),
            MoveStep::new(idx(1), Point2D::new(4.0, 4.0)),
            MoveStep::new(idx(2), Point2D::new(0.0, 4.0)),
        ];

        let mut seen = 0;
        let err = executor
            .execute_steps_with_abort(&mut registry, &steps, |_| {
                seen += 1;
                seen > 2
            })
            .unwrap_err();
        assert_eq!(err, ExecuteError::Aborted { completed: 2 });
        assert_eq!(registry.tip_position(idx(1)), Some(Point2D::new(4.0, 4.0)));
        assert_eq!(registry.tip_position(idx(2)), Some(Point2D::ORIGIN));
    }

    #[test]
    fn test_execute_segmented_plan() {
        let mut registry = registry();
        let mut executor = SequenceExecutor::new(Recorder::default());
        let steps = PlanSteps::from_slice(&[
            MoveStep::new(idx(1), Point2D::new(6.0, 0.0)),
            MoveStep::new(idx(1), Point2D::new(6.0, 4.0)),
        ])
        .unwrap();
        let plan = MotionPlan::segmented(steps);

        let summary = executor.execute_plan(&mut registry, &plan).unwrap();
        assert_eq!(summary.steps(), plan.steps());
        assert_eq!(executor.into_driver().moves, 2);
        assert_eq!(registry.tip_position(idx(1)), Some(Point2D::new(6.0, 4.0)));
    }
}
