//! Motion planner
//!
//! Owns the bounding box registry and runs a planning call end to end:
//! sample the moves, build the collision matrix, order the moves through
//! the dependency graph, and fall back to axis-aligned legs when the
//! direct moves form a cycle.

use super::graph::DependencyGraph;
use super::segment::{self, Candidates};
use super::{MotionPlan, PlanError, SafeOrder};
use crate::collision::matrix::path_collides;
use crate::collision::{BoundingBoxRegistry, CollisionMatrix, RegistryError, StationaryPose};
use crate::config::PlannerConfig;
use crate::execution::{ExecuteError, ExecutionSummary, SequenceExecutor};
use crate::geometry::{Aabb, GeometryError, Point2D};
use crate::motion::{
    generate_trajectory_with_epsilon, ManipulatorIndex, MoveSet, TargetMap, Trajectory,
    TrajectorySet, MAX_MANIPULATORS,
};
use crate::state::{FaultKind, PlanEvent, PlanState};
use crate::traits::ManipulatorDriver;

/// Collision-aware sequencer for one manipulator bus
#[derive(Debug, Clone, Default)]
pub struct MotionPlanner {
    registry: BoundingBoxRegistry,
    config: PlannerConfig,
    state: PlanState,
}

impl MotionPlanner {
    /// Create a planner with an empty registry
    pub fn new(config: PlannerConfig) -> Self {
        Self::with_registry(config, BoundingBoxRegistry::new())
    }

    /// Create a planner around an existing registry
    pub fn with_registry(config: PlannerConfig, registry: BoundingBoxRegistry) -> Self {
        Self {
            registry,
            config,
            state: PlanState::Idle,
        }
    }

    /// Planner tuning
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Where the last planning call got to
    pub fn state(&self) -> PlanState {
        self.state
    }

    /// Get the registry
    pub fn registry(&self) -> &BoundingBoxRegistry {
        &self.registry
    }

    /// Get the registry mutably
    pub fn registry_mut(&mut self) -> &mut BoundingBoxRegistry {
        &mut self.registry
    }

    /// Release the registry
    pub fn into_registry(self) -> BoundingBoxRegistry {
        self.registry
    }

    /// Register or replace a manipulator's silhouette
    pub fn set_bounding_box(
        &mut self,
        index: ManipulatorIndex,
        points: &[Point2D],
    ) -> Result<(), GeometryError> {
        self.registry.set_bounding_box(index, points)
    }

    /// Remove a manipulator's silhouette
    pub fn clear_bounding_box(&mut self, index: ManipulatorIndex) -> bool {
        self.registry.clear_bounding_box(index)
    }

    /// Record a confirmed tip position
    pub fn update_tip_position(
        &mut self,
        index: ManipulatorIndex,
        tip: Point2D,
    ) -> Result<(), RegistryError> {
        self.registry.update_tip_position(index, tip)
    }

    /// Get a manipulator's box
    pub fn get_bounding_box(&self, index: ManipulatorIndex) -> Option<&Aabb> {
        self.registry.get_bounding_box(index)
    }

    /// Return to idle, clearing any fault
    pub fn reset(&mut self) {
        self.advance(PlanEvent::Reset);
    }

    fn advance(&mut self, event: PlanEvent) {
        let next = self.state.transition(event);
        if next != self.state {
            trace!("plan state {} -> {}", self.state, next);
        }
        self.state = next;
    }

    fn check_moves(&self, moves: &MoveSet) -> Result<(), PlanError> {
        if moves.is_empty() {
            return Err(PlanError::EmptyMoveSet);
        }
        for (index, request) in moves.iter() {
            if !self.registry.is_registered(index) {
                return Err(PlanError::UnregisteredManipulator(index));
            }
            if !request.current.is_finite() || !request.target.is_finite() {
                return Err(PlanError::NonFinitePosition(index));
            }
        }
        Ok(())
    }

    /// The move set plus every other registered manipulator, held at its tip
    fn with_idle_manipulators(&self, moves: &MoveSet) -> MoveSet {
        let mut scene = moves.clone();
        for (index, aabb) in self.registry.iter() {
            if !scene.contains(index) {
                scene.insert(index, aabb.tip(), aabb.tip());
            }
        }
        scene
    }

    /// Sample every move of the set
    pub fn build_trajectories(&self, moves: &MoveSet) -> TrajectorySet {
        TrajectorySet::build(moves, &self.config)
    }

    /// Start a planning call and compute its collision matrix
    ///
    /// Registered manipulators outside the move set take part as
    /// stationary obstacles at their current tip. The registry is only
    /// read.
    pub fn build_collision_matrix(&mut self, moves: &MoveSet) -> Result<CollisionMatrix, PlanError> {
        self.advance(PlanEvent::Reset);

        if let Err(e) = self.check_moves(moves) {
            warn!("planning rejected: {}", e);
            self.advance(PlanEvent::FaultDetected(FaultKind::Configuration));
            return Err(e);
        }

        let trajectories = self.build_trajectories(&self.with_idle_manipulators(moves));
        self.advance(PlanEvent::TrajectoriesReady);

        let matrix = CollisionMatrix::build(
            &self.registry,
            trajectories,
            self.config.check_parked_targets,
        )?;
        self.advance(PlanEvent::MatrixReady);
        Ok(matrix)
    }

    /// "Must move after" graph over the manipulator slots of a matrix
    ///
    /// A collision with a manipulator at rest means it moves first; a
    /// collision with one parked at its target means it moves last. One
    /// that does not move at all can do neither, so hitting it is a cycle.
    pub fn dependency_graph(matrix: &CollisionMatrix) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for (index, _) in matrix.trajectories().iter() {
            graph.add_node(index.slot());
        }
        for detail in matrix.details() {
            let moving = detail.moving.slot();
            let stationary = detail.stationary.slot();
            let fixed = matrix
                .trajectories()
                .get(detail.stationary)
                .is_some_and(Trajectory::is_stationary);
            if fixed || detail.pose == StationaryPose::Rest {
                graph.add_dependency(moving, stationary);
            }
            if fixed || detail.pose == StationaryPose::Parked {
                graph.add_dependency(stationary, moving);
            }
        }
        graph
    }

    fn safe_order(matrix: &CollisionMatrix, moves: &MoveSet) -> Option<SafeOrder> {
        match Self::dependency_graph(matrix).topological_order() {
            Ok(nodes) => Some(
                nodes
                    .into_iter()
                    .filter_map(ManipulatorIndex::from_slot)
                    .filter(|&index| moves.contains(index))
                    .collect(),
            ),
            Err(cycle) => {
                debug!("dependency cycle over {} manipulators", cycle.unresolved.len());
                None
            }
        }
    }

    /// Order the straight-line moves so none of them collides
    ///
    /// Returns `Ok(None)` when the moves depend on each other in a cycle
    /// or one of them runs into a manipulator that is not moving. No
    /// segmentation is attempted. The order only names manipulators of
    /// the move set.
    pub fn plan_direct(&mut self, moves: &MoveSet) -> Result<Option<SafeOrder>, PlanError> {
        let matrix = self.build_collision_matrix(moves)?;

        match Self::safe_order(&matrix, moves) {
            Some(order) => {
                self.advance(PlanEvent::OrderResolved);
                Ok(Some(order))
            }
            None => {
                self.advance(PlanEvent::CycleUnresolved);
                Ok(None)
            }
        }
    }

    /// Find a collision-free plan for the move set
    ///
    /// Tries the direct order first, then, if enabled, axis-aligned legs
    /// for the manipulators involved in collisions. Returns `Ok(None)` if
    /// neither works.
    pub fn plan(&mut self, moves: &MoveSet) -> Result<Option<MotionPlan>, PlanError> {
        let matrix = self.build_collision_matrix(moves)?;

        if let Some(order) = Self::safe_order(&matrix, moves) {
            self.advance(PlanEvent::OrderResolved);
            info!("direct plan for {} manipulators", order.len());
            return Ok(Some(MotionPlan::direct(&order, &moves.targets())));
        }

        if !self.config.segmentation {
            self.advance(PlanEvent::CycleUnresolved);
            warn!("no direct plan for {} manipulators", moves.len());
            return Ok(None);
        }
        self.advance(PlanEvent::CycleDetected);

        let epsilon = self.config.epsilon_um;
        let scene = self.with_idle_manipulators(moves);
        let offending = matrix.colliding_manipulators().filter(|&index| {
            moves
                .get(index)
                .is_some_and(|request| !request.is_stationary(epsilon))
        });

        for assignment in Candidates::new(offending) {
            let legs = segment::plan_legs(&self.registry, &scene, &assignment, &self.config)?;
            if let Some(legs) = legs {
                self.advance(PlanEvent::SegmentationResolved);
                info!("segmented plan with {} legs", legs.len());
                return Ok(Some(MotionPlan::segmented(legs)));
            }
        }

        self.advance(PlanEvent::SegmentationExhausted);
        warn!("no collision-free plan for {} manipulators", moves.len());
        Ok(None)
    }

    /// Replay a plan against the move set and check it stays clear
    ///
    /// Every step is swept against every other registered manipulator at
    /// its position at that point of the plan, using the same sampling as
    /// planning. Manipulators outside the move set stay at their tip. The
    /// plan must also leave each manipulator at its target.
    pub fn verify(&self, moves: &MoveSet, plan: &MotionPlan) -> bool {
        let epsilon = self.config.epsilon_um;
        let scene = self.with_idle_manipulators(moves);
        let mut positions: [Option<Point2D>; MAX_MANIPULATORS] = [None; MAX_MANIPULATORS];
        for (index, request) in scene.iter() {
            positions[index.slot()] = Some(request.current);
        }

        for step in plan.steps() {
            let Some(from) = positions[step.index.slot()] else {
                return false;
            };
            let Some(moving) = self.registry.get_bounding_box(step.index) else {
                return false;
            };
            let steps = self.config.steps_for(from, step.target);
            let path = generate_trajectory_with_epsilon(from, step.target, steps, epsilon);

            for other in scene.indices() {
                if other == step.index {
                    continue;
                }
                let (Some(obstacle), Some(at)) = (
                    self.registry.get_bounding_box(other),
                    positions[other.slot()],
                ) else {
                    return false;
                };
                if path_collides(moving, &path, &obstacle.at(at)) {
                    debug!("step for manipulator {} hits {}", step.index, other);
                    return false;
                }
            }
            positions[step.index.slot()] = Some(step.target);
        }

        let all_at_target = scene.iter().all(|(index, request)| {
            positions[index.slot()].is_some_and(|p| p.approx_eq(request.target, epsilon))
        });
        all_at_target
    }

    fn finish_execution(&mut self, result: &Result<ExecutionSummary, ExecuteError>) {
        match result {
            Ok(_) => self.advance(PlanEvent::ExecutionComplete),
            Err(ExecuteError::HardwareFault { .. }) => {
                self.advance(PlanEvent::FaultDetected(FaultKind::Hardware))
            }
            Err(ExecuteError::Aborted { .. }) => {}
            Err(_) => self.advance(PlanEvent::FaultDetected(FaultKind::Configuration)),
        }
    }

    /// Move each manipulator of a safe order straight to its target
    ///
    /// The registry tip of each manipulator is updated as soon as the
    /// driver confirms its move.
    pub fn execute<D: ManipulatorDriver>(
        &mut self,
        driver: &mut D,
        order: &[ManipulatorIndex],
        targets: &TargetMap,
    ) -> Result<ExecutionSummary, ExecuteError> {
        let result = SequenceExecutor::new(driver).execute(&mut self.registry, order, targets);
        self.finish_execution(&result);
        result
    }

    /// Run every step of a plan
    pub fn execute_plan<D: ManipulatorDriver>(
        &mut self,
        driver: &mut D,
        plan: &MotionPlan,
    ) -> Result<ExecutionSummary, ExecuteError> {
        let result = SequenceExecutor::new(driver).execute_plan(&mut self.registry, plan);
        self.finish_execution(&result);
        result
    }
}
