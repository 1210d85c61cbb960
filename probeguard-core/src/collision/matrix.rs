//! Pairwise collision matrix
//!
//! For every ordered pair (moving, stationary) the moving probe's box is
//! swept along its sampled trajectory while the other probe is held still.
//! Only one manipulator is ever actuated at a time, so two probes moving
//! together is never modelled.
//!
//! The stationary probe is checked in two poses: at rest (the first point
//! of its own trajectory, before it moves) and parked (the last point,
//! after it has moved). A rest collision means the stationary probe must
//! move first; a parked collision means it must move last.

use heapless::Vec;

use super::registry::{BoundingBoxRegistry, RegistryError};
use crate::geometry::{Aabb, Point2D};
use crate::motion::{ManipulatorIndex, Trajectory, TrajectorySet, MAX_MANIPULATORS, MAX_TRAJECTORY_POINTS};

/// Trajectory step indices at which a collision occurs
pub type StepList = Vec<u16, MAX_TRAJECTORY_POINTS>;

/// Where the stationary manipulator is held during a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StationaryPose {
    /// At the start of its own trajectory
    Rest,
    /// At the end of its own trajectory
    Parked,
}

impl StationaryPose {
    /// Both poses, rest first
    pub const ALL: [Self; 2] = [Self::Rest, Self::Parked];

    fn layer(self) -> usize {
        match self {
            Self::Rest => 0,
            Self::Parked => 1,
        }
    }

    /// Position of a manipulator in this pose along its trajectory
    pub fn position(self, trajectory: &Trajectory) -> Point2D {
        match self {
            Self::Rest => trajectory.start(),
            Self::Parked => trajectory.end(),
        }
    }
}

/// Result of sweeping one probe past another
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CollisionOutcome {
    /// The pair was not checked
    #[default]
    NotComputed,
    /// Checked, no sample overlaps
    Clear,
    /// Checked, these samples overlap
    CollidesAt(StepList),
}

impl CollisionOutcome {
    /// Check if the pair was evaluated
    pub fn is_computed(&self) -> bool {
        !matches!(self, Self::NotComputed)
    }

    /// Check if the pair was evaluated and found clear
    pub fn is_clear(&self) -> bool {
        matches!(self, Self::Clear)
    }

    /// Check if any sample overlaps
    pub fn collides(&self) -> bool {
        matches!(self, Self::CollidesAt(steps) if !steps.is_empty())
    }

    /// Colliding step indices (empty unless `CollidesAt`)
    pub fn steps(&self) -> &[u16] {
        match self {
            Self::CollidesAt(steps) => steps,
            _ => &[],
        }
    }
}

/// Sweep `moving` along `path` against `obstacle` held in place
///
/// A single-point path never collides.
pub fn sweep(moving: &Aabb, path: &Trajectory, obstacle: &Aabb) -> CollisionOutcome {
    if path.is_stationary() {
        return CollisionOutcome::Clear;
    }

    let obstacle = obstacle.extent();
    let mut steps = StepList::new();
    for (step, &point) in path.points().iter().enumerate() {
        if moving.extent_at(point).intersects(&obstacle) {
            let _ = steps.push(step as u16);
        }
    }

    if steps.is_empty() {
        CollisionOutcome::Clear
    } else {
        CollisionOutcome::CollidesAt(steps)
    }
}

/// Check if any sample of `path` brings `moving` into `obstacle`
pub fn path_collides(moving: &Aabb, path: &Trajectory, obstacle: &Aabb) -> bool {
    if path.is_stationary() {
        return false;
    }
    let obstacle = obstacle.extent();
    path.points()
        .iter()
        .any(|&p| moving.extent_at(p).intersects(&obstacle))
}

/// Collision record of one ordered pair, for diagnostics
#[derive(Debug, Clone, Copy)]
pub struct CollisionDetail<'a> {
    pub moving: ManipulatorIndex,
    pub stationary: ManipulatorIndex,
    pub pose: StationaryPose,
    /// Colliding step indices of the moving trajectory
    pub steps: &'a [u16],
    trajectory: &'a Trajectory,
}

impl<'a> CollisionDetail<'a> {
    /// Tip positions of the moving manipulator at each colliding step
    pub fn positions(&self) -> impl Iterator<Item = Point2D> + 'a {
        let trajectory = self.trajectory;
        self.steps
            .iter()
            .filter_map(move |&step| trajectory.get(step as usize))
    }

    /// First colliding step
    pub fn first_step(&self) -> Option<u16> {
        self.steps.first().copied()
    }
}

/// Collision outcomes for every ordered pair of a move set
#[derive(Debug, Clone)]
pub struct CollisionMatrix {
    /// Indexed `[moving][stationary][pose]` by dense slot
    cells: [[[CollisionOutcome; 2]; MAX_MANIPULATORS]; MAX_MANIPULATORS],
    trajectories: TrajectorySet,
}

impl CollisionMatrix {
    /// Sweep every ordered pair of sampled moves
    ///
    /// The registry is only read: each sweep uses a relocated copy of the
    /// stored box. With `check_parked` false the parked layer stays
    /// `NotComputed`.
    pub fn build(
        registry: &BoundingBoxRegistry,
        trajectories: TrajectorySet,
        check_parked: bool,
    ) -> Result<Self, RegistryError> {
        let mut cells: [[[CollisionOutcome; 2]; MAX_MANIPULATORS]; MAX_MANIPULATORS] =
            Default::default();

        for (moving, path) in trajectories.iter() {
            let moving_box = registry
                .get_bounding_box(moving)
                .ok_or(RegistryError::Unregistered(moving))?;

            for (stationary, other_path) in trajectories.iter() {
                if moving == stationary {
                    continue;
                }
                let stationary_box = registry
                    .get_bounding_box(stationary)
                    .ok_or(RegistryError::Unregistered(stationary))?;

                for pose in StationaryPose::ALL {
                    if pose == StationaryPose::Parked && !check_parked {
                        continue;
                    }
                    let obstacle = stationary_box.at(pose.position(other_path));
                    let outcome = sweep(moving_box, path, &obstacle);
                    if outcome.collides() {
                        debug!(
                            "manipulator {} hits {} ({}) at {} steps",
                            moving,
                            stationary,
                            pose,
                            outcome.steps().len()
                        );
                    }
                    cells[moving.slot()][stationary.slot()][pose.layer()] = outcome;
                }
            }
        }

        Ok(Self {
            cells,
            trajectories,
        })
    }

    /// Outcome for an ordered pair and pose
    pub fn outcome(
        &self,
        moving: ManipulatorIndex,
        stationary: ManipulatorIndex,
        pose: StationaryPose,
    ) -> &CollisionOutcome {
        &self.cells[moving.slot()][stationary.slot()][pose.layer()]
    }

    /// Check if an ordered pair collides in a pose
    pub fn collides(
        &self,
        moving: ManipulatorIndex,
        stationary: ManipulatorIndex,
        pose: StationaryPose,
    ) -> bool {
        self.outcome(moving, stationary, pose).collides()
    }

    /// Check if any pair collides in any pose
    pub fn has_collisions(&self) -> bool {
        self.cells
            .iter()
            .flatten()
            .flatten()
            .any(CollisionOutcome::collides)
    }

    /// Every colliding pair, ordered by moving, stationary, then pose
    pub fn details(&self) -> impl Iterator<Item = CollisionDetail<'_>> {
        self.trajectories.iter().flat_map(move |(moving, trajectory)| {
            ManipulatorIndex::all().flat_map(move |stationary| {
                StationaryPose::ALL.into_iter().filter_map(move |pose| {
                    let outcome = self.outcome(moving, stationary, pose);
                    if !outcome.collides() {
                        return None;
                    }
                    Some(CollisionDetail {
                        moving,
                        stationary,
                        pose,
                        steps: outcome.steps(),
                        trajectory,
                    })
                })
            })
        })
    }

    /// Manipulators taking part in any collision, as mover or obstacle
    pub fn colliding_manipulators(&self) -> impl Iterator<Item = ManipulatorIndex> + '_ {
        ManipulatorIndex::all().filter(move |&index| {
            self.details()
                .any(|d| d.moving == index || d.stationary == index)
        })
    }

    /// Sampled trajectories the matrix was built from
    pub fn trajectories(&self) -> &TrajectorySet {
        &self.trajectories
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlannerConfig;
    use crate::geometry::BoundingPolygon;
    use crate::motion::MoveSet;

    fn idx(raw: u8) -> ManipulatorIndex {
        ManipulatorIndex::new(raw).unwrap()
    }

    fn registry_with_squares(count: u8, size: f64) -> BoundingBoxRegistry {
        let mut registry = BoundingBoxRegistry::new();
        for raw in 1..=count {
            registry.set_bounding_box_at(
                idx(raw),
                BoundingPolygon::rectangle(size, size).unwrap(),
                Point2D::ORIGIN,
            );
        }
        registry
    }

    fn build(registry: &BoundingBoxRegistry, moves: &MoveSet) -> CollisionMatrix {
        let config = PlannerConfig::default();
        CollisionMatrix::build(registry, TrajectorySet::build(moves, &config), true).unwrap()
    }

    #[test]
    fn test_single_mover_hits_stationary_manipulator() {
        let registry = registry_with_squares(2, 2.0);
        let mut moves = MoveSet::new();
        moves.insert(idx(1), Point2D::new(0.0, 0.0), Point2D::new(5.0, 0.0));
        moves.insert(idx(2), Point2D::new(3.0, 0.0), Point2D::new(3.0, 0.0));

        let matrix = build(&registry, &moves);
        assert!(matrix.has_collisions());

        let outcome = matrix.outcome(idx(1), idx(2), StationaryPose::Rest);
        // Box centred at x overlaps [2, 4] strictly for 1 < x < 5: steps 3..=9
        assert_eq!(outcome.steps(), &[3, 4, 5, 6, 7, 8, 9]);
        assert!(outcome.steps().contains(&6));

        // A stationary manipulator never contributes
        assert!(matrix.outcome(idx(2), idx(1), StationaryPose::Rest).is_clear());
    }

    #[test]
    fn test_distant_manipulator_is_clear() {
        let registry = registry_with_squares(2, 2.0);
        let mut moves = MoveSet::new();
        moves.insert(idx(1), Point2D::new(0.0, 0.0), Point2D::new(5.0, 0.0));
        moves.insert(idx(2), Point2D::new(20.0, 20.0), Point2D::new(20.0, 20.0));

        let matrix = build(&registry, &moves);
        assert!(!matrix.has_collisions());
        assert!(matrix.outcome(idx(1), idx(2), StationaryPose::Rest).is_clear());
        assert_eq!(matrix.details().count(), 0);
    }

    #[test]
    fn test_not_computed_is_distinct_from_clear() {
        let registry = registry_with_squares(3, 2.0);
        let mut moves = MoveSet::new();
        moves.insert(idx(1), Point2D::new(0.0, 0.0), Point2D::new(5.0, 0.0));
        moves.insert(idx(2), Point2D::new(20.0, 20.0), Point2D::new(20.0, 20.0));

        let config = PlannerConfig::default();
        let matrix =
            CollisionMatrix::build(&registry, TrajectorySet::build(&moves, &config), false)
                .unwrap();

        // Not in the move set
        let outside = matrix.outcome(idx(1), idx(3), StationaryPose::Rest);
        assert!(!outside.is_computed());
        // Diagonal
        assert!(!matrix.outcome(idx(1), idx(1), StationaryPose::Rest).is_computed());
        // Parked layer disabled
        assert!(!matrix.outcome(idx(1), idx(2), StationaryPose::Parked).is_computed());
        // Evaluated pair
        assert!(matrix.outcome(idx(1), idx(2), StationaryPose::Rest).is_clear());
    }

    #[test]
    fn test_parked_layer() {
        let registry = registry_with_squares(2, 2.0);
        let mut moves = MoveSet::new();
        // 2 moves into the spot 1 passes through
        moves.insert(idx(1), Point2D::new(0.0, 0.0), Point2D::new(10.0, 0.0));
        moves.insert(idx(2), Point2D::new(5.0, 20.0), Point2D::new(5.0, 0.0));

        let matrix = build(&registry, &moves);
        assert!(!matrix.collides(idx(1), idx(2), StationaryPose::Rest));
        assert!(matrix.collides(idx(1), idx(2), StationaryPose::Parked));
    }

    #[test]
    fn test_details_report_positions() {
        let registry = registry_with_squares(2, 2.0);
        let mut moves = MoveSet::new();
        moves.insert(idx(1), Point2D::new(0.0, 0.0), Point2D::new(5.0, 0.0));
        moves.insert(idx(2), Point2D::new(3.0, 0.0), Point2D::new(3.0, 0.0));

        let matrix = build(&registry, &moves);
        let rest = matrix
            .details()
            .find(|d| d.pose == StationaryPose::Rest)
            .unwrap();
        assert_eq!(rest.moving, idx(1));
        assert_eq!(rest.stationary, idx(2));
        assert_eq!(rest.first_step(), Some(3));
        let first = rest.positions().next().unwrap();
        assert!(first.approx_eq(Point2D::new(1.5, 0.0), 1e-9));

        let mut involved = matrix.colliding_manipulators();
        assert_eq!(involved.next(), Some(idx(1)));
        assert_eq!(involved.next(), Some(idx(2)));
        assert_eq!(involved.next(), None);
    }

    #[test]
    fn test_build_leaves_registry_untouched() {
        let registry = registry_with_squares(2, 2.0);
        let before = registry.clone();
        let mut moves = MoveSet::new();
        moves.insert(idx(1), Point2D::new(0.0, 0.0), Point2D::new(5.0, 0.0));
        moves.insert(idx(2), Point2D::new(3.0, 0.0), Point2D::new(3.0, 0.0));

        let _ = build(&registry, &moves);
        for index in [idx(1), idx(2)] {
            assert_eq!(registry.get_bounding_box(index), before.get_bounding_box(index));
        }
    }

    #[test]
    fn test_unregistered_manipulator() {
        let registry = registry_with_squares(1, 2.0);
        let mut moves = MoveSet::new();
        moves.insert(idx(1), Point2D::new(0.0, 0.0), Point2D::new(5.0, 0.0));
        moves.insert(idx(2), Point2D::new(3.0, 0.0), Point2D::new(3.0, 0.0));

        let config = PlannerConfig::default();
        let result = CollisionMatrix::build(&registry, TrajectorySet::build(&moves, &config), true);
        assert!(matches!(result, Err(RegistryError::Unregistered(i)) if i == idx(2)));
    }
}
