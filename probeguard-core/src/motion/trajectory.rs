//! Straight-line trajectory sampling
//!
//! A move is checked for collisions at evenly spaced samples between its
//! start and end tip positions. A move with no displacement collapses to a
//! single sample, so a stationary manipulator never sweeps into anything.

use heapless::Vec;

use super::position::{ManipulatorIndex, MoveSet, MAX_MANIPULATORS};
use crate::config::PlannerConfig;
use crate::geometry::Point2D;

/// Maximum steps per trajectory
pub const MAX_TRAJECTORY_STEPS: usize = 128;

/// Maximum samples per trajectory (`steps + 1`)
pub const MAX_TRAJECTORY_POINTS: usize = MAX_TRAJECTORY_STEPS + 1;

/// Default distance under which start and end are the same point (µm)
pub const DEFAULT_EPSILON_UM: f64 = 1e-6;

/// Sampled straight-line path of one manipulator tip
///
/// Never empty: a stationary trajectory has exactly one point.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Trajectory {
    points: Vec<Point2D, MAX_TRAJECTORY_POINTS>,
}

impl Trajectory {
    /// Single-point trajectory for a manipulator that does not move
    pub fn stationary(at: Point2D) -> Self {
        let mut points = Vec::new();
        let _ = points.push(at);
        Self { points }
    }

    /// Sample points in order
    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if there are no samples
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Check if this is a single-point trajectory
    pub fn is_stationary(&self) -> bool {
        self.points.len() == 1
    }

    /// First sample (the rest position before the move)
    pub fn start(&self) -> Point2D {
        self.points[0]
    }

    /// Last sample (the target)
    pub fn end(&self) -> Point2D {
        self.points[self.points.len() - 1]
    }

    /// Sample at a step index
    pub fn get(&self, step: usize) -> Option<Point2D> {
        self.points.get(step).copied()
    }
}

/// Sample a straight move from `start` to `end`
///
/// Returns `steps + 1` evenly spaced points with the first equal to `start`
/// and the last equal to `end`, or a single point if the two coincide
/// within [`DEFAULT_EPSILON_UM`]. `steps` is clamped to
/// `1..=MAX_TRAJECTORY_STEPS`.
pub fn generate_trajectory(start: Point2D, end: Point2D, steps: usize) -> Trajectory {
    generate_trajectory_with_epsilon(start, end, steps, DEFAULT_EPSILON_UM)
}

/// Sample a straight move with a caller-supplied coincidence epsilon
pub fn generate_trajectory_with_epsilon(
    start: Point2D,
    end: Point2D,
    steps: usize,
    epsilon: f64,
) -> Trajectory {
    if start.approx_eq(end, epsilon) {
        return Trajectory::stationary(start);
    }

    let steps = steps.clamp(1, MAX_TRAJECTORY_STEPS);
    let mut points = Vec::new();
    for i in 0..steps {
        let t = i as f64 / steps as f64;
        let _ = points.push(start.lerp(end, t));
    }
    // Exact end, free of interpolation rounding
    let _ = points.push(end);

    Trajectory { points }
}

/// Trajectories for every manipulator of a move set
#[derive(Debug, Clone, Default)]
pub struct TrajectorySet {
    slots: [Option<Trajectory>; MAX_MANIPULATORS],
}

impl TrajectorySet {
    /// Sample every move using the planner's step policy
    pub fn build(moves: &MoveSet, config: &PlannerConfig) -> Self {
        let mut set = Self::default();
        for (index, request) in moves.iter() {
            let steps = config.steps_for(request.current, request.target);
            set.slots[index.slot()] = Some(generate_trajectory_with_epsilon(
                request.current,
                request.target,
                steps,
                config.epsilon_um,
            ));
        }
        set
    }

    /// Trajectory for a manipulator
    pub fn get(&self, index: ManipulatorIndex) -> Option<&Trajectory> {
        self.slots[index.slot()].as_ref()
    }

    /// Trajectories in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = (ManipulatorIndex, &Trajectory)> {
        self.slots.iter().enumerate().filter_map(|(slot, t)| {
            Some((ManipulatorIndex::from_slot(slot)?, t.as_ref()?))
        })
    }

    /// Number of trajectories
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stationary_ignores_steps() {
        let p = Point2D::new(3.0, 4.0);
        for steps in [0, 1, 10, 1000] {
            let t = generate_trajectory(p, p, steps);
            assert_eq!(t.len(), 1);
            assert!(t.is_stationary());
            assert_eq!(t.start(), p);
            assert_eq!(t.end(), p);
        }
    }

    #[test]
    fn test_within_epsilon_is_stationary() {
        let p = Point2D::new(3.0, 4.0);
        let q = Point2D::new(3.0 + 1e-9, 4.0);
        assert!(generate_trajectory(p, q, 10).is_stationary());
    }

    #[test]
    fn test_step_count_and_endpoints() {
        let p = Point2D::new(0.0, 0.0);
        let q = Point2D::new(5.0, 0.0);
        let t = generate_trajectory(p, q, 10);
        assert_eq!(t.len(), 11);
        assert_eq!(t.start(), p);
        assert_eq!(t.end(), q);
    }

    #[test]
    fn test_even_spacing() {
        let t = generate_trajectory(Point2D::new(0.0, 0.0), Point2D::new(10.0, -20.0), 4);
        assert_eq!(t.get(1), Some(Point2D::new(2.5, -5.0)));
        assert_eq!(t.get(2), Some(Point2D::new(5.0, -10.0)));
        assert_eq!(t.get(3), Some(Point2D::new(7.5, -15.0)));
        assert_eq!(t.get(5), None);
    }

    #[test]
    fn test_steps_clamped() {
        let p = Point2D::new(0.0, 0.0);
        let q = Point2D::new(1.0, 1.0);
        assert_eq!(generate_trajectory(p, q, 0).len(), 2);
        assert_eq!(
            generate_trajectory(p, q, MAX_TRAJECTORY_STEPS * 4).len(),
            MAX_TRAJECTORY_POINTS
        );
    }

    #[test]
    fn test_trajectory_set_build() {
        let a = ManipulatorIndex::new(1).unwrap();
        let b = ManipulatorIndex::new(3).unwrap();
        let mut moves = MoveSet::new();
        moves.insert(a, Point2D::new(0.0, 0.0), Point2D::new(5.0, 0.0));
        moves.insert(b, Point2D::new(3.0, 0.0), Point2D::new(3.0, 0.0));

        let set = TrajectorySet::build(&moves, &PlannerConfig::default());
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(a).unwrap().len(), 11);
        assert!(set.get(b).unwrap().is_stationary());
        assert!(set.get(ManipulatorIndex::new(2).unwrap()).is_none());
    }
}
