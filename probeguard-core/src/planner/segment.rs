//! Axis-segmentation fallback
//!
//! When the direct moves admit no safe order, a diagonal move can be split
//! into two axis-aligned legs through one of the two corners of its
//! bounding rectangle. Each leg becomes its own node in the dependency
//! graph and the legs of different manipulators may interleave.
//!
//! For a leg and another manipulator resting at one of its waypoints:
//! - first waypoint: the leg runs after that manipulator's first leg
//! - last waypoint: the leg runs before that manipulator's last leg
//! - a middle waypoint: either before the leg that reaches it or after the
//!   leg that leaves it; both choices are tried

use heapless::Vec;

use super::graph::{DependencyGraph, MAX_NODES};
use crate::collision::matrix::path_collides;
use crate::collision::{BoundingBoxRegistry, RegistryError};
use crate::config::PlannerConfig;
use crate::geometry::Point2D;
use crate::motion::{
    generate_trajectory_with_epsilon, ManipulatorIndex, MoveSet, MoveStep, MAX_MANIPULATORS,
};

/// Start plus the end of each of at most two legs
pub const MAX_WAYPOINTS: usize = 3;

/// Limit on two-way ordering choices explored per candidate
pub const MAX_CHOICES: usize = 10;

/// Waypoints of one manipulator's route
pub type Waypoints = Vec<Point2D, MAX_WAYPOINTS>;

/// Legs of a segmented plan, in execution order
pub type LegSteps = Vec<MoveStep, MAX_NODES>;

/// Which axis a split move travels first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AxisOrder {
    /// `start -> (target.x, start.y) -> target`
    XThenY,
    /// `start -> (start.x, target.y) -> target`
    YThenX,
}

/// How one manipulator's move is routed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Decomposition {
    /// Straight line to the target
    #[default]
    Direct,
    /// Two axis-aligned legs
    Split(AxisOrder),
}

/// Route choice for every manipulator slot
pub type Assignment = [Decomposition; MAX_MANIPULATORS];

/// Waypoints of a move under a decomposition
///
/// Legs shorter than `epsilon` are dropped, so a stationary move has only
/// its start and an axis-parallel move never has more than one leg.
pub fn waypoints(
    start: Point2D,
    target: Point2D,
    decomposition: Decomposition,
    epsilon: f64,
) -> Waypoints {
    let mut route = Waypoints::new();
    let _ = route.push(start);

    let corner = match decomposition {
        Decomposition::Direct => None,
        Decomposition::Split(AxisOrder::XThenY) => Some(Point2D::new(target.x, start.y)),
        Decomposition::Split(AxisOrder::YThenX) => Some(Point2D::new(start.x, target.y)),
    };

    for point in corner.into_iter().chain(core::iter::once(target)) {
        let last = route[route.len() - 1];
        if !last.approx_eq(point, epsilon) {
            let _ = route.push(point);
        }
    }
    route
}

/// Two-way ordering choice for a leg against a manipulator parked mid-route
#[derive(Debug, Clone, Copy)]
struct Choice {
    leg: usize,
    /// Leg that brings the other manipulator to the waypoint
    reaches: usize,
    /// Leg that takes it away again
    leaves: usize,
}

/// Search for an interleaving of legs under one route assignment
///
/// Returns `Ok(None)` if no ordering keeps every leg clear.
pub fn plan_legs(
    registry: &BoundingBoxRegistry,
    moves: &MoveSet,
    assignment: &Assignment,
    config: &PlannerConfig,
) -> Result<Option<LegSteps>, RegistryError> {
    let epsilon = config.epsilon_um;
    let mut routes: [Waypoints; MAX_MANIPULATORS] = Default::default();
    let mut first_leg = [0usize; MAX_MANIPULATORS];
    let mut owner = [(0usize, 0usize); MAX_NODES];
    let mut graph = DependencyGraph::new();
    let mut legs = 0;

    for (index, request) in moves.iter() {
        if !registry.is_registered(index) {
            return Err(RegistryError::Unregistered(index));
        }
        let slot = index.slot();
        let route = waypoints(request.current, request.target, assignment[slot], epsilon);

        first_leg[slot] = legs;
        for leg in 0..route.len() - 1 {
            owner[legs] = (slot, leg);
            graph.add_node(legs);
            if leg > 0 {
                graph.add_dependency(legs, legs - 1);
            }
            legs += 1;
        }
        routes[slot] = route;
    }

    let mut choices: Vec<Choice, MAX_CHOICES> = Vec::new();

    for node in 0..legs {
        let (slot, leg) = owner[node];
        let Some(index) = ManipulatorIndex::from_slot(slot) else {
            continue;
        };
        let moving = registry
            .get_bounding_box(index)
            .ok_or(RegistryError::Unregistered(index))?;

        let from = routes[slot][leg];
        let to = routes[slot][leg + 1];
        let path = generate_trajectory_with_epsilon(from, to, config.steps_for(from, to), epsilon);

        for other in moves.indices() {
            if other == index {
                continue;
            }
            let obstacle = registry
                .get_bounding_box(other)
                .ok_or(RegistryError::Unregistered(other))?;
            let route = &routes[other.slot()];
            let other_legs = route.len() - 1;
            let base = first_leg[other.slot()];

            for (position, &point) in route.iter().enumerate() {
                if !path_collides(moving, &path, &obstacle.at(point)) {
                    continue;
                }
                if other_legs == 0 {
                    // Blocked by a manipulator that is not going anywhere
                    return Ok(None);
                }
                if position == 0 {
                    graph.add_dependency(node, base);
                } else if position == other_legs {
                    graph.add_dependency(base + other_legs - 1, node);
                } else {
                    let choice = Choice {
                        leg: node,
                        reaches: base + position - 1,
                        leaves: base + position,
                    };
                    if choices.push(choice).is_err() {
                        warn!("too many ordering choices, candidate skipped");
                        return Ok(None);
                    }
                }
            }
        }
    }

    for mask in 0u32..(1u32 << choices.len()) {
        let mut candidate = graph.clone();
        for (bit, choice) in choices.iter().enumerate() {
            if mask & (1 << bit) == 0 {
                candidate.add_dependency(choice.reaches, choice.leg);
            } else {
                candidate.add_dependency(choice.leg, choice.leaves);
            }
        }

        if let Ok(order) = candidate.topological_order() {
            let mut steps = LegSteps::new();
            for node in order {
                let (slot, leg) = owner[node];
                if let Some(index) = ManipulatorIndex::from_slot(slot) {
                    let _ = steps.push(MoveStep::new(index, routes[slot][leg + 1]));
                }
            }
            return Ok(Some(steps));
        }
    }

    Ok(None)
}

/// Route assignments to try, in order
///
/// Every offending manipulator X-then-Y, every one Y-then-X, then each
/// remaining mix of direct and split routes (which covers splitting only a
/// subset). The all-direct assignment is never produced.
#[derive(Debug, Clone)]
pub struct Candidates {
    offending: Vec<ManipulatorIndex, MAX_MANIPULATORS>,
    /// Position in the sequence
    cursor: u32,
    total: u32,
}

impl Candidates {
    /// Candidates over the given manipulators
    pub fn new(offending: impl IntoIterator<Item = ManipulatorIndex>) -> Self {
        let mut list = Vec::new();
        for index in offending {
            if !list.contains(&index) {
                let _ = list.push(index);
            }
        }
        let total = 3u32.pow(list.len() as u32);
        Self {
            offending: list,
            cursor: 0,
            total,
        }
    }

    /// Base-3 code with every digit equal to `digit`
    fn uniform(&self, digit: u32) -> u32 {
        (0..self.offending.len()).fold(0, |code, _| code * 3 + digit)
    }

    fn decode(&self, mut code: u32) -> Assignment {
        let mut assignment = Assignment::default();
        for index in &self.offending {
            assignment[index.slot()] = match code % 3 {
                1 => Decomposition::Split(AxisOrder::XThenY),
                2 => Decomposition::Split(AxisOrder::YThenX),
                _ => Decomposition::Direct,
            };
            code /= 3;
        }
        assignment
    }
}

impl Iterator for Candidates {
    type Item = Assignment;

    fn next(&mut self) -> Option<Assignment> {
        if self.offending.is_empty() {
            return None;
        }
        let all_x = self.uniform(1);
        let all_y = self.uniform(2);

        loop {
            let code = match self.cursor {
                0 => all_x,
                1 => all_y,
                n => {
                    // Codes 1..total, skipping the two uniform ones
                    let code = n - 1;
                    if code >= self.total {
                        return None;
                    }
                    if code == all_x || code == all_y {
                        self.cursor += 1;
                        continue;
                    }
                    code
                }
            };
            self.cursor += 1;
            return Some(self.decode(code));
        }
    }
}
