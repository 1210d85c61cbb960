//! Plan moves with the core planner and run them on the simulated bus.

use probeguard_core::config::{ManipulatorConfig, SetupConfig};
use probeguard_core::execution::ExecuteError;
use probeguard_core::planner::PlanStrategy;
use probeguard_core::state::{FaultKind, PlanState};
use probeguard_core::traits::{DriverError, ManipulatorDriver, StagePosition};
use probeguard_core::{BoundingPolygon, ManipulatorIndex, MotionPlanner, MoveSet, Point2D};
use probeguard_drivers::SimulatedManipulators;

const TIP_HEIGHT: f64 = 500.0;

fn idx(raw: u8) -> ManipulatorIndex {
    ManipulatorIndex::new(raw).unwrap()
}

/// Planner and bus with square boxes at the given tips
fn station(size: f64, tips: &[Point2D]) -> (MotionPlanner, SimulatedManipulators) {
    let mut setup = SetupConfig::new();
    let mut bus = SimulatedManipulators::new();

    for (slot, &tip) in tips.iter().enumerate() {
        let index = ManipulatorIndex::from_slot(slot).unwrap();
        let mut arm = ManipulatorConfig::new(index, BoundingPolygon::rectangle(size, size).unwrap());
        arm.tip = tip;
        setup.add_manipulator(arm).unwrap();
        bus.add_device(index, StagePosition::new(tip.x, tip.y, TIP_HEIGHT));
    }

    (setup.build_planner().unwrap(), bus)
}

fn assert_in_sync(planner: &MotionPlanner, bus: &mut SimulatedManipulators) {
    for (index, aabb) in planner.registry().iter() {
        let stage = bus.current_position(index).unwrap();
        assert_eq!(stage.planar(), aabb.tip(), "manipulator {:?}", index);
    }
}

#[test]
fn direct_plan_runs_obstacle_first() {
    let (mut planner, mut bus) = station(2.0, &[Point2D::ORIGIN, Point2D::new(5.0, 0.0)]);
    let moves = MoveSet::from_registry(
        planner.registry(),
        &[
            (idx(1), Point2D::new(10.0, 0.0)),
            (idx(2), Point2D::new(5.0, 10.0)),
        ],
    )
    .unwrap();

    let order = planner.plan_direct(&moves).unwrap().unwrap();
    let summary = planner.execute(&mut bus, &order, &moves.targets()).unwrap();

    assert_eq!(summary.moves(), 2);
    let moved: Vec<_> = bus.log().iter().map(|r| r.index).collect();
    assert_eq!(moved, vec![idx(2), idx(1)]);
    assert_eq!(planner.state(), PlanState::Executed);
    assert_in_sync(&planner, &mut bus);
}

#[test]
fn crossing_diagonals_run_in_legs() {
    let (mut planner, mut bus) = station(3.0, &[Point2D::new(0.0, 0.0), Point2D::new(0.0, 4.0)]);
    let moves = MoveSet::from_registry(
        planner.registry(),
        &[
            (idx(1), Point2D::new(6.0, 4.0)),
            (idx(2), Point2D::new(6.0, 0.0)),
        ],
    )
    .unwrap();

    let plan = planner.plan(&moves).unwrap().unwrap();
    assert_eq!(plan.strategy(), PlanStrategy::Segmented);
    assert!(planner.verify(&moves, &plan));

    planner.execute_plan(&mut bus, &plan).unwrap();
    assert_eq!(bus.move_count(), plan.len());
    assert_eq!(
        planner.registry().tip_position(idx(1)),
        Some(Point2D::new(6.0, 4.0))
    );
    assert_eq!(
        planner.registry().tip_position(idx(2)),
        Some(Point2D::new(6.0, 0.0))
    );
    assert_in_sync(&planner, &mut bus);
}

#[test]
fn fault_mid_plan_leaves_registry_at_last_confirmed_move() {
    let (mut planner, mut bus) = station(
        2.0,
        &[
            Point2D::new(0.0, 0.0),
            Point2D::new(100.0, 0.0),
            Point2D::new(200.0, 0.0),
        ],
    );
    let moves = MoveSet::from_registry(
        planner.registry(),
        &[
            (idx(1), Point2D::new(0.0, 20.0)),
            (idx(2), Point2D::new(100.0, 20.0)),
            (idx(3), Point2D::new(200.0, 20.0)),
        ],
    )
    .unwrap();
    let plan = planner.plan(&moves).unwrap().unwrap();
    bus.fail_after(1, DriverError::CommunicationError);

    let err = planner.execute_plan(&mut bus, &plan).unwrap_err();
    assert_eq!(
        err,
        ExecuteError::HardwareFault {
            index: idx(2),
            error: DriverError::CommunicationError,
            completed: 1,
        }
    );
    assert_eq!(planner.state(), PlanState::Faulted(FaultKind::Hardware));

    // Caller re-queries the hardware before planning again
    assert_in_sync(&planner, &mut bus);
    assert_eq!(
        planner.registry().tip_position(idx(3)),
        Some(Point2D::new(200.0, 0.0))
    );

    bus.clear_fault();
    let remaining = MoveSet::from_registry(
        planner.registry(),
        &[
            (idx(2), Point2D::new(100.0, 20.0)),
            (idx(3), Point2D::new(200.0, 20.0)),
        ],
    )
    .unwrap();
    let plan = planner.plan(&remaining).unwrap().unwrap();
    planner.execute_plan(&mut bus, &plan).unwrap();
    assert_eq!(planner.state(), PlanState::Executed);
    assert_in_sync(&planner, &mut bus);
}

#[test]
fn infeasible_plan_moves_nothing() {
    let obstacle = Point2D::new(3.0, 0.0);
    let (mut planner, bus) = station(2.0, &[Point2D::ORIGIN, obstacle]);
    let moves = MoveSet::from_registry(
        planner.registry(),
        &[(idx(1), Point2D::new(5.0, 0.0)), (idx(2), obstacle)],
    )
    .unwrap();

    assert_eq!(planner.plan(&moves), Ok(None));
    assert_eq!(planner.state(), PlanState::Infeasible);
    assert_eq!(bus.move_count(), 0);
}

#[test]
fn idle_arm_blocks_a_move_left_out_of_the_set() {
    let (mut planner, bus) = station(2.0, &[Point2D::ORIGIN, Point2D::new(3.0, 0.0)]);
    let moves = MoveSet::from_registry(planner.registry(), &[(idx(1), Point2D::new(5.0, 0.0))])
        .unwrap();

    assert_eq!(planner.plan_direct(&moves), Ok(None));
    assert_eq!(planner.plan(&moves), Ok(None));
    assert_eq!(planner.state(), PlanState::Infeasible);
    assert_eq!(bus.move_count(), 0);
}
