//! Simulated manipulator bus
//!
//! Behaves like a controller that drives one device at a time:
//! - Moves are only accepted for the active device
//! - Positions update instantly on a successful move
//! - Every accepted move is logged for later inspection
//! - A fault can be injected after a given number of moves
//!
//! # Usage
//!
//! ```ignore
//! let mut bus = SimulatedManipulators::new()
//!     .with_device(index, StagePosition::new(0.0, 0.0, 500.0));
//! planner.execute_plan(&mut bus, &plan)?;
//! assert_eq!(bus.move_count(), plan.len());
//! ```

use heapless::Vec;
use probeguard_core::motion::{ManipulatorIndex, MAX_MANIPULATORS};
use probeguard_core::traits::{DriverError, ManipulatorDriver, StagePosition};

/// Moves kept in the log; later moves still run but are not recorded
pub const MAX_LOGGED_MOVES: usize = 64;

/// One accepted move
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveRecord {
    pub index: ManipulatorIndex,
    pub position: StagePosition,
}

/// Injected failure
#[derive(Debug, Clone, Copy)]
struct Fault {
    /// Moves accepted before the failure
    after: usize,
    error: DriverError,
}

/// In-memory stand-in for a manipulator controller
#[derive(Debug, Clone, Default)]
pub struct SimulatedManipulators {
    positions: [Option<StagePosition>; MAX_MANIPULATORS],
    active: Option<ManipulatorIndex>,
    log: Vec<MoveRecord, MAX_LOGGED_MOVES>,
    moves: usize,
    fault: Option<Fault>,
    /// Largest absolute x or y a device can reach (µm)
    travel_limit: Option<f64>,
}

impl SimulatedManipulators {
    /// Create a bus with no devices
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device at a starting position
    pub fn with_device(mut self, index: ManipulatorIndex, position: StagePosition) -> Self {
        self.add_device(index, position);
        self
    }

    /// Add or replace a device
    pub fn add_device(&mut self, index: ManipulatorIndex, position: StagePosition) {
        self.positions[index.slot()] = Some(position);
    }

    /// Reject moves beyond `limit` on either axis
    pub fn set_travel_limit(&mut self, limit: f64) {
        self.travel_limit = Some(limit);
    }

    /// Fail the move issued after `moves` successful ones
    pub fn fail_after(&mut self, moves: usize, error: DriverError) {
        self.fault = Some(Fault {
            after: moves,
            error,
        });
    }

    /// Remove an injected fault
    pub fn clear_fault(&mut self) {
        self.fault = None;
    }

    /// Currently selected device
    pub fn active_device(&self) -> Option<ManipulatorIndex> {
        self.active
    }

    /// Position of a device, if present
    pub fn position(&self, index: ManipulatorIndex) -> Option<StagePosition> {
        self.positions[index.slot()]
    }

    /// Accepted moves in order
    pub fn log(&self) -> &[MoveRecord] {
        &self.log
    }

    /// Number of accepted moves, including unlogged ones
    pub fn move_count(&self) -> usize {
        self.moves
    }

    fn within_travel(&self, x: f64, y: f64) -> bool {
        match self.travel_limit {
            Some(limit) => (-limit..=limit).contains(&x) && (-limit..=limit).contains(&y),
            None => true,
        }
    }
}

impl ManipulatorDriver for SimulatedManipulators {
    fn current_position(&mut self, index: ManipulatorIndex) -> Result<StagePosition, DriverError> {
        self.positions[index.slot()].ok_or(DriverError::DeviceNotFound)
    }

    fn change_active_device(&mut self, index: ManipulatorIndex) -> Result<(), DriverError> {
        if self.positions[index.slot()].is_none() {
            return Err(DriverError::DeviceNotFound);
        }
        self.active = Some(index);
        Ok(())
    }

    fn move_to(
        &mut self,
        index: ManipulatorIndex,
        x: f64,
        y: f64,
        z: Option<f64>,
    ) -> Result<(), DriverError> {
        let Some(current) = self.positions[index.slot()] else {
            return Err(DriverError::DeviceNotFound);
        };
        if self.active != Some(index) {
            return Err(DriverError::NotActive);
        }
        if !x.is_finite() || !y.is_finite() || !self.within_travel(x, y) {
            return Err(DriverError::MoveRejected);
        }
        if let Some(fault) = self.fault {
            if self.moves >= fault.after {
                return Err(fault.error);
            }
        }

        let position = StagePosition::new(x, y, z.unwrap_or(current.z));
        self.positions[index.slot()] = Some(position);
        self.moves += 1;
        let _ = self.log.push(MoveRecord { index, position });
        Ok(())
    }
}
