//! Manipulator driver trait
//!
//! This trait abstracts over micromanipulator controllers that share one
//! command bus and actuate a single device at a time.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geometry::Point2D;
use crate::motion::ManipulatorIndex;

/// Stage coordinates reported by a controller (µm)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StagePosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl StagePosition {
    /// Create a stage position
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Projection onto the planning plane
    pub fn planar(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// Errors that can occur with manipulator operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError {
    /// Communication error with the controller (serial link)
    CommunicationError,
    /// Move did not complete in time
    Timeout,
    /// No device answers at this index
    DeviceNotFound,
    /// Controller refused the target (out of travel, non-finite)
    MoveRejected,
    /// Move issued to a device that is not the active one
    NotActive,
    /// Controller is still executing a previous command
    Busy,
}

/// Trait for micromanipulator controllers
///
/// Only one device is actuated at a time: callers select it with
/// [`change_active_device`](Self::change_active_device) before moving it.
pub trait ManipulatorDriver {
    /// Read the current stage position of a device
    fn current_position(&mut self, index: ManipulatorIndex) -> Result<StagePosition, DriverError>;

    /// Make a device the target of subsequent moves
    fn change_active_device(&mut self, index: ManipulatorIndex) -> Result<(), DriverError>;

    /// Move the active device and block until the controller confirms
    ///
    /// `z` of `None` keeps the current height.
    fn move_to(
        &mut self,
        index: ManipulatorIndex,
        x: f64,
        y: f64,
        z: Option<f64>,
    ) -> Result<(), DriverError>;
}

impl<T: ManipulatorDriver + ?Sized> ManipulatorDriver for &mut T {
    fn current_position(&mut self, index: ManipulatorIndex) -> Result<StagePosition, DriverError> {
        (**self).current_position(index)
    }

    fn change_active_device(&mut self, index: ManipulatorIndex) -> Result<(), DriverError> {
        (**self).change_active_device(index)
    }

    fn move_to(
        &mut self,
        index: ManipulatorIndex,
        x: f64,
        y: f64,
        z: Option<f64>,
    ) -> Result<(), DriverError> {
        (**self).move_to(index, x, y, z)
    }
}
