//! Hardware abstraction traits
//!
//! These traits define the interface between the planning logic and the
//! manipulator controller that actually moves the probes.

pub mod manipulator;

pub use manipulator::{DriverError, ManipulatorDriver, StagePosition};
