//! Plan execution
//!
//! Runs a safe order or a segmented plan through a manipulator driver, one
//! blocking move at a time, keeping the registry in step with the hardware.

pub mod executor;

pub use executor::{ExecuteError, ExecutionSummary, SequenceExecutor};
