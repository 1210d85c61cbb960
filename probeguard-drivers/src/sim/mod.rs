//! Simulated manipulator controllers

pub mod manipulator;

pub use manipulator::{MoveRecord, SimulatedManipulators, MAX_LOGGED_MOVES};
