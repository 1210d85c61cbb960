//! Manipulator driver implementations
//!
//! This crate provides concrete implementations of the
//! [`ManipulatorDriver`](probeguard_core::traits::ManipulatorDriver) trait
//! defined in probeguard-core:
//!
//! - Simulated controller (bench testing, dry runs, fault injection)

#![no_std]
#![deny(unsafe_code)]

pub mod sim;

pub use sim::{MoveRecord, SimulatedManipulators};
