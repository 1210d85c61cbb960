//! Configuration types
//!
//! Board-agnostic setup structures: planner tuning and the static
//! per-manipulator probe silhouettes registered once at setup time.

pub mod types;

pub use types::*;
