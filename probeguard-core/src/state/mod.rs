//! Planning-call state machine
//!
//! Tracks where a planning call is between sampling the moves and running
//! them on hardware. The machine is explicit, finite, and deterministic.

pub mod events;
pub mod machine;

pub use events::PlanEvent;
pub use machine::{FaultKind, PlanState};
