//! Probe station setup loading
//!
//! Reads the station description (planner tuning and one silhouette per
//! manipulator) from TOML and turns it into a ready [`MotionPlanner`].
//!
//! ```toml
//! version = 1
//!
//! [planner]
//! trajectory_steps = 20
//!
//! [[manipulator]]
//! index = 1
//! label = "SMU force"
//! polygon = [{ x = -5, y = -5 }, { x = 400, y = -5 }, { x = 400, y = 60 }, { x = -5, y = 60 }]
//! tip = { x = 0, y = 0 }
//! ```

pub mod error;
pub mod loader;

pub use error::ConfigError;
pub use loader::{load_planner, load_setup, parse_setup};

pub use probeguard_core::config::SetupConfig;
pub use probeguard_core::MotionPlanner;
