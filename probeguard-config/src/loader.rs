//! Setup file loading
//!
//! Parses the station TOML with `serde` and validates it before anything
//! is registered.

use std::fs;
use std::path::Path;

use probeguard_core::config::SetupConfig;
use probeguard_core::MotionPlanner;

use super::error::ConfigError;

/// Parse and validate a setup from TOML text
pub fn parse_setup(text: &str) -> Result<SetupConfig, ConfigError> {
    let setup: SetupConfig = toml::from_str(text)?;
    setup.validate()?;
    log_setup_summary(&setup);
    Ok(setup)
}

/// Read, parse and validate a setup file
pub fn load_setup(path: impl AsRef<Path>) -> Result<SetupConfig, ConfigError> {
    let text = fs::read_to_string(path)?;
    parse_setup(&text)
}

/// Planner for the station described by a setup file
///
/// Every configured manipulator is registered at its setup tip.
pub fn load_planner(path: impl AsRef<Path>) -> Result<MotionPlanner, ConfigError> {
    let setup = load_setup(path)?;
    Ok(setup.build_planner()?)
}

/// Log a summary of the loaded setup
#[cfg(feature = "defmt")]
fn log_setup_summary(setup: &SetupConfig) {
    defmt::info!("Setup loaded successfully");
    defmt::debug!("  {} manipulators", setup.manipulators.len());
    defmt::debug!("  {} trajectory steps", setup.planner.trajectory_steps);
    defmt::debug!("  segmentation {}", setup.planner.segmentation);
}

#[cfg(not(feature = "defmt"))]
fn log_setup_summary(_setup: &SetupConfig) {}
