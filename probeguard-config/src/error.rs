//! Setup loading errors

use core::fmt;
use std::io;

use probeguard_core::config::SetupError;

/// Setup loading errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Setup file could not be read
    Io(io::ErrorKind),
    /// TOML syntax or schema error, with the parser's message
    Toml(String),
    /// Parsed setup failed validation
    Invalid(SetupError),
}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e.kind())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Toml(e.to_string())
    }
}

impl From<SetupError> for ConfigError {
    fn from(e: SetupError) -> Self {
        ConfigError::Invalid(e)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(kind) => write!(f, "cannot read setup: {}", kind),
            ConfigError::Toml(msg) => write!(f, "invalid setup TOML: {}", msg),
            ConfigError::Invalid(e) => write!(f, "invalid setup: {:?}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ConfigError::Io(kind) => defmt::write!(f, "Io({})", defmt::Debug2Format(kind)),
            ConfigError::Toml(msg) => defmt::write!(f, "Toml({=str})", msg.as_str()),
            ConfigError::Invalid(e) => defmt::write!(f, "Invalid({})", e),
        }
    }
}
