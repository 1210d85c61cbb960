//! Logging shims
//!
//! Forward to `defmt` when the `defmt` feature is enabled, otherwise the
//! arguments are evaluated by reference and discarded.

#![allow(unused_macros)]

#[cfg(feature = "defmt")]
macro_rules! trace {
    ($($arg:tt)*) => { ::defmt::trace!($($arg)*) };
}

#[cfg(feature = "defmt")]
macro_rules! debug {
    ($($arg:tt)*) => { ::defmt::debug!($($arg)*) };
}

#[cfg(feature = "defmt")]
macro_rules! info {
    ($($arg:tt)*) => { ::defmt::info!($($arg)*) };
}

#[cfg(feature = "defmt")]
macro_rules! warn {
    ($($arg:tt)*) => { ::defmt::warn!($($arg)*) };
}

#[cfg(not(feature = "defmt"))]
macro_rules! trace {
    ($s:literal $(, $x:expr)* $(,)?) => {{ let _ = ($( & $x ),*); }};
}

#[cfg(not(feature = "defmt"))]
macro_rules! debug {
    ($s:literal $(, $x:expr)* $(,)?) => {{ let _ = ($( & $x ),*); }};
}

#[cfg(not(feature = "defmt"))]
macro_rules! info {
    ($s:literal $(, $x:expr)* $(,)?) => {{ let _ = ($( & $x ),*); }};
}

#[cfg(not(feature = "defmt"))]
macro_rules! warn {
    ($s:literal $(, $x:expr)* $(,)?) => {{ let _ = ($( & $x ),*); }};
}
