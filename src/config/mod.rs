//! Configuration module for stepper-ramp.
//!
//! Provides types for loading and validating motor configurations from TOML
//! files (with `std` feature) or pre-parsed data.

mod motor;
mod service;
mod system;
pub mod units;
#[cfg(feature = "std")]
mod loader;
mod validation;

pub use motor::MotorConfig;
pub use service::{ServiceSettings, DEFAULT_CORE, DEFAULT_POLL_INTERVAL_US, DEFAULT_STACK_SIZE};
pub use system::{SystemConfig, MAX_MOTORS};
pub use validation::validate_config;

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::{StepsPerSec, StepsPerSecSquared};
