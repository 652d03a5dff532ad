//! Error types for stepper-ramp.
//!
//! Provides unified error handling across configuration, motor construction,
//! and the background step service.
//!
//! The motion profile calculator itself never fails: degenerate input always
//! produces a well-defined plan, so nothing in `motion` returns these errors.

use core::fmt;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all stepper-ramp operations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Motor construction or pin error
    Motor(MotorError),
    /// Background service lifecycle error
    Service(ServiceError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Motor name not found in configuration
    MotorNotFound(heapless::String<32>),
    /// Invalid max speed (must be > 0)
    InvalidMaxSpeed(f32),
    /// Invalid acceleration (must be > 0)
    InvalidAcceleration(f32),
    /// Invalid deceleration (must be > 0)
    InvalidDeceleration(f32),
    /// Two pin roles are bound to the same pin number
    DuplicatePin(u8),
    /// Invalid service stack size (must be > 0)
    InvalidStackSize(u32),
    /// Invalid service poll interval (must be > 0)
    InvalidPollInterval(u32),
    /// A required builder field was not supplied
    MissingField(&'static str),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Motor operation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorError {
    /// Pin operation failed
    PinError,
    /// Operation needs exclusive access to the pins, but the service owns them
    ServiceRunning,
}

/// Service lifecycle errors.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServiceError {
    /// A service is already running for this motor
    AlreadyRunning,
    /// The background task could not be created
    Spawn(heapless::String<64>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Motor(e) => write!(f, "Motor error: {}", e),
            Error::Service(e) => write!(f, "Service error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::MotorNotFound(name) => write!(f, "Motor '{}' not found", name),
            ConfigError::InvalidMaxSpeed(v) => write!(f, "Invalid max speed: {}. Must be > 0", v),
            ConfigError::InvalidAcceleration(v) => {
                write!(f, "Invalid acceleration: {}. Must be > 0", v)
            }
            ConfigError::InvalidDeceleration(v) => {
                write!(f, "Invalid deceleration: {}. Must be > 0", v)
            }
            ConfigError::DuplicatePin(pin) => {
                write!(f, "Pin {} is bound to more than one role", pin)
            }
            ConfigError::InvalidStackSize(v) => write!(f, "Invalid stack size: {}. Must be > 0", v),
            ConfigError::InvalidPollInterval(v) => {
                write!(f, "Invalid poll interval: {} us. Must be > 0", v)
            }
            ConfigError::MissingField(field) => write!(f, "{} is required", field),
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for MotorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorError::PinError => write!(f, "GPIO pin operation failed"),
            MotorError::ServiceRunning => {
                write!(f, "Pins are owned by the running step service")
            }
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::AlreadyRunning => write!(f, "Step service is already running"),
            ServiceError::Spawn(msg) => write!(f, "Failed to create step task: {}", msg),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<MotorError> for Error {
    fn from(e: MotorError) -> Self {
        Error::Motor(e)
    }
}

impl From<ServiceError> for Error {
    fn from(e: ServiceError) -> Self {
        Error::Service(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for MotorError {}

#[cfg(feature = "std")]
impl std::error::Error for ServiceError {}
