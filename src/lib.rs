//! # stepper-ramp
//!
//! Trapezoidal step/direction stepper control with embedded-hal 1.0 support.
//!
//! ## Features
//!
//! - **Trapezoidal ramps**: accelerate, cruise and decelerate with independent
//!   acceleration and deceleration rates
//! - **No overshoot**: deceleration starts early enough to stop exactly on any
//!   target that can still be reached at the configured deceleration; a
//!   target moved inside the stopping distance is passed, and the axis brakes,
//!   reverses and returns without ever exceeding its limits
//! - **Background step task**: a dedicated thread, optionally pinned to a CPU
//!   core, runs the step loop while callers read and steer it through atomics
//! - **no_std compatible**: the profile calculator, the step runner and the
//!   shared state work without the standard library
//! - **embedded-hal 1.0**: Uses `OutputPin` for STEP/DIR/ENABLE, `DelayNs` for
//!   the pulse width
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stepper_ramp::{StepperBuilder, UnitExt};
//!
//! let mut stepper = StepperBuilder::new()
//!     .step_pin(step_pin)
//!     .dir_pin(dir_pin)
//!     .delay(delay)
//!     .max_speed(1000.0.steps_per_sec())
//!     .acceleration(2000.0.steps_per_sec_squared())
//!     .build()?;
//!
//! stepper.start_as_service(1);
//! stepper.set_target_position_in_steps(500);
//!
//! while !stepper.is_motion_complete() {
//!     std::thread::sleep(std::time::Duration::from_millis(10));
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): background step task, wall clock, TOML file loading
//! - `rt`: pin the step task to its CPU core (Linux)
//! - `defmt`: Enables defmt logging for embedded targets
//! - `log`: Enables `log` logging for hosted targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

// This must go first so the logging macros are visible to every module.
#[macro_use]
mod fmt;

// Core modules
pub mod clock;
pub mod config;
pub mod error;
pub mod motion;
pub mod motor;
#[cfg(feature = "std")]
pub mod service;

// Re-exports for ergonomic API
pub use clock::Clock;
pub use config::{validate_config, MotorConfig, ServiceSettings, SystemConfig};
pub use error::{Error, Result};
pub use motion::{
    determine_period_of_next_step, Direction, KinematicLimits, KinematicState, MotionPhase,
    StepPlan, StepRunner,
};
pub use motor::{NoPin, PulseEmitter, SharedKinematics, StepDirDriver};

#[cfg(feature = "std")]
pub use clock::{ManualClock, StdClock};
#[cfg(feature = "std")]
pub use motor::{Stepper, StepperBuilder};
#[cfg(feature = "std")]
pub use service::{ServiceConfig, ServiceHandle};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};

// Unit types
pub use config::units::{StepsPerSec, StepsPerSecSquared, UnitExt};
