//! Motor module for stepper-ramp.
//!
//! The pulse emitter boundary, the state shared with callers and, with
//! `std`, the stepper object that hosts the background step task.

mod driver;
mod shared;

#[cfg(feature = "std")]
mod builder;
#[cfg(feature = "std")]
mod stepper;

pub use driver::{NoPin, PulseEmitter, StepDirDriver, DEFAULT_PULSE_WIDTH_US};
pub use shared::SharedKinematics;

#[cfg(feature = "std")]
pub use builder::StepperBuilder;
#[cfg(feature = "std")]
pub use stepper::Stepper;
