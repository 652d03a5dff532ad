//! Motion module for stepper-ramp.
//!
//! Kinematic state and limits, the per-step profile calculator and the
//! runner that turns its decisions into pulses.

pub(crate) mod limits;
mod profile;
mod runner;
mod state;

pub use limits::{KinematicLimits, MIN_KINEMATIC_VALUE};
pub use profile::{determine_period_of_next_step, Direction, MotionPhase, StepPlan};
pub use runner::StepRunner;
pub use state::KinematicState;
