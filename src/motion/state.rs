//! Kinematic state of a single axis.

use crate::config::units::MICROS_PER_SECOND;

use super::profile::{Direction, MotionPhase};

/// The mutable record the profile calculator and the step runner operate on.
///
/// A `KinematicState` is a plain value. The step runner owns the
/// authoritative copy; callers see it through
/// [`SharedKinematics`](crate::motor::SharedKinematics).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicState {
    /// Authoritative position in steps.
    pub current_position: i32,
    /// Desired final position in steps.
    pub target_position: i32,
    /// Period of the most recent step in microseconds; 0 at rest.
    pub current_period_us: f32,
    /// Period planned for the upcoming step in microseconds; 0 at rest.
    pub next_period_us: f32,
    /// Direction of the current motion.
    pub direction: Direction,
    /// Monotonic timestamp of the most recent step.
    pub last_step_us: u64,
    /// Phase chosen by the last profile computation.
    pub phase: MotionPhase,
}

impl KinematicState {
    /// A state at rest at `position` with nothing to do.
    pub const fn at_rest(position: i32) -> Self {
        Self {
            current_position: position,
            target_position: position,
            current_period_us: 0.0,
            next_period_us: 0.0,
            direction: Direction::Stopped,
            last_step_us: 0,
            phase: MotionPhase::Complete,
        }
    }

    /// Signed distance from the current position to the target.
    #[inline]
    pub fn distance_to_target(&self) -> i64 {
        self.target_position as i64 - self.current_position as i64
    }

    /// Whether the axis is in motion.
    #[inline]
    pub fn is_moving(&self) -> bool {
        self.direction != Direction::Stopped && self.current_period_us > 0.0
    }

    /// Unsigned speed in steps/s.
    #[inline]
    pub fn speed(&self) -> f32 {
        if self.is_moving() {
            MICROS_PER_SECOND / self.current_period_us
        } else {
            0.0
        }
    }

    /// Signed velocity in steps/s; the sign is the direction of motion.
    #[inline]
    pub fn velocity(&self) -> f32 {
        self.speed() * self.direction.sign() as f32
    }

    /// At the target and at rest.
    #[inline]
    pub fn is_motion_complete(&self) -> bool {
        !self.is_moving() && self.current_position == self.target_position
    }

    /// Bring the axis to rest where it is.
    pub(crate) fn settle(&mut self) {
        self.current_period_us = 0.0;
        self.next_period_us = 0.0;
        self.direction = Direction::Stopped;
        self.phase = MotionPhase::Complete;
    }
}

impl Default for KinematicState {
    fn default() -> Self {
        Self::at_rest(0)
    }
}
