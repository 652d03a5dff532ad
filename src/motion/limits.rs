//! Kinematic limits and the step periods derived from them.

use libm::sqrtf;

use crate::config::units::MICROS_PER_SECOND;

/// Smallest value accepted for speed, acceleration or deceleration.
///
/// Non-positive or non-finite values are clamped up to this.
pub const MIN_KINEMATIC_VALUE: f32 = 1.0e-3;

/// Ratio between the slowest step period and the longest period that still
/// counts as "about to stop".
const STOPPED_MOTION_RATIO: f32 = 2.8;

/// Margin applied to the stop threshold so that a period computed right at
/// the threshold is not rejected by rounding.
const STOP_THRESHOLD_MARGIN: f32 = 0.99;

/// Speed, acceleration and deceleration limits plus derived periods.
///
/// The derived periods are computed once, when the limits change, and read
/// on every profile computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicLimits {
    max_speed: f32,
    acceleration: f32,
    deceleration: f32,
    desired_period_us: f32,
    slowest_period_us: f32,
    stopped_motion_period_us: f32,
}

impl KinematicLimits {
    /// Create limits from steps/s, steps/s² and steps/s².
    ///
    /// Values that are not strictly positive are clamped to
    /// [`MIN_KINEMATIC_VALUE`].
    pub fn new(max_speed: f32, acceleration: f32, deceleration: f32) -> Self {
        let max_speed = sanitize(max_speed);
        let acceleration = sanitize(acceleration);
        let deceleration = sanitize(deceleration);

        let desired_period_us = MICROS_PER_SECOND / max_speed;

        // First step out of rest. Never faster than the commanded max speed,
        // and slow enough that either ramp can follow it.
        let ramp = acceleration.min(deceleration);
        let slowest_period_us = (MICROS_PER_SECOND / sqrtf(2.0 * ramp)).max(desired_period_us);

        // Period of the final step into the target under full deceleration.
        let last_step_period_us = MICROS_PER_SECOND / sqrtf(2.0 * deceleration);
        let stopped_motion_period_us = (slowest_period_us / STOPPED_MOTION_RATIO)
            .min(last_step_period_us)
            * STOP_THRESHOLD_MARGIN;

        Self {
            max_speed,
            acceleration,
            deceleration,
            desired_period_us,
            slowest_period_us,
            stopped_motion_period_us,
        }
    }

    /// Maximum speed in steps/s.
    #[inline]
    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    /// Acceleration in steps/s².
    #[inline]
    pub fn acceleration(&self) -> f32 {
        self.acceleration
    }

    /// Deceleration in steps/s².
    #[inline]
    pub fn deceleration(&self) -> f32 {
        self.deceleration
    }

    /// Step period at max speed, in microseconds.
    #[inline]
    pub fn desired_period_us(&self) -> f32 {
        self.desired_period_us
    }

    /// Longest step period the profile ever produces, in microseconds.
    ///
    /// This is also the period of the first step out of rest.
    #[inline]
    pub fn slowest_period_us(&self) -> f32 {
        self.slowest_period_us
    }

    /// A moving axis whose period is at least this long may stop or reverse
    /// on its next decision.
    #[inline]
    pub fn stopped_motion_period_us(&self) -> f32 {
        self.stopped_motion_period_us
    }

    /// Steps needed to come to rest from `speed` (steps/s) at full
    /// deceleration: v² / 2d.
    #[inline]
    pub fn stopping_distance(&self, speed: f32) -> f32 {
        speed * speed / (2.0 * self.deceleration)
    }

    /// Shortest period that still lets the axis stop within
    /// `remaining_steps` at full deceleration.
    #[inline]
    pub fn braking_period_us(&self, remaining_steps: u32) -> f32 {
        MICROS_PER_SECOND / sqrtf(2.0 * self.deceleration * remaining_steps.max(1) as f32)
    }
}

impl Default for KinematicLimits {
    fn default() -> Self {
        Self::new(1000.0, 1000.0, 1000.0)
    }
}

/// Clamp a kinematic value to the accepted positive range.
#[inline]
pub(crate) fn sanitize(value: f32) -> f32 {
    if value.is_finite() && value >= MIN_KINEMATIC_VALUE {
        value
    } else if value == f32::INFINITY {
        f32::MAX
    } else {
        MIN_KINEMATIC_VALUE
    }
}
