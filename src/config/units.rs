//! Unit types for physical quantities.
//!
//! Speeds and accelerations carry their unit in the type so that steps/s and
//! steps/s² cannot be swapped at a call site.

use serde::Deserialize;

/// Microseconds per second, the base for every period/speed conversion.
pub const MICROS_PER_SECOND: f32 = 1_000_000.0;

/// Speed in steps per second.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct StepsPerSec(pub f32);

impl StepsPerSec {
    /// Create a new StepsPerSec value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }

    /// Step period in microseconds at this speed.
    ///
    /// Returns `None` for a speed that is zero, negative or not finite.
    #[inline]
    pub fn period_us(self) -> Option<f32> {
        if self.0.is_finite() && self.0 > 0.0 {
            Some(MICROS_PER_SECOND / self.0)
        } else {
            None
        }
    }
}

/// Acceleration in steps per second squared.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct StepsPerSecSquared(pub f32);

impl StepsPerSecSquared {
    /// Create a new StepsPerSecSquared value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }
}

/// Extension trait for creating unit types from primitives.
pub trait UnitExt {
    /// Convert to StepsPerSec.
    fn steps_per_sec(self) -> StepsPerSec;
    /// Convert to StepsPerSecSquared.
    fn steps_per_sec_squared(self) -> StepsPerSecSquared;
}

impl UnitExt for f32 {
    #[inline]
    fn steps_per_sec(self) -> StepsPerSec {
        StepsPerSec(self)
    }

    #[inline]
    fn steps_per_sec_squared(self) -> StepsPerSecSquared {
        StepsPerSecSquared(self)
    }
}
