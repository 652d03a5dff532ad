//! Step/direction pulse emission.
//!
//! Generic over embedded-hal 1.0 pin and delay types.

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};

use crate::error::MotorError;
use crate::motion::Direction;

/// Default STEP pulse width in microseconds.
pub const DEFAULT_PULSE_WIDTH_US: u32 = 2;

/// The hardware side of a stepper: a direction line, a step line and an
/// optional enable line.
///
/// The step runner only decides *when* to step and in *which direction*;
/// implementations own the pin-level timing of the pulse itself.
pub trait PulseEmitter {
    /// Settle the direction line. `Direction::Stopped` leaves it as is.
    fn set_direction(&mut self, direction: Direction) -> Result<(), MotorError>;

    /// Emit one minimal-width pulse on the step line.
    fn step_pulse(&mut self) -> Result<(), MotorError>;

    /// Energise or release the driver.
    fn set_enabled(&mut self, enabled: bool) -> Result<(), MotorError>;
}

/// Placeholder for an unconnected enable line.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Pulse emitter for step/direction driver carriers (A4988, DRV8825, TMC in
/// standalone mode, ...).
///
/// Generic over:
/// - `STEP`: STEP pin type (must implement `OutputPin`)
/// - `DIR`: DIR pin type (must implement `OutputPin`)
/// - `EN`: ENABLE pin type, [`NoPin`] when not wired
/// - `DELAY`: Delay provider for the pulse width (must implement `DelayNs`)
pub struct StepDirDriver<STEP, DIR, EN, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    DELAY: DelayNs,
{
    step_pin: STEP,
    dir_pin: DIR,
    enable_pin: EN,
    delay: DELAY,
    /// Cached to avoid unnecessary pin writes.
    current_direction: Option<Direction>,
    invert_direction: bool,
    enable_active_low: bool,
    pulse_width_us: u32,
}

impl<STEP, DIR, EN, DELAY> StepDirDriver<STEP, DIR, EN, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    DELAY: DelayNs,
{
    /// Bind the pins. The enable line defaults to active-low.
    pub fn new(step_pin: STEP, dir_pin: DIR, enable_pin: EN, delay: DELAY) -> Self {
        Self {
            step_pin,
            dir_pin,
            enable_pin,
            delay,
            current_direction: None,
            invert_direction: false,
            enable_active_low: true,
            pulse_width_us: DEFAULT_PULSE_WIDTH_US,
        }
    }

    /// Swap the DIR level for both directions.
    pub fn with_inverted_direction(mut self, invert: bool) -> Self {
        self.invert_direction = invert;
        self
    }

    /// Drive ENABLE low (`true`) or high (`false`) to energise the driver.
    pub fn with_enable_active_low(mut self, active_low: bool) -> Self {
        self.enable_active_low = active_low;
        self
    }

    /// STEP high time in microseconds.
    pub fn with_pulse_width_us(mut self, pulse_width_us: u32) -> Self {
        self.pulse_width_us = pulse_width_us;
        self
    }

    /// Direction last written to the DIR pin.
    #[inline]
    pub fn current_direction(&self) -> Option<Direction> {
        self.current_direction
    }

    /// Release the pins and delay.
    pub fn release(self) -> (STEP, DIR, EN, DELAY) {
        (self.step_pin, self.dir_pin, self.enable_pin, self.delay)
    }
}

impl<STEP, DIR, EN, DELAY> PulseEmitter for StepDirDriver<STEP, DIR, EN, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    DELAY: DelayNs,
{
    fn set_direction(&mut self, direction: Direction) -> Result<(), MotorError> {
        if direction == Direction::Stopped || self.current_direction == Some(direction) {
            return Ok(());
        }

        let pin_high = match direction {
            Direction::Forward => !self.invert_direction,
            _ => self.invert_direction,
        };

        if pin_high {
            self.dir_pin.set_high().map_err(|_| MotorError::PinError)?;
        } else {
            self.dir_pin.set_low().map_err(|_| MotorError::PinError)?;
        }

        self.current_direction = Some(direction);
        Ok(())
    }

    fn step_pulse(&mut self) -> Result<(), MotorError> {
        self.step_pin.set_high().map_err(|_| MotorError::PinError)?;
        self.delay.delay_us(self.pulse_width_us);
        self.step_pin.set_low().map_err(|_| MotorError::PinError)
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<(), MotorError> {
        if enabled != self.enable_active_low {
            self.enable_pin.set_high().map_err(|_| MotorError::PinError)
        } else {
            self.enable_pin.set_low().map_err(|_| MotorError::PinError)
        }
    }
}
