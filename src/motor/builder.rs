//! Builder pattern for Stepper.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::clock::{Clock, StdClock};
use crate::config::units::{StepsPerSec, StepsPerSecSquared};
use crate::config::{MotorConfig, ServiceSettings, SystemConfig};
use crate::error::{ConfigError, Error, Result};
use crate::motion::KinematicLimits;
use crate::service::ServiceConfig;

use super::driver::{NoPin, StepDirDriver, DEFAULT_PULSE_WIDTH_US};
use super::stepper::Stepper;

/// Builder for creating [`Stepper`] instances on step/direction drivers.
///
/// Starts out with no enable line and the wall clock; [`enable_pin`] and
/// [`clock`] swap those in.
///
/// [`enable_pin`]: StepperBuilder::enable_pin
/// [`clock`]: StepperBuilder::clock
pub struct StepperBuilder<STEP, DIR, DELAY, EN = NoPin, C = StdClock>
where
    STEP: OutputPin,
    DIR: OutputPin,
    DELAY: DelayNs,
    EN: OutputPin,
    C: Clock,
{
    step_pin: Option<STEP>,
    dir_pin: Option<DIR>,
    enable_pin: EN,
    delay: Option<DELAY>,
    clock: C,
    name: Option<heapless::String<32>>,
    max_speed: Option<StepsPerSec>,
    acceleration: Option<StepsPerSecSquared>,
    deceleration: Option<StepsPerSecSquared>,
    invert_direction: bool,
    enable_active_low: bool,
    pulse_width_us: u32,
    service: ServiceSettings,
}

impl<STEP, DIR, DELAY> Default for StepperBuilder<STEP, DIR, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    DELAY: DelayNs,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<STEP, DIR, DELAY> StepperBuilder<STEP, DIR, DELAY>
where
    STEP: OutputPin,
    DIR: OutputPin,
    DELAY: DelayNs,
{
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            step_pin: None,
            dir_pin: None,
            enable_pin: NoPin,
            delay: None,
            clock: StdClock::new(),
            name: None,
            max_speed: None,
            acceleration: None,
            deceleration: None,
            invert_direction: false,
            enable_active_low: true,
            pulse_width_us: DEFAULT_PULSE_WIDTH_US,
            service: ServiceSettings::default(),
        }
    }
}

impl<STEP, DIR, DELAY, EN, C> StepperBuilder<STEP, DIR, DELAY, EN, C>
where
    STEP: OutputPin + Send + 'static,
    DIR: OutputPin + Send + 'static,
    DELAY: DelayNs + Send + 'static,
    EN: OutputPin + Send + 'static,
    C: Clock + Send + 'static,
{
    /// Set the STEP pin.
    pub fn step_pin(mut self, pin: STEP) -> Self {
        self.step_pin = Some(pin);
        self
    }

    /// Set the DIR pin.
    pub fn dir_pin(mut self, pin: DIR) -> Self {
        self.dir_pin = Some(pin);
        self
    }

    /// Set the delay provider used for the pulse width.
    pub fn delay(mut self, delay: DELAY) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Bind an ENABLE pin.
    pub fn enable_pin<P>(self, pin: P) -> StepperBuilder<STEP, DIR, DELAY, P, C>
    where
        P: OutputPin,
    {
        StepperBuilder {
            step_pin: self.step_pin,
            dir_pin: self.dir_pin,
            enable_pin: pin,
            delay: self.delay,
            clock: self.clock,
            name: self.name,
            max_speed: self.max_speed,
            acceleration: self.acceleration,
            deceleration: self.deceleration,
            invert_direction: self.invert_direction,
            enable_active_low: self.enable_active_low,
            pulse_width_us: self.pulse_width_us,
            service: self.service,
        }
    }

    /// Use another time source.
    pub fn clock<T>(self, clock: T) -> StepperBuilder<STEP, DIR, DELAY, EN, T>
    where
        T: Clock,
    {
        StepperBuilder {
            step_pin: self.step_pin,
            dir_pin: self.dir_pin,
            enable_pin: self.enable_pin,
            delay: self.delay,
            clock,
            name: self.name,
            max_speed: self.max_speed,
            acceleration: self.acceleration,
            deceleration: self.deceleration,
            invert_direction: self.invert_direction,
            enable_active_low: self.enable_active_low,
            pulse_width_us: self.pulse_width_us,
            service: self.service,
        }
    }

    /// Set the motor name.
    pub fn name(mut self, name: &str) -> Self {
        self.name = heapless::String::try_from(name).ok();
        self
    }

    /// Set the max speed.
    pub fn max_speed(mut self, speed: StepsPerSec) -> Self {
        self.max_speed = Some(speed);
        self
    }

    /// Set the acceleration.
    pub fn acceleration(mut self, acceleration: StepsPerSecSquared) -> Self {
        self.acceleration = Some(acceleration);
        self
    }

    /// Set the deceleration. Defaults to the acceleration.
    pub fn deceleration(mut self, deceleration: StepsPerSecSquared) -> Self {
        self.deceleration = Some(deceleration);
        self
    }

    /// Set direction inversion.
    pub fn invert_direction(mut self, invert: bool) -> Self {
        self.invert_direction = invert;
        self
    }

    /// Set the ENABLE polarity.
    pub fn enable_active_low(mut self, active_low: bool) -> Self {
        self.enable_active_low = active_low;
        self
    }

    /// Set the STEP pulse width in microseconds.
    pub fn pulse_width_us(mut self, pulse_width_us: u32) -> Self {
        self.pulse_width_us = pulse_width_us;
        self
    }

    /// Set the background task settings.
    pub fn service(mut self, service: ServiceSettings) -> Self {
        self.service = service;
        self
    }

    /// Configure from a MotorConfig.
    ///
    /// Pin numbers in the configuration identify the pins; the pin objects
    /// themselves are still passed to [`step_pin`](Self::step_pin) and
    /// friends.
    pub fn from_motor_config(mut self, config: &MotorConfig) -> Self {
        self.name = Some(config.name.clone());
        self.max_speed = Some(config.max_speed);
        self.acceleration = Some(config.acceleration);
        self.deceleration = config.deceleration;
        self.invert_direction = config.invert_direction;
        self.enable_active_low = config.enable_active_low;
        self.pulse_width_us = config.pulse_width_us;
        self.service = config.service;
        self
    }

    /// Configure from SystemConfig by motor name.
    pub fn from_config(self, config: &SystemConfig, motor_name: &str) -> Result<Self> {
        Ok(self.from_motor_config(config.require_motor(motor_name)?))
    }

    /// Build the Stepper.
    ///
    /// # Errors
    ///
    /// Returns an error if a pin, the delay, the max speed or the
    /// acceleration is missing.
    pub fn build(self) -> Result<Stepper<StepDirDriver<STEP, DIR, EN, DELAY>, C>> {
        let step_pin = self
            .step_pin
            .ok_or(Error::Config(ConfigError::MissingField("step_pin")))?;
        let dir_pin = self
            .dir_pin
            .ok_or(Error::Config(ConfigError::MissingField("dir_pin")))?;
        let delay = self
            .delay
            .ok_or(Error::Config(ConfigError::MissingField("delay")))?;
        let max_speed = self
            .max_speed
            .ok_or(Error::Config(ConfigError::MissingField("max_speed")))?;
        let acceleration = self
            .acceleration
            .ok_or(Error::Config(ConfigError::MissingField("acceleration")))?;
        let deceleration = self.deceleration.unwrap_or(acceleration);

        let name = self
            .name
            .unwrap_or_else(|| heapless::String::try_from("stepper").unwrap_or_default());

        let driver = StepDirDriver::new(step_pin, dir_pin, self.enable_pin, delay)
            .with_inverted_direction(self.invert_direction)
            .with_enable_active_low(self.enable_active_low)
            .with_pulse_width_us(self.pulse_width_us);

        let limits = KinematicLimits::new(
            max_speed.value(),
            acceleration.value(),
            deceleration.value(),
        );

        debug!(
            "{}: {} steps/s, accel {}, decel {}",
            name.as_str(),
            limits.max_speed(),
            limits.acceleration(),
            limits.deceleration()
        );

        Ok(Stepper::from_parts(
            driver,
            self.clock,
            limits,
            ServiceConfig::from_settings(name.as_str(), &self.service),
        ))
    }
}
