//! Configuration validation.

use crate::error::{ConfigError, Error, Result};

use super::system::MAX_MOTORS;
use super::{MotorConfig, SystemConfig};

/// Validate a system configuration.
///
/// Checks:
/// - Speed, acceleration and deceleration are strictly positive and finite
/// - Service stack size and poll interval are non-zero
/// - No pin number is bound to more than one role, across all motors
pub fn validate_config(config: &SystemConfig) -> Result<()> {
    let mut seen: heapless::Vec<u8, { MAX_MOTORS * 3 }> = heapless::Vec::new();

    for (_, motor) in config.motors.iter() {
        validate_motor(motor)?;

        for pin in motor.pins() {
            if seen.contains(&pin) {
                return Err(Error::Config(ConfigError::DuplicatePin(pin)));
            }
            // At most three pins per motor.
            let _ = seen.push(pin);
        }
    }

    Ok(())
}

fn validate_motor(config: &MotorConfig) -> Result<()> {
    if config.max_speed.period_us().is_none() {
        return Err(Error::Config(ConfigError::InvalidMaxSpeed(
            config.max_speed.value(),
        )));
    }

    let acceleration = config.acceleration.value();
    if !is_positive(acceleration) {
        return Err(Error::Config(ConfigError::InvalidAcceleration(acceleration)));
    }

    if let Some(deceleration) = config.deceleration {
        if !is_positive(deceleration.value()) {
            return Err(Error::Config(ConfigError::InvalidDeceleration(
                deceleration.value(),
            )));
        }
    }

    if config.service.stack_size == 0 {
        return Err(Error::Config(ConfigError::InvalidStackSize(
            config.service.stack_size,
        )));
    }

    if config.service.poll_interval_us == 0 {
        return Err(Error::Config(ConfigError::InvalidPollInterval(
            config.service.poll_interval_us,
        )));
    }

    Ok(())
}

#[inline]
fn is_positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}
