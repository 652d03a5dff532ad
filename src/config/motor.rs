//! Motor configuration from TOML.

use heapless::String;
use serde::Deserialize;

use crate::motion::KinematicLimits;
use crate::motor::DEFAULT_PULSE_WIDTH_US;

use super::service::ServiceSettings;
use super::units::{StepsPerSec, StepsPerSecSquared};

/// Complete motor configuration from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct MotorConfig {
    /// Human-readable name (max 32 chars).
    pub name: String<32>,

    /// GPIO number of the STEP line.
    pub step_pin: u8,

    /// GPIO number of the DIR line.
    pub direction_pin: u8,

    /// GPIO number of the ENABLE line, if wired.
    #[serde(default)]
    pub enable_pin: Option<u8>,

    /// Maximum speed in steps per second.
    #[serde(rename = "max_speed_steps_per_sec")]
    pub max_speed: StepsPerSec,

    /// Acceleration in steps per second squared.
    #[serde(rename = "acceleration_steps_per_sec2")]
    pub acceleration: StepsPerSecSquared,

    /// Deceleration in steps per second squared. Defaults to `acceleration`.
    #[serde(default, rename = "deceleration_steps_per_sec2")]
    pub deceleration: Option<StepsPerSecSquared>,

    /// Invert direction pin logic.
    #[serde(default)]
    pub invert_direction: bool,

    /// ENABLE energises the driver when low.
    #[serde(default = "default_enable_active_low")]
    pub enable_active_low: bool,

    /// STEP pulse width in microseconds.
    #[serde(default = "default_pulse_width_us")]
    pub pulse_width_us: u32,

    /// Background task settings.
    #[serde(default)]
    pub service: ServiceSettings,
}

fn default_enable_active_low() -> bool {
    true
}

fn default_pulse_width_us() -> u32 {
    DEFAULT_PULSE_WIDTH_US
}

impl MotorConfig {
    /// Effective deceleration.
    pub fn deceleration(&self) -> StepsPerSecSquared {
        self.deceleration.unwrap_or(self.acceleration)
    }

    /// Kinematic limits described by this configuration.
    pub fn limits(&self) -> KinematicLimits {
        KinematicLimits::new(
            self.max_speed.value(),
            self.acceleration.value(),
            self.deceleration().value(),
        )
    }

    /// Every pin number this motor binds, in role order.
    pub fn pins(&self) -> impl Iterator<Item = u8> {
        [Some(self.step_pin), Some(self.direction_pin), self.enable_pin]
            .into_iter()
            .flatten()
    }
}
