//! Root of the TOML configuration: one table per motor.

use heapless::{FnvIndexMap, String};
use serde::Deserialize;

use crate::error::{ConfigError, Error, Result};

use super::motor::MotorConfig;

/// Most motors one configuration can describe.
pub const MAX_MOTORS: usize = 8;

/// Every `[motors.<key>]` table of a configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemConfig {
    /// Motor tables keyed by their TOML key.
    pub motors: FnvIndexMap<String<32>, MotorConfig, MAX_MOTORS>,
}

impl SystemConfig {
    /// Motor table under `key`, if any.
    pub fn motor(&self, key: &str) -> Option<&MotorConfig> {
        self.motors
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v)
    }

    /// Like [`motor`](Self::motor), but a missing key is an error.
    pub fn require_motor(&self, key: &str) -> Result<&MotorConfig> {
        self.motor(key).ok_or_else(|| {
            let mut name = String::new();
            for c in key.chars() {
                if name.push(c).is_err() {
                    break;
                }
            }
            Error::Config(ConfigError::MotorNotFound(name))
        })
    }

    /// Motor keys in file order.
    pub fn motor_names(&self) -> impl Iterator<Item = &str> {
        self.motors.keys().map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_missing_motor() {
        let config = SystemConfig::default();
        assert!(config.motor("x").is_none());
        assert!(matches!(
            config.require_motor("x"),
            Err(Error::Config(ConfigError::MotorNotFound(ref name))) if name.as_str() == "x"
        ));
    }
}
