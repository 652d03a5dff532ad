//! Configuration parsing and validation.

use stepper_ramp::config::{validate_config, ServiceSettings, SystemConfig};
use stepper_ramp::error::{ConfigError, Error};

const MOTOR: &str = r#"
[motors.spindle]
name = "Spindle"
step_pin = 2
direction_pin = 3
max_speed_steps_per_sec = 1000.0
acceleration_steps_per_sec2 = 2000.0
"#;

fn config_error(toml_str: &str) -> ConfigError {
    let config: SystemConfig = toml::from_str(toml_str).expect("Failed to parse TOML");
    match validate_config(&config) {
        Err(Error::Config(e)) => e,
        other => panic!("expected a config error, got {:?}", other),
    }
}

/// Test validation of a valid configuration.
#[test]
fn test_valid_config_passes_validation() {
    let config: SystemConfig = toml::from_str(MOTOR).expect("Failed to parse TOML");
    assert!(validate_config(&config).is_ok());

    let motor = config.motor("spindle").unwrap();
    assert_eq!(motor.name.as_str(), "Spindle");
    assert_eq!(motor.deceleration().value(), 2000.0);
    assert_eq!(motor.pulse_width_us, 2);
    assert_eq!(motor.service, ServiceSettings::default());
    assert_eq!(config.motor_names().collect::<Vec<_>>(), vec!["spindle"]);
}

#[test]
fn test_service_defaults() {
    let settings = ServiceSettings::default();
    assert_eq!(settings.core, 1);
    assert_eq!(settings.stack_size, 16 * 1024);
    assert_eq!(settings.poll_interval_us, 1000);
}

#[test]
fn test_partial_service_table_keeps_defaults() {
    let toml_str = format!("{}\n[motors.spindle.service]\ncore = 0\n", MOTOR);
    let config: SystemConfig = toml::from_str(&toml_str).expect("Failed to parse TOML");

    let service = config.motor("spindle").unwrap().service;
    assert_eq!(service.core, 0);
    assert_eq!(service.stack_size, 16 * 1024);
    assert_eq!(service.poll_interval_us, 1000);
}

/// Test validation fails for zero max speed.
#[test]
fn test_zero_max_speed() {
    let toml_str = MOTOR.replace(
        "max_speed_steps_per_sec = 1000.0",
        "max_speed_steps_per_sec = 0.0",
    );
    assert_eq!(config_error(&toml_str), ConfigError::InvalidMaxSpeed(0.0));
}

/// Test validation fails for negative acceleration.
#[test]
fn test_negative_acceleration() {
    let toml_str = MOTOR.replace(
        "acceleration_steps_per_sec2 = 2000.0",
        "acceleration_steps_per_sec2 = -5.0",
    );
    assert_eq!(
        config_error(&toml_str),
        ConfigError::InvalidAcceleration(-5.0)
    );
}

#[test]
fn test_zero_deceleration() {
    let toml_str = format!("{}deceleration_steps_per_sec2 = 0.0\n", MOTOR);
    assert_eq!(
        config_error(&toml_str),
        ConfigError::InvalidDeceleration(0.0)
    );
}

#[test]
fn test_duplicate_pin_within_motor() {
    let toml_str = format!("{}enable_pin = 3\n", MOTOR);
    assert_eq!(config_error(&toml_str), ConfigError::DuplicatePin(3));
}

#[test]
fn test_duplicate_pin_across_motors() {
    let toml_str = format!(
        "{}{}",
        MOTOR,
        r#"
[motors.feeder]
name = "Feeder"
step_pin = 4
direction_pin = 2
max_speed_steps_per_sec = 500.0
acceleration_steps_per_sec2 = 500.0
"#
    );
    assert_eq!(config_error(&toml_str), ConfigError::DuplicatePin(2));
}

#[test]
fn test_zero_stack_size() {
    let toml_str = format!("{}\n[motors.spindle.service]\nstack_size = 0\n", MOTOR);
    assert_eq!(config_error(&toml_str), ConfigError::InvalidStackSize(0));
}

#[test]
fn test_zero_poll_interval() {
    let toml_str = format!(
        "{}\n[motors.spindle.service]\npoll_interval_us = 0\n",
        MOTOR
    );
    assert_eq!(config_error(&toml_str), ConfigError::InvalidPollInterval(0));
}

#[test]
fn test_missing_required_field_is_parse_error() {
    let toml_str = MOTOR.replace("direction_pin = 3\n", "");
    let result = stepper_ramp::parse_config(&toml_str);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::ParseError(_)))
    ));
}

#[test]
fn test_parse_config_runs_validation() {
    let toml_str = format!("{}enable_pin = 2\n", MOTOR);
    assert!(matches!(
        stepper_ramp::parse_config(&toml_str),
        Err(Error::Config(ConfigError::DuplicatePin(2)))
    ));
}
