//! Integration tests for stepper-ramp.
//!
//! These tests verify the complete workflow from TOML parsing to pulses on
//! the pins.

use embedded_hal_mock::eh1::delay::NoopDelay;
use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};

use stepper_ramp::config::SystemConfig;
use stepper_ramp::error::{ConfigError, Error};
use stepper_ramp::{Direction, ManualClock, StepperBuilder, UnitExt};

// =============================================================================
// Test configuration data
// =============================================================================

const FULL_CONFIG: &str = r#"
[motors.feeder]
name = "Feeder"
step_pin = 25
direction_pin = 26
enable_pin = 27
max_speed_steps_per_sec = 1000.0
acceleration_steps_per_sec2 = 2000.0
deceleration_steps_per_sec2 = 4000.0
invert_direction = true
pulse_width_us = 5

[motors.feeder.service]
core = 0
stack_size = 8192
poll_interval_us = 500

[motors.gate]
name = "Gate"
step_pin = 12
direction_pin = 14
max_speed_steps_per_sec = 400.0
acceleration_steps_per_sec2 = 800.0
"#;

fn parse(toml_str: &str) -> SystemConfig {
    stepper_ramp::parse_config(toml_str).expect("Config should parse")
}

fn step_transactions(steps: usize) -> Vec<Transaction> {
    let mut transactions = Vec::new();
    for _ in 0..steps {
        transactions.push(Transaction::set(State::High));
        transactions.push(Transaction::set(State::Low));
    }
    transactions
}

// =============================================================================
// Config to stepper
// =============================================================================

#[test]
fn test_builder_from_config() {
    let config = parse(FULL_CONFIG);
    let mut step = PinMock::new(&[]);
    let mut dir = PinMock::new(&[]);

    let stepper = StepperBuilder::new()
        .from_config(&config, "feeder")
        .unwrap()
        .step_pin(step.clone())
        .dir_pin(dir.clone())
        .delay(NoopDelay::new())
        .clock(ManualClock::default())
        .build()
        .unwrap();

    assert_eq!(stepper.name(), "Feeder");
    assert_eq!(stepper.service_config().core, 0);
    assert_eq!(stepper.service_config().stack_size, 8192);
    assert_eq!(stepper.service_config().poll_interval_us, 500);

    let limits = stepper.shared().limits();
    assert_eq!(limits.max_speed(), 1000.0);
    assert_eq!(limits.acceleration(), 2000.0);
    assert_eq!(limits.deceleration(), 4000.0);

    step.done();
    dir.done();
}

#[test]
fn test_builder_unknown_motor() {
    let config = parse(FULL_CONFIG);

    let result = StepperBuilder::<PinMock, PinMock, NoopDelay>::new().from_config(&config, "nope");
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::MotorNotFound(_)))
    ));
}

#[test]
fn test_builder_requires_pins_and_limits() {
    let mut step = PinMock::new(&[]);
    let mut dir = PinMock::new(&[]);

    let result = StepperBuilder::<PinMock, PinMock, NoopDelay>::new()
        .dir_pin(dir.clone())
        .delay(NoopDelay::new())
        .max_speed(100.0.steps_per_sec())
        .acceleration(100.0.steps_per_sec_squared())
        .build();
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::MissingField("step_pin")))
    ));

    let result = StepperBuilder::new()
        .step_pin(step.clone())
        .dir_pin(dir.clone())
        .delay(NoopDelay::new())
        .acceleration(100.0.steps_per_sec_squared())
        .build();
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::MissingField("max_speed")))
    ));

    step.done();
    dir.done();
}

// =============================================================================
// Polling a move onto the pins
// =============================================================================

#[test]
fn test_polled_move_drives_pins() {
    let config = parse(FULL_CONFIG);
    let clock = ManualClock::default();

    // Inverted direction: forward drives DIR low.
    let mut step = PinMock::new(&step_transactions(3));
    let mut dir = PinMock::new(&[Transaction::set(State::Low)]);
    let mut enable = PinMock::new(&[Transaction::set(State::Low), Transaction::set(State::High)]);

    let mut stepper = StepperBuilder::new()
        .from_config(&config, "feeder")
        .unwrap()
        .step_pin(step.clone())
        .dir_pin(dir.clone())
        .enable_pin(enable.clone())
        .delay(NoopDelay::new())
        .clock(clock.clone())
        .build()
        .unwrap();

    stepper.set_enabled(true).unwrap();
    stepper.set_target_position_in_steps(3);

    let mut iterations = 0;
    while !stepper.process_movement().unwrap() {
        clock.advance(1000);
        iterations += 1;
        assert!(iterations < 10_000, "move did not finish");
    }
    stepper.set_enabled(false).unwrap();

    assert_eq!(stepper.current_position_in_steps(), 3);
    assert_eq!(stepper.direction_of_motion(), Direction::Stopped);
    assert!(stepper.is_motion_complete());

    step.done();
    dir.done();
    enable.done();
}

#[test]
fn test_polled_reverse_move_sets_direction_once() {
    let config = parse(FULL_CONFIG);
    let clock = ManualClock::default();

    let mut step = PinMock::new(&step_transactions(4));
    let mut dir = PinMock::new(&[Transaction::set(State::Low)]);

    let mut stepper = StepperBuilder::new()
        .from_config(&config, "gate")
        .unwrap()
        .step_pin(step.clone())
        .dir_pin(dir.clone())
        .delay(NoopDelay::new())
        .clock(clock.clone())
        .build()
        .unwrap();

    stepper.set_target_position_relative_in_steps(-4);
    while !stepper.process_movement().unwrap() {
        clock.advance(1000);
    }

    assert_eq!(stepper.current_position_in_steps(), -4);
    assert_eq!(stepper.distance_to_target_signed(), 0);

    step.done();
    dir.done();
}
