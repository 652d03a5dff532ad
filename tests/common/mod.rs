//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};
use std::sync::Arc;

use stepper_ramp::error::MotorError;
use stepper_ramp::{
    Clock, Direction, KinematicLimits, ManualClock, MotionPhase, PulseEmitter, SharedKinematics,
    StepRunner,
};

/// Pulse emitter that counts what it is asked to do.
///
/// Clones share the counters, so a test can keep one while the runner (or a
/// background task) owns the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingEmitter {
    direction: Option<Direction>,
    pulses: Arc<AtomicU32>,
    net_steps: Arc<AtomicI64>,
    direction_changes: Arc<AtomicU32>,
    enabled: Arc<AtomicBool>,
}

impl RecordingEmitter {
    pub fn pulses(&self) -> u32 {
        self.pulses.load(Ordering::SeqCst)
    }

    pub fn net_steps(&self) -> i64 {
        self.net_steps.load(Ordering::SeqCst)
    }

    pub fn direction_changes(&self) -> u32 {
        self.direction_changes.load(Ordering::SeqCst)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

impl PulseEmitter for RecordingEmitter {
    fn set_direction(&mut self, direction: Direction) -> Result<(), MotorError> {
        if direction != Direction::Stopped && self.direction != Some(direction) {
            if self.direction.is_some() {
                self.direction_changes.fetch_add(1, Ordering::SeqCst);
            }
            self.direction = Some(direction);
        }
        Ok(())
    }

    fn step_pulse(&mut self) -> Result<(), MotorError> {
        let sign = self.direction.map(Direction::sign).unwrap_or(0);
        self.pulses.fetch_add(1, Ordering::SeqCst);
        self.net_steps.fetch_add(sign as i64, Ordering::SeqCst);
        Ok(())
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<(), MotorError> {
        self.enabled.store(enabled, Ordering::SeqCst);
        Ok(())
    }
}

/// State observed right after one step.
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub position: i32,
    pub velocity: f32,
    pub direction: Direction,
    pub phase: MotionPhase,
    pub distance: i64,
    pub time_us: u64,
}

/// A step runner on simulated time.
pub struct Simulation {
    pub runner: StepRunner<RecordingEmitter, ManualClock>,
    pub shared: SharedKinematics,
    pub clock: ManualClock,
    pub emitter: RecordingEmitter,
}

impl Simulation {
    pub fn new(max_speed: f32, acceleration: f32, deceleration: f32) -> Self {
        let clock = ManualClock::default();
        let emitter = RecordingEmitter::default();
        Self {
            runner: StepRunner::new(emitter.clone(), clock.clone()),
            shared: SharedKinematics::new(KinematicLimits::new(
                max_speed,
                acceleration,
                deceleration,
            )),
            clock,
            emitter,
        }
    }

    /// One loop iteration followed by the sleep the runner asks for.
    ///
    /// Returns `true` once the motion is complete.
    pub fn tick(&mut self) -> bool {
        let done = self.runner.process_movement(&self.shared).unwrap();
        if !done {
            self.clock.advance(self.runner.wait_us(1000).max(1) as u64);
        }
        done
    }

    /// Run to completion, calling `on_tick` before every iteration and
    /// recording a sample after every step.
    pub fn run_with<F>(&mut self, mut on_tick: F) -> Vec<Sample>
    where
        F: FnMut(&SharedKinematics),
    {
        let mut samples = Vec::new();
        for _ in 0..50_000_000u64 {
            on_tick(&self.shared);

            let pulses = self.emitter.pulses();
            let done = self.tick();
            if self.emitter.pulses() != pulses {
                let state = self.runner.state();
                samples.push(Sample {
                    position: state.current_position,
                    velocity: self.shared.current_velocity_in_steps_per_second(),
                    direction: self.shared.direction_of_motion(),
                    phase: state.phase,
                    distance: self.shared.distance_to_target_signed(),
                    time_us: state.last_step_us,
                });
            }
            if done {
                return samples;
            }
        }
        panic!("motion did not complete");
    }

    pub fn run(&mut self) -> Vec<Sample> {
        self.run_with(|_| {})
    }

    pub fn now_us(&self) -> u64 {
        self.clock.now_us()
    }
}

/// Largest speed seen across samples.
pub fn peak_speed(samples: &[Sample]) -> f32 {
    samples
        .iter()
        .map(|s| s.velocity.abs())
        .fold(0.0, f32::max)
}
