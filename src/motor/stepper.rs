//! The stepper object: control API plus the background step task.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::clock::Clock;
use crate::error::{MotorError, Result};
use crate::motion::{Direction, KinematicLimits, KinematicState, StepRunner};
use crate::service::{ServiceConfig, ServiceHandle, StackWatermark};

use super::driver::PulseEmitter;
use super::shared::SharedKinematics;

/// One axis: the shared kinematic state, the step runner that moves it and,
/// while started, the background task hosting that runner.
///
/// Every control and status method may be called while the service runs.
/// Dropping the stepper stops the service first.
pub struct Stepper<E, C>
where
    E: PulseEmitter + Send + 'static,
    C: Clock + Send + 'static,
{
    name: heapless::String<32>,
    shared: Arc<SharedKinematics>,
    runner: Arc<Mutex<StepRunner<E, C>>>,
    watermark: Arc<StackWatermark>,
    service_config: ServiceConfig,
    service: Option<ServiceHandle>,
}

impl<E, C> Stepper<E, C>
where
    E: PulseEmitter + Send + 'static,
    C: Clock + Send + 'static,
{
    /// Stepper at rest at position 0.
    pub fn new(emitter: E, clock: C, limits: KinematicLimits) -> Self {
        Self::from_parts(emitter, clock, limits, ServiceConfig::default())
    }

    pub(crate) fn from_parts(
        emitter: E,
        clock: C,
        limits: KinematicLimits,
        service_config: ServiceConfig,
    ) -> Self {
        Self {
            name: service_config.name.clone(),
            shared: Arc::new(SharedKinematics::new(limits)),
            runner: Arc::new(Mutex::new(StepRunner::new(emitter, clock))),
            watermark: Arc::new(StackWatermark::new()),
            service_config,
            service: None,
        }
    }

    /// Motor name.
    #[inline]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Shared state, for callers on other threads.
    #[inline]
    pub fn shared(&self) -> &Arc<SharedKinematics> {
        &self.shared
    }

    /// Settings used by [`start_as_service`](Self::start_as_service).
    #[inline]
    pub fn service_config(&self) -> &ServiceConfig {
        &self.service_config
    }

    // ---- limits and targets ----

    /// Set the max speed in steps/s.
    pub fn set_speed_in_steps_per_second(&self, speed: f32) {
        self.shared.set_speed_in_steps_per_second(speed);
    }

    /// Set the acceleration in steps/s².
    pub fn set_acceleration_in_steps_per_second_per_second(&self, acceleration: f32) {
        self.shared
            .set_acceleration_in_steps_per_second_per_second(acceleration);
    }

    /// Set the deceleration in steps/s².
    pub fn set_deceleration_in_steps_per_second_per_second(&self, deceleration: f32) {
        self.shared
            .set_deceleration_in_steps_per_second_per_second(deceleration);
    }

    /// Move to an absolute position.
    pub fn set_target_position_in_steps(&self, position: i32) {
        self.shared.set_target_position_in_steps(position);
    }

    /// Move relative to the current position.
    pub fn set_target_position_relative_in_steps(&self, delta: i32) {
        self.shared.set_target_position_relative_in_steps(delta);
    }

    /// Decelerate to rest at the nearest reachable position.
    pub fn set_target_position_to_stop(&self) {
        self.shared.set_target_position_to_stop();
    }

    // ---- status ----

    /// At the target and at rest.
    pub fn is_motion_complete(&self) -> bool {
        self.shared.is_motion_complete()
    }

    /// Current position in steps.
    pub fn current_position_in_steps(&self) -> i32 {
        self.shared.current_position_in_steps()
    }

    /// Signed speed in steps/s.
    pub fn current_velocity_in_steps_per_second(&self) -> f32 {
        self.shared.current_velocity_in_steps_per_second()
    }

    /// Direction of the current motion; `sign()` gives -1/0/+1.
    pub fn direction_of_motion(&self) -> Direction {
        self.shared.direction_of_motion()
    }

    /// Target minus current position.
    pub fn distance_to_target_signed(&self) -> i64 {
        self.shared.distance_to_target_signed()
    }

    /// Target position in steps.
    pub fn target_position_in_steps(&self) -> i64 {
        self.shared.target_position_in_steps()
    }

    /// Caller-visible state at this instant.
    pub fn snapshot(&self) -> KinematicState {
        self.shared.snapshot()
    }

    // ---- service ----

    /// Start the step task on `core`.
    ///
    /// Returns `false` if it is already running or could not be created.
    pub fn start_as_service(&mut self, core: u8) -> bool {
        match self.try_start_service(core) {
            Ok(()) => true,
            Err(e) => {
                warn!("{}: step task not started: {}", self.name.as_str(), e);
                false
            }
        }
    }

    /// Start the step task on the configured core.
    pub fn start_as_service_on_default_core(&mut self) -> bool {
        self.start_as_service(self.service_config.core)
    }

    /// Start the step task on `core`, reporting why it could not be started.
    pub fn try_start_service(&mut self, core: u8) -> Result<()> {
        if self.is_started_as_service() {
            return Err(crate::error::ServiceError::AlreadyRunning.into());
        }
        // Reap a task that exited on its own.
        self.stop_service();

        let mut config = self.service_config.clone();
        config.core = core;

        let handle = ServiceHandle::spawn(
            self.runner.clone(),
            self.shared.clone(),
            self.watermark.clone(),
            &config,
        )?;
        self.service = Some(handle);
        Ok(())
    }

    /// Stop the step task and wait for it to exit. Does nothing if it is
    /// not running.
    pub fn stop_service(&mut self) {
        if let Some(handle) = self.service.take() {
            handle.stop();
        }
    }

    /// Whether the step task is alive.
    pub fn is_started_as_service(&self) -> bool {
        self.service
            .as_ref()
            .map(ServiceHandle::is_running)
            .unwrap_or(false)
    }

    /// Minimum free stack margin of the step task since it last started, in
    /// bytes; 0 if it never ran.
    pub fn get_task_stack_high_water_mark(&self) -> u32 {
        self.watermark.high_water_mark()
    }

    // ---- polling ----

    /// Run one step-loop iteration on the caller's thread.
    ///
    /// Returns `Ok(true)` when the motion is complete.
    ///
    /// # Errors
    ///
    /// `MotorError::ServiceRunning` while the step task owns the pins, or
    /// `MotorError::PinError` if the pulse could not be emitted.
    pub fn process_movement(&mut self) -> Result<bool> {
        if self.is_started_as_service() {
            return Err(MotorError::ServiceRunning.into());
        }
        let shared = self.shared.clone();
        Ok(self.lock_runner().process_movement(&shared)?)
    }

    /// Energise or release the driver while no service is running.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        if self.is_started_as_service() {
            return Err(MotorError::ServiceRunning.into());
        }
        Ok(self.lock_runner().set_enabled(enabled)?)
    }

    fn lock_runner(&self) -> MutexGuard<'_, StepRunner<E, C>> {
        match self.runner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<E, C> Drop for Stepper<E, C>
where
    E: PulseEmitter + Send + 'static,
    C: Clock + Send + 'static,
{
    fn drop(&mut self) {
        self.stop_service();
    }
}
