//! Step task runner.
//!
//! Drives the profile calculator at the cadence it asks for and turns due
//! steps into pulses. One iteration is [`StepRunner::process_movement`];
//! [`StepRunner::run`] repeats it until told to stop.

use core::sync::atomic::{AtomicBool, Ordering};

use libm::ceilf;

use crate::clock::Clock;
use crate::error::MotorError;
use crate::motor::{PulseEmitter, SharedKinematics};

use super::limits::KinematicLimits;
use super::profile::{determine_period_of_next_step, MotionPhase, StepPlan};
use super::state::KinematicState;

/// Runs the motion profile of one axis against a pulse emitter.
///
/// The runner owns the authoritative [`KinematicState`]; after every step it
/// publishes position, period and direction to a [`SharedKinematics`], and
/// before every computation it picks up the target and limits from it.
pub struct StepRunner<E, C> {
    emitter: E,
    clock: C,
    state: KinematicState,
    limits: KinematicLimits,
    /// Revision of the shared limits `limits` was derived from.
    limits_revision: Option<u32>,
    /// When the next planned step becomes due.
    due_at_us: Option<u64>,
}

impl<E, C> StepRunner<E, C>
where
    E: PulseEmitter,
    C: Clock,
{
    /// Runner at rest at position 0.
    pub fn new(emitter: E, clock: C) -> Self {
        Self {
            emitter,
            clock,
            state: KinematicState::at_rest(0),
            limits: KinematicLimits::default(),
            limits_revision: None,
            due_at_us: None,
        }
    }

    /// Authoritative kinematic state.
    #[inline]
    pub fn state(&self) -> &KinematicState {
        &self.state
    }

    /// Limits in effect for the last computation.
    #[inline]
    pub fn limits(&self) -> &KinematicLimits {
        &self.limits
    }

    /// The pulse emitter.
    #[inline]
    pub fn emitter(&self) -> &E {
        &self.emitter
    }

    /// The time source.
    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Energise or release the driver.
    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), MotorError> {
        self.emitter.set_enabled(enabled)
    }

    /// One polling iteration: compute the next step and emit it if due.
    ///
    /// Returns `Ok(true)` once the axis is at its target and at rest.
    pub fn process_movement(&mut self, shared: &SharedKinematics) -> Result<bool, MotorError> {
        self.process_movement_with(shared, &mut || {})
    }

    /// Like [`process_movement`](Self::process_movement), calling `probe`
    /// right before a pulse is emitted.
    pub fn process_movement_with<F>(
        &mut self,
        shared: &SharedKinematics,
        probe: &mut F,
    ) -> Result<bool, MotorError>
    where
        F: FnMut(),
    {
        self.refresh(shared);

        let now = self.clock.now_us();
        let plan = determine_period_of_next_step(&self.state, &self.limits, now);

        if plan.is_complete() {
            self.finish(shared);
            return Ok(true);
        }

        self.state.next_period_us = plan.period_us;
        if !plan.step_now {
            self.due_at_us = Some(due_after(self.state.last_step_us, plan.period_us));
            return Ok(false);
        }

        probe();
        self.emitter.set_direction(plan.direction)?;
        self.emitter.step_pulse()?;
        self.commit_step(&plan, now, shared);

        let next = determine_period_of_next_step(&self.state, &self.limits, now);
        if next.is_complete() {
            self.finish(shared);
            return Ok(true);
        }

        self.state.next_period_us = next.period_us;
        self.due_at_us = Some(due_after(self.state.last_step_us, next.period_us));
        Ok(false)
    }

    /// How long the loop may sleep before the next iteration, capped at
    /// `poll_interval_us`.
    pub fn wait_us(&self, poll_interval_us: u32) -> u32 {
        match self.due_at_us {
            Some(due) => {
                let wait = due.saturating_sub(self.clock.now_us());
                wait.min(poll_interval_us as u64) as u32
            }
            None => poll_interval_us,
        }
    }

    /// Iterate until `running` is cleared.
    ///
    /// `probe` is called at the deepest point of every iteration that emits a
    /// pulse. Pin failures are logged and retried after one poll interval.
    pub fn run<F>(
        &mut self,
        shared: &SharedKinematics,
        running: &AtomicBool,
        poll_interval_us: u32,
        mut probe: F,
    ) where
        F: FnMut(),
    {
        debug!("step loop started at position {}", self.state.current_position);

        while running.load(Ordering::Acquire) {
            if let Err(e) = self.process_movement_with(shared, &mut probe) {
                error!("step pulse failed: {}", e);
                self.clock.idle_us(poll_interval_us);
                continue;
            }
            self.pause(poll_interval_us);
        }

        debug!("step loop stopped at position {}", self.state.current_position);
    }

    /// Wait for the next iteration. Only a wait that ends on a step deadline
    /// has to be precise; otherwise the clock may idle.
    fn pause(&mut self, poll_interval_us: u32) {
        let step_due_in_wait = self
            .due_at_us
            .map(|due| due.saturating_sub(self.clock.now_us()) <= poll_interval_us as u64)
            .unwrap_or(false);

        if step_due_in_wait {
            let wait = self.wait_us(poll_interval_us);
            if wait > 0 {
                self.clock.sleep_us(wait);
            }
        } else {
            self.clock.idle_us(poll_interval_us);
        }
    }

    /// Decompose into the emitter and the clock.
    pub fn into_parts(self) -> (E, C) {
        (self.emitter, self.clock)
    }

    fn refresh(&mut self, shared: &SharedKinematics) {
        let revision = shared.limits_revision();
        if self.limits_revision != Some(revision) {
            self.limits = shared.limits();
            self.limits_revision = Some(revision);
            trace!(
                "limits updated: {} steps/s, accel {}, decel {}",
                self.limits.max_speed(),
                self.limits.acceleration(),
                self.limits.deceleration()
            );
        }
        self.state.target_position = shared.target_position_in_steps() as i32;
    }

    fn commit_step(&mut self, plan: &StepPlan, now: u64, shared: &SharedKinematics) {
        let was_moving = self.state.is_moving();

        if plan.direction != self.state.direction && was_moving {
            trace!("reversing at position {}", self.state.current_position);
        }
        if plan.phase != self.state.phase {
            debug!(
                "{} -> {} at position {}",
                self.state.phase.as_str(),
                plan.phase.as_str(),
                self.state.current_position
            );
        }

        // Keep to the planned schedule unless the loop fell a whole period
        // behind; then restart the schedule from now.
        let scheduled = due_after(self.state.last_step_us, plan.period_us);
        self.state.last_step_us =
            if was_moving && now.saturating_sub(scheduled) < plan.period_us as u64 {
                scheduled
            } else {
                now
            };

        self.state.current_position = self
            .state
            .current_position
            .wrapping_add(plan.direction.sign() as i32);
        self.state.current_period_us = plan.period_us;
        self.state.direction = plan.direction;
        self.state.phase = plan.phase;

        shared.publish_motion(
            self.state.current_position,
            plan.period_us,
            plan.direction,
        );
    }

    fn finish(&mut self, shared: &SharedKinematics) {
        self.due_at_us = None;
        if self.state.phase == MotionPhase::Complete && !self.state.is_moving() {
            return;
        }

        self.state.settle();
        shared.publish_motion(
            self.state.current_position,
            0.0,
            self.state.direction,
        );
        shared.disarm_stop();
        debug!("motion complete at position {}", self.state.current_position);
    }
}

#[inline]
fn due_after(last_step_us: u64, period_us: f32) -> u64 {
    last_step_us + ceilf(period_us) as u64
}
