//! Kinematic state shared between the step loop and callers.
//!
//! Every field is its own atomic, so a reader may see a position from one
//! step and a period from the next, but never a half-written value. The step
//! loop only ever loads and stores; nothing here can block it.

use core::sync::atomic::{AtomicBool, AtomicI32, AtomicI8, AtomicU32, Ordering};

use libm::roundf;

use crate::config::units::MICROS_PER_SECOND;
use crate::motion::limits::{sanitize, KinematicLimits};
use crate::motion::{Direction, KinematicState};

/// An `f32` stored as its bit pattern.
#[derive(Debug)]
struct AtomicF32(AtomicU32);

impl AtomicF32 {
    const fn zero() -> Self {
        Self(AtomicU32::new(0))
    }

    fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed)
    }
}

/// Control and status state of one axis.
///
/// Callers write limits and targets; the step runner publishes position,
/// period and direction after every step and picks up new limits and
/// targets before every profile computation.
#[derive(Debug)]
pub struct SharedKinematics {
    current_position: AtomicI32,
    target_position: AtomicI32,
    current_period_us: AtomicF32,
    direction: AtomicI8,
    max_speed: AtomicF32,
    acceleration: AtomicF32,
    deceleration: AtomicF32,
    limits_revision: AtomicU32,
    stop_armed: AtomicBool,
}

impl SharedKinematics {
    /// At rest at position 0 with the given limits.
    pub fn new(limits: KinematicLimits) -> Self {
        Self {
            current_position: AtomicI32::new(0),
            target_position: AtomicI32::new(0),
            current_period_us: AtomicF32::zero(),
            direction: AtomicI8::new(Direction::Stopped.sign()),
            max_speed: AtomicF32::new(limits.max_speed()),
            acceleration: AtomicF32::new(limits.acceleration()),
            deceleration: AtomicF32::new(limits.deceleration()),
            limits_revision: AtomicU32::new(0),
            stop_armed: AtomicBool::new(false),
        }
    }

    // ---- limits ----

    /// Set the max speed in steps/s. Non-positive values are clamped to
    /// [`MIN_KINEMATIC_VALUE`](crate::motion::MIN_KINEMATIC_VALUE).
    pub fn set_speed_in_steps_per_second(&self, speed: f32) {
        self.max_speed.store(checked_limit("speed", speed));
        self.bump_limits();
    }

    /// Set the acceleration in steps/s². Non-positive values are clamped.
    pub fn set_acceleration_in_steps_per_second_per_second(&self, acceleration: f32) {
        self.acceleration
            .store(checked_limit("acceleration", acceleration));
        self.bump_limits();
    }

    /// Set the deceleration in steps/s². Non-positive values are clamped.
    pub fn set_deceleration_in_steps_per_second_per_second(&self, deceleration: f32) {
        self.deceleration
            .store(checked_limit("deceleration", deceleration));
        self.bump_limits();
    }

    /// Current limits with their derived periods.
    pub fn limits(&self) -> KinematicLimits {
        KinematicLimits::new(
            self.max_speed.load(),
            self.acceleration.load(),
            self.deceleration.load(),
        )
    }

    /// Incremented on every limits update.
    #[inline]
    pub fn limits_revision(&self) -> u32 {
        self.limits_revision.load(Ordering::Acquire)
    }

    fn bump_limits(&self) {
        self.limits_revision.fetch_add(1, Ordering::Release);
    }

    // ---- targets ----

    /// Move to an absolute position. Cancels a pending stop.
    pub fn set_target_position_in_steps(&self, position: i32) {
        self.stop_armed.store(false, Ordering::Release);
        self.target_position.store(position, Ordering::Release);
    }

    /// Move relative to the position at call time. Cancels a pending stop.
    pub fn set_target_position_relative_in_steps(&self, delta: i32) {
        let position = self.current_position_in_steps().saturating_add(delta);
        self.set_target_position_in_steps(position);
    }

    /// Decelerate to rest as soon as possible.
    ///
    /// The stop point is computed once, from the speed and deceleration at
    /// call time, and held: further calls while the stop is pending keep the
    /// same point. A new target cancels the stop, and a target set while the
    /// stop point is being computed wins over it. Does nothing at rest.
    pub fn set_target_position_to_stop(&self) {
        let direction = self.direction_of_motion();
        if direction == Direction::Stopped {
            return;
        }
        if self.stop_armed.swap(true, Ordering::AcqRel) {
            return;
        }

        let observed_target = self.target_position.load(Ordering::Acquire);
        let period = self.current_period_us.load();
        let speed = if period > 0.0 {
            MICROS_PER_SECOND / period
        } else {
            0.0
        };
        let distance = roundf(self.limits().stopping_distance(speed));
        let distance = if distance >= i32::MAX as f32 {
            i32::MAX
        } else {
            distance as i32
        };
        let stop_point = self
            .current_position_in_steps()
            .saturating_add(distance.saturating_mul(direction.sign() as i32));

        self.hold_stop_point(observed_target, stop_point);
    }

    /// Replace `observed_target` with `stop_point`, unless the target changed
    /// since it was read.
    fn hold_stop_point(&self, observed_target: i32, stop_point: i32) {
        match self.target_position.compare_exchange(
            observed_target,
            stop_point,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => debug!("stop requested, holding stop point {}", stop_point),
            Err(target) => {
                self.stop_armed.store(false, Ordering::Release);
                debug!("stop superseded by new target {}", target);
            }
        }
    }

    /// Whether a stop point is currently being held.
    #[inline]
    pub fn is_stop_pending(&self) -> bool {
        self.stop_armed.load(Ordering::Relaxed)
    }

    // ---- status ----

    /// Current position in steps.
    #[inline]
    pub fn current_position_in_steps(&self) -> i32 {
        self.current_position.load(Ordering::Acquire)
    }

    /// Target position in steps.
    #[inline]
    pub fn target_position_in_steps(&self) -> i64 {
        self.target_position.load(Ordering::Relaxed) as i64
    }

    /// Signed speed in steps/s; 0 at rest.
    pub fn current_velocity_in_steps_per_second(&self) -> f32 {
        let period = self.current_period_us.load();
        let direction = self.direction_of_motion();
        if period > 0.0 && direction != Direction::Stopped {
            MICROS_PER_SECOND / period * direction.sign() as f32
        } else {
            0.0
        }
    }

    /// Direction of the current motion.
    #[inline]
    pub fn direction_of_motion(&self) -> Direction {
        Direction::from_sign(self.direction.load(Ordering::Relaxed))
    }

    /// Target minus current position.
    #[inline]
    pub fn distance_to_target_signed(&self) -> i64 {
        self.target_position_in_steps() - self.current_position_in_steps() as i64
    }

    /// At the target and at rest.
    pub fn is_motion_complete(&self) -> bool {
        self.direction_of_motion() == Direction::Stopped && self.distance_to_target_signed() == 0
    }

    /// Point-in-time copy of the caller-visible fields.
    ///
    /// Runner-private fields (`last_step_us`, `phase`, `next_period_us`) are
    /// left at their rest values.
    pub fn snapshot(&self) -> KinematicState {
        let mut state = KinematicState::at_rest(self.current_position_in_steps());
        state.target_position = self.target_position.load(Ordering::Relaxed);
        state.current_period_us = self.current_period_us.load();
        state.direction = self.direction_of_motion();
        state
    }

    // ---- runner side ----

    pub(crate) fn publish_motion(&self, position: i32, period_us: f32, direction: Direction) {
        self.current_period_us.store(period_us);
        self.direction.store(direction.sign(), Ordering::Relaxed);
        self.current_position.store(position, Ordering::Release);
    }

    pub(crate) fn disarm_stop(&self) {
        self.stop_armed.store(false, Ordering::Relaxed);
    }
}

impl Default for SharedKinematics {
    fn default() -> Self {
        Self::new(KinematicLimits::default())
    }
}

fn checked_limit(what: &str, value: f32) -> f32 {
    let clamped = sanitize(value);
    if clamped != value {
        warn!("{} {} out of range, using {}", what, value, clamped);
    }
    clamped
}
