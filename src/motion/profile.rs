//! Motion profile calculation.
//!
//! Decides, one step at a time, whether the axis should accelerate, cruise or
//! decelerate, and derives the period of the next step from the period of the
//! previous one. The target is re-read on every call, so retargeting (and
//! reversal) mid-motion needs no special handling: a flipped distance simply
//! lands in the "moving away" branch.
//!
//! Each step changes the speed `v` by at most the configured rate over the
//! duration of that step, `1 / v'`:
//!
//! ```text
//! speeding up:  v' - v = a / v'   =>  v' = (v + sqrt(v² + 4a)) / 2
//! slowing down: v - v' = d / v'   =>  v' = (v + sqrt(v² - 4d)) / 2
//! ```
//!
//! Below `v = 2 sqrt(d)` any slower speed satisfies the deceleration bound;
//! the speed is then halved per step at most.

use libm::sqrtf;

use crate::config::units::MICROS_PER_SECOND;

use super::limits::KinematicLimits;
use super::state::KinematicState;

/// Once decelerating, stay there until the stopping distance falls this many
/// steps short of the remaining distance.
const DECELERATION_HYSTERESIS_STEPS: f32 = 0.5;

/// Direction of motor motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i8)]
pub enum Direction {
    /// Positive step count.
    Forward = 1,
    /// Not moving.
    #[default]
    Stopped = 0,
    /// Negative step count.
    Backward = -1,
}

impl Direction {
    /// Direction that reduces a signed distance.
    #[inline]
    pub fn from_distance(distance: i64) -> Self {
        match distance.signum() {
            1 => Direction::Forward,
            -1 => Direction::Backward,
            _ => Direction::Stopped,
        }
    }

    /// Decode the `-1/0/+1` representation; anything else is `Stopped`.
    #[inline]
    pub fn from_sign(sign: i8) -> Self {
        match sign {
            1 => Direction::Forward,
            -1 => Direction::Backward,
            _ => Direction::Stopped,
        }
    }

    /// Get the sign multiplier.
    #[inline]
    pub fn sign(self) -> i8 {
        self as i8
    }
}

/// Current phase of motion execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionPhase {
    /// Speeding up toward max speed.
    Accelerating,
    /// Moving at max speed.
    Cruising,
    /// Slowing down, either to stop at the target or to reverse.
    Decelerating,
    /// At the target and at rest.
    #[default]
    Complete,
}

impl MotionPhase {
    /// Phase name for logging.
    pub fn as_str(self) -> &'static str {
        match self {
            MotionPhase::Accelerating => "accelerating",
            MotionPhase::Cruising => "cruising",
            MotionPhase::Decelerating => "decelerating",
            MotionPhase::Complete => "complete",
        }
    }
}

/// Outcome of one profile computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepPlan {
    /// Period between the previous step and the planned one, microseconds.
    pub period_us: f32,
    /// Direction of the planned step.
    pub direction: Direction,
    /// Phase the planned step belongs to.
    pub phase: MotionPhase,
    /// Whether the planned step is due now.
    pub step_now: bool,
}

impl StepPlan {
    /// Nothing to do: the axis is at its target and may rest.
    pub const fn complete() -> Self {
        Self {
            period_us: 0.0,
            direction: Direction::Stopped,
            phase: MotionPhase::Complete,
            step_now: false,
        }
    }

    /// Whether the motion is finished.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.phase == MotionPhase::Complete
    }
}

/// Determine the period and direction of the next step, and whether it is due.
///
/// This never fails. Consecutive periods never change speed faster than the
/// configured acceleration or deceleration allow, and the period never
/// exceeds `slowest_period_us` of `limits`. A step heading toward the target
/// never passes it; a target that lies inside the current stopping distance
/// is passed, and the axis comes back once it has braked to a stop.
pub fn determine_period_of_next_step(
    state: &KinematicState,
    limits: &KinematicLimits,
    now_us: u64,
) -> StepPlan {
    let distance = state.distance_to_target();

    if !state.is_moving() {
        if distance == 0 {
            return StepPlan::complete();
        }
        // Starting from rest, the first step is due right away.
        return StepPlan {
            period_us: limits.slowest_period_us(),
            direction: Direction::from_distance(distance),
            phase: MotionPhase::Accelerating,
            step_now: true,
        };
    }

    let period = state.current_period_us.min(limits.slowest_period_us());
    let heading_to_target = distance.signum() == state.direction.sign() as i64;

    let (period_us, direction, phase) = if heading_to_target {
        let remaining = distance.unsigned_abs().min(u32::MAX as u64) as u32;
        plan_toward_target(state, limits, period, remaining)
    } else if period >= limits.stopped_motion_period_us() {
        // Slow enough to stop here, or to turn around.
        if distance == 0 {
            return StepPlan::complete();
        }
        (
            limits.slowest_period_us(),
            Direction::from_distance(distance),
            MotionPhase::Accelerating,
        )
    } else {
        // Overshooting or retargeted behind us: brake before reversing.
        let next = slow_down(period, limits.deceleration()).min(limits.slowest_period_us());
        (next, state.direction, MotionPhase::Decelerating)
    };

    let elapsed_us = now_us.saturating_sub(state.last_step_us) as f32;

    StepPlan {
        period_us,
        direction,
        phase,
        step_now: elapsed_us >= period_us,
    }
}

fn plan_toward_target(
    state: &KinematicState,
    limits: &KinematicLimits,
    period: f32,
    remaining: u32,
) -> (f32, Direction, MotionPhase) {
    let stopping_distance = limits.stopping_distance(state.speed());
    let hysteresis = if state.phase == MotionPhase::Decelerating {
        DECELERATION_HYSTERESIS_STEPS
    } else {
        0.0
    };
    // Slowest period this step may take without exceeding the deceleration.
    let hardest_brake = slow_down(period, limits.deceleration());

    let (raw, phase) = if stopping_distance + hysteresis >= remaining as f32 {
        // Follow v² = 2d(R - 1) down to the target, never speeding up.
        let landing = if remaining > 1 {
            limits.braking_period_us(remaining - 1)
        } else {
            f32::INFINITY
        };
        (landing.max(period).min(hardest_brake), MotionPhase::Decelerating)
    } else if period > limits.desired_period_us() {
        (speed_up(period, limits.acceleration()), MotionPhase::Accelerating)
    } else if period < limits.desired_period_us() {
        // Max speed was lowered mid-motion.
        (
            limits.desired_period_us().min(hardest_brake),
            MotionPhase::Decelerating,
        )
    } else {
        (limits.desired_period_us(), MotionPhase::Cruising)
    };

    // Never faster than max speed or than what can still stop in the
    // remaining distance, unless getting there would brake harder than the
    // deceleration allows. Never slower than the first step out of rest.
    let fastest = limits
        .desired_period_us()
        .max(limits.braking_period_us(remaining))
        .min(hardest_brake);
    let period_us = raw.max(fastest).min(limits.slowest_period_us());

    let phase = if period_us > period {
        MotionPhase::Decelerating
    } else {
        phase
    };

    (period_us, state.direction, phase)
}

/// Period of the next step when speeding up from `period_us` at
/// `acceleration` steps/s².
#[inline]
fn speed_up(period_us: f32, acceleration: f32) -> f32 {
    let speed = MICROS_PER_SECOND / period_us;
    let next = 0.5 * (speed + sqrtf(speed * speed + 4.0 * acceleration));
    MICROS_PER_SECOND / next
}

/// Longest period of the next step when slowing down from `period_us` at
/// `deceleration` steps/s².
#[inline]
fn slow_down(period_us: f32, deceleration: f32) -> f32 {
    let speed = MICROS_PER_SECOND / period_us;
    let discriminant = speed * speed - 4.0 * deceleration;
    let next = if discriminant > 0.0 {
        0.5 * (speed + sqrtf(discriminant))
    } else {
        0.5 * speed
    };
    MICROS_PER_SECOND / next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> KinematicLimits {
        KinematicLimits::new(1000.0, 2000.0, 2000.0)
    }

    fn moving(position: i32, target: i32, period_us: f32, direction: Direction) -> KinematicState {
        KinematicState {
            current_position: position,
            target_position: target,
            current_period_us: period_us,
            next_period_us: period_us,
            direction,
            last_step_us: 0,
            phase: MotionPhase::Accelerating,
        }
    }

    #[test]
    fn test_rest_at_target_is_complete() {
        let state = KinematicState::at_rest(10);
        let plan = determine_period_of_next_step(&state, &limits(), 1_000_000);

        assert!(plan.is_complete());
        assert!(!plan.step_now);
        assert_eq!(plan.direction, Direction::Stopped);
    }

    #[test]
    fn test_start_from_rest() {
        let mut state = KinematicState::at_rest(0);
        state.target_position = -50;
        let plan = determine_period_of_next_step(&state, &limits(), 0);

        assert!(plan.step_now);
        assert_eq!(plan.direction, Direction::Backward);
        assert_eq!(plan.phase, MotionPhase::Accelerating);
        assert_eq!(plan.period_us, limits().slowest_period_us());
    }

    #[test]
    fn test_accelerate_shrinks_period() {
        let state = moving(10, 1000, 10_000.0, Direction::Forward);
        let plan = determine_period_of_next_step(&state, &limits(), 0);

        assert_eq!(plan.phase, MotionPhase::Accelerating);
        assert!(plan.period_us < 10_000.0);
        assert!(plan.period_us >= limits().desired_period_us());
    }

    #[test]
    fn test_cruise_holds_max_speed() {
        // 1000 steps/s, 5000 steps left: stopping distance is only 250.
        let state = moving(0, 5000, 1000.0, Direction::Forward);
        let plan = determine_period_of_next_step(&state, &limits(), 0);

        assert_eq!(plan.phase, MotionPhase::Cruising);
        assert!((plan.period_us - 1000.0).abs() < 0.01);
    }

    #[test]
    fn test_decelerate_near_target() {
        // 1000 steps/s with 250 steps left: exactly the stopping distance.
        let state = moving(750, 1000, 1000.0, Direction::Forward);
        let plan = determine_period_of_next_step(&state, &limits(), 0);

        assert_eq!(plan.phase, MotionPhase::Decelerating);
        assert!(plan.period_us > 1000.0);
        assert!(plan.period_us >= limits().braking_period_us(249) * 0.999);
    }

    #[test]
    fn test_target_inside_stopping_distance_brakes_at_deceleration() {
        // 1000 steps/s needs 250 steps to stop; only 5 left.
        let state = moving(1000, 1005, 1000.0, Direction::Forward);
        let plan = determine_period_of_next_step(&state, &limits(), 0);

        assert_eq!(plan.phase, MotionPhase::Decelerating);
        assert_eq!(plan.direction, Direction::Forward);
        assert!(plan.period_us > 1000.0);
        assert!(plan.period_us < limits().braking_period_us(5));

        let after = 1.0e6 / plan.period_us;
        let rate = (1000.0 - after) * after;
        assert!(rate <= 2000.0 * 1.001, "braked at {} steps/s²", rate);
    }

    #[test]
    fn test_target_behind_brakes_before_reversing() {
        let state = moving(300, 0, 1000.0, Direction::Forward);
        let plan = determine_period_of_next_step(&state, &limits(), 0);

        assert_eq!(plan.direction, Direction::Forward);
        assert_eq!(plan.phase, MotionPhase::Decelerating);
        assert!(plan.period_us > 1000.0);
    }

    #[test]
    fn test_reverse_once_slow() {
        let l = limits();
        let state = moving(300, 0, l.slowest_period_us(), Direction::Forward);
        let plan = determine_period_of_next_step(&state, &l, 0);

        assert_eq!(plan.direction, Direction::Backward);
        assert_eq!(plan.phase, MotionPhase::Accelerating);
        assert_eq!(plan.period_us, l.slowest_period_us());
    }

    #[test]
    fn test_arrival_at_slow_speed_completes() {
        let l = limits();
        let state = moving(100, 100, l.braking_period_us(1), Direction::Forward);
        assert!(determine_period_of_next_step(&state, &l, 0).is_complete());
    }

    #[test]
    fn test_arrival_at_high_speed_keeps_braking() {
        // Target yanked onto the current position while at full speed.
        let state = moving(100, 100, 1000.0, Direction::Forward);
        let plan = determine_period_of_next_step(&state, &limits(), 0);

        assert!(!plan.is_complete());
        assert_eq!(plan.phase, MotionPhase::Decelerating);
    }

    #[test]
    fn test_step_not_due_before_period_elapses() {
        let mut state = moving(0, 5000, 1000.0, Direction::Forward);
        state.last_step_us = 10_000;

        assert!(!determine_period_of_next_step(&state, &limits(), 10_500).step_now);
        assert!(determine_period_of_next_step(&state, &limits(), 11_000).step_now);
    }

    #[test]
    fn test_lowered_max_speed_is_approached_at_deceleration() {
        // 2000 steps/s against a 1000 steps/s limit.
        let state = moving(0, 100_000, 500.0, Direction::Forward);
        let plan = determine_period_of_next_step(&state, &limits(), 0);

        assert_eq!(plan.phase, MotionPhase::Decelerating);
        assert!(plan.period_us > 500.0);
        assert!(plan.period_us < limits().desired_period_us());
    }

    #[test]
    fn test_speed_change_matches_configured_rates() {
        for period in [20_000.0f32, 5000.0, 1000.0, 250.0] {
            let speed = 1.0e6 / period;

            let faster = 1.0e6 / speed_up(period, 2000.0);
            assert!(((faster - speed) * faster - 2000.0).abs() < 2.0);

            let slower = 1.0e6 / slow_down(period, 2000.0);
            assert!(slower < speed);
            assert!((speed - slower) * slower <= 2000.0 * 1.001);
        }
    }
}
