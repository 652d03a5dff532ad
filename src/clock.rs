//! Monotonic time source for the step loop.

/// Microsecond clock and bounded wait used by the step runner.
pub trait Clock {
    /// Monotonic time in microseconds.
    fn now_us(&self) -> u64;

    /// Suspend the caller until `us` microseconds have passed, as precisely
    /// as the platform allows. Used when a step is due at the end of the wait.
    fn sleep_us(&mut self, us: u32);

    /// Suspend the caller for about `us` microseconds when nothing is due.
    /// Lateness is harmless here, so implementations should not busy-wait.
    fn idle_us(&mut self, us: u32) {
        self.sleep_us(us);
    }
}

#[cfg(feature = "std")]
pub use self::host::{ManualClock, StdClock};

#[cfg(feature = "std")]
mod host {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    use super::Clock;

    /// OS sleeps shorter than this overshoot by more than a typical step
    /// period at high speed, so the tail of every wait is spent spinning.
    const SPIN_WINDOW_US: u32 = 100;

    /// Wall clock backed by [`Instant`].
    #[derive(Debug, Clone, Copy)]
    pub struct StdClock {
        origin: Instant,
    }

    impl StdClock {
        /// Clock whose zero is now.
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
            }
        }
    }

    impl Default for StdClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Clock for StdClock {
        fn now_us(&self) -> u64 {
            self.origin.elapsed().as_micros() as u64
        }

        fn sleep_us(&mut self, us: u32) {
            let deadline = self.now_us() + us as u64;
            if us > SPIN_WINDOW_US {
                thread::sleep(Duration::from_micros((us - SPIN_WINDOW_US) as u64));
            }
            while self.now_us() < deadline {
                core::hint::spin_loop();
            }
        }

        fn idle_us(&mut self, us: u32) {
            thread::sleep(Duration::from_micros(us as u64));
        }
    }

    /// Simulated clock: time only moves when slept on or advanced.
    ///
    /// Clones share the same time line, so a test can keep one handle and
    /// give the other to a [`StepRunner`](crate::motion::StepRunner).
    #[derive(Debug, Clone, Default)]
    pub struct ManualClock {
        now: Arc<AtomicU64>,
    }

    impl ManualClock {
        /// Clock starting at `start_us`.
        pub fn starting_at(start_us: u64) -> Self {
            Self {
                now: Arc::new(AtomicU64::new(start_us)),
            }
        }

        /// Move time forward.
        pub fn advance(&self, us: u64) {
            self.now.fetch_add(us, Ordering::Relaxed);
        }
    }

    impl Clock for ManualClock {
        fn now_us(&self) -> u64 {
            self.now.load(Ordering::Relaxed)
        }

        fn sleep_us(&mut self, us: u32) {
            self.advance(us as u64);
        }
    }
}
