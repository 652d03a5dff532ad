//! Stack margin tracking for the step task.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// Lowest free stack margin observed on the step task, in bytes.
///
/// The margin is estimated from the distance between the stack pointer at
/// task entry and at the sampling point, so it does not include whatever the
/// runtime placed below the entry frame.
#[derive(Debug, Default)]
pub struct StackWatermark {
    base: AtomicUsize,
    stack_size: AtomicU32,
    min_free: AtomicU32,
}

impl StackWatermark {
    /// No task has run yet.
    pub const fn new() -> Self {
        Self {
            base: AtomicUsize::new(0),
            stack_size: AtomicU32::new(0),
            min_free: AtomicU32::new(0),
        }
    }

    /// Record the entry frame of a new task with `stack_size` bytes of
    /// stack. Must be called on that task.
    pub fn start(&self, stack_size: u32) {
        self.base.store(stack_address(), Ordering::Relaxed);
        self.stack_size.store(stack_size, Ordering::Relaxed);
        self.min_free.store(stack_size, Ordering::Relaxed);
    }

    /// Sample the current depth. Must be called on the task passed to
    /// [`start`](Self::start).
    #[inline(never)]
    pub fn sample(&self) {
        let base = self.base.load(Ordering::Relaxed);
        if base == 0 {
            return;
        }
        let used = base.abs_diff(stack_address());
        let free = (self.stack_size.load(Ordering::Relaxed) as usize).saturating_sub(used);
        self.min_free.fetch_min(free as u32, Ordering::Relaxed);
    }

    /// Minimum free margin since the last start; 0 if no task ever started.
    pub fn high_water_mark(&self) -> u32 {
        self.min_free.load(Ordering::Relaxed)
    }
}

#[inline(always)]
fn stack_address() -> usize {
    let marker = 0u8;
    core::hint::black_box(&marker) as *const u8 as usize
}
