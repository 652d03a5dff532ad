//! Background step task.
//!
//! Hosts a [`StepRunner`](crate::motion::StepRunner) on a dedicated thread,
//! optionally pinned to one CPU core (feature `rt`).

mod handle;
mod stack;

pub use handle::ServiceHandle;
pub use stack::StackWatermark;

use crate::config::{ServiceSettings, DEFAULT_CORE, DEFAULT_POLL_INTERVAL_US, DEFAULT_STACK_SIZE};

/// Settings for the background step task.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// CPU core to run on.
    pub core: u8,
    /// Stack size in bytes.
    pub stack_size: u32,
    /// Longest idle sleep in microseconds.
    pub poll_interval_us: u32,
    /// Thread name.
    pub name: heapless::String<32>,
}

impl ServiceConfig {
    /// Task named `name` with the given settings.
    pub fn from_settings(name: &str, settings: &ServiceSettings) -> Self {
        Self {
            core: settings.core,
            stack_size: settings.stack_size,
            poll_interval_us: settings.poll_interval_us,
            name: heapless::String::try_from(name).unwrap_or_default(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            core: DEFAULT_CORE,
            stack_size: DEFAULT_STACK_SIZE,
            poll_interval_us: DEFAULT_POLL_INTERVAL_US,
            name: heapless::String::try_from("stepper").unwrap_or_default(),
        }
    }
}

#[cfg(feature = "rt")]
pub(crate) fn pin_to_core(core: u8) {
    use nix::sched::{sched_setaffinity, CpuSet};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    let pinned = cpuset
        .set(core as usize)
        .and_then(|_| sched_setaffinity(Pid::from_raw(0), &cpuset));

    match pinned {
        Ok(()) => debug!("step task pinned to core {}", core),
        Err(e) => warn!("could not pin step task to core {}: errno {}", core, e as i32),
    }
}

#[cfg(not(feature = "rt"))]
pub(crate) fn pin_to_core(core: u8) {
    trace!("core affinity not supported, ignoring core {}", core);
}
