//! Background task settings.

use serde::Deserialize;

/// Core the step task is pinned to when none is given.
pub const DEFAULT_CORE: u8 = 1;

/// Stack reserved for the step task, in bytes.
pub const DEFAULT_STACK_SIZE: u32 = 16 * 1024;

/// Longest sleep of the step loop when no step is due, in microseconds.
pub const DEFAULT_POLL_INTERVAL_US: u32 = 1000;

/// `[motors.<name>.service]` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// CPU core to run on.
    pub core: u8,
    /// Stack size in bytes.
    pub stack_size: u32,
    /// Longest idle sleep in microseconds.
    pub poll_interval_us: u32,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            core: DEFAULT_CORE,
            stack_size: DEFAULT_STACK_SIZE,
            poll_interval_us: DEFAULT_POLL_INTERVAL_US,
        }
    }
}
