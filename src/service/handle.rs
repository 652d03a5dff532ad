//! Owned handle to a running step task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::clock::Clock;
use crate::error::ServiceError;
use crate::motion::StepRunner;
use crate::motor::{PulseEmitter, SharedKinematics};

use super::{pin_to_core, ServiceConfig, StackWatermark};

/// A step task running on its own thread.
///
/// The task holds the runner's lock for as long as it runs. Stopping clears
/// the running flag and joins the thread; dropping the handle does the same,
/// so the task never outlives its owner.
#[derive(Debug)]
pub struct ServiceHandle {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
    core: u8,
}

impl ServiceHandle {
    /// Start `runner` on a new thread configured by `config`.
    pub fn spawn<E, C>(
        runner: Arc<Mutex<StepRunner<E, C>>>,
        shared: Arc<SharedKinematics>,
        watermark: Arc<StackWatermark>,
        config: &ServiceConfig,
    ) -> Result<Self, ServiceError>
    where
        E: PulseEmitter + Send + 'static,
        C: Clock + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let core = config.core;
        let stack_size = config.stack_size;
        let poll_interval_us = config.poll_interval_us;

        let task = {
            let running = running.clone();
            move || {
                watermark.start(stack_size);
                pin_to_core(core);

                let mut runner = match runner.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };

                if let Err(e) = runner.set_enabled(true) {
                    error!("could not enable driver: {}", e);
                }
                runner.run(&shared, &running, poll_interval_us, || watermark.sample());
                if let Err(e) = runner.set_enabled(false) {
                    error!("could not disable driver: {}", e);
                }
            }
        };

        let thread = thread::Builder::new()
            .name(config.name.as_str().to_string())
            .stack_size(stack_size as usize)
            .spawn(task)
            .map_err(|e| {
                let mut msg = heapless::String::new();
                for c in e.to_string().chars() {
                    if msg.push(c).is_err() {
                        break;
                    }
                }
                ServiceError::Spawn(msg)
            })?;

        info!("step task started on core {}", core);

        Ok(Self {
            running,
            thread: Some(thread),
            core,
        })
    }

    /// Core the task was asked to run on.
    #[inline]
    pub fn core(&self) -> u8 {
        self.core
    }

    /// Whether the task thread is still alive.
    pub fn is_running(&self) -> bool {
        self.thread
            .as_ref()
            .map(|t| !t.is_finished())
            .unwrap_or(false)
    }

    /// Signal the loop to exit and wait until it has.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("step task panicked");
            } else {
                info!("step task stopped");
            }
        }
    }
}

impl Drop for ServiceHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
