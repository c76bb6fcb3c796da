//! Background timer that drives periodic flushes.
//!
//! The scheduler owns a dedicated thread that sleeps on a condition variable
//! for one interval, runs its task, and repeats. Cancelling wakes the thread
//! and joins it, so once [`FlushScheduler::cancel`] returns the task will not
//! run again.

use parking_lot::{Condvar, Mutex, MutexGuard};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const THREAD_NAME: &str = "fogmap-flush";

/// What the scheduler should do after a task run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskControl {
    Continue,
    Stop,
}

struct Signal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

/// Recurring trigger running a task on its own thread at a fixed interval.
pub struct FlushScheduler {
    signal: Arc<Signal>,
    handle: Option<JoinHandle<()>>,
    interval: Duration,
}

impl FlushScheduler {
    /// Spawns the timer thread. The first run happens one full interval after start.
    pub fn start<F>(interval: Duration, mut task: F) -> std::io::Result<Self>
    where
        F: FnMut() -> TaskControl + Send + 'static,
    {
        let signal = Arc::new(Signal {
            stopped: Mutex::new(false),
            wake: Condvar::new(),
        });

        let worker = Arc::clone(&signal);
        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || {
                let mut stopped = worker.stopped.lock();
                loop {
                    let deadline = Instant::now() + interval;
                    while !*stopped {
                        if worker.wake.wait_until(&mut stopped, deadline).timed_out() {
                            break;
                        }
                    }
                    if *stopped {
                        break;
                    }

                    let control = MutexGuard::unlocked(&mut stopped, &mut task);
                    if control == TaskControl::Stop {
                        break;
                    }
                }
                log::debug!("Flush scheduler stopped");
            })?;

        log::debug!("Flush scheduler started with {:?} interval", interval);

        Ok(Self {
            signal,
            handle: Some(handle),
            interval,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stops the timer and waits for an in-flight run to finish.
    ///
    /// Called from the timer thread itself (possible when the task drops the
    /// last owner of the scheduler) it only signals, since joining would deadlock.
    pub fn cancel(&mut self) {
        *self.signal.stopped.lock() = true;
        self.signal.wake.notify_all();

        if let Some(handle) = self.handle.take() {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                log::error!("Flush scheduler thread panicked");
            }
        }
    }
}

impl Drop for FlushScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for FlushScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlushScheduler")
            .field("interval", &self.interval)
            .field("running", &self.is_running())
            .finish()
    }
}
