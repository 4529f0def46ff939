//! Periodic Sweep Task
//!
//! Cancellable repeating timer used by the cache and the security engine to
//! reclaim expired state.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

// == Sweep Handle ==
/// Owning handle for a running sweep task.
///
/// Dropping the handle aborts the task.
#[derive(Debug)]
pub struct SweepHandle {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl SweepHandle {
    /// Name the sweep was started with.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns true once the task has exited or been aborted.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancels the sweep.
    pub fn stop(self) {
        info!(sweep = self.name, "Stopping sweep task");
        self.handle.abort();
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawns a task that calls `tick` every `interval`.
///
/// The first tick happens one full interval after spawning. The loop ends when
/// `tick` returns `ControlFlow::Break`, which the owners use once the state
/// they sweep has been dropped.
///
/// # Panics
/// Must be called from within a tokio runtime.
///
/// # Example
/// ```ignore
/// let handle = spawn_periodic("cache", Duration::from_secs(60), move || {
///     // reclaim memory
///     ControlFlow::Continue(())
/// });
/// // Later, during shutdown:
/// handle.stop();
/// ```
pub fn spawn_periodic<F>(name: &'static str, interval: Duration, mut tick: F) -> SweepHandle
where
    F: FnMut() -> ControlFlow<()> + Send + 'static,
{
    let handle = tokio::spawn(async move {
        info!(
            sweep = name,
            "Starting sweep task with interval of {} ms",
            interval.as_millis()
        );

        loop {
            tokio::time::sleep(interval).await;

            if tick().is_break() {
                debug!(sweep = name, "Sweep target dropped, exiting");
                break;
            }
        }
    });

    SweepHandle { name, handle }
}
