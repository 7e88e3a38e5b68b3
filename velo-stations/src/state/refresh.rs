//! Background periodic refresh task.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Owns at most one running refresh loop.
///
/// Dropping it aborts the loop.
#[derive(Debug, Default)]
pub(crate) struct AutoRefresh {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl AutoRefresh {
    /// Start the loop if it is not already running.
    ///
    /// `tick` is called once per period, never at start. It returns the
    /// refresh to await, or `None` to end the loop. Returns `false` if a
    /// loop was already running or there is no Tokio runtime to spawn on.
    pub(crate) fn start<F, Fut>(&self, period: Duration, mut tick: F) -> bool
    where
        F: FnMut() -> Option<Fut> + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut guard = self.handle.lock().unwrap_or_else(|e| e.into_inner());
        if guard.as_ref().is_some_and(|h| !h.is_finished()) {
            return false;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(error = %e, "Cannot start auto-refresh outside a Tokio runtime");
                return false;
            }
        };

        *guard = Some(runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await; // First tick is immediate, skip it
            loop {
                interval.tick().await;
                match tick() {
                    // Detached: stopping the loop must not cancel an in-flight refresh
                    Some(refresh) => {
                        if let Err(e) = tokio::spawn(refresh).await {
                            warn!(error = %e, "Auto-refresh task failed");
                        }
                    }
                    None => {
                        debug!("Auto-refresh owner gone, stopping");
                        break;
                    }
                }
            }
        }));
        true
    }

    /// Stop the loop. Returns whether one was running.
    pub(crate) fn stop(&self) -> bool {
        let mut guard = self.handle.lock().unwrap_or_else(|e| e.into_inner());
        match guard.take() {
            Some(handle) => {
                let was_running = !handle.is_finished();
                handle.abort();
                was_running
            }
            None => false,
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        let guard = self.handle.lock().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        let handle = self.handle.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = handle.take() {
            handle.abort();
        }
    }
}
