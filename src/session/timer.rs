//! The login timer: fires a 421 and scheduled exit on `TimeoutLogin`
//! expiry, backed by a 10-second backstop that hard-exits if the scheduled
//! exit does not run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::AbortHandle;

/// Duration of the backstop timer armed after the login timer itself
/// expires.
pub const BACKSTOP_DURATION: Duration = Duration::from_secs(10);

/// Cancelable, idempotent login timer for one connection.
///
/// Cancellation races with the expiry callback are resolved by the shared
/// `fired` flag: whichever side observes it first wins, and the backstop
/// timer guarantees the worker exits even if the scheduled exit after
/// expiry never runs.
pub struct LoginTimer {
    handle: Option<AbortHandle>,
    fired: Arc<AtomicBool>,
}

impl LoginTimer {
    /// Arms a login timer of `duration`. `on_expire` is invoked once, from
    /// the timer task, if the timer is not canceled first; it is expected
    /// to send the 421 response and schedule the worker's exit. `on_backstop`
    /// is invoked `BACKSTOP_DURATION` later if the worker has not exited by
    /// then and is expected to hard-exit the process.
    #[must_use]
    pub fn arm<F, G>(duration: Duration, on_expire: F, on_backstop: G) -> Self
    where
        F: FnOnce() + Send + 'static,
        G: FnOnce() + Send + 'static,
    {
        let fired = Arc::new(AtomicBool::new(false));
        let fired_for_task = Arc::clone(&fired);

        let join = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if fired_for_task.swap(true, Ordering::SeqCst) {
                return;
            }
            on_expire();
            tokio::time::sleep(BACKSTOP_DURATION).await;
            on_backstop();
        });

        Self {
            handle: Some(join.abort_handle()),
            fired,
        }
    }

    /// Cancels the timer. Idempotent: calling this after the timer has
    /// already fired, or calling it twice, has no effect beyond the first
    /// successful cancellation.
    pub fn cancel(&mut self) {
        if self.fired.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for LoginTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
