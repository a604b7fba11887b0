//! Cancel-and-restart debouncing.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Default quiet period for free-text search.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Runs an action once input has been quiet for a fixed period.
///
/// Every [`call`](Debouncer::call) cancels the pending timer and starts a
/// new one, so only the last value in a burst reaches the action.
pub struct Debouncer<T: Send + 'static> {
    quiet: Duration,
    action: Arc<dyn Fn(T) + Send + Sync>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F>(quiet: Duration, action: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            quiet,
            action: Arc::new(action),
            pending: Mutex::new(None),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    /// Restart the quiet period with a new value. Requires a tokio runtime.
    pub fn call(&self, value: T) {
        let Ok(mut pending) = self.pending.lock() else {
            return;
        };
        if let Some(timer) = pending.take() {
            timer.abort();
        }

        let action = Arc::clone(&self.action);
        let quiet = self.quiet;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            action(value);
        }));
    }

    /// Drop the pending value, if any.
    pub fn cancel(&self) {
        if let Some(timer) = self.pending.lock().ok().and_then(|mut p| p.take()) {
            timer.abort();
        }
    }

    /// Returns true while a value is waiting for the quiet period to end.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .map(|p| p.as_ref().is_some_and(|t| !t.is_finished()))
            .unwrap_or(false)
    }
}

impl<T: Send + 'static> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.cancel();
    }
}
