//! Cancellable trailing-edge timer.
//!
//! Rapid calls to [`Debouncer::schedule`] coalesce into a single call of the
//! action, with the last value, once the window has elapsed without a new
//! call. Dropping the debouncer cancels whatever is pending.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

type Action<T> = Arc<dyn Fn(T) + Send + Sync>;

pub struct Debouncer<T> {
    window: Duration,
    action: Action<T>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Return a debouncer running `action` after `window` of quiescence.
    /// Scheduling requires a tokio runtime.
    ///
    pub fn new(window: Duration, action: impl Fn(T) + Send + Sync + 'static) -> Self {
        Debouncer {
            window,
            action: Arc::new(action),
            pending: Mutex::new(None),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Start the timer, or restart it if a call is already pending. The
    /// pending value is replaced.
    ///
    pub fn schedule(&self, value: T) {
        let action = Arc::clone(&self.action);
        let window = self.window;
        let task = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            action(value);
        });
        if let Some(previous) = self.pending().replace(task) {
            previous.abort();
        }
    }

    /// Drop the pending call, if any. Returns whether one was dropped.
    ///
    pub fn cancel(&self) -> bool {
        match self.pending().take() {
            Some(task) if !task.is_finished() => {
                task.abort();
                true
            }
            _ => false,
        }
    }

    /// Cancel the pending call and run the action right away.
    ///
    pub fn fire(&self, value: T) {
        self.cancel();
        (self.action)(value);
    }

    pub fn is_pending(&self) -> bool {
        self.pending()
            .as_ref()
            .map_or(false, |task| !task.is_finished())
    }

    fn pending(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        let pending = self.pending.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = pending.take() {
            task.abort();
        }
    }
}
