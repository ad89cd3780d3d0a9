use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Cloneable abort signal threaded through every wait loop.
///
/// Cancelling wakes any thread currently sleeping in [`CancelToken::wait`].
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (lock, cvar) = &*self.inner;
        *Self::guard(lock) = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *Self::guard(&self.inner.0)
    }

    /// Sleep for `timeout` or until cancelled. Returns `true` if cancelled.
    pub fn wait(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let guard = Self::guard(lock);
        let (guard, _) = cvar
            .wait_timeout_while(guard, timeout, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }

    fn guard(lock: &Mutex<bool>) -> MutexGuard<'_, bool> {
        // A bool cannot be left half-written.
        lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
