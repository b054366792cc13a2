use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

struct Pending {
    ticket: u64,
    handle: JoinHandle<()>,
}

/// Trailing-edge debounce on the tokio runtime.
///
/// Every `schedule` cancels the pending timer and starts a new one, so only the
/// last action of a burst runs, `delay` after the burst went quiet. Once the
/// timer has fired the action is running and can no longer be cancelled; a
/// later `schedule` just starts the next window alongside it.
///
/// Timers are spawned onto the runtime given at construction, so `schedule`
/// can be called from threads that are not part of it.
pub struct Debouncer {
    runtime: Handle,
    delay: Duration,
    pending: Arc<Mutex<Option<Pending>>>,
    next_ticket: AtomicU64,
}

impl Debouncer {
    pub fn new(delay: Duration, runtime: Handle) -> Self {
        Self {
            runtime,
            delay,
            pending: Arc::new(Mutex::new(None)),
            next_ticket: AtomicU64::new(0),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `action` once `delay` has passed without another call to `schedule`.
    pub fn schedule<F, Fut>(&self, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let delay = self.delay;
        let pending = Arc::clone(&self.pending);

        // Held while spawning, so the timer task can't look for its ticket
        // before it is stored.
        let mut slot = self.pending.lock();
        if let Some(previous) = slot.take() {
            previous.handle.abort();
        }

        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut slot = pending.lock();
                match slot.as_ref() {
                    Some(current) if current.ticket == ticket => {
                        slot.take();
                    }
                    _ => return,
                }
            }
            action().await;
        });

        *slot = Some(Pending { ticket, handle });
    }

    /// Drop the pending action, if its timer has not fired yet.
    /// Returns whether something was cancelled.
    pub fn cancel(&self) -> bool {
        match self.pending.lock().take() {
            Some(previous) => {
                previous.handle.abort();
                true
            }
            None => false,
        }
    }

    /// True while a timer is waiting to fire.
    pub fn is_pending(&self) -> bool {
        self.pending.lock().is_some()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
