//! Flush timing.
//!
//! The scheduler owns the single outstanding flush timer. The default
//! `shared()` instance is process-wide: every aggregator using it
//! competes for one timer slot, so at most one timeout flush is armed
//! in the whole process at any time. Tests (or callers that want
//! per-instance timers) inject an isolated scheduler via `new()`.
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

pub struct FlushScheduler {
    armed: AtomicBool,
}

impl FlushScheduler {
    /// Creates an isolated scheduler with its own timer slot.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            armed: AtomicBool::new(false),
        })
    }

    /// The process-wide scheduler used when none is injected.
    pub fn shared() -> Arc<Self> {
        static SHARED: OnceLock<Arc<FlushScheduler>> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(FlushScheduler::new))
    }

    /// Whether a flush timer is currently outstanding.
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    /// Arms the timer slot if it is free, running `flush` after `delay`
    /// and then disarming. Returns false (and drops `flush` unpolled)
    /// while a timer is already outstanding; arming is idempotent.
    ///
    /// Once armed the timer always fires; there is no cancellation.
    pub(crate) fn try_schedule<F>(self: &Arc<Self>, delay: Duration, flush: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.armed.swap(true, Ordering::SeqCst) {
            return false;
        }

        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            flush.await;
            // Free the slot only after draining, so writes racing the
            // flush cannot arm a second timer over a non-empty buffer.
            scheduler.armed.store(false, Ordering::SeqCst);
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn only_one_timer_is_outstanding() {
        let scheduler = FlushScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let fired = Arc::clone(&fired);
            scheduler.try_schedule(Duration::from_millis(20), async move {
                fired.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert!(scheduler.is_armed());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_armed());
    }

    #[tokio::test]
    async fn slot_is_reusable_after_firing() {
        let scheduler = FlushScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let fired = Arc::clone(&fired);
            assert!(scheduler.try_schedule(Duration::from_millis(10), async move {
                fired.fetch_add(1, Ordering::SeqCst);
            }));
            tokio::time::sleep(Duration::from_millis(40)).await;
        }

        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }
}
