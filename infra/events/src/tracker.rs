//! In-flight accounting for firings.
//!
//! One [`InFlight`] counter exists for the whole manager and one per
//! subscriber list. Work is bracketed by an [`InFlightGuard`], so the
//! counter stays balanced when a handler unwinds or a scheduled unit is
//! dropped before it runs.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
pub(crate) struct InFlight {
    count: Mutex<usize>,
    idle: Condvar,
    notify: Notify,
}

impl InFlight {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Marks one unit of work as started.
    pub(crate) fn enter(this: &Arc<Self>) -> InFlightGuard {
        *this.count.lock() += 1;
        InFlightGuard { tracker: Arc::clone(this) }
    }

    fn leave(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
            self.notify.notify_waiters();
        }
    }

    pub(crate) fn active(&self) -> usize {
        *self.count.lock()
    }

    /// Blocks the calling thread until the counter is zero.
    pub(crate) fn wait(&self) {
        let mut count = self.count.lock();
        while *count != 0 {
            self.idle.wait(&mut count);
        }
    }

    /// Waits until the counter is zero without blocking the executor.
    pub(crate) async fn wait_async(&self) {
        loop {
            let mut notified = std::pin::pin!(self.notify.notified());
            // Register before checking so a `leave` in between is not lost.
            notified.as_mut().enable();
            if self.active() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Leaves the tracker on drop.
#[derive(Debug)]
pub(crate) struct InFlightGuard {
    tracker: Arc<InFlight>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.tracker.leave();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_guard_balances_counter() {
        let tracker = InFlight::new();
        let a = InFlight::enter(&tracker);
        let b = InFlight::enter(&tracker);
        assert_eq!(tracker.active(), 2);
        drop(a);
        assert_eq!(tracker.active(), 1);
        drop(b);
        assert_eq!(tracker.active(), 0);
        tracker.wait();
    }

    #[test]
    fn test_wait_blocks_until_idle() {
        let tracker = InFlight::new();
        let guard = InFlight::enter(&tracker);

        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            drop(guard);
        });

        tracker.wait();
        assert_eq!(tracker.active(), 0);
        handle.join().unwrap();
    }

    #[test]
    fn test_guard_released_on_unwind() {
        let tracker = InFlight::new();
        let inner = Arc::clone(&tracker);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = InFlight::enter(&inner);
            panic!("boom");
        }));
        assert!(result.is_err());
        assert_eq!(tracker.active(), 0);
    }

    #[tokio::test]
    async fn test_wait_async_wakes_on_leave() {
        let tracker = InFlight::new();
        let guard = InFlight::enter(&tracker);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            drop(guard);
        });

        tokio::time::timeout(Duration::from_secs(5), tracker.wait_async())
            .await
            .expect("tracker should become idle");
        assert_eq!(tracker.active(), 0);
    }
}
